//! Error types for archive operations

use std::io;
use std::path::PathBuf;

use psarc_secure::CryptoError;
use psarc_sng::SngError;
use thiserror::Error;

/// One failed entry inside an aggregating batch operation.
#[derive(Debug)]
pub struct EntryFailure {
    pub name: String,
    pub error: ArchiveError,
}

/// Main error type for archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open archive {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid PSARC file: wrong magic number")]
    InvalidMagic,
    #[error("unsupported PSARC version: {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },
    #[error("TOC data truncated")]
    TruncatedToc,
    #[error("invalid TOC entry size: {size}")]
    InvalidTocEntrySize { size: u32 },
    #[error("chunk index out of range")]
    ChunkIndexOutOfRange,
    #[error("invalid entry index: {index}")]
    InvalidEntryIndex { index: usize },
    #[error("short read inside archive data: {0}")]
    ShortRead(#[source] io::Error),
    #[error("cryptographic operation failed: {0}")]
    Crypto(#[from] CryptoError),
    #[error("SNG operation failed: {0}")]
    Sng(#[from] SngError),
    #[error("file not found in archive: {name}")]
    EntryNotFound { name: String },
    #[error("archive is not open")]
    NotOpen,
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("audio conversion failed for {name}: {source}")]
    AudioConversion {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to process {} file(s)", failures.len())]
    PartialExtraction { failures: Vec<EntryFailure> },
}
