//! Error types for SNG operations

use psarc_secure::CryptoError;
use thiserror::Error;

/// Main error type for SNG decoding and parsing
#[derive(Debug, Error)]
pub enum SngError {
    #[error("SNG data too short: {len} bytes")]
    TooShort { len: usize },
    #[error("invalid SNG magic")]
    InvalidMagic,
    #[error("cryptographic operation failed: {0}")]
    Crypto(#[from] CryptoError),
    #[error("failed to decompress SNG payload")]
    Decompression,
    #[error("read past end at offset {offset}: need {need} bytes, {available} available")]
    ReadPastEnd {
        offset: usize,
        need: usize,
        available: usize,
    },
    #[error("{remaining} bytes remaining after the final section")]
    TrailingBytes { remaining: usize },
}
