//! PSARC 1.4 container reading.
//!
//! A PSARC file is a big-endian header, a table of contents (optionally
//! AES-encrypted), a table of per-chunk compressed lengths, and the chunk
//! data itself. Entry 0 is always a newline-separated manifest assigning
//! path names to the remaining entries. The Rocksmith 2014 flavor
//! additionally wraps `.sng` entries in their own encryption layer, which
//! [`PsarcReader`] unwraps transparently on extraction.
//!
//! [`PsarcReader`] works over any `Read + Seek` source and parses the
//! tables eagerly; [`Archive`] owns a file path on top of it and adds the
//! batch operations (extract-all, SNG-to-XML conversion, audio handoff).

pub mod archive;
pub mod error;
pub mod reader;
pub mod structs;

pub use archive::{Archive, AudioConverter};
pub use error::{ArchiveError, EntryFailure};
pub use reader::PsarcReader;
pub use structs::{ArchiveFlags, CompressionMethod, FileEntry, PsarcHeader};

#[cfg(test)]
mod tests;
