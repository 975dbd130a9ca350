//! Decompression helpers for PSARC chunk payloads.
//!
//! PSARC compresses entries block by block, and real-world archives contain
//! the occasional chunk that is stored raw despite carrying a nonzero
//! compressed length. Both decoders therefore signal failure with `None`
//! instead of an error, leaving the fallback policy to the caller: the
//! container reader passes the raw chunk bytes through, while the SNG
//! decoder treats `None` as a hard failure.

pub mod lzma;
pub mod zlib;

#[cfg(test)]
mod tests;
