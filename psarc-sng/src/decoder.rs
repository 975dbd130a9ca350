//! SNG wrapper handling.
//!
//! On disk an SNG entry is a 24-byte little-endian prefix (magic, flags,
//! 16-byte IV) followed by AES-256-CTR ciphertext. When the compressed flag
//! is set, the plaintext starts with a 32-bit uncompressed size and a zlib
//! stream.

use crate::error::SngError;

pub const SNG_MAGIC: u32 = 0x0000_004A;

/// Flag bit: the decrypted payload is zlib-compressed.
pub const SNG_COMPRESSED_FLAG: u32 = 0x0000_0001;

/// Strip the wrapper: validate, decrypt, and decompress if flagged.
///
/// Returns the SNG plaintext ready for [`crate::parser::parse`].
pub fn decode(data: &[u8]) -> Result<Vec<u8>, SngError> {
    if data.len() < 24 {
        return Err(SngError::TooShort { len: data.len() });
    }

    let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if magic != SNG_MAGIC {
        return Err(SngError::InvalidMagic);
    }

    let flags = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&data[8..24]);

    let plain = psarc_secure::decrypt_sng(&iv, &data[24..])?;

    if flags & SNG_COMPRESSED_FLAG != 0 {
        if plain.len() < 4 {
            return Err(SngError::TooShort { len: plain.len() });
        }
        let uncompressed_size =
            u32::from_le_bytes([plain[0], plain[1], plain[2], plain[3]]) as usize;
        return psarc_comp::zlib::inflate(&plain[4..], uncompressed_size)
            .ok_or(SngError::Decompression);
    }

    Ok(plain)
}
