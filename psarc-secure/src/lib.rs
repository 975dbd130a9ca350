//! Cryptographic primitives for the PSARC toolchain.
//!
//! Rocksmith 2014 archives use two fixed AES-256 keys: one (with a fixed IV)
//! for the archive's table of contents in CFB128 mode, and one for the SNG
//! payloads in CTR mode with a per-file IV carried in the SNG wrapper. The
//! keys are long-public and baked into every extractor for this format, so
//! they are embedded here as process-wide constants.

use aes::Aes256;
use aes::cipher::{AsyncStreamCipher, KeyIvInit, StreamCipher};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// AES-256 key for the archive table of contents (CFB128).
pub const TOC_KEY: [u8; 32] = [
    0xC5, 0x3D, 0xB2, 0x38, 0x70, 0xA1, 0xA2, 0xF7, 0x1C, 0xAE, 0x64, 0x06, 0x1F, 0xDD, 0x0E, 0x11,
    0x57, 0x30, 0x9D, 0xC8, 0x52, 0x04, 0xD4, 0xC5, 0xBF, 0xDF, 0x25, 0x09, 0x0D, 0xF2, 0x57, 0x2C,
];

/// Fixed IV paired with [`TOC_KEY`].
pub const TOC_IV: [u8; 16] = [
    0xE9, 0x15, 0xAA, 0x01, 0x8F, 0xEF, 0x71, 0xFC, 0x50, 0x81, 0x32, 0xE4, 0xBB, 0x4C, 0xEB, 0x42,
];

/// AES-256 key for SNG payloads (CTR, per-file IV).
pub const SNG_KEY: [u8; 32] = [
    0xCB, 0x64, 0x8D, 0xF3, 0xD1, 0x2A, 0x16, 0xBF, 0x71, 0x70, 0x14, 0x14, 0xE6, 0x96, 0x19, 0xEC,
    0x17, 0x1C, 0xCA, 0x5D, 0x2A, 0x14, 0x2E, 0x3E, 0x59, 0xDE, 0x7A, 0xDD, 0xA1, 0x8A, 0x3A, 0x30,
];

type TocDecryptor = cfb_mode::Decryptor<Aes256>;
type SngCipher = ctr::Ctr128BE<Aes256>;

/// Cryptographic operation errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("AES {stage} failed")]
    Failure { stage: &'static str },
}

/// Decrypt an encrypted table of contents.
///
/// CFB128 operates on whole 16-byte blocks, so the ciphertext is zero-padded
/// up to a block multiple before decryption and the output truncated back to
/// the input length.
pub fn decrypt_toc(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let padded_len = data.len().div_ceil(16) * 16;
    let mut buf = data.to_vec();
    buf.resize(padded_len, 0);

    let decryptor = TocDecryptor::new_from_slices(&TOC_KEY, &TOC_IV)
        .map_err(|_| CryptoError::Failure { stage: "TOC cipher init" })?;
    decryptor.decrypt(&mut buf);

    buf.truncate(data.len());
    Ok(buf)
}

/// Decrypt an SNG payload stream with the wrapper-supplied IV.
///
/// CTR is a stream cipher, so arbitrary lengths pass through unchanged and
/// no finalization step exists.
pub fn decrypt_sng(iv: &[u8; 16], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut cipher = SngCipher::new_from_slices(&SNG_KEY, iv)
        .map_err(|_| CryptoError::Failure { stage: "SNG cipher init" })?;

    let mut buf = data.to_vec();
    cipher.apply_keystream(&mut buf);
    Ok(buf)
}
