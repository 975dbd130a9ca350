use std::io::{Cursor, Read};

use lzma_rust2::LZMAReader;

/// Decode one LZMA-alone chunk, capped at `expected_size` bytes of output.
///
/// Unlike [`crate::zlib::inflate`] there is only a single framing to try.
/// Output is truncated at the expected size even when the embedded stream
/// claims more, matching the bounded-buffer behavior of the reference
/// decoder.
pub fn decode_alone(data: &[u8], expected_size: usize) -> Option<Vec<u8>> {
    if data.is_empty() {
        return None;
    }

    let mut decoder = LZMAReader::new_mem_limit(Cursor::new(data), u32::MAX, None).ok()?;

    let mut out = Vec::with_capacity(expected_size);
    match decoder.by_ref().take(expected_size as u64).read_to_end(&mut out) {
        Ok(_) => Some(out),
        Err(_) => None,
    }
}
