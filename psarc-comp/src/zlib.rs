use std::io::Read;

use flate2::read::GzDecoder;
use flate2::{Decompress, FlushDecompress, Status};

/// Inflate one chunk, expecting at most `expected_size` bytes of output.
///
/// Archives in the wild disagree on how chunk streams are framed, so three
/// variants are tried in order: a standard zlib stream, a raw deflate
/// stream, and a gzip stream. The first variant that drives the stream to
/// its end within `expected_size` bytes wins. A chunk may legitimately
/// inflate to fewer bytes than expected (the final block of an entry), in
/// which case the shorter output is returned as-is.
pub fn inflate(data: &[u8], expected_size: usize) -> Option<Vec<u8>> {
    if data.is_empty() {
        return None;
    }

    for zlib_header in [true, false] {
        if let Some(out) = inflate_deflate(data, expected_size, zlib_header) {
            return Some(out);
        }
    }
    inflate_gzip(data, expected_size)
}

fn inflate_deflate(data: &[u8], expected_size: usize, zlib_header: bool) -> Option<Vec<u8>> {
    let mut decompress = Decompress::new(zlib_header);
    let mut out = Vec::with_capacity(expected_size);

    match decompress.decompress_vec(data, &mut out, FlushDecompress::Finish) {
        Ok(Status::StreamEnd) => Some(out),
        _ => None,
    }
}

fn inflate_gzip(data: &[u8], expected_size: usize) -> Option<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::with_capacity(expected_size);

    if decoder
        .by_ref()
        .take(expected_size as u64)
        .read_to_end(&mut out)
        .is_err()
    {
        return None;
    }

    // The stream must have ended within the expected output size.
    let mut probe = [0u8; 1];
    match decoder.read(&mut probe) {
        Ok(0) => Some(out),
        _ => None,
    }
}
