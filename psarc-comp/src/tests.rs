use std::io::Write;

use flate2::Compression;
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use lzma_rust2::{EncodeMode, LZMA2Options, LZMAWriter, MFType};

use crate::{lzma, zlib};

fn zlib_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn inflate_standard_zlib() {
    let plain = b"chunk payload with a zlib header";
    let compressed = zlib_compress(plain);

    let out = zlib::inflate(&compressed, plain.len()).expect("inflate failed");
    assert_eq!(out, plain);
}

#[test]
fn inflate_raw_deflate() {
    let plain = b"raw deflate stream without any framing";
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(plain).unwrap();
    let compressed = encoder.finish().unwrap();

    let out = zlib::inflate(&compressed, plain.len()).expect("inflate failed");
    assert_eq!(out, plain);
}

#[test]
fn inflate_gzip() {
    let plain = b"gzip framed stream";
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(plain).unwrap();
    let compressed = encoder.finish().unwrap();

    let out = zlib::inflate(&compressed, plain.len()).expect("inflate failed");
    assert_eq!(out, plain);
}

#[test]
fn inflate_rejects_garbage() {
    assert!(zlib::inflate(&[0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03], 64).is_none());
    assert!(zlib::inflate(&[], 64).is_none());
}

#[test]
fn inflate_rejects_oversized_output() {
    // Valid stream, but it inflates past the expected block size.
    let plain = vec![7u8; 256];
    let compressed = zlib_compress(&plain);
    assert!(zlib::inflate(&compressed, 64).is_none());
}

#[test]
fn inflate_allows_short_output() {
    // The final block of an entry is usually shorter than the block size.
    let plain = b"short tail";
    let compressed = zlib_compress(plain);

    let out = zlib::inflate(&compressed, 65536).expect("inflate failed");
    assert_eq!(out, plain);
}

fn lzma_compress(data: &[u8]) -> Vec<u8> {
    let options = LZMA2Options {
        dict_size: 65536,
        lc: 3,
        lp: 0,
        pb: 2,
        mode: EncodeMode::Normal,
        mf: MFType::BT4,
        nice_len: 64,
        depth_limit: 0,
        preset_dict: None,
    };

    let mut out = Vec::new();
    let mut encoder =
        LZMAWriter::new_use_header(&mut out, &options, Some(data.len() as u64)).unwrap();
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap();
    out
}

#[test]
fn lzma_alone_roundtrip() {
    let plain = b"an lzma-alone chunk with its standard 13-byte header";
    let compressed = lzma_compress(plain);

    let out = lzma::decode_alone(&compressed, plain.len()).expect("decode failed");
    assert_eq!(out, plain);
}

#[test]
fn lzma_rejects_garbage() {
    assert!(lzma::decode_alone(&[0xFF; 4], 64).is_none());
    assert!(lzma::decode_alone(&[], 64).is_none());
}

#[test]
fn lzma_caps_output_at_expected_size() {
    let plain = vec![3u8; 512];
    let compressed = lzma_compress(&plain);

    let out = lzma::decode_alone(&compressed, 128).expect("decode failed");
    assert_eq!(out.len(), 128);
    assert_eq!(out, vec![3u8; 128]);
}
