use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;

use aes::Aes256;
use aes::cipher::{AsyncStreamCipher, KeyIvInit};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::archive::Archive;
use crate::error::ArchiveError;
use crate::reader::PsarcReader;

enum MockChunk {
    /// `z_len == 0`: stored as one uncompressed block.
    Stored(Vec<u8>),
    /// Explicit chunk length plus the stored bytes.
    Sized(u16, Vec<u8>),
}

/// Assemble a version-1.4 archive from (uncompressed_size, chunks) pairs.
/// The first file is the names manifest.
fn build_archive(
    tag: &[u8; 4],
    flags: u32,
    block_size: u32,
    files: &[(u64, Vec<MockChunk>)],
) -> Vec<u8> {
    const ENTRY_SIZE: u32 = 30; // 16 md5 + 4 chunk index + 2 * 5-byte fields

    let total_chunks: usize = files.iter().map(|(_, chunks)| chunks.len()).sum();
    let toc_len = 32 + files.len() * ENTRY_SIZE as usize + total_chunks * 2;

    let mut toc = Vec::new();
    let mut z_table: Vec<u16> = Vec::new();
    let mut data = Vec::new();

    for (uncompressed_size, chunks) in files {
        toc.extend_from_slice(&[0u8; 16]); // md5, ignored
        toc.write_u32::<BigEndian>(z_table.len() as u32).unwrap();
        toc.extend_from_slice(&uncompressed_size.to_be_bytes()[3..8]);
        let offset = (toc_len + data.len()) as u64;
        toc.extend_from_slice(&offset.to_be_bytes()[3..8]);

        for chunk in chunks {
            match chunk {
                MockChunk::Stored(bytes) => {
                    z_table.push(0);
                    data.extend_from_slice(bytes);
                }
                MockChunk::Sized(z_len, bytes) => {
                    z_table.push(*z_len);
                    data.extend_from_slice(bytes);
                }
            }
        }
    }

    for z_len in &z_table {
        toc.write_u16::<BigEndian>(*z_len).unwrap();
    }

    if flags & 0x04 != 0 {
        toc = encrypt_toc(&toc);
    }

    let mut out = Vec::new();
    out.write_u32::<BigEndian>(crate::structs::PSARC_MAGIC)
        .unwrap();
    out.write_u16::<BigEndian>(1).unwrap();
    out.write_u16::<BigEndian>(4).unwrap();
    out.extend_from_slice(tag);
    out.write_u32::<BigEndian>(toc_len as u32).unwrap();
    out.write_u32::<BigEndian>(ENTRY_SIZE).unwrap();
    out.write_u32::<BigEndian>(files.len() as u32).unwrap();
    out.write_u32::<BigEndian>(block_size).unwrap();
    out.write_u32::<BigEndian>(flags).unwrap();
    out.extend_from_slice(&toc);
    out.extend_from_slice(&data);
    out
}

fn encrypt_toc(plain: &[u8]) -> Vec<u8> {
    type TocEncryptor = cfb_mode::Encryptor<Aes256>;

    let mut buf = plain.to_vec();
    buf.resize(plain.len().div_ceil(16) * 16, 0);
    let enc = TocEncryptor::new_from_slices(&psarc_secure::TOC_KEY, &psarc_secure::TOC_IV).unwrap();
    enc.encrypt(&mut buf);
    buf.truncate(plain.len());
    buf
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn stored(content: &[u8]) -> (u64, Vec<MockChunk>) {
    (
        content.len() as u64,
        vec![MockChunk::Stored(content.to_vec())],
    )
}

#[test]
fn tiny_archive_lists_and_roundtrips() {
    let data = build_archive(
        b"zlib",
        0,
        65536,
        &[stored(b"file-a.txt\n"), stored(b"hello")],
    );

    let mut psarc = PsarcReader::open(Cursor::new(data)).expect("open failed");
    assert_eq!(psarc.entry_count(), 2);

    let names: Vec<_> = psarc
        .entries()
        .iter()
        .map(|entry| entry.name.clone().unwrap())
        .collect();
    assert_eq!(names, ["NamesBlock.bin", "file-a.txt"]);

    assert_eq!(psarc.extract_by_name("NamesBlock.bin").unwrap(), b"file-a.txt\n");
    assert_eq!(psarc.extract_by_name("file-a.txt").unwrap(), b"hello");
}

#[test]
fn extracted_length_matches_entry_size() {
    let content: Vec<u8> = (0..200u16).map(|i| (i % 251) as u8).collect();
    let data = build_archive(
        b"zlib",
        0,
        65536,
        &[stored(b"blob.bin\n"), stored(&content)],
    );

    let mut psarc = PsarcReader::open(Cursor::new(data)).unwrap();
    for index in 0..psarc.entry_count() {
        let size = psarc.entry(index).unwrap().uncompressed_size as usize;
        assert_eq!(psarc.extract_by_index(index).unwrap().len(), size);
    }
}

#[test]
fn encrypted_toc_matches_plaintext_twin() {
    let files = || vec![stored(b"file-a.txt\n"), stored(b"hello")];

    let plain = build_archive(b"zlib", 0, 65536, &files());
    let encrypted = build_archive(b"zlib", 0x04, 65536, &files());
    assert_ne!(plain, encrypted);

    let mut a = PsarcReader::open(Cursor::new(plain)).unwrap();
    let b = PsarcReader::open(Cursor::new(encrypted)).unwrap();

    let names =
        |reader: &PsarcReader<Cursor<Vec<u8>>>| -> Vec<Option<String>> {
            reader.entries().iter().map(|e| e.name.clone()).collect()
        };
    assert_eq!(names(&a), names(&b));
    assert_eq!(a.extract_by_name("file-a.txt").unwrap(), b"hello");
}

#[test]
fn invalid_zlib_chunk_passes_through_raw() {
    // Seven bytes that are not a valid stream under any framing.
    let junk = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
    let data = build_archive(
        b"zlib",
        0,
        65536,
        &[
            stored(b"raw.bin\n"),
            (7, vec![MockChunk::Sized(7, junk.to_vec())]),
        ],
    );

    let mut psarc = PsarcReader::open(Cursor::new(data)).unwrap();
    assert_eq!(psarc.extract_by_name("raw.bin").unwrap(), junk);
}

#[test]
fn multi_chunk_zlib_entry_reassembles() {
    // Three blocks at a deliberately tiny block size.
    let block_size = 16usize;
    let content: Vec<u8> = (0..40u8).collect();

    let chunks: Vec<MockChunk> = content
        .chunks(block_size)
        .map(|block| {
            let compressed = zlib(block);
            MockChunk::Sized(compressed.len() as u16, compressed)
        })
        .collect();

    let data = build_archive(
        b"zlib",
        0,
        block_size as u32,
        &[stored(b"big.bin\n"), (content.len() as u64, chunks)],
    );

    let mut psarc = PsarcReader::open(Cursor::new(data)).unwrap();
    assert_eq!(psarc.extract_by_name("big.bin").unwrap(), content);
}

#[test]
fn rejects_wrong_magic() {
    let mut data = build_archive(b"zlib", 0, 65536, &[stored(b"x\n")]);
    data[0] = b'Q';
    assert!(matches!(
        PsarcReader::open(Cursor::new(data)),
        Err(ArchiveError::InvalidMagic)
    ));
}

#[test]
fn rejects_unsupported_version() {
    let mut data = build_archive(b"zlib", 0, 65536, &[stored(b"x\n")]);
    data[5] = 2; // major version 1 -> 0x0102
    match PsarcReader::open(Cursor::new(data)) {
        Err(ArchiveError::UnsupportedVersion { minor: 4, .. }) => {}
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }
}

#[test]
fn rejects_invalid_toc_entry_size() {
    let mut data = build_archive(b"zlib", 0, 65536, &[stored(b"x\n")]);
    // toc_entry_size lives at offset 16..20; 21 gives a fractional width.
    data[16..20].copy_from_slice(&21u32.to_be_bytes());
    assert!(matches!(
        PsarcReader::open(Cursor::new(data)),
        Err(ArchiveError::InvalidTocEntrySize { size: 21 })
    ));
}

#[test]
fn rejects_chunk_index_out_of_range() {
    // The entry claims one byte but owns no chunks at all.
    let data = build_archive(b"zlib", 0, 65536, &[(1, Vec::new())]);
    assert!(matches!(
        PsarcReader::open(Cursor::new(data)),
        Err(ArchiveError::ChunkIndexOutOfRange)
    ));
}

// --- SNG auto-unwrap --------------------------------------------------

/// Minimal instrumental SNG plaintext: every section empty plus a default
/// metadata block.
fn minimal_sng_plaintext() -> Vec<u8> {
    let mut buf = Vec::new();
    for _ in 0..14 {
        buf.write_i32::<LittleEndian>(0).unwrap();
    }
    for _ in 0..4 {
        buf.write_f64::<LittleEndian>(0.0).unwrap();
    }
    buf.write_f32::<LittleEndian>(2.0).unwrap(); // first beat length
    buf.write_f32::<LittleEndian>(5.0).unwrap(); // start time
    buf.push(0); // capo
    buf.extend_from_slice(&[0u8; 32]); // conversion date
    buf.write_i16::<LittleEndian>(1).unwrap(); // part
    buf.write_f32::<LittleEndian>(120.0).unwrap(); // song length
    buf.write_i32::<LittleEndian>(0).unwrap(); // tuning count
    buf.write_f32::<LittleEndian>(0.0).unwrap();
    buf.write_f32::<LittleEndian>(0.0).unwrap();
    buf.write_i32::<LittleEndian>(0).unwrap(); // max difficulty
    buf
}

fn wrap_sng(plaintext: &[u8]) -> Vec<u8> {
    let iv = [0x5Au8; 16];
    let ciphertext = psarc_secure::decrypt_sng(&iv, plaintext).unwrap();

    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(0x4A).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap(); // uncompressed payload
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    out
}

#[test]
fn sng_entries_are_unwrapped_on_extract() {
    let plaintext = minimal_sng_plaintext();
    let wrapped = wrap_sng(&plaintext);

    let data = build_archive(
        b"zlib",
        0,
        65536,
        &[stored(b"songs/bin/generic/tiny.sng\n"), stored(&wrapped)],
    );

    let mut psarc = PsarcReader::open(Cursor::new(data)).unwrap();
    let extracted = psarc
        .extract_by_name("songs/bin/generic/tiny.sng")
        .unwrap();
    assert_eq!(extracted, plaintext);
    assert!(psarc_sng::parse(&extracted).is_ok());
}

// --- facade -----------------------------------------------------------

fn temp_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("psarc-archive-test-{}-{tag}", std::process::id()))
}

fn write_temp_archive(tag: &str, bytes: &[u8]) -> PathBuf {
    let path = temp_path(tag).with_extension("psarc");
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn archive_open_is_idempotent() {
    let path = write_temp_archive(
        "idempotent",
        &build_archive(b"zlib", 0, 65536, &[stored(b"a.txt\n"), stored(b"A")]),
    );

    let mut archive = Archive::new(&path);
    assert!(!archive.is_open());
    archive.open().unwrap();
    archive.open().unwrap();
    assert!(archive.is_open());
    assert_eq!(archive.file_count(), 2);
    assert_eq!(archive.file_list(), ["NamesBlock.bin", "a.txt"]);
    assert!(archive.file_exists("a.txt"));
    assert!(!archive.file_exists("b.txt"));

    archive.close();
    archive.close();
    assert!(!archive.is_open());
    assert_eq!(archive.file_count(), 0);

    fs::remove_file(path).unwrap();
}

#[test]
fn archive_requires_open() {
    let mut archive = Archive::new("/nonexistent/nothing.psarc");
    assert!(matches!(
        archive.extract_file("x"),
        Err(ArchiveError::NotOpen)
    ));
    assert!(matches!(archive.open(), Err(ArchiveError::OpenFailed { .. })));
}

#[test]
fn extract_file_reports_unknown_names() {
    let path = write_temp_archive(
        "unknown-name",
        &build_archive(b"zlib", 0, 65536, &[stored(b"a.txt\n"), stored(b"A")]),
    );

    let mut archive = Archive::new(&path);
    archive.open().unwrap();
    assert!(matches!(
        archive.extract_file("missing.txt"),
        Err(ArchiveError::EntryNotFound { .. })
    ));

    fs::remove_file(path).unwrap();
}

#[test]
fn extract_all_writes_every_named_entry() {
    let path = write_temp_archive(
        "extract-all",
        &build_archive(
            b"zlib",
            0,
            65536,
            &[
                stored(b"dir/a.txt\ndir/sub/b.txt\n"),
                stored(b"alpha"),
                stored(b"beta"),
            ],
        ),
    );
    let out_dir = temp_path("extract-all-out");

    let mut archive = Archive::new(&path);
    archive.open().unwrap();
    archive.extract_all(&out_dir).unwrap();

    assert_eq!(fs::read(out_dir.join("dir/a.txt")).unwrap(), b"alpha");
    assert_eq!(fs::read(out_dir.join("dir/sub/b.txt")).unwrap(), b"beta");
    assert!(out_dir.join("NamesBlock.bin").exists());

    fs::remove_file(path).unwrap();
    fs::remove_dir_all(out_dir).unwrap();
}

#[test]
fn extract_all_aggregates_per_entry_failures() {
    // Second entry claims bytes it has no chunks for; the first and third
    // still extract.
    let path = write_temp_archive(
        "partial",
        &build_archive(
            b"zlib",
            0,
            65536,
            &[
                stored(b"ok.txt\nbroken.bin\n"),
                stored(b"fine"),
                (4, Vec::new()),
            ],
        ),
    );
    let out_dir = temp_path("partial-out");

    let mut archive = Archive::new(&path);
    archive.open().unwrap();

    match archive.extract_all(&out_dir) {
        Err(ArchiveError::PartialExtraction { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].name, "broken.bin");
            assert!(matches!(
                failures[0].error,
                ArchiveError::ChunkIndexOutOfRange
            ));
        }
        other => panic!("expected PartialExtraction, got {other:?}"),
    }
    assert_eq!(fs::read(out_dir.join("ok.txt")).unwrap(), b"fine");

    fs::remove_file(path).unwrap();
    fs::remove_dir_all(out_dir).unwrap();
}

#[test]
fn convert_sng_emits_xml_with_manifest_overlay() {
    let names = b"songs/bin/generic/tiny.sng\nmanifests/songs_dlc_tiny/tiny.json\n";
    let wrapped = wrap_sng(&minimal_sng_plaintext());
    let manifest = br#"{"Entries":{"k":{"Attributes":{"SongName":"Tiny Song"}}}}"#;

    let path = write_temp_archive(
        "convert-sng",
        &build_archive(
            b"zlib",
            0,
            65536,
            &[stored(names), stored(&wrapped), stored(manifest)],
        ),
    );
    let out_dir = temp_path("convert-sng-out");

    let mut archive = Archive::new(&path);
    archive.open().unwrap();
    archive.convert_sng(&out_dir).unwrap();

    let xml = fs::read_to_string(out_dir.join("songs/arr/tiny.xml")).unwrap();
    assert!(xml.contains("<song version=\"8\">"));
    assert!(xml.contains("<title>Tiny Song</title>"));
    assert!(xml.contains("<offset>-5.000</offset>"));

    fs::remove_file(path).unwrap();
    fs::remove_dir_all(out_dir).unwrap();
}

#[test]
fn convert_audio_delegates_to_the_collaborator() {
    struct UpperCaser;
    impl crate::archive::AudioConverter for UpperCaser {
        fn convert(&self, _name: &str, data: &[u8]) -> std::io::Result<Vec<u8>> {
            Ok(data.to_ascii_uppercase())
        }
    }

    let path = write_temp_archive(
        "convert-audio",
        &build_archive(
            b"zlib",
            0,
            65536,
            &[stored(b"audio/song.wem\nnotes.txt\n"), stored(b"wem-bytes"), stored(b"ignored")],
        ),
    );
    let out_dir = temp_path("convert-audio-out");

    let mut archive = Archive::new(&path);
    archive.open().unwrap();
    archive.convert_audio(&out_dir, &UpperCaser).unwrap();

    assert_eq!(
        fs::read(out_dir.join("audio/song.ogg")).unwrap(),
        b"WEM-BYTES"
    );
    assert!(!out_dir.join("notes.ogg").exists());

    fs::remove_file(path).unwrap();
    fs::remove_dir_all(out_dir).unwrap();
}
