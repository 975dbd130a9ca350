use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use binrw::BinReaderExt;
use byteorder::{BigEndian, ReadBytesExt};
use enumflags2::BitFlags;
use tracing::debug;

use crate::error::ArchiveError;
use crate::structs::{ArchiveFlags, CompressionMethod, FileEntry, PSARC_MAGIC, PsarcHeader};

#[derive(Debug)]
pub struct PsarcReader<R: Read + Seek> {
    /// The underlying reader.
    ///
    /// Extraction seeks and reads through it, so every extract call needs
    /// exclusive access.
    inner: R,

    /// The parsed fixed header.
    header: PsarcHeader,

    /// Compression scheme resolved from the header tag.
    compression: CompressionMethod,

    /// Archive flag bits.
    flags: BitFlags<ArchiveFlags>,

    /// Every entry of the archive in TOC order. Entry 0 is the names
    /// manifest, surfaced under the synthetic name `NamesBlock.bin`.
    entries: Vec<FileEntry>,

    /// Trailing chunk-length table. A zero length denotes an uncompressed
    /// full block of `block_size` bytes.
    z_lengths: Vec<u16>,

    /// Name to entry-index lookup for the named entries.
    name_map: HashMap<String, usize>,
}

impl<R: Read + Seek> PsarcReader<R> {
    /// Open an archive: parse the header, the table of contents, the
    /// chunk-length table, and the names manifest.
    pub fn open(mut reader: R) -> Result<Self, ArchiveError> {
        reader.rewind().map_err(ArchiveError::ShortRead)?;

        let magic = reader
            .read_u32::<BigEndian>()
            .map_err(ArchiveError::ShortRead)?;
        if magic != PSARC_MAGIC {
            return Err(ArchiveError::InvalidMagic);
        }

        let header: PsarcHeader = reader.read_be().map_err(|_| ArchiveError::TruncatedToc)?;

        if header.version_major != 1 || header.version_minor != 4 {
            return Err(ArchiveError::UnsupportedVersion {
                major: header.version_major,
                minor: header.version_minor,
            });
        }

        let flags = BitFlags::<ArchiveFlags>::from_bits_truncate(header.archive_flags);
        let compression = header.compression();

        // The header's TOC length covers the 32 header bytes as well.
        let toc_size = (header.toc_length as usize)
            .checked_sub(32)
            .ok_or(ArchiveError::TruncatedToc)?;
        let mut toc_data = vec![0u8; toc_size];
        reader
            .read_exact(&mut toc_data)
            .map_err(|_| ArchiveError::TruncatedToc)?;

        if flags.contains(ArchiveFlags::EncryptedToc) {
            toc_data = psarc_secure::decrypt_toc(&toc_data)?;
        }

        let (entries, z_lengths) = parse_toc(&toc_data, &header)?;

        let mut psarc = Self {
            inner: reader,
            header,
            compression,
            flags,
            entries,
            z_lengths,
            name_map: HashMap::new(),
        };
        psarc.read_names()?;
        Ok(psarc)
    }

    pub fn header(&self) -> &PsarcHeader {
        &self.header
    }

    pub fn flags(&self) -> BitFlags<ArchiveFlags> {
        self.flags
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    pub fn entry_index(&self, name: &str) -> Option<usize> {
        self.name_map.get(name).copied()
    }

    /// Entry 0 names the rest of the archive: one path per line, trimmed.
    /// A short manifest leaves later entries unnamed; surplus lines are
    /// ignored.
    fn read_names(&mut self) -> Result<(), ArchiveError> {
        if self.entries.is_empty() {
            return Ok(());
        }

        let manifest = self.extract_by_index(0)?;
        let names: Vec<String> = String::from_utf8_lossy(&manifest)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();

        self.entries[0].name = Some("NamesBlock.bin".to_owned());
        self.name_map.insert("NamesBlock.bin".to_owned(), 0);

        for (index, name) in names.into_iter().enumerate() {
            let Some(entry) = self.entries.get_mut(index + 1) else {
                break;
            };
            entry.name = Some(name.clone());
            self.name_map.insert(name, index + 1);
        }
        Ok(())
    }

    /// Reassemble one entry from its chunks.
    ///
    /// Chunks that fail to decompress are passed through raw; some archives
    /// store chunks uncompressed without zeroing their length field.
    /// Entries on the Rocksmith SNG path are unwrapped before returning.
    pub fn extract_by_index(&mut self, index: usize) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .entries
            .get(index)
            .ok_or(ArchiveError::InvalidEntryIndex { index })?
            .clone();

        if entry.uncompressed_size == 0 {
            return Ok(Vec::new());
        }

        let needed = entry.uncompressed_size as usize;
        let block_size = self.header.block_size as usize;

        let mut result = Vec::with_capacity(needed);
        self.inner
            .seek(SeekFrom::Start(entry.offset))
            .map_err(ArchiveError::ShortRead)?;

        let mut chunk_index = entry.start_chunk_index as usize;
        while result.len() < needed {
            if chunk_index >= self.z_lengths.len() {
                return Err(ArchiveError::ChunkIndexOutOfRange);
            }
            let z_len = self.z_lengths[chunk_index];
            chunk_index += 1;

            if z_len == 0 {
                // Uncompressed full block; the final block of the file may
                // come up short.
                let mut block = vec![0u8; block_size];
                let read = read_up_to(&mut self.inner, &mut block)?;
                block.truncate(read);
                result.extend_from_slice(&block);
                continue;
            }

            let mut chunk = vec![0u8; z_len as usize];
            self.inner
                .read_exact(&mut chunk)
                .map_err(ArchiveError::ShortRead)?;

            let expected = (needed - result.len()).min(block_size);
            let decompressed = match self.compression {
                CompressionMethod::Zlib => psarc_comp::zlib::inflate(&chunk, expected),
                CompressionMethod::Lzma => psarc_comp::lzma::decode_alone(&chunk, expected),
                CompressionMethod::Unknown(_) => psarc_comp::zlib::inflate(&chunk, expected)
                    .or_else(|| psarc_comp::lzma::decode_alone(&chunk, expected)),
            };

            match decompressed {
                Some(data) => result.extend_from_slice(&data),
                None => {
                    // Stored raw despite the nonzero length field.
                    debug!(chunk = chunk_index - 1, len = z_len, "raw chunk fallback");
                    result.extend_from_slice(&chunk);
                }
            }
        }

        result.truncate(needed);

        if entry.is_sng() {
            return Ok(psarc_sng::decode(&result)?);
        }
        Ok(result)
    }

    pub fn extract_by_name(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let index = self
            .entry_index(name)
            .ok_or_else(|| ArchiveError::EntryNotFound {
                name: name.to_owned(),
            })?;
        self.extract_by_index(index)
    }
}

/// Read as many bytes as the source still has, up to `buf.len()`.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, ArchiveError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ArchiveError::ShortRead(e)),
        }
    }
    Ok(filled)
}

fn parse_toc(
    toc_data: &[u8],
    header: &PsarcHeader,
) -> Result<(Vec<FileEntry>, Vec<u16>), ArchiveError> {
    // Length and offset share an archive-wide field width derived from the
    // entry size: 16 bytes of MD5, 4 bytes of chunk index, then two
    // equal-width big-endian integers.
    let field_bytes = header.toc_entry_size.wrapping_sub(20);
    if field_bytes % 2 != 0 {
        return Err(ArchiveError::InvalidTocEntrySize {
            size: header.toc_entry_size,
        });
    }
    let width = (field_bytes / 2) as usize;
    if !(1..=8).contains(&width) {
        return Err(ArchiveError::InvalidTocEntrySize {
            size: header.toc_entry_size,
        });
    }

    let mut entries = Vec::with_capacity(header.file_count as usize);
    let mut pos = 0usize;

    for _ in 0..header.file_count {
        // The digest is not verified; skip it.
        pos += 16;

        if pos + 4 + width * 2 > toc_data.len() {
            return Err(ArchiveError::TruncatedToc);
        }

        let start_chunk_index = u32::from_be_bytes([
            toc_data[pos],
            toc_data[pos + 1],
            toc_data[pos + 2],
            toc_data[pos + 3],
        ]);
        pos += 4;

        let mut uncompressed_size = 0u64;
        for _ in 0..width {
            uncompressed_size = (uncompressed_size << 8) | u64::from(toc_data[pos]);
            pos += 1;
        }
        let mut offset = 0u64;
        for _ in 0..width {
            offset = (offset << 8) | u64::from(toc_data[pos]);
            pos += 1;
        }

        entries.push(FileEntry {
            name: None,
            offset,
            uncompressed_size,
            start_chunk_index,
        });
    }

    let mut z_lengths = Vec::new();
    while pos + 2 <= toc_data.len() {
        z_lengths.push(u16::from_be_bytes([toc_data[pos], toc_data[pos + 1]]));
        pos += 2;
    }

    Ok((entries, z_lengths))
}
