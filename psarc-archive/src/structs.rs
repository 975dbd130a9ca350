use binrw::BinRead;
use enumflags2::bitflags;

/// `'P' 'S' 'A' 'R'` in big-endian order.
pub const PSARC_MAGIC: u32 = 0x5053_4152;

/// Fixed 32-byte archive header (magic excluded, read separately).
#[derive(BinRead, Debug, Clone)]
#[br(big)]
pub struct PsarcHeader {
    pub version_major: u16,
    pub version_minor: u16,
    pub compression_method: [u8; 4],
    pub toc_length: u32,
    pub toc_entry_size: u32,
    pub file_count: u32,
    pub block_size: u32,
    pub archive_flags: u32,
}

impl PsarcHeader {
    pub fn compression(&self) -> CompressionMethod {
        CompressionMethod::from_tag(self.compression_method)
    }
}

/// Per-chunk compression scheme named by the header's four-byte tag.
///
/// Unknown tags are preserved; extraction then probes zlib first and LZMA
/// second per chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Zlib,
    Lzma,
    Unknown([u8; 4]),
}

impl CompressionMethod {
    pub fn from_tag(tag: [u8; 4]) -> Self {
        match &tag {
            b"zlib" => Self::Zlib,
            b"lzma" => Self::Lzma,
            _ => Self::Unknown(tag),
        }
    }
}

#[bitflags]
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArchiveFlags {
    IgnoreCase = 0x01,
    AbsolutePaths = 0x02,
    EncryptedToc = 0x04,
}

/// One logical entry of the archive.
///
/// `name` stays `None` when the names manifest is shorter than the entry
/// table; such entries cannot be addressed by name but still extract by
/// index.
#[derive(Debug, Clone, Default)]
pub struct FileEntry {
    pub name: Option<String>,
    pub offset: u64,
    pub uncompressed_size: u64,
    pub start_chunk_index: u32,
}

impl FileEntry {
    /// Rocksmith stores playable arrangements under this path shape; these
    /// entries carry the extra SNG encryption wrapper.
    pub fn is_sng(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.contains("songs/bin/generic/") && name.ends_with(".sng"))
    }
}
