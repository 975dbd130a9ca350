use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ArchiveError, EntryFailure};
use crate::reader::PsarcReader;
use crate::structs::FileEntry;

/// External collaborator that turns Wwise audio bytes (`.wem` / `.bnk`)
/// into OGG. The core only defines the seam; the CLI supplies an
/// implementation backed by a separate tool.
pub trait AudioConverter {
    fn convert(&self, entry_name: &str, data: &[u8]) -> io::Result<Vec<u8>>;
}

/// Path-owning facade over [`PsarcReader`].
///
/// `open` is idempotent and parses all tables eagerly; `close` drops the
/// file handle and tables and also runs on drop. Entry bytes are produced
/// per call and owned by the caller.
pub struct Archive {
    path: PathBuf,
    reader: Option<PsarcReader<File>>,
}

impl Archive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: None,
        }
    }

    pub fn open(&mut self) -> Result<(), ArchiveError> {
        if self.reader.is_some() {
            return Ok(());
        }

        let file = File::open(&self.path).map_err(|source| ArchiveError::OpenFailed {
            path: self.path.clone(),
            source,
        })?;
        self.reader = Some(PsarcReader::open(file)?);
        debug!(path = %self.path.display(), "archive opened");
        Ok(())
    }

    pub fn close(&mut self) {
        self.reader = None;
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(&self) -> Result<&PsarcReader<File>, ArchiveError> {
        self.reader.as_ref().ok_or(ArchiveError::NotOpen)
    }

    fn reader_mut(&mut self) -> Result<&mut PsarcReader<File>, ArchiveError> {
        self.reader.as_mut().ok_or(ArchiveError::NotOpen)
    }

    pub fn file_count(&self) -> usize {
        self.reader.as_ref().map_or(0, PsarcReader::entry_count)
    }

    /// Names of all addressable entries, in TOC order.
    pub fn file_list(&self) -> Vec<String> {
        self.reader.as_ref().map_or_else(Vec::new, |reader| {
            reader
                .entries()
                .iter()
                .filter_map(|entry| entry.name.clone())
                .collect()
        })
    }

    pub fn file_exists(&self, name: &str) -> bool {
        self.reader
            .as_ref()
            .is_some_and(|reader| reader.entry_index(name).is_some())
    }

    pub fn entry(&self, index: usize) -> Option<&FileEntry> {
        self.reader.as_ref().and_then(|reader| reader.entry(index))
    }

    pub fn entry_by_name(&self, name: &str) -> Option<&FileEntry> {
        let reader = self.reader.as_ref()?;
        reader.entry(reader.entry_index(name)?)
    }

    pub fn extract_file(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        self.reader_mut()?.extract_by_name(name)
    }

    pub fn extract_file_to(&mut self, name: &str, out_path: &Path) -> Result<(), ArchiveError> {
        let data = self.extract_file(name)?;
        write_output(out_path, &data)
    }

    /// Extract every named entry under `dir`, creating parent directories.
    ///
    /// Individual failures do not stop the walk; they are collected and
    /// surfaced once at the end.
    pub fn extract_all(&mut self, dir: &Path) -> Result<(), ArchiveError> {
        self.reader()?;
        fs::create_dir_all(dir).map_err(|source| ArchiveError::WriteFailed {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut failures = Vec::new();
        for index in 0..self.file_count() {
            let Some(name) = self.entry(index).and_then(|entry| entry.name.clone()) else {
                continue;
            };

            let result = (|| -> Result<(), ArchiveError> {
                let data = self.reader_mut()?.extract_by_index(index)?;
                write_output(&dir.join(&name), &data)
            })();

            if let Err(error) = result {
                warn!(entry = %name, %error, "extraction failed");
                failures.push(EntryFailure { name, error });
            }
        }

        finish_batch(failures)
    }

    /// Convert every SNG arrangement in the archive to XML under
    /// `dir/songs/arr/`, overlaying metadata from a matching JSON manifest
    /// when one exists. Failures aggregate like [`Archive::extract_all`].
    pub fn convert_sng(&mut self, dir: &Path) -> Result<(), ArchiveError> {
        let reader = self.reader()?;

        let sng_indices: Vec<usize> = (0..reader.entry_count())
            .filter(|&index| reader.entry(index).is_some_and(FileEntry::is_sng))
            .collect();
        let manifest_indices: Vec<usize> = (0..reader.entry_count())
            .filter(|&index| {
                reader.entry(index).is_some_and(|entry| {
                    entry
                        .name
                        .as_deref()
                        .is_some_and(is_likely_manifest)
                })
            })
            .collect();

        let mut failures = Vec::new();
        for index in sng_indices {
            let name = self
                .entry(index)
                .and_then(|entry| entry.name.clone())
                .unwrap_or_default();

            let result = self.convert_one_sng(index, &name, &manifest_indices, dir);
            if let Err(error) = result {
                warn!(entry = %name, %error, "SNG conversion failed");
                failures.push(EntryFailure { name, error });
            }
        }

        finish_batch(failures)
    }

    fn convert_one_sng(
        &mut self,
        index: usize,
        name: &str,
        manifest_indices: &[usize],
        dir: &Path,
    ) -> Result<(), ArchiveError> {
        // extract_by_index already unwrapped the SNG layer.
        let data = self.reader_mut()?.extract_by_index(index)?;
        let song = psarc_sng::parse(&data)?;

        let stem = path_stem(name).to_lowercase();

        // Prefer a manifest whose stem matches exactly; fall back to any
        // manifest path containing the stem.
        let mut matched = manifest_indices.iter().copied().find(|&mi| {
            self.entry(mi)
                .and_then(|entry| entry.name.as_deref())
                .is_some_and(|json| path_stem(json).to_lowercase() == stem)
        });
        if matched.is_none() {
            matched = manifest_indices.iter().copied().find(|&mi| {
                self.entry(mi)
                    .and_then(|entry| entry.name.as_deref())
                    .is_some_and(|json| json.to_lowercase().contains(&stem))
            });
        }

        let manifest = match matched {
            Some(mi) => {
                let json = self.reader_mut()?.extract_by_index(mi)?;
                psarc_sng::SongManifest::from_json(&String::from_utf8_lossy(&json))
            }
            None => None,
        };

        let xml = psarc_sng::xml::render(&song, manifest.as_ref());
        let out_path = dir
            .join("songs")
            .join("arr")
            .join(format!("{}.xml", path_stem(name)));
        write_output(&out_path, xml.as_bytes())
    }

    /// Hand every `.wem` / `.bnk` entry to the external audio tool and
    /// write the OGG it returns. Failures aggregate like
    /// [`Archive::extract_all`].
    pub fn convert_audio(
        &mut self,
        dir: &Path,
        converter: &dyn AudioConverter,
    ) -> Result<(), ArchiveError> {
        let reader = self.reader()?;

        let audio_indices: Vec<usize> = (0..reader.entry_count())
            .filter(|&index| {
                reader.entry(index).is_some_and(|entry| {
                    entry
                        .name
                        .as_deref()
                        .is_some_and(|name| name.ends_with(".wem") || name.ends_with(".bnk"))
                })
            })
            .collect();

        let mut failures = Vec::new();
        for index in audio_indices {
            let name = self
                .entry(index)
                .and_then(|entry| entry.name.clone())
                .unwrap_or_default();

            let result = (|| -> Result<(), ArchiveError> {
                let data = self.reader_mut()?.extract_by_index(index)?;
                let ogg = converter.convert(&name, &data).map_err(|source| {
                    ArchiveError::AudioConversion {
                        name: name.clone(),
                        source,
                    }
                })?;

                let relative = Path::new(&name);
                let parent = relative.parent().unwrap_or_else(|| Path::new(""));
                let out_path = dir
                    .join(parent)
                    .join(format!("{}.ogg", path_stem(&name)));
                write_output(&out_path, &ogg)
            })();

            if let Err(error) = result {
                warn!(entry = %name, %error, "audio conversion failed");
                failures.push(EntryFailure { name, error });
            }
        }

        finish_batch(failures)
    }
}

fn is_likely_manifest(name: &str) -> bool {
    name.ends_with(".json") && name.contains("songs_dlc_")
}

fn path_stem(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}

fn write_output(path: &Path, data: &[u8]) -> Result<(), ArchiveError> {
    let failed = |source| ArchiveError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(failed)?;
    }
    fs::write(path, data).map_err(failed)
}

fn finish_batch(failures: Vec<EntryFailure>) -> Result<(), ArchiveError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ArchiveError::PartialExtraction { failures })
    }
}
