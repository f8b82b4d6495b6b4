use crate::io::{write_read, Record};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The file extension used for every output group
pub const GROUP_EXTENSION: &str = "fastq";

/// Returns the path at which the output group `name` is stored inside `dir`.
pub fn group_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{GROUP_EXTENSION}"))
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error(
        "output group {path} already contains data from a previous run
suggestion: choose an empty output directory, or pass --force to overwrite it"
    )]
    NotFresh { path: String },

    #[error(
        "input {path} is also an output group of this run
suggestion: move the input out of the output directory, or choose another output directory"
    )]
    InputIsOutput { path: String },
}

/// A set of append-only FASTQ outputs inside a single directory.
///
/// Each group holds one open, buffered handle for as long as the `OutputGroups` lives. Handles
/// are flushed by `finish`; if a run is aborted they are released (and flushed on a best-effort
/// basis) when the value is dropped.
pub struct OutputGroups {
    dir: PathBuf,
    overwrite: bool,
    writers: IndexMap<String, BufWriter<File>>,
}

impl OutputGroups {
    /// Prepares the output directory, creating it if absent.
    ///
    /// If `overwrite` is false, opening a group whose file already has content is an error.
    /// Otherwise such files are truncated.
    pub fn new(dir: &str, overwrite: bool) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Unable to create output directory {dir}"))?;

        Ok(Self {
            dir: PathBuf::from(dir),
            overwrite,
            writers: IndexMap::new(),
        })
    }

    /// Checks the group files already present in the output directory before anything is
    /// written. `is_group` decides from a file stem whether a `.fastq` file is one of this run's
    /// groups.
    ///
    /// An input which is one of those files is always an error, as it would be truncated while
    /// being read. Otherwise a group file with content is an error, or is truncated if
    /// `overwrite` is set.
    pub fn claim_existing(
        &self,
        inputs: &[String],
        is_group: impl Fn(&str) -> bool,
    ) -> Result<()> {
        let inputs = inputs
            .iter()
            .map(|input| {
                std::fs::canonicalize(input).with_context(|| format!("Unable to resolve {input}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Unable to list {}", self.dir.display()))?;

        let mut existing = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("Unable to list {}", self.dir.display()))?
                .path();

            if !path.is_file() || path.extension() != Some(OsStr::new(GROUP_EXTENSION)) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
                continue;
            };
            if !is_group(stem) {
                continue;
            }

            let canonical = std::fs::canonicalize(&path)
                .with_context(|| format!("Unable to resolve {}", path.display()))?;
            if inputs.contains(&canonical) {
                return Err(OutputError::InputIsOutput {
                    path: path.display().to_string(),
                }
                .into());
            }
            existing.push(path);
        }

        for path in existing {
            let len = std::fs::metadata(&path)
                .with_context(|| format!("Unable to read {}", path.display()))?
                .len();
            if len == 0 {
                continue;
            }
            if !self.overwrite {
                return Err(OutputError::NotFresh {
                    path: path.display().to_string(),
                }
                .into());
            }

            warn!("Overwriting {}", path.display());
            File::create(&path)
                .with_context(|| format!("Unable to truncate {}", path.display()))?;
        }

        Ok(())
    }

    /// Opens every named group up front, so that a non-fresh location is detected before any
    /// record is written.
    pub fn open_all<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            self.writer(name)?;
        }
        Ok(())
    }

    /// Appends a record to the group `name`, opening the group on first use.
    pub fn append(&mut self, name: &str, record: &Record) -> Result<()> {
        write_read(self.writer(name)?, record).with_context(|| {
            format!("Unable to write to {}", group_path(&self.dir, name).display())
        })
    }

    /// Flushes and closes every group.
    pub fn finish(mut self) -> Result<()> {
        for (name, writer) in self.writers.iter_mut() {
            writer.flush().with_context(|| {
                format!("Unable to flush {}", group_path(&self.dir, name).display())
            })?;
        }
        Ok(())
    }

    fn writer(&mut self, name: &str) -> Result<&mut BufWriter<File>> {
        if let Some(idx) = self.writers.get_index_of(name) {
            return Ok(&mut self.writers[idx]);
        }

        let file = self.create(name)?;
        let (idx, _) = self
            .writers
            .insert_full(name.to_string(), BufWriter::new(file));
        Ok(&mut self.writers[idx])
    }

    fn create(&self, name: &str) -> Result<File> {
        let path = group_path(&self.dir, name);

        if !self.overwrite {
            if let Ok(metadata) = std::fs::metadata(&path) {
                if metadata.len() > 0 {
                    return Err(OutputError::NotFresh {
                        path: path.display().to_string(),
                    }
                    .into());
                }
            }
        }

        debug!("Creating output group {}", path.display());
        File::create(&path).with_context(|| format!("Unable to create {}", path.display()))
    }
}
