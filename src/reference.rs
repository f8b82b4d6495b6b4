use crate::matcher::UNMATCHED_GROUP;

use indexmap::IndexMap;
use needletail::parser::FastaReader;
use needletail::FastxReader;
use std::collections::HashMap;
use std::fs::File;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReferenceLoadError {
    #[error("unable to open reference file {path}")]
    Missing {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("reference file {path} contains no sequences")]
    Empty { path: String },

    #[error("unable to parse reference file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error(
        "reference identifier `{id}` in {path} cannot be used as an output name
reason: {reason}"
    )]
    InvalidIdentifier {
        path: String,
        id: String,
        reason: &'static str,
    },
}

/// Named reference sequences, kept in the order they were loaded.
#[derive(Debug, Default)]
pub struct ReferenceSet {
    sequences: IndexMap<String, String>,
}

impl ReferenceSet {
    /// Loads every record of a FASTA file. The identifier of each reference is its header up to
    /// the first whitespace; multi-line sequences are joined.
    ///
    /// A repeated identifier replaces the earlier sequence but keeps the earlier load position.
    ///
    /// # Errors
    ///
    /// Returns a `ReferenceLoadError` if the file cannot be opened, holds no records, is not
    /// valid FASTA, or has an identifier which cannot be used as an output file name.
    pub fn from_path(path: &str) -> Result<Self, ReferenceLoadError> {
        let file = File::open(path).map_err(|source| ReferenceLoadError::Missing {
            path: path.to_string(),
            source,
        })?;

        let parse_err = |reason: String| ReferenceLoadError::Parse {
            path: path.to_string(),
            reason,
        };

        let is_empty = file
            .metadata()
            .map_err(|source| ReferenceLoadError::Missing {
                path: path.to_string(),
                source,
            })?
            .len()
            == 0;
        if is_empty {
            return Err(ReferenceLoadError::Empty {
                path: path.to_string(),
            });
        }

        let mut reader = FastaReader::new(file);
        let mut references = ReferenceSet::default();

        while let Some(rec) = reader.next() {
            let rec = rec.map_err(|e| parse_err(e.to_string()))?;

            let header = std::str::from_utf8(rec.id())
                .map_err(|e| parse_err(format!("header is not valid UTF-8 ({e})")))?;
            let id = header.split_whitespace().next().unwrap_or_default();
            if let Err(reason) = validate_identifier(id) {
                return Err(ReferenceLoadError::InvalidIdentifier {
                    path: path.to_string(),
                    id: id.to_string(),
                    reason,
                });
            }

            let seq = String::from_utf8(rec.seq().into_owned())
                .map_err(|e| parse_err(format!("sequence of {id} is not valid UTF-8 ({e})")))?;

            if seq.is_empty() {
                warn!("Reference {id} has an empty sequence");
            }
            references.insert(id.to_string(), seq);
        }

        if references.is_empty() {
            return Err(ReferenceLoadError::Empty {
                path: path.to_string(),
            });
        }

        references.warn_shared_sequences();
        Ok(references)
    }

    fn insert(&mut self, id: String, seq: String) {
        if self.sequences.insert(id.clone(), seq).is_some() {
            warn!("Reference {id} appears more than once; only its last sequence is kept");
        }
    }

    /// Several references with one sequence are allowed, but only the first can ever match.
    fn warn_shared_sequences(&self) {
        let mut first_owner: HashMap<&str, &str> = HashMap::new();
        for (id, seq) in self.sequences.iter() {
            if let Some(owner) = first_owner.get(seq.as_str()) {
                warn!(
                    "Reference {id} has the same sequence as {owner}, so its reads will be assigned to {owner}"
                );
            } else {
                first_owner.insert(seq, id);
            }
        }
    }

    /// Returns the identifier of the first reference, in load order, whose sequence is exactly
    /// `seq`.
    pub fn find_first(&self, seq: &str) -> Option<&str> {
        self.sequences
            .iter()
            .find(|(_, ref_seq)| ref_seq.as_str() == seq)
            .map(|(id, _)| id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sequences.contains_key(id)
    }

    /// Reference identifiers in load order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl<I: Into<String>, S: Into<String>> FromIterator<(I, S)> for ReferenceSet {
    fn from_iter<T: IntoIterator<Item = (I, S)>>(iter: T) -> Self {
        let mut references = ReferenceSet::default();
        for (id, seq) in iter {
            references.insert(id.into(), seq.into());
        }
        references
    }
}

/// Identifiers become file names inside the output directory.
fn validate_identifier(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        Err("the identifier is empty")
    } else if id.contains('/') || id.contains('\\') {
        Err("it contains a path separator")
    } else if id == "." || id == ".." {
        Err("it names a directory")
    } else if id == UNMATCHED_GROUP {
        Err("it is reserved for reads which match no reference")
    } else {
        Ok(())
    }
}
