pub mod fastq;

use thiserror::Error;

pub use fastq::{count_records, FastqRecords};

/// Raised when a FASTQ file does not consist of whole 4-line records.
#[derive(Error, Debug)]
pub enum MalformedInputError {
    #[error(
        "malformed input: {path} has {lines} lines, which is not a multiple of 4
every record must span exactly 4 lines (header, sequence, separator, quality)"
    )]
    LineCount { path: String, lines: u64 },

    #[error(
        "malformed input: record {record} of {path} is truncated
expected a {missing} line, but the file ended after line {lines}"
    )]
    Truncated {
        path: String,
        record: u64,
        missing: &'static str,
        lines: u64,
    },
}
