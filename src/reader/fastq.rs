use super::MalformedInputError;
use crate::io::Record;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};

/// A lazy iterator over the records of a FASTQ file.
///
/// Every record is exactly 4 lines; the separator line is read and discarded. Once an error is
/// yielded the iterator is exhausted.
pub struct FastqRecords<R: BufRead> {
    lines: Lines<R>,
    path: String,
    lines_read: u64,
    records: u64,
    done: bool,
}

impl FastqRecords<BufReader<File>> {
    pub fn from_path(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Unable to open file {path}"))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> FastqRecords<R> {
    /// Wraps any buffered reader. `path` is only used in error messages.
    pub fn new(reader: R, path: &str) -> Self {
        Self {
            lines: reader.lines(),
            path: path.to_string(),
            lines_read: 0,
            records: 0,
            done: false,
        }
    }

    /// Returns the next line, `None` at end of file. `lines()` already strips `\n` and `\r\n`.
    fn next_line(&mut self) -> Option<Result<String>> {
        let line = self.lines.next()?;
        self.lines_read += 1;
        Some(line.with_context(|| {
            format!("Unable to read line {} of {}", self.lines_read, self.path)
        }))
    }

    /// Reads one of the lines following the header, failing if the file has ended.
    fn expect_line(&mut self, missing: &'static str) -> Result<String> {
        match self.next_line() {
            Some(line) => line,
            None => Err(MalformedInputError::Truncated {
                path: self.path.clone(),
                record: self.records + 1,
                missing,
                lines: self.lines_read,
            }
            .into()),
        }
    }

    fn read_record(&mut self, header: String) -> Result<Record> {
        let seq = self.expect_line("sequence")?;
        self.expect_line("separator")?;
        let qual = self.expect_line("quality")?;

        self.records += 1;

        Ok(Record { header, seq, qual })
    }
}

impl<R: BufRead> Iterator for FastqRecords<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = match self.next_line() {
            None => {
                self.done = true;
                return None;
            }
            Some(Ok(header)) => self.read_record(header),
            Some(Err(e)) => Err(e),
        };

        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

/// Counts the records of a FASTQ file without parsing them.
///
/// # Errors
///
/// Returns a `MalformedInputError::LineCount` if the number of lines is not a multiple of 4, or
/// an I/O error if the file cannot be read.
pub fn count_records(path: &str) -> Result<usize> {
    let file = File::open(path).with_context(|| format!("Unable to open file {path}"))?;
    let reader = BufReader::new(file);

    let mut lines = 0u64;
    for line in reader.split(b'\n') {
        line.with_context(|| format!("Unable to read {path}"))?;
        lines += 1;
    }

    if lines % 4 != 0 {
        return Err(MalformedInputError::LineCount {
            path: path.to_string(),
            lines,
        }
        .into());
    }

    Ok((lines / 4) as usize)
}
