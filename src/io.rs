use std::io::Write;

/// A single FASTQ read.
///
/// The header line is stored verbatim, including its leading `@`, so a record that is written
/// with `write_read` and read back is identical to the one that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub header: String,
    pub seq: String,
    pub qual: String,
}

impl Record {
    /// The number of bases in the read, counted in characters rather than bytes so that a
    /// stray non-ASCII symbol counts once.
    pub fn len(&self) -> usize {
        self.seq.chars().count()
    }
}

/// Formats a record as a FASTQ read and writes it to the provided writer.
///
/// The separator line is always written as a bare `+`, whatever the input contained.
///
/// # Arguments
///
/// * `writer` - A mutable reference to an object that implements the `Write` trait. Since this is
///   `std::io::Write` and *not* `std::fmt::Write`, this does not accept Strings. It is acceptable
///   to use a `std::io::Cursor` instead.
/// * `record` - A reference to the `Record` to write.
///
/// # Returns
///
/// This function returns a `std::io::Result<()>` indicating the success or failure of the write operation.
pub fn write_read(writer: &mut impl Write, record: &Record) -> std::io::Result<()> {
    writeln!(writer, "{}\n{}\n+\n{}", record.header, record.seq, record.qual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn writes_four_lines() {
        let record = Record {
            header: "@read1 extra".to_string(),
            seq: "ACGT".to_string(),
            qual: "IIII".to_string(),
        };

        let mut output = Cursor::new(Vec::new());
        write_read(&mut output, &record).unwrap();

        assert_eq!(
            String::from_utf8(output.into_inner()).unwrap(),
            "@read1 extra\nACGT\n+\nIIII\n"
        );
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn length_counts_characters() {
        let record = Record {
            header: "@r".to_string(),
            seq: "ACGTÑ".to_string(),
            qual: "IIIII".to_string(),
        };
        assert_eq!(record.len(), 5);
    }
}
