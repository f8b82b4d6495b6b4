use crate::io::Record;
use crate::output::OutputGroups;
use crate::reader::{count_records, FastqRecords};

use anyhow::Result;
use indexmap::IndexMap;
use std::borrow::Cow;

/// A strategy that assigns every read to exactly one named output group.
pub trait Classify {
    fn assign<'a>(&'a self, record: &Record) -> Cow<'a, str>;
}

/// The counts accumulated while classifying, owned by a single run.
#[derive(Debug, Default)]
pub struct RunCounts {
    /// Total reads classified
    pub reads: usize,
    /// Reads per output group, in the order groups were first encountered
    pub groups: IndexMap<String, usize>,
}

impl RunCounts {
    fn add(&mut self, group: &str) {
        self.reads += 1;
        match self.groups.get_mut(group) {
            Some(count) => *count += 1,
            None => {
                self.groups.insert(group.to_string(), 1);
            }
        }
    }

    /// Logs one line per group, in first-encounter order.
    pub fn log(&self) {
        for (group, count) in self.groups.iter() {
            info!("{group}: {count} reads");
        }
    }
}

/// Validates every input and returns the total number of records across them.
///
/// This runs before any output is opened, so a malformed input aborts the run without
/// writing anything.
pub fn count_inputs(inputs: &[String]) -> Result<usize> {
    let mut total = 0;
    for input in inputs {
        let n = count_records(input)?;
        debug!("{input}: {n} reads");
        total += n;
    }
    Ok(total)
}

/// Streams every read of every input through `classifier`, appending each one to the group it
/// is assigned to.
///
/// # Errors
///
/// Stops at the first unreadable input, malformed record or failed write.
pub fn classify_files(
    inputs: &[String],
    classifier: &impl Classify,
    groups: &mut OutputGroups,
) -> Result<RunCounts> {
    let mut counts = RunCounts::default();

    for input in inputs {
        info!("Classifying reads from {input}");

        for rec in FastqRecords::from_path(input)? {
            let rec = rec?;
            let group = classifier.assign(&rec);

            groups.append(&group, &rec)?;
            counts.add(&group);

            // print progress notification
            if counts.reads % 50000 == 0 {
                info!("Processed: {}", counts.reads);
            }
        }
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FirstBase;

    impl Classify for FirstBase {
        fn assign<'a>(&'a self, record: &Record) -> Cow<'a, str> {
            Cow::Owned(record.seq[..1].to_string())
        }
    }

    #[test]
    fn counts_follow_first_encounter_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.fastq");
        let b = dir.path().join("b.fastq");
        std::fs::write(&a, "@1\nTA\n+\nII\n@2\nAA\n+\nII\n").unwrap();
        std::fs::write(&b, "@3\nTC\n+\nII\n").unwrap();

        let inputs = vec![
            a.to_str().unwrap().to_string(),
            b.to_str().unwrap().to_string(),
        ];
        let out = dir.path().join("out");

        assert_eq!(count_inputs(&inputs).unwrap(), 3);

        let mut groups = OutputGroups::new(out.to_str().unwrap(), false).unwrap();
        let counts = classify_files(&inputs, &FirstBase, &mut groups).unwrap();
        groups.finish().unwrap();

        assert_eq!(counts.reads, 3);
        assert_eq!(
            counts.groups.into_iter().collect::<Vec<_>>(),
            vec![("T".to_string(), 2), ("A".to_string(), 1)]
        );
        assert_eq!(
            std::fs::read_to_string(out.join("T.fastq")).unwrap(),
            "@1\nTA\n+\nII\n@3\nTC\n+\nII\n"
        );
    }
}
