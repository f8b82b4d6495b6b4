use crate::output::group_path;
use crate::reader::count_records;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use indoc::writedoc;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Reads sorted into length buckets
    Buckets,
    /// Reads matched against reference sequences
    References,
}

/// Read counts re-derived from the output files of a run.
#[derive(Serialize, Debug)]
pub struct Statistics {
    pub kind: ReportKind,
    pub input_reads: usize,
    pub groups: IndexMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmatched: Option<usize>,
    pub total_output: usize,
    pub conserved: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    readsort_version: &'static str,
    report_date: String,
    #[serde(flatten)]
    statistics: &'a Statistics,
}

impl Statistics {
    /// Counts the records stored in each output group by reading them back from `dir`, and
    /// checks that together they account for every input read.
    ///
    /// A group which was never written counts as zero. The counts kept by the classifier are
    /// deliberately not used here.
    ///
    /// # Arguments
    ///
    /// * `dir` - The output directory of the run.
    /// * `kind` - Which kind of classification produced the groups.
    /// * `groups` - The groups to report, in report order.
    /// * `unmatched` - The group holding unclassified reads, if there is one.
    /// * `input_reads` - The number of reads in the inputs.
    pub fn collect<'a>(
        dir: &Path,
        kind: ReportKind,
        groups: impl IntoIterator<Item = &'a str>,
        unmatched: Option<&str>,
        input_reads: usize,
    ) -> Result<Self> {
        let groups = groups
            .into_iter()
            .map(|name| -> Result<(String, usize)> {
                Ok((name.to_string(), count_group(dir, name)?))
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        let unmatched = unmatched.map(|name| count_group(dir, name)).transpose()?;

        let total_output = groups.values().sum::<usize>() + unmatched.unwrap_or(0);
        let conserved = total_output == input_reads;

        if !conserved {
            warn!(
                "Conservation check failed: {input_reads} input reads, {total_output} output reads"
            );
        }

        Ok(Self {
            kind,
            input_reads,
            groups,
            unmatched,
            total_output,
            conserved,
        })
    }

    pub fn verdict(&self) -> &'static str {
        if self.conserved {
            "conserved"
        } else {
            "warning: mismatch"
        }
    }

    /// Writes the plain text report.
    pub fn write_text(&self, w: &mut impl Write) -> std::io::Result<()> {
        let heading = match self.kind {
            ReportKind::Buckets => "Reads per bucket",
            ReportKind::References => "Matched reads",
        };

        writedoc!(
            w,
            "
            Input reads: {}

            {heading}:
            ",
            self.input_reads
        )?;
        for (name, count) in self.groups.iter() {
            writeln!(w, "{name}: {count}")?;
        }

        match self.unmatched {
            Some(unmatched) => writedoc!(
                w,
                "

                Unmatched reads: {unmatched}

                Matched reads + Unmatched reads: {}
                ",
                self.total_output
            )?,
            None => writedoc!(
                w,
                "

                Total output reads: {}
                ",
                self.total_output
            )?,
        }

        writeln!(w, "Check: {}", self.verdict())
    }

    /// Writes the report as JSON, along with the version and time it was generated.
    pub fn write_json(&self, w: &mut impl Write) -> Result<()> {
        let report = JsonReport {
            readsort_version: crate::cli::VERSION,
            report_date: format!("{:?}", chrono::offset::Local::now()),
            statistics: self,
        };
        serde_json::to_writer_pretty(&mut *w, &report).context("Could not serialize statistics")?;
        writeln!(w)?;
        Ok(())
    }

    /// Writes `<stem>.txt` into `dir`, and `<stem>.json` as well if `json` is set.
    pub fn write_reports(&self, dir: &Path, stem: &str, json: bool) -> Result<()> {
        let path = dir.join(format!("{stem}.txt"));
        info!("Writing statistics to {}", path.display());

        let mut wtr = create(&path)?;
        self.write_text(&mut wtr)
            .and_then(|_| wtr.flush())
            .with_context(|| format!("Unable to write {}", path.display()))?;

        if json {
            let path = dir.join(format!("{stem}.json"));
            let mut wtr = create(&path)?;
            self.write_json(&mut wtr)?;
            wtr.flush()
                .with_context(|| format!("Unable to write {}", path.display()))?;
        }

        Ok(())
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn count_group(dir: &Path, name: &str) -> Result<usize> {
    let path = group_path(dir, name);
    if !path.exists() {
        return Ok(0);
    }

    let path = path.to_str().context("Output path is not valid UTF-8")?;
    count_records(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_group(dir: &Path, name: &str, reads: usize) {
        let content = "@r\nACGT\n+\nIIII\n".repeat(reads);
        std::fs::write(group_path(dir, name), content).unwrap();
    }

    fn text(stats: &Statistics) -> String {
        let mut output = Vec::new();
        stats.write_text(&mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn reference_report() {
        let dir = tempfile::tempdir().unwrap();
        write_group(dir.path(), "refA", 1);
        write_group(dir.path(), "refB", 0);
        write_group(dir.path(), "unmatched", 1);

        let stats = Statistics::collect(
            dir.path(),
            ReportKind::References,
            ["refA", "refB"],
            Some("unmatched"),
            2,
        )
        .unwrap();

        assert!(stats.conserved);
        assert_eq!(
            text(&stats),
            "Input reads: 2\n\
             \n\
             Matched reads:\n\
             refA: 1\n\
             refB: 0\n\
             \n\
             Unmatched reads: 1\n\
             \n\
             Matched reads + Unmatched reads: 2\n\
             Check: conserved\n"
        );
    }

    #[test]
    fn bucket_report() {
        let dir = tempfile::tempdir().unwrap();
        write_group(dir.path(), "B0", 3);
        write_group(dir.path(), "B-1", 2);

        let stats =
            Statistics::collect(dir.path(), ReportKind::Buckets, ["B0", "B-1"], None, 5).unwrap();

        assert_eq!(
            text(&stats),
            "Input reads: 5\n\
             \n\
             Reads per bucket:\n\
             B0: 3\n\
             B-1: 2\n\
             \n\
             Total output reads: 5\n\
             Check: conserved\n"
        );
    }

    #[test]
    fn recounts_what_was_written() {
        let dir = tempfile::tempdir().unwrap();
        write_group(dir.path(), "refA", 2);

        // a lost read
        let stats = Statistics::collect(
            dir.path(),
            ReportKind::References,
            ["refA", "missing"],
            Some("unmatched"),
            3,
        )
        .unwrap();

        assert_eq!(stats.groups["missing"], 0);
        assert_eq!(stats.unmatched, Some(0));
        assert_eq!(stats.total_output, 2);
        assert!(!stats.conserved);
        assert!(text(&stats).ends_with("Check: warning: mismatch\n"));

        // a duplicated read
        let stats =
            Statistics::collect(dir.path(), ReportKind::Buckets, ["refA"], None, 1).unwrap();
        assert!(!stats.conserved);
        assert_eq!(stats.verdict(), "warning: mismatch");
    }

    #[test]
    fn malformed_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(group_path(dir.path(), "B0"), "@r\nACGT\n").unwrap();

        assert!(Statistics::collect(dir.path(), ReportKind::Buckets, ["B0"], None, 1).is_err());
    }

    #[test]
    fn json_report() {
        let dir = tempfile::tempdir().unwrap();
        write_group(dir.path(), "B0", 1);

        let stats =
            Statistics::collect(dir.path(), ReportKind::Buckets, ["B0"], None, 1).unwrap();
        stats.write_reports(dir.path(), "read_stats", true).unwrap();

        let json = std::fs::read_to_string(dir.path().join("read_stats.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(json["kind"], "buckets");
        assert_eq!(json["input_reads"], 1);
        assert_eq!(json["groups"]["B0"], 1);
        assert_eq!(json["conserved"], true);
        assert!(json.get("unmatched").is_none());
        assert!(json["readsort_version"].is_string());
        assert!(dir.path().join("read_stats.txt").exists());
    }
}
