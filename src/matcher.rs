use crate::classify::{classify_files, count_inputs, Classify};
use crate::io::Record;
use crate::output::OutputGroups;
use crate::reference::ReferenceSet;
use crate::summary::{ReportKind, Statistics};

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::Path;

/// The output group for reads that match no reference
pub const UNMATCHED_GROUP: &str = "unmatched";
/// The file stem of the statistics report
pub const STATS_STEM: &str = "statistics";

/// Routes each read to the first reference, in load order, whose sequence it equals exactly.
///
/// Every read is compared against every reference until one matches; there is no index, as
/// reference sets are expected to be small.
pub struct ReferenceMatcher<'r> {
    references: &'r ReferenceSet,
}

impl<'r> ReferenceMatcher<'r> {
    pub fn new(references: &'r ReferenceSet) -> Self {
        Self { references }
    }
}

impl Classify for ReferenceMatcher<'_> {
    fn assign<'a>(&'a self, record: &Record) -> Cow<'a, str> {
        Cow::Borrowed(
            self.references
                .find_first(&record.seq)
                .unwrap_or(UNMATCHED_GROUP),
        )
    }
}

/// Matches the reads of every input against the references in `reference`, writing one .fastq
/// per reference and one for unmatched reads into `output`, followed by the statistics report.
///
/// Every output group is checked and opened before any read is classified, so an output
/// directory holding data from a previous run is rejected up front (or cleared, if `overwrite` is
/// set), and an input which is itself one of the output groups is always rejected.
///
/// # Errors
///
/// This function will return an error if:
/// * The reference file cannot be loaded.
/// * An input is not made of whole 4-line records. Nothing is written in this case.
/// * An input is one of the output groups.
/// * An output group already contains data and `overwrite` is not set.
/// * Reading an input or writing an output fails.
pub fn match_reads(
    inputs: &[String],
    reference: &str,
    output: &str,
    overwrite: bool,
    json: bool,
) -> Result<Statistics> {
    let references = ReferenceSet::from_path(reference)
        .with_context(|| format!("Could not load references from {reference}"))?;
    info!("Loaded {} reference sequences", references.len());

    let input_reads = count_inputs(inputs)?;
    info!("Found {input_reads} reads across {} file(s)", inputs.len());

    let mut groups = OutputGroups::new(output, overwrite)?;
    groups.claim_existing(inputs, |stem| {
        stem == UNMATCHED_GROUP || references.contains(stem)
    })?;
    groups.open_all(references.ids().chain([UNMATCHED_GROUP]))?;

    let counts = classify_files(inputs, &ReferenceMatcher::new(&references), &mut groups)?;
    groups.finish()?;

    counts.log();

    let stats = Statistics::collect(
        Path::new(output),
        ReportKind::References,
        references.ids(),
        Some(UNMATCHED_GROUP),
        input_reads,
    )?;
    stats.write_reports(Path::new(output), STATS_STEM, json)?;

    Ok(stats)
}
