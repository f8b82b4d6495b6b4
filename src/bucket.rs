use crate::classify::{classify_files, count_inputs, Classify};
use crate::io::Record;
use crate::output::OutputGroups;
use crate::summary::{ReportKind, Statistics};

use anyhow::{ensure, Result};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::path::Path;

/// The read length at the centre of bucket 0
pub const DEFAULT_OFFSET: i64 = 70;
/// The default bucket width, in bases
pub const DEFAULT_BIN_WIDTH: u32 = 15;
/// The largest offset accepted in either direction, which keeps `len - offset` within an i64
pub const MAX_OFFSET: i64 = u32::MAX as i64;
/// The file stem of the statistics report
pub const STATS_STEM: &str = "read_stats";

#[derive(Copy, Clone, Debug)]
pub struct BinParams {
    offset: i64,
    width: i64,
}

impl BinParams {
    pub fn new(offset: i64, width: u32) -> Result<Self> {
        ensure!(width > 0, "bucket width must be at least 1");
        ensure!(
            (-MAX_OFFSET..=MAX_OFFSET).contains(&offset),
            "bucket offset must be between -{MAX_OFFSET} and {MAX_OFFSET}"
        );
        Ok(Self {
            offset,
            width: width as i64,
        })
    }
}

impl Default for BinParams {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            width: DEFAULT_BIN_WIDTH as i64,
        }
    }
}

/// Computes `round((len - offset) / width)`, rounding halves to the nearest even integer.
///
/// The division is done in integer arithmetic, so there is no floating point error at the
/// bucket boundaries. With a width of 10 and an offset of 70, lengths 75 and 65 both fall in
/// bucket 0, 85 in bucket 2 and 55 in bucket -2.
pub fn bucket_key(len: usize, params: &BinParams) -> i64 {
    let diff = len as i64 - params.offset;
    let quotient = diff.div_euclid(params.width);
    let remainder = diff.rem_euclid(params.width);

    match (2 * remainder).cmp(&params.width) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal if quotient.rem_euclid(2) == 0 => quotient,
        Ordering::Equal => quotient + 1,
    }
}

/// The output group name of a bucket. Negative keys keep their sign, so `B-1` and `B1` differ.
pub fn bucket_name(key: i64) -> String {
    format!("B{key}")
}

/// Whether `name` is one that `bucket_name` produces.
pub fn is_bucket_name(name: &str) -> bool {
    name.strip_prefix('B')
        .and_then(|key| key.parse::<i64>().ok())
        .is_some_and(|key| bucket_name(key) == name)
}

pub struct LengthClassifier {
    params: BinParams,
}

impl LengthClassifier {
    pub fn new(params: BinParams) -> Self {
        Self { params }
    }
}

impl Classify for LengthClassifier {
    fn assign<'a>(&'a self, record: &Record) -> Cow<'a, str> {
        Cow::Owned(bucket_name(bucket_key(record.len(), &self.params)))
    }
}

/// Sorts the reads of every input into length buckets inside `output`, then writes the
/// statistics report next to them.
///
/// # Arguments
///
/// * `inputs` - The input .fastq files.
/// * `output` - The output directory, created if absent.
/// * `params` - The bucket offset and width.
/// * `overwrite` - Whether bucket files that already contain data may be truncated.
/// * `json` - Whether to also write the statistics as JSON.
///
/// # Errors
///
/// Fails without writing any output if:
/// * An input is not made of whole 4-line records.
/// * An input is itself a bucket file inside `output`.
/// * A bucket file inside `output` already contains reads and `overwrite` is not set. With
///   `overwrite`, every such file is truncated first, including buckets this run leaves empty.
pub fn bin_reads(
    inputs: &[String],
    output: &str,
    params: BinParams,
    overwrite: bool,
    json: bool,
) -> Result<Statistics> {
    let input_reads = count_inputs(inputs)?;
    info!("Found {input_reads} reads across {} file(s)", inputs.len());

    let mut groups = OutputGroups::new(output, overwrite)?;
    groups.claim_existing(inputs, is_bucket_name)?;

    let counts = classify_files(inputs, &LengthClassifier::new(params), &mut groups)?;
    groups.finish()?;

    counts.log();

    let stats = Statistics::collect(
        Path::new(output),
        ReportKind::Buckets,
        counts.groups.keys().map(|k| k.as_str()),
        None,
        input_reads,
    )?;
    stats.write_reports(Path::new(output), STATS_STEM, json)?;

    Ok(stats)
}
