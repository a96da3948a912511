//! Timing summary of a capture log.
//!
//! The capture firmware logs a JSON object after every exported packet:
//!
//! ```text
//! I (5120) CSI_COLLECTION: { "msgid":1, "dt since last call":1021, "export data dt":412 }
//! ```
//!
//! This module collects the `dt since last call` values (microseconds) and
//! summarizes their distribution.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, trace};
use serde_json::Value;

use crate::errors::TimingsError;

const LOG_TAG: &str = "CSI_COLLECTION";
const TIMING_MSG_ID: i64 = 1;
const INTERVAL_KEY: &str = "dt since last call";

/// Distribution of the packet intervals in one log.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSummary {
    pub count: usize,
    pub mean: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

impl fmt::Display for TimingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "N= {}", self.count)?;
        write!(
            f,
            "mean/10/50/90 percentile= {} [{} {} {}]",
            self.mean, self.p10, self.p50, self.p90
        )
    }
}

/// Extracts the interval of every timing message in `reader`.
///
/// Lines without the collection tag or without a parseable object are
/// skipped, as are objects with another message id.
pub fn collect_intervals<R: BufRead>(reader: R) -> Result<Vec<f64>, TimingsError> {
    let mut intervals = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.contains(LOG_TAG) {
            continue;
        }
        let Some(object) = json_object(&line) else {
            continue;
        };
        let value: Value = match serde_json::from_str(object) {
            Ok(value) => value,
            Err(e) => {
                trace!("Skipping unparseable timing line: {e}");
                continue;
            }
        };
        if value.get("msgid").and_then(Value::as_i64) != Some(TIMING_MSG_ID) {
            continue;
        }
        if let Some(dt) = value.get(INTERVAL_KEY).and_then(Value::as_f64) {
            intervals.push(dt);
        }
    }
    Ok(intervals)
}

/// The text from the first `{` to the last `}`, leaving out any terminal
/// colour codes the logger appends.
fn json_object(line: &str) -> Option<&str> {
    let start = line.find('{')?;
    let end = line.rfind('}')?;
    (end > start).then(|| &line[start..=end])
}

/// Percentile of ascending `sorted` values with linear interpolation
/// between the closest ranks.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = p / 100.0 * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

pub fn summarize(mut intervals: Vec<f64>) -> Option<TimingSummary> {
    if intervals.is_empty() {
        return None;
    }
    intervals.sort_by(f64::total_cmp);
    let count = intervals.len();
    let mean = intervals.iter().sum::<f64>() / count as f64;
    Some(TimingSummary {
        count,
        mean,
        p10: percentile(&intervals, 10.0),
        p50: percentile(&intervals, 50.0),
        p90: percentile(&intervals, 90.0),
    })
}

/// Reads a capture log and summarizes its packet intervals.
///
/// # Errors
///
/// Returns `TimingsError::Empty` if the log holds no timing message.
pub fn summarize_file(path: &Path) -> Result<TimingSummary, TimingsError> {
    let reader = BufReader::new(File::open(path)?);
    let intervals = collect_intervals(reader)?;
    debug!("Found {} timing records in {}", intervals.len(), path.display());
    summarize(intervals).ok_or(TimingsError::Empty)
}
