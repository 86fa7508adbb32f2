use crate::constants::{P95_QUANTILE, P99_QUANTILE};
use crate::data::{MeasurementSet, Trial};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::warn;

const MAX_REPORTED_ERRORS: usize = 5;

/// Summary statistics over the trials of one load stage.
///
/// Percentiles are rank based: the value at zero-based index `floor(total * q)` of the
/// ascending elapsed times, clamped to the last element. The median uses index `total / 2`,
/// which is the upper of the two middle values for an even number of trials.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub success_count: u64,
    pub failure_count: u64,
    /// Percentage in `[0, 100]`
    pub success_rate: f64,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub min: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub max: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub avg: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub median: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub p95: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub p99: Duration,
}

/// Aggregate a set of trials into a [`Summary`].
///
/// Returns `None` when there are no trials, which is a reportable outcome rather than an error.
/// The success and failure counters are taken as given and are not recomputed from the trials.
pub fn compute_statistics(
    trials: &[Trial],
    success_count: u64,
    failure_count: u64,
) -> Option<Summary> {
    if trials.is_empty() {
        return None;
    }

    let mut elapsed: Vec<Duration> = trials.iter().map(Trial::elapsed).collect();
    elapsed.sort_unstable();
    let total = elapsed.len();

    if success_count.saturating_add(failure_count) != total as u64 {
        warn!(
            "Counters disagree with trial count: {success_count} successes + {failure_count} failures != {total} trials"
        );
    }

    let success_rate = (success_count as f64 / total as f64 * 100.).clamp(0., 100.);
    let sum: u128 = elapsed.iter().map(Duration::as_nanos).sum();

    Some(Summary {
        total,
        success_count,
        failure_count,
        success_rate,
        min: elapsed[0],
        max: elapsed[total - 1],
        avg: duration_from_nanos(sum / total as u128),
        median: elapsed[total / 2],
        p95: elapsed[rank(total, P95_QUANTILE)],
        p99: elapsed[rank(total, P99_QUANTILE)],
    })
}

fn rank(total: usize, quantile: f64) -> usize {
    ((total as f64 * quantile) as usize).min(total - 1)
}

fn duration_from_nanos(nanos: u128) -> Duration {
    Duration::new(
        (nanos / 1_000_000_000) as u64,
        (nanos % 1_000_000_000) as u32,
    )
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total={}, SuccessRate={:.2}%, min={:.3}s, avg={:.3}s, p50={:.3}s, p95={:.3}s, p99={:.3}s, max={:.3}s",
            self.total,
            self.success_rate,
            self.min.as_secs_f64(),
            self.avg.as_secs_f64(),
            self.median.as_secs_f64(),
            self.p95.as_secs_f64(),
            self.p99.as_secs_f64(),
            self.max.as_secs_f64(),
        )
    }
}

/// Result of one load stage: a batch, a sustained run or one step of a progressive run.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageStatistics {
    pub users: usize,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub elapsed: Duration,
    pub summary: Option<Summary>,
    pub errors: Vec<String>,
}

impl StageStatistics {
    pub fn new(users: usize, elapsed: Duration, measurements: &MeasurementSet) -> Self {
        Self {
            users,
            elapsed,
            summary: measurements.summary(),
            errors: measurements.errors().map(str::to_string).collect(),
        }
    }
}

impl fmt::Display for StageStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== {} concurrent users ({:.3}s) ===",
            self.users,
            self.elapsed.as_secs_f64()
        )?;

        let Some(summary) = &self.summary else {
            return writeln!(f, "No completed requests");
        };

        writeln!(f, "Total requests: {}", summary.total)?;
        writeln!(
            f,
            "Success rate: {:.2}% ({} ok, {} failed)",
            summary.success_rate, summary.success_count, summary.failure_count
        )?;
        writeln!(f, "Min response time: {:.3}s", summary.min.as_secs_f64())?;
        writeln!(f, "Avg response time: {:.3}s", summary.avg.as_secs_f64())?;
        writeln!(f, "Median response time: {:.3}s", summary.median.as_secs_f64())?;
        writeln!(f, "P95 response time: {:.3}s", summary.p95.as_secs_f64())?;
        writeln!(f, "P99 response time: {:.3}s", summary.p99.as_secs_f64())?;
        writeln!(f, "Max response time: {:.3}s", summary.max.as_secs_f64())?;

        if !self.errors.is_empty() {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for error in &self.errors {
                *counts.entry(error.as_str()).or_default() += 1;
            }

            writeln!(f, "Errors:")?;
            for (error, count) in counts.iter().take(MAX_REPORTED_ERRORS) {
                writeln!(f, "  {count}x {error}")?;
            }
            if counts.len() > MAX_REPORTED_ERRORS {
                writeln!(
                    f,
                    "  ... and {} other kinds",
                    counts.len() - MAX_REPORTED_ERRORS
                )?;
            }
        }

        Ok(())
    }
}

/// Statistics for a complete scenario run.
///
/// Batch and sustained runs produce a single stage; progressive runs produce one stage per
/// user count, in the order they were run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    pub name: String,
    pub stages: Vec<StageStatistics>,
}

impl RunStatistics {
    /// Summary of the final stage.
    pub fn summary(&self) -> Option<&Summary> {
        self.stages.last().and_then(|stage| stage.summary.as_ref())
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "##### {} #####", self.name)?;
        for stage in &self.stages {
            writeln!(f)?;
            write!(f, "{stage}")?;
        }

        if self.stages.len() > 1 {
            writeln!(f)?;
            writeln!(f, "=== Progressive Load Summary ===")?;
            for stage in &self.stages {
                match &stage.summary {
                    Some(summary) => writeln!(
                        f,
                        "{} users: {:.2}% success, {:.3}s avg",
                        stage.users,
                        summary.success_rate,
                        summary.avg.as_secs_f64()
                    )?,
                    None => writeln!(f, "{} users: no data", stage.users)?,
                }
            }
        }

        Ok(())
    }
}
