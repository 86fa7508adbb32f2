use crate::stats::{compute_statistics, Summary};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::time::Duration;

/// Outcome of a single measured attempt.
///
/// A trial either succeeded or carries the text of the error which made it fail; there is no
/// way to build a successful trial with an error attached.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    elapsed: Duration,
    error: Option<String>,
}

impl Trial {
    pub fn success(elapsed: Duration) -> Self {
        Self {
            elapsed,
            error: None,
        }
    }

    pub fn failure(elapsed: Duration, error: impl Into<String>) -> Self {
        Self {
            elapsed,
            error: Some(error.into()),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Trials gathered during one load stage.
///
/// The success and failure counters are accumulated next to the trial list rather than derived
/// from it. [`MeasurementSet::record`] keeps them in step, while [`MeasurementSet::from_parts`]
/// accepts counters gathered elsewhere and trusts them as given.
#[derive(Debug, Clone, Default)]
pub struct MeasurementSet {
    trials: Vec<Trial>,
    success_count: u64,
    failure_count: u64,
}

impl MeasurementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(trials: Vec<Trial>, success_count: u64, failure_count: u64) -> Self {
        Self {
            trials,
            success_count,
            failure_count,
        }
    }

    pub fn record(&mut self, trial: Trial) {
        if trial.succeeded() {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.trials.push(trial);
    }

    /// Trials in the order they were recorded.
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    /// Error messages of failed trials, in arrival order.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.trials.iter().filter_map(Trial::error)
    }

    pub fn summary(&self) -> Option<Summary> {
        compute_statistics(&self.trials, self.success_count, self.failure_count)
    }
}

impl Extend<Trial> for MeasurementSet {
    fn extend<I: IntoIterator<Item = Trial>>(&mut self, iter: I) {
        for trial in iter {
            self.record(trial);
        }
    }
}

impl FromIterator<Trial> for MeasurementSet {
    fn from_iter<I: IntoIterator<Item = Trial>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
