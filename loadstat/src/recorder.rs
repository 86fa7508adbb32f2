use loadstat_core::{MeasurementSet, Trial};
use metrics_util::AtomicBucket;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared sink the workers of a stage record their trials into.
///
/// Counters are accumulated separately from the trial list, and both are handed over as-is to
/// the [`MeasurementSet`] on collection.
#[derive(Clone)]
pub(crate) struct TrialRecorder {
    success: Arc<AtomicU64>,
    failure: Arc<AtomicU64>,
    sequence: Arc<AtomicU64>,
    trials: Arc<AtomicBucket<(u64, Trial)>>,
}

impl TrialRecorder {
    pub fn new() -> Self {
        Self {
            success: Arc::new(AtomicU64::new(0)),
            failure: Arc::new(AtomicU64::new(0)),
            sequence: Arc::new(AtomicU64::new(0)),
            trials: Arc::new(AtomicBucket::new()),
        }
    }

    pub fn record(&self, trial: Trial) {
        if trial.succeeded() {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure.fetch_add(1, Ordering::Relaxed);
        }

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.trials.push((seq, trial));
    }

    /// Drain everything recorded so far. Trials come back in completion order.
    pub fn collect(&self) -> MeasurementSet {
        let success = self.success.swap(0, Ordering::Relaxed);
        let failure = self.failure.swap(0, Ordering::Relaxed);

        let mut trials = vec![];
        self.trials.clear_with(|block| {
            trials.extend_from_slice(block);
        });
        trials.sort_unstable_by_key(|(seq, _)| *seq);

        MeasurementSet::from_parts(
            trials.into_iter().map(|(_, trial)| trial).collect(),
            success,
            failure,
        )
    }
}
