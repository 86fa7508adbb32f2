use crate::recorder::TrialRecorder;
use crate::trial::measure_trial;
use loadstat_core::MeasurementSet;
use std::fmt::Display;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Fixed-size pool of workers, each one simulating a concurrent user.
pub(crate) struct WorkerPool<T> {
    name: Arc<str>,
    scenario: T,
    workers: NonZeroUsize,
    timeout: Duration,
    recorder: TrialRecorder,
}

impl<T, F, R, E> WorkerPool<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Display + Send + 'static,
{
    pub fn new(name: &str, scenario: T, workers: NonZeroUsize, timeout: Duration) -> Self {
        Self {
            name: Arc::from(name),
            scenario,
            workers,
            timeout,
            recorder: TrialRecorder::new(),
        }
    }

    /// Run `count` trials. At most `workers` are in flight; the rest wait for a free worker.
    pub async fn run_trials(&self, count: usize) -> MeasurementSet {
        let queue = Arc::new(AtomicUsize::new(count));
        let workers = self.workers.get().min(count);
        debug!("Running {count} trials on {workers} workers");

        let tasks = (0..workers)
            .map(|_| {
                let queue = queue.clone();
                self.spawn_worker(move || take_one(&queue), Duration::ZERO)
            })
            .collect();

        self.join(tasks).await
    }

    /// Keep every worker running trials until `duration` has passed since the start. A trial
    /// which is in flight at the deadline is allowed to finish.
    pub async fn run_for(&self, duration: Duration, think_time: Duration) -> MeasurementSet {
        let start = Instant::now();
        debug!(
            "Running {} workers for {}",
            self.workers,
            humantime::format_duration(duration)
        );

        let tasks = (0..self.workers.get())
            .map(|_| self.spawn_worker(move || start.elapsed() < duration, think_time))
            .collect();

        self.join(tasks).await
    }

    fn spawn_worker<C>(&self, mut next: C, think_time: Duration) -> JoinHandle<()>
    where
        C: FnMut() -> bool + Send + 'static,
    {
        let name = self.name.clone();
        let scenario = self.scenario.clone();
        let recorder = self.recorder.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            while next() {
                let trial = measure_trial(&name, timeout, scenario()).await;
                recorder.record(trial);

                if !think_time.is_zero() {
                    tokio::time::sleep(think_time).await;
                }
            }
        })
    }

    async fn join(&self, tasks: Vec<JoinHandle<()>>) -> MeasurementSet {
        for res in futures_util::future::join_all(tasks).await {
            if let Err(err) = res {
                error!("Worker task failed: {err}");
            }
        }

        let measurements = self.recorder.collect();
        trace!(
            "Collected {} trials ({} ok, {} failed)",
            measurements.len(),
            measurements.success_count(),
            measurements.failure_count()
        );
        measurements
    }
}

fn take_one(queue: &AtomicUsize) -> bool {
    queue
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        .is_ok()
}
