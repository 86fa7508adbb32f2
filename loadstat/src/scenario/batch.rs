use crate::pool::WorkerPool;
use loadstat_core::{ScenarioConfig, StageStatistics};
use std::fmt::Display;
use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Spread `requests` trials over `users` workers and wait for all of them to finish.
pub(crate) async fn run_batch<T, F, R, E>(
    scenario: T,
    config: &ScenarioConfig,
    users: NonZeroUsize,
    requests: usize,
) -> StageStatistics
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Display + Send + 'static,
{
    let start = Instant::now();
    let pool = WorkerPool::new(&config.name, scenario, users, config.timeout);
    let measurements = pool.run_trials(requests).await;
    let stage = StageStatistics::new(users.get(), start.elapsed(), &measurements);

    match &stage.summary {
        Some(summary) => info!("{users} users: {summary}"),
        None => warn!("{users} users: no trials completed"),
    }

    stage
}
