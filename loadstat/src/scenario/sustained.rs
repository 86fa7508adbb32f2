use crate::pool::WorkerPool;
use loadstat_core::{ScenarioConfig, StageStatistics};
use std::fmt::Display;
use std::future::Future;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Every worker repeats trials, pausing `think_time` between them, until `duration` is over.
pub(crate) async fn run_sustained<T, F, R, E>(
    scenario: T,
    config: &ScenarioConfig,
    users: NonZeroUsize,
    duration: Duration,
    think_time: Duration,
) -> StageStatistics
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Display + Send + 'static,
{
    info!(
        "Sustaining {users} users for {} with {} think time",
        humantime::format_duration(duration),
        humantime::format_duration(think_time)
    );

    let start = Instant::now();
    let pool = WorkerPool::new(&config.name, scenario, users, config.timeout);
    let measurements = pool.run_for(duration, think_time).await;
    let stage = StageStatistics::new(users.get(), start.elapsed(), &measurements);

    match &stage.summary {
        Some(summary) => info!("{users} users: {summary}"),
        None => warn!("{users} users: no trials completed"),
    }

    stage
}
