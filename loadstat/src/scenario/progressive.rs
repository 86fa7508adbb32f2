use super::batch::run_batch;
use loadstat_core::{ScenarioConfig, StageStatistics};
use std::fmt::Display;
use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Run one batch per user count, each user doing a single trial, pausing between stages.
pub(crate) async fn run_progressive<T, F, R, E>(
    scenario: T,
    config: &ScenarioConfig,
    stages: &[NonZeroUsize],
    pause: Duration,
) -> Vec<StageStatistics>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Display + Send + 'static,
{
    let mut results = Vec::with_capacity(stages.len());

    for (idx, users) in stages.iter().enumerate() {
        if idx > 0 && !pause.is_zero() {
            trace!("Pausing {} before next stage", humantime::format_duration(pause));
            tokio::time::sleep(pause).await;
        }

        debug!("Stage {}/{}: {users} users", idx + 1, stages.len());
        let stage = run_batch(scenario.clone(), config, *users, users.get())
            .instrument(tracing::info_span!("stage", users = users.get()))
            .await;
        results.push(stage);
    }

    results
}
