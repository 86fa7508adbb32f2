//! Scenario logic and constants
use loadstat_core::{RunStatistics, ScenarioConfig, ScenarioKind};
use std::{
    fmt::Display,
    future::Future,
    num::NonZeroUsize,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

mod batch;
mod progressive;
mod sustained;

/// Load test scenario structure
///
/// Wraps a function performing one attempt of the operation under test. Every call of the
/// function is one trial: `Ok` counts as a success, `Err`, a panic, or running past the timeout
/// counts as a failure. Awaiting the scenario runs it and yields its [`RunStatistics`].
///
/// Usually created through the [`#[scenario]`](loadstat_macros::scenario) macro, or
/// [`Scenario::new`] for closures.
#[pin_project::pin_project]
pub struct Scenario<T> {
    func: T,
    runner_fut: Option<Pin<Box<dyn Future<Output = RunStatistics> + Send>>>,
    config: ScenarioConfig,
}

impl<T> Scenario<T> {
    pub fn new(name: &str, func: T) -> Self {
        Self {
            func,
            runner_fut: None,
            config: ScenarioConfig::new(name),
        }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }
}

impl<T, F, R, E> Future for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Display + Send + 'static,
{
    type Output = RunStatistics;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.runner_fut.is_none() {
            let func = self.func.clone();
            let config = self.config.clone();
            self.runner_fut = Some(Box::pin(async move { run_scenario(func, config).await }));
        }

        if let Some(runner) = &mut self.runner_fut {
            runner.as_mut().poll(cx)
        } else {
            unreachable!()
        }
    }
}

pub trait ConfigurableScenario<T: Send>: Future<Output = T> + Sized + Send {
    fn users(self, users: usize) -> Self;
    fn requests(self, requests: usize) -> Self;
    fn duration(self, duration: Duration) -> Self;
    fn think_time(self, think_time: Duration) -> Self;
    fn timeout(self, timeout: Duration) -> Self;
    fn stages(self, stages: Vec<usize>) -> Self;
    fn stage_pause(self, pause: Duration) -> Self;
}

impl<T, F, R, E> ConfigurableScenario<RunStatistics> for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Display + Send + 'static,
{
    /// Number of concurrent users (workers). Values below 1 are raised to 1.
    ///
    /// # Example
    /// ```no_run
    /// use loadstat::prelude::*;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let stats = Scenario::new("noop", || async { Ok::<_, String>(()) })
    ///         .users(10)
    ///         .await;
    ///     println!("{stats}");
    /// }
    /// ```
    fn users(mut self, users: usize) -> Self {
        self.config.users = NonZeroUsize::new(users).unwrap_or_else(|| {
            warn!("A scenario needs at least one user; using 1.");
            NonZeroUsize::MIN
        });
        self
    }

    /// Total number of trials of a batch run. Defaults to the number of users, one trial each.
    fn requests(mut self, requests: usize) -> Self {
        self.config.requests = Some(requests);
        self
    }

    /// Keep every user running trials for the given duration instead of a fixed batch.
    ///
    /// # Example
    /// ```no_run
    /// use loadstat::prelude::*;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     Scenario::new("noop", || async { Ok::<_, String>(()) })
    ///         .users(20)
    ///         .duration(Duration::from_secs(30))
    ///         .think_time(Duration::from_millis(500))
    ///         .await;
    /// }
    /// ```
    fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = Some(duration);
        self
    }

    /// Pause between two trials of the same user during a sustained run.
    fn think_time(mut self, think_time: Duration) -> Self {
        self.config.think_time = think_time;
        self
    }

    /// Time after which a single trial is abandoned and counted as failed.
    fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Run one batch per user count, in order, to find where the target starts to struggle.
    /// Zero entries are skipped.
    ///
    /// # Example
    /// ```no_run
    /// use loadstat::prelude::*;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let stats = Scenario::new("noop", || async { Ok::<_, String>(()) })
    ///         .stages(vec![10, 25, 50, 75, 100])
    ///         .stage_pause(Duration::from_secs(2))
    ///         .await;
    ///     assert_eq!(stats.stages.len(), 5);
    /// }
    /// ```
    fn stages(mut self, stages: Vec<usize>) -> Self {
        self.config.stages = stages.into_iter().filter_map(NonZeroUsize::new).collect();
        self
    }

    /// Pause between two stages of a progressive run.
    fn stage_pause(mut self, pause: Duration) -> Self {
        self.config.stage_pause = pause;
        self
    }
}

#[instrument(name="scenario", skip_all, fields(name=config.name))]
pub(crate) async fn run_scenario<T, F, R, E>(scenario: T, config: ScenarioConfig) -> RunStatistics
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Display + Send + 'static,
{
    info!("Running {} with config {:?}", config.name, &config);

    let stages = match config.kind() {
        ScenarioKind::Batch { users, requests } => {
            vec![batch::run_batch(scenario, &config, users, requests).await]
        }
        ScenarioKind::Sustained {
            users,
            duration,
            think_time,
        } => vec![sustained::run_sustained(scenario, &config, users, duration, think_time).await],
        ScenarioKind::Progressive { stages, pause } => {
            progressive::run_progressive(scenario, &config, &stages, pause).await
        }
    };

    info!("Scenario complete");

    RunStatistics {
        name: config.name,
        stages,
    }
}
