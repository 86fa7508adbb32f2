use futures_util::FutureExt;
use loadstat_core::Trial;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
#[allow(unused)]
use tracing::{debug, error, trace, warn};

/// Measure a single attempt of a scenario function.
///
/// `Err` results, panics and timeouts all become failed trials; the elapsed time is kept in
/// every case.
#[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
pub(crate) async fn measure_trial<F, R, E>(scenario: &str, timeout: Duration, func: F) -> Trial
where
    F: Future<Output = Result<R, E>>,
    E: Display,
{
    let start = Instant::now();
    let res = tokio::time::timeout(timeout, AssertUnwindSafe(func).catch_unwind()).await;
    let elapsed = start.elapsed();

    let trial = match res {
        Ok(Ok(Ok(_))) => Trial::success(elapsed),
        Ok(Ok(Err(err))) => Trial::failure(elapsed, err.to_string()),
        Ok(Err(panic)) => {
            let msg = panic_message(panic.as_ref());
            error!("Trial panicked: {msg}");
            Trial::failure(elapsed, format!("trial panicked: {msg}"))
        }
        Err(_) => {
            trace!("Trial exceeded its timeout.");
            Trial::failure(
                elapsed,
                format!("timed out after {}", humantime::format_duration(timeout)),
            )
        }
    };

    #[cfg(feature = "metrics")]
    {
        metrics::histogram!("loadstat_trial_latency", "scenario" => scenario.to_string())
            .record(elapsed.as_secs_f64());

        if trial.succeeded() {
            metrics::counter!("loadstat_trial_success", "scenario" => scenario.to_string())
                .increment(1);
        } else {
            metrics::counter!("loadstat_trial_failure", "scenario" => scenario.to_string())
                .increment(1);
        }
    }

    trial
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}
