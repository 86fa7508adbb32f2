use std::time::Duration;

/// Per-trial timeout used when a scenario does not set `.timeout()`
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between two trials of the same worker during sustained load
pub const DEFAULT_THINK_TIME: Duration = Duration::from_millis(500);

/// Pause between two stages of a progressive load
pub const DEFAULT_STAGE_PAUSE: Duration = Duration::from_secs(2);

/// Number of concurrent users when none is configured
pub const DEFAULT_USERS: usize = 10;

pub const P95_QUANTILE: f64 = 0.95;
pub const P99_QUANTILE: f64 = 0.99;
