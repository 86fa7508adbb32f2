use crate::stats::Summary;
use std::time::Duration;
use thiserror::Error;

/// Pass/fail bounds checked against a [`Summary`].
///
/// The success rate bound is inclusive, latency bounds are strict.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thresholds {
    pub min_success_rate: Option<f64>,
    pub max_avg: Option<Duration>,
    pub max_median: Option<Duration>,
    pub max_p95: Option<Duration>,
    pub max_p99: Option<Duration>,
    pub max_response: Option<Duration>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("No completed trials to check thresholds against")]
    NoData,

    #[error("Success rate {actual:.2}% is below the minimum of {minimum:.2}%")]
    SuccessRate { actual: f64, minimum: f64 },

    #[error("{metric} response time {actual:?} is not under {limit:?}")]
    Latency {
        metric: &'static str,
        actual: Duration,
        limit: Duration,
    },
}

impl Thresholds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_success_rate(mut self, percent: f64) -> Self {
        self.min_success_rate = Some(percent);
        self
    }

    pub fn max_avg(mut self, limit: Duration) -> Self {
        self.max_avg = Some(limit);
        self
    }

    pub fn max_median(mut self, limit: Duration) -> Self {
        self.max_median = Some(limit);
        self
    }

    pub fn max_p95(mut self, limit: Duration) -> Self {
        self.max_p95 = Some(limit);
        self
    }

    pub fn max_p99(mut self, limit: Duration) -> Self {
        self.max_p99 = Some(limit);
        self
    }

    pub fn max_response(mut self, limit: Duration) -> Self {
        self.max_response = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check the summary, returning the first violated bound.
    pub fn check(&self, summary: Option<&Summary>) -> Result<(), ThresholdError> {
        match self.check_all(summary).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Check the summary, returning every violated bound.
    pub fn check_all(&self, summary: Option<&Summary>) -> Vec<ThresholdError> {
        if self.is_empty() {
            return vec![];
        }

        let Some(summary) = summary else {
            return vec![ThresholdError::NoData];
        };

        let mut violations = vec![];

        if let Some(minimum) = self.min_success_rate {
            if summary.success_rate < minimum {
                violations.push(ThresholdError::SuccessRate {
                    actual: summary.success_rate,
                    minimum,
                });
            }
        }

        let latencies = [
            ("Average", summary.avg, self.max_avg),
            ("Median", summary.median, self.max_median),
            ("P95", summary.p95, self.max_p95),
            ("P99", summary.p99, self.max_p99),
            ("Max", summary.max, self.max_response),
        ];
        for (metric, actual, limit) in latencies {
            if let Some(limit) = limit {
                if actual >= limit {
                    violations.push(ThresholdError::Latency {
                        metric,
                        actual,
                        limit,
                    });
                }
            }
        }

        violations
    }
}
