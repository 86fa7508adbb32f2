use clap::Parser;
use loadstat::prelude::*;
use reqwest::Url;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(version, about = "Load test an HTTP endpoint and report response time statistics")]
pub struct Cli {
    /// URL requested by every trial
    #[arg(long)]
    pub url: Url,

    /// Scenario name used in the report (defaults to the URL path)
    #[arg(long)]
    pub name: Option<String>,

    /// Number of concurrent users
    #[arg(short, long, default_value_t = 10)]
    pub users: usize,

    /// Total number of requests for a batch run (defaults to one per user)
    #[arg(short, long)]
    pub requests: Option<usize>,

    /// Keep every user busy for this long instead of running a fixed batch
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// Pause between two requests of a user during a sustained run
    #[arg(long, value_parser = humantime::parse_duration, default_value = "500ms")]
    pub think_time: Duration,

    /// Per-request timeout
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub timeout: Duration,

    /// Progressive stress test, one batch per concurrency level (e.g. `10,25,50`)
    #[arg(long, value_delimiter = ',')]
    pub stages: Vec<usize>,

    /// Pause between progressive stages
    #[arg(long, value_parser = humantime::parse_duration, default_value = "2s")]
    pub stage_pause: Duration,

    /// Query parameter as `key=value`; when repeated, trials cycle through them
    #[arg(short, long = "query", value_parser = parse_key_value)]
    pub queries: Vec<(String, String)>,

    /// Count every HTTP response as a success, whatever its status
    #[arg(long)]
    pub ignore_status: bool,

    #[arg(long)]
    pub min_success_rate: Option<f64>,

    #[arg(long, value_parser = humantime::parse_duration)]
    pub max_avg: Option<Duration>,

    #[arg(long, value_parser = humantime::parse_duration)]
    pub max_p95: Option<Duration>,

    #[arg(long, value_parser = humantime::parse_duration)]
    pub max_p99: Option<Duration>,

    /// Print the statistics as JSON instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Serve Prometheus metrics on this address while the test runs
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    pub fn scenario_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.url.path().to_string())
    }

    pub fn configure<S: ConfigurableScenario<RunStatistics>>(&self, scenario: S) -> S {
        let mut scenario = scenario
            .users(self.users)
            .think_time(self.think_time)
            .timeout(self.timeout)
            .stage_pause(self.stage_pause);

        if let Some(requests) = self.requests {
            scenario = scenario.requests(requests);
        }
        if let Some(duration) = self.duration {
            scenario = scenario.duration(duration);
        }
        if !self.stages.is_empty() {
            scenario = scenario.stages(self.stages.clone());
        }
        scenario
    }

    pub fn thresholds(&self) -> Thresholds {
        let mut thresholds = Thresholds::new();
        if let Some(rate) = self.min_success_rate {
            thresholds = thresholds.min_success_rate(rate);
        }
        if let Some(limit) = self.max_avg {
            thresholds = thresholds.max_avg(limit);
        }
        if let Some(limit) = self.max_p95 {
            thresholds = thresholds.max_p95(limit);
        }
        if let Some(limit) = self.max_p99 {
            thresholds = thresholds.max_p99(limit);
        }
        thresholds
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected `key=value`, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
