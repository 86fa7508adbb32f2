use anyhow::bail;
use clap::Parser;
use loadstat::prelude::*;
use metrics_exporter_prometheus::PrometheusBuilder;
use reqwest::Client;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod target;

use cli::Cli;
use target::HttpTarget;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("loadstat=info,loadstat_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    if let Some(addr) = args.metrics_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        info!("Serving Prometheus metrics on {addr}");
    }

    let target = HttpTarget::new(
        Client::builder().build()?,
        args.url.clone(),
        args.queries.clone(),
        args.ignore_status,
    );
    let scenario = Scenario::new(&args.scenario_name(), move || target.clone().request());
    let stats = args.configure(scenario).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{stats}");
    }

    let thresholds = args.thresholds();
    let violations: Vec<_> = stats
        .stages
        .iter()
        .flat_map(|stage| thresholds.check_all(stage.summary.as_ref()))
        .collect();

    for violation in &violations {
        error!("{violation}");
    }
    if !violations.is_empty() {
        bail!("{} threshold check(s) failed", violations.len());
    }

    Ok(())
}
