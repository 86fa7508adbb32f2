mod utils;
use utils::*;

use loadstat::prelude::*;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

static CLIENT: OnceLock<Client> = OnceLock::new();

fn client() -> Client {
    CLIENT.get_or_init(Client::new).clone()
}

/// Trial issuing a GET of `path` and failing on error statuses.
fn get(path: &str) -> impl Fn() -> GetFuture + Send + Sync + Clone + 'static {
    let client = client();
    let url = mock_url(path);
    move || -> GetFuture {
        let req = client.get(&url);
        Box::pin(async move {
            req.send().await?.error_for_status()?.bytes().await?;
            Ok::<_, reqwest::Error>(())
        })
    }
}

type GetFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), reqwest::Error>> + Send>>;

fn assert_healthy(stats: &RunStatistics) {
    let thresholds = Thresholds::new()
        .min_success_rate(95.)
        .max_avg(Duration::from_secs(3));
    for stage in &stats.stages {
        thresholds
            .check(stage.summary.as_ref())
            .unwrap_or_else(|err| panic!("{}: {err}\n{stats}", stats.name));
    }
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn homepage_load() {
    init();

    let stats = Scenario::new("homepage", get("/")).users(10).await;

    let summary = stats.summary().unwrap();
    assert_eq!(summary.total, 10);
    assert_eq!(summary.success_count, 10);
    assert_healthy(&stats);
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn deals_listing_load() {
    init();

    let stats = Scenario::new("deals", get("/deals/")).users(25).await;

    assert_eq!(stats.summary().unwrap().total, 25);
    assert_healthy(&stats);
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn cart_load() {
    init();

    let stats = Scenario::new("cart", get("/client/panier/"))
        .users(50)
        .await;

    assert_eq!(stats.summary().unwrap().total, 50);
    assert_healthy(&stats);
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn search_load_rotates_terms() {
    init();

    const TERMS: [&str; 5] = ["restaurant", "spa", "hotel", "coiffure", "massage"];
    let client = client();
    let url = mock_url("/deals/");
    let next = Arc::new(AtomicUsize::new(0));

    let counter = next.clone();
    let stats = Scenario::new("search", move || {
        let term = TERMS[counter.fetch_add(1, Ordering::Relaxed) % TERMS.len()];
        let req = client.get(&url).query(&[("search", term)]);
        async move {
            let deals: Vec<mock_service::Deal> = req.send().await?.error_for_status()?.json().await?;
            anyhow::ensure!(!deals.is_empty(), "no deals found for {term}");
            Ok::<_, anyhow::Error>(())
        }
    })
    .users(100)
    .await;

    assert_eq!(next.load(Ordering::Relaxed), 100);
    assert_eq!(stats.summary().unwrap().total, 100);
    assert_healthy(&stats);
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn progressive_stress() {
    init();

    let stats = Scenario::new("stress", get("/deals/"))
        .stages(vec![5, 10, 20])
        .stage_pause(Duration::from_millis(10))
        .await;

    let users: Vec<_> = stats.stages.iter().map(|s| s.users).collect();
    assert_eq!(users, vec![5, 10, 20]);
    let totals: Vec<_> = stats
        .stages
        .iter()
        .map(|s| s.summary.as_ref().unwrap().total)
        .collect();
    assert_eq!(totals, vec![5, 10, 20]);
    assert_healthy(&stats);

    let report = stats.to_string();
    assert!(report.contains("Progressive Load Summary"));
    assert!(report.contains("20 users: 100.00% success"));
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn sustained_load() {
    init();

    let stats = Scenario::new("sustained", get("/"))
        .users(5)
        .duration(Duration::from_millis(500))
        .think_time(Duration::from_millis(10))
        .await;

    assert_eq!(stats.stages.len(), 1);
    let stage = &stats.stages[0];
    assert!(stage.elapsed >= Duration::from_millis(500));
    assert!(stage.summary.as_ref().unwrap().total >= 5);
    assert_healthy(&stats);
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn slow_responses_time_out() {
    init();

    let stats = Scenario::new("slow", get("/delay/ms/500"))
        .users(4)
        .timeout(Duration::from_millis(50))
        .await;

    let summary = stats.summary().unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.failure_count, 4);
    assert_eq!(summary.success_rate, 0.);
    assert!(summary.max < Duration::from_millis(500));
    assert!(stats.stages[0]
        .errors
        .iter()
        .all(|e| e == "timed out after 50ms"));

    let err = Thresholds::new()
        .min_success_rate(95.)
        .check(Some(summary))
        .unwrap_err();
    assert!(matches!(err, ThresholdError::SuccessRate { .. }));
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn server_errors_are_failures() {
    init();

    let stats = Scenario::new("errors", get("/status/500")).users(8).await;

    let summary = stats.summary().unwrap();
    assert_eq!(summary.failure_count, 8);
    assert_eq!(summary.success_count, 0);
    assert!(stats.stages[0].errors.iter().all(|e| e.contains("500")));
    assert!(stats.to_string().contains("8x"));
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn rate_limited_route_partially_fails() {
    init();

    let stats = Scenario::new("limited", get("/max/5/scenario/load-test-limited"))
        .users(20)
        .await;

    let summary = stats.summary().unwrap();
    assert_eq!(summary.total, 20);
    assert!(summary.success_count >= 1);
    assert!(summary.failure_count >= 1);
    assert!(summary.success_rate > 0. && summary.success_rate < 100.);
}

#[scenario]
async fn homepage_macro() -> Result<(), reqwest::Error> {
    client().get(mock_url("/")).send().await?.error_for_status()?;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn scenario_macro() {
    init();

    let stats = homepage_macro().users(3).requests(9).await;

    assert_eq!(stats.name, "homepage_macro");
    assert_eq!(stats.summary().unwrap().success_count, 9);
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn trial_metrics_are_exported() {
    init();

    let _ = Scenario::new("metrics-check", get("/")).users(2).await;

    let rendered = rendered_metrics();
    assert!(rendered.contains("loadstat_trial_latency"));
    assert!(rendered.contains("metrics-check"));
}
