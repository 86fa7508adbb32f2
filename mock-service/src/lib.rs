//! Mock storefront used as a load target by the integration tests and for trying out the CLI.
use axum::{
    debug_handler,
    extract::{Path, Query},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use lazy_static::lazy_static;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/deals/", get(deals))
        .route("/client/panier/", get(cart))
        .route("/delay/ms/:delay_ms", get(delay))
        .route("/status/:code", get(status))
        .route("/max/:max_tps/scenario/:scenario_name", get(max))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}

pub async fn run(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    serve(listener).await
}

const HOME_PAGE: &str = "<!doctype html><html><head><title>Cooldeal</title></head>\
<body><h1>Cooldeal</h1><a href=\"/deals/\">Deals</a> <a href=\"/client/panier/\">Cart</a></body></html>";

#[debug_handler]
pub async fn home() -> Html<&'static str> {
    counter!("mock-service.requests", "route" => "home").increment(1);
    tokio::time::sleep(Duration::from_millis(1)).await;
    Html(HOME_PAGE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: u32,
    pub title: String,
    pub category: String,
    pub price_cents: u64,
}

lazy_static! {
    static ref CATALOGUE: Vec<Deal> = [
        (1, "Dinner for two", "restaurant", 4_990),
        (2, "Day at the spa", "spa", 7_900),
        (3, "Weekend hotel stay", "hotel", 15_900),
        (4, "Haircut and styling", "coiffure", 2_500),
        (5, "Relaxing massage", "massage", 5_900),
        (6, "Brunch buffet", "restaurant", 2_990),
    ]
    .into_iter()
    .map(|(id, title, category, price_cents)| Deal {
        id,
        title: title.to_string(),
        category: category.to_string(),
        price_cents,
    })
    .collect();
}

#[derive(Debug, Deserialize)]
pub struct DealsQuery {
    search: Option<String>,
}

#[debug_handler]
pub async fn deals(Query(query): Query<DealsQuery>) -> Json<Vec<Deal>> {
    counter!("mock-service.requests", "route" => "deals").increment(1);
    tokio::time::sleep(Duration::from_millis(2)).await;

    let term = query.search.unwrap_or_default().to_lowercase();
    let deals = CATALOGUE
        .iter()
        .filter(|deal| {
            term.is_empty()
                || deal.category.contains(&term)
                || deal.title.to_lowercase().contains(&term)
        })
        .cloned()
        .collect();
    Json(deals)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<Deal>,
    pub total_cents: u64,
}

#[debug_handler]
pub async fn cart() -> Json<Cart> {
    counter!("mock-service.requests", "route" => "cart").increment(1);
    tokio::time::sleep(Duration::from_millis(1)).await;
    Json(Cart::default())
}

#[debug_handler]
pub async fn delay(Path(delay_ms): Path<u64>) {
    counter!("mock-service.requests", "route" => "delay").increment(1);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

#[debug_handler]
pub async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    counter!("mock-service.requests", "route" => "status").increment(1);
    match StatusCode::from_u16(code) {
        Ok(status) => (status, status.to_string()),
        Err(_) => (StatusCode::BAD_REQUEST, format!("Invalid status code {code}")),
    }
}

lazy_static! {
    static ref MAX_MAP: Arc<RwLock<HashMap<String, Arc<DefaultDirectRateLimiter>>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

/// Accepts `max_tps` requests per second per scenario name, and answers 500 beyond that.
#[debug_handler]
pub async fn max(
    Path((max_tps, scenario_name)): Path<(u32, String)>,
) -> Result<(), StatusCode> {
    counter!("mock-service.requests", "route" => "max").increment(1);
    let max_tps = NonZeroU32::new(max_tps).ok_or(StatusCode::BAD_REQUEST)?;

    let existing = MAX_MAP
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&scenario_name)
        .cloned();
    let limiter = match existing {
        Some(limiter) => limiter,
        None => MAX_MAP
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(scenario_name)
            .or_insert_with(|| Arc::new(rate_limiter(max_tps)))
            .clone(),
    };

    match limiter.check() {
        Ok(_) => Ok(()),
        Err(_) => {
            debug!("Rate limit exceeded");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/** Utils **/

pub fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}
