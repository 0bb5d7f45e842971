use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, TimeZone, Utc};
use folio_cache::{
    conditional::{evaluate, Conditional, ConditionalContext},
    freshness::classes,
    memoize,
    observability::CacheMetrics,
    CacheConfig, DefaultCacheStore, FreshnessPolicy, KeyNamespace,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Portfolio entity
#[derive(Clone, Serialize, Deserialize, Debug)]
struct Portfolio {
    id: String,
    owner: String,
    title: String,
    bio: String,
    updated_at: DateTime<Utc>,
}

/// Mock portfolio database
async fn load_portfolio(id: &str) -> Option<Portfolio> {
    // Simulate database fetch with some delay
    tokio::time::sleep(Duration::from_millis(10)).await;

    let (owner, title) = match id {
        "p_001" => ("alice", "Alice Johnson - Systems Engineer"),
        "p_002" => ("bob", "Bob Smith - Product Designer"),
        _ => return None,
    };

    Some(Portfolio {
        id: id.to_string(),
        owner: owner.to_string(),
        title: title.to_string(),
        bio: format!("{} builds things people use.", owner),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single()?,
    })
}

/// Mock AI summary generation
async fn generate_summary(bio: String) -> Result<String, String> {
    // Simulate a slow upstream model call
    tokio::time::sleep(Duration::from_millis(200)).await;
    Ok(format!("In short: {}", bio))
}

/// Counters exported at /metrics
#[derive(Clone, Default)]
struct CounterMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    fallbacks: Arc<AtomicU64>,
}

impl CacheMetrics for CounterMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self, _key: &str, _duration: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_fallback(&self, _operation: &str) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }
}

/// Application state
#[derive(Clone)]
struct AppState {
    store: DefaultCacheStore,
    policy: Arc<FreshnessPolicy>,
    metrics: CounterMetrics,
}

/// Cached, conditionally served portfolio
async fn get_portfolio(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let key = KeyNamespace::Portfolio.key(&id);

    let portfolio = match state.store.get::<Portfolio>(&key).await {
        Some(portfolio) => portfolio,
        None => match load_portfolio(&id).await {
            Some(portfolio) => {
                state
                    .store
                    .set(&key, &portfolio, Some(Duration::from_secs(300)))
                    .await;
                portfolio
            }
            None => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": "Portfolio not found"})),
                )
                    .into_response()
            }
        },
    };

    let ctx = match ConditionalContext::for_payload(&portfolio, Some(portfolio.updated_at)) {
        Ok(ctx) => ctx,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let response = match evaluate::<Body>(&headers, &ctx) {
        Conditional::NotModified(not_modified) => not_modified,
        Conditional::Proceed => Json(&portfolio).into_response(),
    };

    state
        .policy
        .decorate(response, classes::PUBLIC_PORTFOLIOS, None, Some(&ctx))
}

/// Memoized AI summary of a portfolio bio
async fn get_summary(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    let Some(portfolio) = load_portfolio(&id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let summarize = memoize(
        state.store.clone(),
        KeyNamespace::AiResult.prefix(),
        Some(Duration::from_secs(600)),
        generate_summary,
    );

    match summarize.call(portfolio.bio).await {
        Ok(summary) => state.policy.decorate(
            Json(json!({ "summary": summary })).into_response(),
            classes::AI_RESULTS,
            None,
            None,
        ),
        Err(e) => (StatusCode::BAD_GATEWAY, Json(json!({ "error": e }))).into_response(),
    }
}

/// Drop every cached portfolio, e.g. after a theme change
async fn invalidate_portfolios(State(state): State<AppState>) -> StatusCode {
    state
        .store
        .clear_pattern(KeyNamespace::Portfolio.pattern())
        .await;
    StatusCode::NO_CONTENT
}

/// Metrics endpoint
async fn metrics_handler(State(state): State<AppState>) -> String {
    format!(
        "cache_hits {}\ncache_misses {}\ncache_fallback_ops {}\n",
        state.metrics.hits.load(Ordering::Relaxed),
        state.metrics.misses.load(Ordering::Relaxed),
        state.metrics.fallbacks.load(Ordering::Relaxed),
    )
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "folio-cache-axum-example",
        "cache": state.store.availability().to_string(),
        "cache_backend": state.store.backend_name(),
    }))
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .ok();

    // Initialize cache with metrics; REDIS_URL selects the networked backend
    let metrics = CounterMetrics::default();
    let store = DefaultCacheStore::from_config(&CacheConfig::from_env())
        .with_metrics(metrics.clone());
    store.connect().await;

    let state = AppState {
        store,
        policy: Arc::new(FreshnessPolicy::default()),
        metrics,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/api/portfolios/{id}", get(get_portfolio))
        .route("/api/portfolios/{id}/summary", get(get_summary))
        .route(
            "/api/portfolios/invalidate",
            axum::routing::post(invalidate_portfolios),
        )
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("Failed to bind port 3000");

    println!("Server running on http://127.0.0.1:3000");
    println!("API endpoint: http://127.0.0.1:3000/api/portfolios/p_001");
    println!("AI summary: http://127.0.0.1:3000/api/portfolios/p_001/summary");
    println!("Metrics endpoint: http://127.0.0.1:3000/metrics");
    println!("Health check: http://127.0.0.1:3000/health");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
