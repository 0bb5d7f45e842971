//! Basic usage example of the folio cache layer.

use folio_cache::{
    conditional::{evaluate, format_http_date, ConditionalContext},
    error::Result,
    freshness::{classes, FreshnessOverride, Visibility},
    memoize, CacheConfig, CacheStore, DefaultCacheStore, FreshnessPolicy, KeyNamespace,
};
use http::header::{CACHE_CONTROL, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use http::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;

/// Example entity: Project shown on a portfolio
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
struct Project {
    id: String,
    portfolio_id: String,
    title: String,
    stars: u32,
    tags: Vec<String>,
}

/// Mock database lookup
async fn fetch_project(id: &str) -> Option<Project> {
    println!("  [DB] Fetching project: {}", id);

    match id {
        "proj_001" => Some(Project {
            id: id.to_string(),
            portfolio_id: "p_001".to_string(),
            title: "Toy compiler".to_string(),
            stars: 120,
            tags: vec!["rust".to_string(), "llvm".to_string()],
        }),
        "proj_002" => Some(Project {
            id: id.to_string(),
            portfolio_id: "p_001".to_string(),
            title: "Key-value store".to_string(),
            stars: 48,
            tags: vec!["storage".to_string()],
        }),
        _ => None,
    }
}

/// Read-through lookup: cache first, database on a miss
async fn project(store: &DefaultCacheStore, id: &str) -> Option<Project> {
    let key = KeyNamespace::Portfolio.key(format!("project:{}", id));

    if let Some(cached) = store.get::<Project>(&key).await {
        println!("  [CACHE] Hit: {}", key);
        return Some(cached);
    }

    let project = fetch_project(id).await?;
    store
        .set(&key, &project, Some(Duration::from_secs(300)))
        .await;
    Some(project)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("=== Folio Cache Basic Usage Example ===\n");

    // Setup: REDIS_URL unset means in-process caching
    let store = DefaultCacheStore::from_config(&CacheConfig::from_env());
    println!("Cache availability: {}", store.connect().await);
    println!("Serving from: {}\n", store.backend_name());

    // Example 1: Read-through caching
    println!("--- Example 1: Read-through caching ---");
    let first = project(&store, "proj_001").await;
    let second = project(&store, "proj_001").await;
    assert_eq!(first, second);
    println!("Project: {:?}\n", second);

    // Example 2: Missing entity
    println!("--- Example 2: Missing entity ---");
    println!("Result: {:?}\n", project(&store, "nonexistent").await);

    // Example 3: Namespace invalidation
    println!("--- Example 3: Namespace invalidation ---");
    project(&store, "proj_002").await;
    store
        .set(&KeyNamespace::Template.key("minimal"), "<html/>", None)
        .await;
    store.clear_pattern(KeyNamespace::Portfolio.pattern()).await;
    println!(
        "Template survives portfolio invalidation: {:?}",
        store
            .get::<String>(&KeyNamespace::Template.key("minimal"))
            .await
    );
    project(&store, "proj_002").await;
    println!();

    // Example 4: Memoized expensive work
    println!("--- Example 4: Memoization ---");
    let analytics = memoize(
        CacheStore::local(),
        KeyNamespace::Analytics.prefix(),
        Some(Duration::from_secs(300)),
        |(portfolio, days): (String, u32)| async move {
            println!("  [WORK] Aggregating {} days for {}", days, portfolio);
            Ok::<_, Infallible>(days * 17)
        },
    );
    let visits = analytics.call(("p_001".to_string(), 30)).await;
    let again = analytics.call(("p_001".to_string(), 30)).await;
    println!("Visits: {:?} / {:?}\n", visits, again);

    // Example 5: Freshness headers
    println!("--- Example 5: Freshness headers ---");
    let policy = FreshnessPolicy::default();
    for class in [classes::TEMPLATES, classes::PORTFOLIOS, classes::REALTIME] {
        let headers = policy.headers_for(class, None);
        println!("{:<18} {:?}", class, headers[CACHE_CONTROL]);
    }
    let published = FreshnessOverride::default().with_visibility(Visibility::Public);
    println!(
        "{:<18} {:?}\n",
        "portfolios (pub)",
        policy.headers_for(classes::PORTFOLIOS, Some(&published))[CACHE_CONTROL]
    );

    // Example 6: Conditional requests
    println!("--- Example 6: Conditional requests ---");
    let Some(body) = project(&store, "proj_001").await else {
        return Ok(());
    };
    let modified = chrono::Utc::now();
    let ctx = ConditionalContext::for_payload(&body, Some(modified))?;
    println!("ETag: {:?}", ctx.entity_tag);

    let mut request = HeaderMap::new();
    if let Some(etag) = ctx.header_value() {
        request.insert(IF_NONE_MATCH, etag);
    }
    println!(
        "If-None-Match match   -> 304: {}",
        evaluate::<String>(&request, &ctx).is_not_modified()
    );

    let mut request = HeaderMap::new();
    request.insert(IF_NONE_MATCH, HeaderValue::from_static("\"stale\""));
    println!(
        "If-None-Match differs -> 304: {}",
        evaluate::<String>(&request, &ctx).is_not_modified()
    );

    let mut request = HeaderMap::new();
    if let Ok(since) = HeaderValue::from_str(&format_http_date(modified)) {
        request.insert(IF_MODIFIED_SINCE, since);
    }
    println!(
        "If-Modified-Since     -> 304: {}",
        evaluate::<String>(&request, &ctx).is_not_modified()
    );

    store.disconnect().await;
    println!("\n=== Example completed successfully ===");
    Ok(())
}
