use std::sync::Arc;

use prop_assist::api::api_routes;
use prop_assist::config::Config;
use prop_assist::dispatch::delay::RandomizedDelay;
use prop_assist::dispatch::draft::HttpDraftService;
use prop_assist::dispatch::orchestrator::DispatchOrchestrator;
use prop_assist::dispatch::workers::HttpWorkerFinder;
use prop_assist::error::Error;
use prop_assist::store::MessageStore;
use prop_assist::triage::feed::{CategorizationFeed, HttpCategorizationFeed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().map_err(Error::from)?;

    eprintln!("🏠 Prop Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Worklist API: http://0.0.0.0:{}/api/worklist", config.listen_port);
    eprintln!("   Worklist WS: ws://0.0.0.0:{}/ws", config.listen_port);
    eprintln!("   Categorizer feed: {}", config.feed_base_url);
    eprintln!("   Draft service: {}", config.drafter_base_url);

    // One client for all outbound calls; the timeout bounds every request
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    // ── Store + adapters ────────────────────────────────────────────────
    let store = MessageStore::with_seed();
    let feed: Arc<dyn CategorizationFeed> = Arc::new(HttpCategorizationFeed::new(
        config.feed_base_url.clone(),
        client.clone(),
    ));

    // Best-effort initial merge — an unreachable feed degrades to the
    // seeded messages, it never blocks startup
    match feed.fetch().await {
        Ok(messages) => store.merge_feed(messages).await,
        Err(e) => tracing::warn!(error = %e, "Starting with local messages only"),
    }
    eprintln!("   Messages: {} in worklist", store.len().await);

    // ── Dispatch ────────────────────────────────────────────────────────
    let finder = Arc::new(HttpWorkerFinder::new(
        config.feed_base_url.clone(),
        client.clone(),
    ));
    let drafter = Arc::new(HttpDraftService::new(
        config.drafter_base_url.clone(),
        client,
        config.draft_max_retries,
        config.draft_retry_backoff,
    ));
    let delay = Arc::new(RandomizedDelay::new(
        config.search_delay_min,
        config.search_delay_max,
    ));
    let orchestrator = Arc::new(DispatchOrchestrator::new(
        Arc::clone(&store),
        finder,
        drafter,
        delay,
    ));

    // ── Server ──────────────────────────────────────────────────────────
    let app = api_routes(store, feed, orchestrator);
    let listener =
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.listen_port)).await?;
    tracing::info!(port = config.listen_port, "Worklist server started");
    axum::serve(listener, app).await?;

    Ok(())
}
