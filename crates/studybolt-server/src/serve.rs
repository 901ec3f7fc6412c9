use crate::config::Config;
use crate::http::{create_router, AppState};
use std::sync::Arc;
use studybolt_core::{
    CacheStore, ChatPipeline, MemoryCache, MistralAgentClient, RedisCache, SerpApiClient,
};
use tracing::{info, warn};

pub async fn run(config: Config) -> anyhow::Result<()> {
    info!("Starting StudyBolt API v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP: {}", config.http_addr());
    info!("Agent: {}", config.agent_id);

    let timeout = config.upstream_timeout();

    let search = Arc::new(SerpApiClient::new(
        &config.serp_base_url,
        &config.serp_api_key,
        &config.search_engine,
        timeout,
    )?);
    let completion = Arc::new(MistralAgentClient::new(
        &config.mistral_base_url,
        &config.mistral_api_key,
        &config.agent_id,
        timeout,
    )?);

    // Cache
    let cache: Arc<dyn CacheStore> = if config.uses_memory_cache() {
        warn!("Using in-process summary cache; entries are lost on restart");
        Arc::new(MemoryCache::new())
    } else {
        Arc::new(RedisCache::open(&config.redis_url, timeout)?)
    };
    match cache.ping().await {
        Ok(()) => info!("Cache connected ({})", cache.name()),
        Err(e) => warn!("Cache unreachable at startup, summaries will not be cached: {}", e),
    }

    let pipeline = ChatPipeline::new(search, completion, cache, config.pipeline_config());
    let app = create_router(AppState::new(pipeline), config.body_limit);

    let addr = config.http_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("StudyBolt API running on {}", addr);
    info!("Chat endpoint: http://{}/api/chat", addr);
    info!("Search endpoint: http://{}/api/search", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down gracefully...");
}
