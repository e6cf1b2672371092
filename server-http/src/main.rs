use axum::{extract::Request, ServiceExt};
use coinwatch::auth::{MokaSessionRepository, SessionAuthGuard, SessionStore};
use coinwatch::domain::MarketSnapshot;
use coinwatch::market::CoinGeckoProvider;
use coinwatch::persistence::SledUserRepository;
use server_http::{build_router, AppState};
use shared::config::Config;
use std::sync::Arc;
use std::time::Duration;
use storage_engine::MokaCache;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Coinwatch HTTP Server...");

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = Config::from_env();

    // User records
    let data_dir = std::path::Path::new(&config.data_dir);
    std::fs::create_dir_all(data_dir)?;
    let users = Arc::new(SledUserRepository::new(data_dir.join("users.sled"))?);
    info!("User repository opened at {}", data_dir.display());

    // Market data cache and upstream
    let cache: Arc<MokaCache<String, MarketSnapshot>> =
        Arc::new(MokaCache::new("market-data", Some(config.cache_max_entries)));
    let provider = Arc::new(CoinGeckoProvider::new(
        config.coingecko_base_url.clone(),
        config.coingecko_api_key.clone(),
        Duration::from_secs(config.upstream_timeout_secs),
    )?);
    info!(
        "Market data from {} (ttl {} ms, max {} cache entries)",
        config.coingecko_base_url, config.cache_ttl.0, config.cache_max_entries
    );

    // Auth guard
    let session_store = Arc::new(SessionStore::new(Arc::new(MokaSessionRepository::default())));
    if config.static_tokens.is_empty() {
        warn!("COINWATCH_STATIC_TOKENS not set; watchlist routes accept only externally issued sessions");
    } else {
        let seeded = session_store.seed_tokens(&config.static_tokens).await?;
        info!("Seeded {} static bearer token(s)", seeded);
    }
    let auth_guard = Arc::new(SessionAuthGuard::new(session_store));

    let state = AppState::new(provider, cache, users, auth_guard, config.cache_ttl);

    // Trailing-slash normalization must wrap the router to apply before routing
    let app = NormalizePathLayer::trim_trailing_slash().layer(build_router(state));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("HTTP Server listening on http://{}", address);
    info!("Try: curl http://{}/crypto/top", address);

    // Graceful shutdown handler
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
