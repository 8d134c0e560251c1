use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use text_analyzer::{
    cache::MemoryCache,
    config::{resolve_jwt_secret, ServerConfig},
    create_router, AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "text-analyzer")]
#[command(about = "Text analysis API with cached statistics", long_about = None)]
struct Args {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Secret used to sign session tokens (random if unset)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Session token lifetime in seconds
    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 3600)]
    token_ttl_secs: u64,

    /// Allowed CORS origin (any origin when unset)
    #[arg(long, env = "CLIENT_URL")]
    client_url: Option<String>,

    /// Default cache entry lifetime in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 300)]
    cache_ttl_secs: u64,

    /// Lifetime of the cached text listing in seconds
    #[arg(long, env = "LIST_CACHE_TTL_SECS", default_value_t = 60)]
    list_cache_ttl_secs: u64,

    /// Interval between expired cache entry sweeps in seconds
    #[arg(long, env = "CACHE_CHECK_PERIOD_SECS", default_value_t = 120)]
    cache_check_period_secs: u64,

    /// Requests allowed per client per window (0 disables limiting)
    #[arg(long, env = "RATE_LIMIT_MAX", default_value_t = 100)]
    rate_limit_max: usize,

    /// Rate limit window in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = 900)]
    rate_limit_window_secs: u64,

    /// Trust `X-Forwarded-For` from a reverse proxy for rate limiting
    #[arg(long, env = "TRUST_PROXY")]
    trust_proxy: bool,

    /// Reject texts without a title
    #[arg(long, env = "REQUIRE_TITLE")]
    require_title: bool,

    /// Restrict statistics endpoints to the text owner
    #[arg(long, env = "OWNER_ONLY_STATISTICS")]
    owner_only_statistics: bool,

    /// Mark the session cookie `Secure`
    #[arg(long, env = "SECURE_COOKIES")]
    secure_cookies: bool,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            jwt_secret: resolve_jwt_secret(self.jwt_secret),
            token_ttl_secs: self.token_ttl_secs,
            client_url: self.client_url,
            cache_ttl_secs: self.cache_ttl_secs,
            list_cache_ttl_secs: self.list_cache_ttl_secs,
            cache_check_period_secs: self.cache_check_period_secs,
            rate_limit_max: self.rate_limit_max,
            rate_limit_window_secs: self.rate_limit_window_secs,
            trust_proxy: self.trust_proxy,
            require_title: self.require_title,
            owner_only_statistics: self.owner_only_statistics,
            secure_cookies: self.secure_cookies,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment-specific file first so its values win
    if let Ok(env) = std::env::var("APP_ENV") {
        dotenvy::from_filename(format!(".env.{}", env)).ok();
    }
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "text_analyzer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.into_config();

    let cache = MemoryCache::with_ttl(Duration::from_secs(config.cache_ttl_secs));
    let janitor = cache.spawn_janitor(Duration::from_secs(config.cache_check_period_secs.max(1)));
    tracing::info!(
        ttl_secs = config.cache_ttl_secs,
        check_period_secs = config.cache_check_period_secs,
        "Cache initialized"
    );

    let addr = config.bind_addr();
    let sweep_period = config
        .rate_limit_window()
        .clamp(Duration::from_secs(1), Duration::from_secs(60));
    let state = AppState::in_memory(config, cache);
    let sweeper = state
        .rate_limiter
        .is_enabled()
        .then(|| state.rate_limiter.clone().spawn_sweeper(sweep_period));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    janitor.abort();
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
