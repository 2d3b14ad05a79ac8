use bearer_posts::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    models::demo_posts,
    repository::{InMemoryPostStore, PostStoreState},
};
use std::{process::ExitCode, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, builds the post store and serves
/// the router until the process is stopped.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise verbose defaults for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bearer_posts=debug,tower_http=info,axum=trace".into());

    // Pretty output locally, JSON for log aggregation in production.
    let json_logs = matches!(&config, Ok(config) if config.env == Env::Production);
    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("FATAL: invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Application starting in {:?} mode", config.env);
    if config.env == Env::Local && std::env::var("ACCESS_TOKEN_SECRET").is_err() {
        tracing::warn!("ACCESS_TOKEN_SECRET not set, using the local development secret");
    }

    // 3. Post Store
    let store = if config.seed_demo_posts {
        InMemoryPostStore::with_posts(demo_posts())
    } else {
        InMemoryPostStore::new()
    };
    let store = Arc::new(store) as PostStoreState;

    // 4. Listener
    // Binding through (host, port) lets tokio resolve names like `localhost`.
    let listener = match TcpListener::bind((config.host.as_str(), config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("FATAL: failed to bind {}:{}: {}", config.host, config.port, e);
            return ExitCode::FAILURE;
        }
    };
    let local_addr = listener.local_addr().map(|addr| addr.to_string());
    let port = config.port;

    // 5. Router and Server Startup
    let app = create_router(AppState::new(config, store));

    tracing::info!("Listening on {}", local_addr.as_deref().unwrap_or("unknown address"));
    tracing::info!(
        "API Documentation (Swagger UI) available at: http://localhost:{}/swagger-ui",
        port
    );

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
