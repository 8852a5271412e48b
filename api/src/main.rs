use std::sync::Arc;
use std::time::Duration;

use bookstore::cache::{DisabledCache, RedisCache, ResponseCache};
use bookstore::config::Config;
use bookstore::{db, rest, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "bookstore=debug,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::connect(&config.database_url).await?;
    db::MIGRATOR.run(&pool).await?;

    let cache: Arc<dyn ResponseCache> = match RedisCache::connect(&config.cache_addr).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            tracing::error!("redis unavailable, running without cache: {}", e);
            Arc::new(DisabledCache)
        }
    };

    let app_state = AppState::new(pool, cache, &config)?;
    let app = rest::router(
        app_state,
        Duration::from_secs(config.request_timeout_secs),
    );

    let addr = config.bind_addr();
    tracing::info!("REST API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down");
}
