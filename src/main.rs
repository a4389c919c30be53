use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use formguard::clock::SystemClock;
use formguard::config::Config;
use formguard::store::{FileStore, KeyValueStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Load config
    let config = Config::from_env().expect("Failed to load configuration");

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting FormGuard");

    let store: Arc<dyn KeyValueStore> = match &config.store_path {
        Some(path) => {
            let store = FileStore::open(path).expect("Failed to open durable store");
            tracing::info!("Durable store at {path}");
            Arc::new(store)
        }
        None => {
            tracing::info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = SocketAddr::new(config.host, config.port);
    let cleanup_every = std::time::Duration::from_secs(config.cleanup_interval_secs.max(1));
    let (app, state) = formguard::build_app(config, store, Arc::new(SystemClock))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup = formguard::sweeper::spawn(state, cleanup_every, shutdown_rx);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(true);
    let _ = cleanup.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
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

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
