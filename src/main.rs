use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;

use lostfound_backend::core::config::{AppPaths, ConfigService};
use lostfound_backend::core::logging;
use lostfound_backend::ratelimit::spawn_sweeper;
use lostfound_backend::server::router::router;
use lostfound_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_service = ConfigService::new(Arc::new(AppPaths::new()));
    logging::init(config_service.paths());

    let config = config_service
        .load_app_config()
        .context("Failed to load configuration")?;
    let effective = serde_json::to_value(&config).context("Failed to serialize configuration")?;
    tracing::info!(
        "Loaded configuration from {}: {}",
        config_service.paths().config_path.display(),
        config_service.redact_sensitive_values(&effective)
    );

    let bind_addr = config.server.bind_addr();
    let sweep_every = config.rate_limit.sweep_interval_secs;

    let state = AppState::initialize(config).context("Failed to initialize application state")?;
    if sweep_every > 0 {
        spawn_sweeper(state.governor.clone(), Duration::from_secs(sweep_every));
    }

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!(
        provider = %state.provider.kind,
        chat_model = %state.provider.chat_model,
        embedding_model = %state.provider.embedding_model,
        "Listening on {}",
        addr
    );

    let app = router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
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
