//! Audiodrop API Server
//!
//! Main entry point for the Audiodrop audio extraction service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use audiodrop_api::{AppState, create_router};
use audiodrop_core::delivery::{Delivery, StoreAndLink, StreamAndDiscard};
use audiodrop_core::download::DownloadService;
use audiodrop_core::extraction::YtDlpExtractor;
use audiodrop_core::storage::StorageService;
use audiodrop_core::workspace::WorkspaceManager;
use audiodrop_shared::{AppConfig, DeliveryMode, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(config.log.format);

    // Object storage or streaming
    let delivery = build_delivery(&config)?;

    // Workspaces: clear anything a previous process left behind
    let workspaces = WorkspaceManager::new(config.workspace.root_dir());
    let stale_after = Duration::from_secs(config.workspace.stale_after_secs);
    match workspaces.sweep_stale(stale_after).await {
        Ok(removed) => info!(
            root = %workspaces.root().display(),
            removed,
            "Workspace root ready"
        ),
        Err(e) => warn!(error = %e, "Stale workspace sweep failed"),
    }

    let extractor = YtDlpExtractor::from_config(&config.extractor);
    info!(
        program = %config.extractor.program,
        codec = %config.extractor.codec,
        timeout_secs = ?config.extractor.timeout_secs,
        "Extractor configured"
    );

    // Create application state
    let service = DownloadService::new(
        workspaces,
        Arc::new(extractor),
        config.extractor.clone(),
        delivery,
    );
    let state = AppState::new(service);

    // Create router
    let app = create_router(state, &config.cors);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(delivery = ?config.delivery.mode, "Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize the tracing subscriber.
fn init_tracing(format: LogFormat) {
    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audiodrop=debug,tower_http=debug".into()),
        )
        .with(fmt_layer)
        .init();
}

/// Build the delivery strategy selected in configuration.
fn build_delivery(config: &AppConfig) -> anyhow::Result<Delivery> {
    match config.delivery.mode {
        DeliveryMode::Stream => Ok(Delivery::Stream(StreamAndDiscard)),
        DeliveryMode::Link => {
            let settings = config
                .storage
                .as_ref()
                .context("delivery mode 'link' requires a [storage] section")?;
            let storage = StorageService::from_settings(settings)?;
            info!(
                endpoint = %settings.endpoint,
                bucket = %settings.bucket,
                link_ttl_secs = settings.link_ttl_secs,
                "Object storage configured"
            );

            let ttl = storage.link_ttl();
            Ok(Delivery::Link(StoreAndLink::new(Arc::new(storage)).with_ttl(ttl)))
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
