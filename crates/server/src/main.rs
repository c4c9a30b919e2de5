//! Warden server entry point.
//!
//! Connects the ledger, recovers outstanding reversals and keeps the reversal
//! engine running until the process is asked to stop.

mod discord;

use std::sync::Arc;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_common::Config;
use warden_core::{ModerationService, RetryPolicy, ReversalEngine};
use warden_db::repositories::IncidentLedger;

use crate::discord::DiscordPlatform;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warden=debug,warden_core=debug,warden_db=info".into()),
        )
        .init();

    info!("Starting warden...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = warden_db::init(&config.database).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    warden_db::migrate(&db).await?;
    info!("Migrations completed");

    let ledger = IncidentLedger::new(Arc::new(db));
    let platform = Arc::new(DiscordPlatform::new(&config.platform)?);
    let engine = ReversalEngine::new(
        ledger.clone(),
        platform,
        RetryPolicy::from(&config.reversal),
    );

    // Recovery must finish before any command reaches the service
    let (_moderation, report) = ModerationService::start(ledger, engine.clone()).await?;
    info!(
        rearmed = report.rearmed,
        expired = report.expired,
        skipped = report.skipped,
        "Moderation service ready"
    );

    shutdown_signal().await;

    engine.shutdown().await;
    info!("Server shutdown complete");

    Ok(())
}
