//! Durable storage for warden: the incident table and its ledger.

pub mod entities;
pub mod migrations;
pub mod repositories;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, log::LevelFilter};
use warden_common::{AppError, AppResult, DatabaseConfig};

/// Open the connection pool described by `config`.
///
/// `SQLite` allows a single writer, so a `sqlite:` URL always gets a
/// one-connection pool regardless of `max_connections`.
pub async fn init(config: &DatabaseConfig) -> AppResult<DatabaseConnection> {
    let sqlite = config.url.starts_with("sqlite:");
    let max_connections = if sqlite { 1 } else { config.max_connections };

    let mut opt = ConnectOptions::new(&config.url);
    opt.max_connections(max_connections)
        .min_connections(config.min_connections.min(max_connections))
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    debug!(sqlite, max_connections, "Opening database pool");

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Apply pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> AppResult<()> {
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
