//! Test utilities for database operations.
//!
//! Provides an in-memory `SQLite` ledger with migrations applied.

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::repositories::IncidentLedger;

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh in-memory database and run all migrations.
    ///
    /// The pool is pinned to a single connection; every `SQLite` memory
    /// connection is its own database.
    pub async fn new() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        crate::migrate(&conn)
            .await
            .map_err(|e| DbErr::Custom(e.to_string()))?;

        info!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Ledger over this database.
    #[must_use]
    pub fn ledger(&self) -> IncidentLedger {
        IncidentLedger::new(self.connection())
    }
}
