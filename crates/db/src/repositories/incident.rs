//! Incident ledger: durable record of every moderation incident.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use warden_common::{AppError, AppResult};

use crate::entities::{
    Incident,
    incident::{self, Conclusion, IncidentAction},
};

/// Incident ledger backed by the `incident` table.
///
/// An incident is part of the ledger until it is concluded. Concluding is a
/// conditional update on `concluded_at IS NULL`, so concurrent writers on the
/// same ID are serialized by the database and exactly one of them wins.
#[derive(Clone)]
pub struct IncidentLedger {
    db: Arc<DatabaseConnection>,
}

impl IncidentLedger {
    /// Create a new incident ledger.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record a new incident. The ID is assigned by the database.
    pub async fn put(&self, model: incident::ActiveModel) -> AppResult<incident::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an incident that is still in the ledger.
    pub async fn get(&self, id: i64) -> AppResult<incident::Model> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Incident {id} not found")))
    }

    /// Find an incident that is still in the ledger.
    pub async fn find(&self, id: i64) -> AppResult<Option<incident::Model>> {
        Incident::find_by_id(id)
            .filter(incident::Column::ConcludedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an incident record regardless of whether it has been concluded.
    pub async fn find_record(&self, id: i64) -> AppResult<Option<incident::Model>> {
        Incident::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove an incident from the ledger.
    ///
    /// Returns `true` if this call concluded the incident and `false` if it
    /// was unknown or already concluded.
    pub async fn delete(&self, id: i64, conclusion: Conclusion) -> AppResult<bool> {
        let update = incident::ActiveModel {
            concluded_at: Set(Some(chrono::Utc::now().into())),
            conclusion: Set(Some(conclusion)),
            ..Default::default()
        };

        let result = Incident::update_many()
            .set(update)
            .filter(incident::Column::Id.eq(id))
            .filter(incident::Column::ConcludedAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// All time-bounded incidents that are still in the ledger.
    pub async fn scan_active(&self) -> AppResult<Vec<incident::Model>> {
        Incident::find()
            .filter(incident::Column::ConcludedAt.is_null())
            .filter(incident::Column::Action.is_in(IncidentAction::TIME_BOUNDED))
            .order_by_asc(incident::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Time-bounded incidents still in effect for a guild.
    pub async fn active_in_guild(&self, guild_id: &str) -> AppResult<Vec<incident::Model>> {
        Incident::find()
            .filter(incident::Column::GuildId.eq(guild_id))
            .filter(incident::Column::ConcludedAt.is_null())
            .filter(incident::Column::Action.is_in(IncidentAction::TIME_BOUNDED))
            .order_by_asc(incident::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every incident recorded against a member, newest first.
    pub async fn history(
        &self,
        guild_id: &str,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<incident::Model>> {
        Incident::find()
            .filter(incident::Column::GuildId.eq(guild_id))
            .filter(incident::Column::UserId.eq(user_id))
            .order_by_desc(incident::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
