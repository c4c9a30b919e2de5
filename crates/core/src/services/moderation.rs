//! Moderation service: issue, query and pardon incidents.

use std::time::Duration;

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use tracing::{error, info};
use validator::Validate;
use warden_common::{AppError, AppResult};
use warden_db::entities::incident::{self, Conclusion, IncidentAction};
use warden_db::repositories::IncidentLedger;

use super::recovery::{RecoveryLoader, RecoveryReport};
use super::reversal::ReversalEngine;

/// Longest duration accepted for a time-bounded action.
const MAX_DURATION: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Input for issuing an incident.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IssueInput {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 64))]
    pub actor_id: String,
    #[validate(length(min = 1, max = 64))]
    pub guild_id: String,
    pub action: IncidentAction,
    #[validate(length(max = 2000))]
    pub reason: String,
    /// Required for time-bounded actions, ignored otherwise.
    pub duration: Option<Duration>,
}

/// Moderation facade used by the command layer.
#[derive(Clone)]
pub struct ModerationService {
    ledger: IncidentLedger,
    engine: ReversalEngine,
}

impl ModerationService {
    /// Recover outstanding reversals, then return a service ready for commands.
    pub async fn start(
        ledger: IncidentLedger,
        engine: ReversalEngine,
    ) -> AppResult<(Self, RecoveryReport)> {
        let report = RecoveryLoader::new(ledger.clone(), engine.clone())
            .run(Utc::now())
            .await?;

        Ok((Self { ledger, engine }, report))
    }

    /// Record an incident and schedule its reversal if it is time-bounded.
    pub async fn issue(&self, input: IssueInput) -> AppResult<incident::Model> {
        input.validate()?;

        let duration_ms = if input.action.is_time_bounded() {
            let duration = input.duration.filter(|d| !d.is_zero()).ok_or_else(|| {
                AppError::Validation(format!("A {} requires a duration", input.action))
            })?;
            if duration > MAX_DURATION {
                return Err(AppError::Validation("Duration too long".to_string()));
            }
            Some(duration.as_millis() as i64)
        } else {
            None
        };

        let model = incident::ActiveModel {
            user_id: Set(input.user_id),
            actor_id: Set(input.actor_id),
            guild_id: Set(input.guild_id),
            action: Set(input.action),
            reason: Set(input.reason.trim().to_string()),
            issued_at: Set(Utc::now().into()),
            duration_ms: Set(duration_ms),
            concluded_at: Set(None),
            conclusion: Set(None),
            ..Default::default()
        };

        let incident = self.ledger.put(model).await?;

        info!(
            incident_id = incident.id,
            guild = %incident.guild_id,
            user = %incident.user_id,
            actor = %incident.actor_id,
            action = %incident.action,
            "Issued incident"
        );

        if incident.action.is_time_bounded() {
            let remaining = incident.remaining_at(Utc::now());
            if let Err(e) = self.engine.arm(incident.clone(), remaining).await {
                // Still in the ledger, so recovery re-arms it on the next start
                error!(incident_id = incident.id, error = %e, "Failed to arm reversal");
                return Err(e);
            }
        }

        Ok(incident)
    }

    /// Lift an incident early without undoing it on the platform.
    pub async fn pardon(&self, id: i64) -> AppResult<()> {
        // Delete first: a timer firing in between finds the entry gone and skips the undo
        let concluded = self.ledger.delete(id, Conclusion::Pardoned).await?;
        let disarmed = self.engine.cancel(id).await;

        if !concluded {
            return Err(AppError::NotFound(format!("Incident {id} not found")));
        }

        info!(incident_id = id, disarmed, "Pardoned incident");
        Ok(())
    }

    /// Look up an incident that is still in the ledger.
    pub async fn query(&self, id: i64) -> AppResult<incident::Model> {
        self.ledger.get(id).await
    }

    /// Moderation log for a member, newest first.
    pub async fn history(
        &self,
        guild_id: &str,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<incident::Model>> {
        self.ledger.history(guild_id, user_id, limit).await
    }

    /// Restrictions currently in effect in a guild.
    pub async fn active_in_guild(&self, guild_id: &str) -> AppResult<Vec<incident::Model>> {
        self.ledger.active_in_guild(guild_id).await
    }
}
