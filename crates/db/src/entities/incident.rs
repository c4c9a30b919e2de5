//! Incident entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation action recorded by an incident.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "kebab-case")]
pub enum IncidentAction {
    /// An official warning, no immediate action.
    #[sea_orm(string_value = "warn")]
    Warn,
    /// A message was removed.
    #[sea_orm(string_value = "delete-message")]
    DeleteMessage,
    /// The member was muted for a limited time.
    #[sea_orm(string_value = "mute")]
    Mute,
    /// The member was kicked.
    #[sea_orm(string_value = "kick")]
    Kick,
    /// The member was banned for a limited time.
    #[sea_orm(string_value = "temp-ban")]
    TempBan,
    /// The member was banned permanently.
    #[sea_orm(string_value = "perma-ban")]
    PermaBan,
    /// A mute was revoked.
    #[sea_orm(string_value = "restore")]
    Restore,
    /// A ban was lifted.
    #[sea_orm(string_value = "pardon")]
    Pardon,
}

impl IncidentAction {
    /// Actions that stay in effect only for the incident's duration.
    pub const TIME_BOUNDED: [Self; 2] = [Self::Mute, Self::TempBan];

    /// Whether this action must be reversed once its duration elapses.
    #[must_use]
    pub const fn is_time_bounded(self) -> bool {
        matches!(self, Self::Mute | Self::TempBan)
    }

    /// Stable name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::DeleteMessage => "delete-message",
            Self::Mute => "mute",
            Self::Kick => "kick",
            Self::TempBan => "temp-ban",
            Self::PermaBan => "perma-ban",
            Self::Restore => "restore",
            Self::Pardon => "pardon",
        }
    }
}

impl std::fmt::Display for IncidentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an incident left the active ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    /// The restriction expired and was undone on the platform.
    #[sea_orm(string_value = "reversed")]
    Reversed,
    /// A moderator lifted the incident early.
    #[sea_orm(string_value = "pardoned")]
    Pardoned,
}

/// Incident model - one row per recorded moderation action.
///
/// Rows are never removed. An incident is part of the ledger while
/// `concluded_at` is unset.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incident")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The member acted upon.
    pub user_id: String,
    /// The moderator who took action.
    pub actor_id: String,
    /// The guild the action applies to.
    pub guild_id: String,
    /// What was done.
    pub action: IncidentAction,
    /// Why it was done.
    pub reason: String,
    /// When the action was taken.
    pub issued_at: DateTimeWithTimeZone,
    /// How long a time-bounded action lasts, in milliseconds.
    pub duration_ms: Option<i64>,
    /// When the incident left the ledger.
    pub concluded_at: Option<DateTimeWithTimeZone>,
    /// Why the incident left the ledger.
    pub conclusion: Option<Conclusion>,
}

impl Model {
    /// Length of the restriction, if any.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.duration_ms
            .filter(|ms| *ms > 0)
            .map(chrono::Duration::milliseconds)
    }

    /// Instant at which a time-bounded action is due to be reversed.
    #[must_use]
    pub fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        if !self.action.is_time_bounded() {
            return None;
        }
        let issued_at = self.issued_at.with_timezone(&chrono::Utc);
        self.duration()
            .and_then(|duration| issued_at.checked_add_signed(duration))
    }

    /// Time left until the reversal deadline, clamped at zero.
    #[must_use]
    pub fn remaining_at(&self, now: chrono::DateTime<chrono::Utc>) -> std::time::Duration {
        self.expires_at()
            .and_then(|deadline| (deadline - now).to_std().ok())
            .unwrap_or_default()
    }

    /// Whether the incident is still part of the ledger.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.concluded_at.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
