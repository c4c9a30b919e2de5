//! Platform collaborator used to undo time-bounded restrictions.

use warden_common::AppResult;

/// Undo operations exposed by the chat platform.
///
/// Failures should be reported as [`warden_common::AppError::Platform`]; the
/// reversal engine retries them.
#[async_trait::async_trait]
pub trait PlatformActions: Send + Sync {
    /// Remove the mute role from a member.
    async fn revert_mute(&self, guild_id: &str, user_id: &str) -> AppResult<()>;

    /// Lift a ban on a member.
    async fn revert_ban(&self, guild_id: &str, user_id: &str) -> AppResult<()>;
}
