//! Discord REST implementation of the platform collaborator.

use std::time::Duration;

use reqwest::{StatusCode, header::AUTHORIZATION};
use tracing::debug;
use warden_common::{AppError, AppResult, PlatformConfig};
use warden_core::PlatformActions;

const AUDIT_LOG_REASON: &str = "Temporary restriction expired";

/// Undoes mutes and bans through the Discord REST API.
pub struct DiscordPlatform {
    http: reqwest::Client,
    api_base: String,
    token: String,
    mute_role: String,
}

impl DiscordPlatform {
    /// Create a new Discord platform client.
    pub fn new(config: &PlatformConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            mute_role: config.mute_role.clone(),
        })
    }

    fn mute_role_url(&self, guild_id: &str, user_id: &str) -> String {
        format!(
            "{}/guilds/{guild_id}/members/{user_id}/roles/{}",
            self.api_base, self.mute_role
        )
    }

    fn ban_url(&self, guild_id: &str, user_id: &str) -> String {
        format!("{}/guilds/{guild_id}/bans/{user_id}", self.api_base)
    }

    async fn delete(&self, url: &str) -> AppResult<()> {
        let response = self
            .http
            .delete(url)
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .header("X-Audit-Log-Reason", AUDIT_LOG_REASON)
            .send()
            .await
            .map_err(|e| AppError::Platform(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // The role or ban is already gone
            StatusCode::NOT_FOUND => {
                debug!(url, "Restriction already lifted on platform");
                Ok(())
            }
            status => Err(AppError::Platform(format!("{status} from {url}"))),
        }
    }
}

#[async_trait::async_trait]
impl PlatformActions for DiscordPlatform {
    async fn revert_mute(&self, guild_id: &str, user_id: &str) -> AppResult<()> {
        self.delete(&self.mute_role_url(guild_id, user_id)).await
    }

    async fn revert_ban(&self, guild_id: &str, user_id: &str) -> AppResult<()> {
        self.delete(&self.ban_url(guild_id, user_id)).await
    }
}
