//! Shared fixtures for warden-core integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::Set;
use warden_common::{AppError, AppResult};
use warden_core::{PlatformActions, RetryPolicy, ReversalEngine};
use warden_db::entities::incident::{self, IncidentAction};
use warden_db::repositories::IncidentLedger;
use warden_db::test_utils::TestDatabase;

/// A successful undo call observed by [`RecordingPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RevertMute { guild: String, user: String },
    RevertBan { guild: String, user: String },
}

impl Call {
    pub fn mute(guild: &str, user: &str) -> Self {
        Self::RevertMute {
            guild: guild.to_string(),
            user: user.to_string(),
        }
    }

    pub fn ban(guild: &str, user: &str) -> Self {
        Self::RevertBan {
            guild: guild.to_string(),
            user: user.to_string(),
        }
    }
}

/// Platform fake that records undo calls and can fail the first N attempts.
#[derive(Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<Call>>,
    attempts: AtomicU32,
    failures_left: AtomicU32,
}

impl RecordingPlatform {
    pub fn failing(times: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(times),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Platform("503 Service Unavailable".to_string()));
        }

        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait::async_trait]
impl PlatformActions for RecordingPlatform {
    async fn revert_mute(&self, guild_id: &str, user_id: &str) -> AppResult<()> {
        self.record(Call::mute(guild_id, user_id))
    }

    async fn revert_ban(&self, guild_id: &str, user_id: &str) -> AppResult<()> {
        self.record(Call::ban(guild_id, user_id))
    }
}

/// Retry policy with millisecond delays.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        multiplier: 2.0,
        alert_after: 2,
    }
}

/// Ledger, platform fake and engine over one in-memory database.
pub struct Harness {
    pub db: TestDatabase,
    pub ledger: IncidentLedger,
    pub platform: Arc<RecordingPlatform>,
    pub engine: ReversalEngine,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_platform(RecordingPlatform::default()).await
    }

    pub async fn with_platform(platform: RecordingPlatform) -> Self {
        let db = TestDatabase::new().await.unwrap();
        let ledger = db.ledger();
        let platform = Arc::new(platform);
        let engine = ReversalEngine::new(ledger.clone(), platform.clone(), fast_retry());

        Self {
            db,
            ledger,
            platform,
            engine,
        }
    }

    /// Simulate a process restart: drop every timer and build a fresh engine
    /// over the same database.
    pub async fn restart(&mut self) {
        self.engine.shutdown().await;
        self.engine = ReversalEngine::new(self.ledger.clone(), self.platform.clone(), fast_retry());
    }

    /// Insert an incident directly into the ledger.
    pub async fn put(
        &self,
        action: IncidentAction,
        issued_at: DateTime<Utc>,
        duration: Option<Duration>,
    ) -> incident::Model {
        self.ledger
            .put(incident::ActiveModel {
                user_id: Set("u1".to_string()),
                actor_id: Set("m1".to_string()),
                guild_id: Set("g1".to_string()),
                action: Set(action),
                reason: Set("fixture".to_string()),
                issued_at: Set(issued_at.into()),
                duration_ms: Set(duration.map(|d| d.as_millis() as i64)),
                concluded_at: Set(None),
                conclusion: Set(None),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    /// Whether the incident is still in the ledger.
    pub async fn in_ledger(&self, id: i64) -> bool {
        self.ledger.find(id).await.unwrap().is_some()
    }
}

/// Poll `check` until it holds or five seconds pass.
pub async fn wait_until<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
