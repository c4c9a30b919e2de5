//! Reversal engine for time-bounded moderation actions.
//!
//! Every armed incident owns one tokio task. The task sleeps until the
//! incident's deadline, undoes the restriction on the platform and then
//! removes the incident from the ledger.
//!
//! Per incident the engine moves through:
//!
//! ```text
//! Pending --(deadline)--> Reversing --(undo ok, deleted)--> Reversed
//!    |
//!    +--(cancel)--> Cancelled
//! ```
//!
//! A failed undo stays in `Reversing` and is retried with backoff. A failure
//! that cannot succeed on retry raises an alert and leaves the incident in the
//! ledger for the next recovery run.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use warden_common::{AppError, AppResult};
use warden_db::entities::incident::{self, Conclusion, IncidentAction};
use warden_db::repositories::IncidentLedger;

use super::platform::PlatformActions;
use super::retry::RetryPolicy;

/// Scheduling state of an incident known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReversalState {
    /// Timer armed, waiting for the deadline.
    Pending,
    /// Deadline reached, undo in progress.
    Reversing,
}

struct Slot {
    generation: u64,
    state: ReversalState,
    handle: JoinHandle<()>,
}

enum Outcome {
    Reversed,
    Superseded,
    Abandoned,
}

struct EngineInner {
    ledger: IncidentLedger,
    platform: Arc<dyn PlatformActions>,
    retry: RetryPolicy,
    slots: Mutex<HashMap<i64, Slot>>,
    generations: AtomicU64,
    alerts: AtomicU64,
}

/// Schedules and performs reversals of time-bounded incidents.
#[derive(Clone)]
pub struct ReversalEngine {
    inner: Arc<EngineInner>,
}

impl ReversalEngine {
    /// Create a new reversal engine.
    #[must_use]
    pub fn new(
        ledger: IncidentLedger,
        platform: Arc<dyn PlatformActions>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                ledger,
                platform,
                retry,
                slots: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
                alerts: AtomicU64::new(0),
            }),
        }
    }

    /// Schedule a one-shot reversal of `incident` after `remaining`.
    ///
    /// Any pending timer for the same incident is cancelled first. Arming an
    /// incident whose reversal is already in flight is a conflict.
    pub async fn arm(&self, incident: incident::Model, remaining: Duration) -> AppResult<()> {
        ensure_time_bounded(&incident)?;

        let id = incident.id;
        let generation = self.next_generation();
        let mut slots = self.inner.slots.lock().await;
        Self::evict_pending(&mut slots, id)?;

        let engine = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            engine.fire(incident, generation).await;
        });

        slots.insert(
            id,
            Slot {
                generation,
                state: ReversalState::Pending,
                handle,
            },
        );

        debug!(incident_id = id, remaining_ms = remaining.as_millis() as u64, "Armed reversal");
        Ok(())
    }

    /// Start reversing `incident` immediately, skipping the timer.
    pub async fn reverse_now(&self, incident: incident::Model) -> AppResult<()> {
        ensure_time_bounded(&incident)?;

        let id = incident.id;
        let generation = self.next_generation();
        let mut slots = self.inner.slots.lock().await;
        Self::evict_pending(&mut slots, id)?;

        let engine = self.clone();
        let handle = tokio::spawn(async move {
            engine.run_reversal(incident, generation).await;
        });

        slots.insert(
            id,
            Slot {
                generation,
                state: ReversalState::Reversing,
                handle,
            },
        );

        debug!(incident_id = id, "Started immediate reversal");
        Ok(())
    }

    /// Disarm a pending reversal.
    ///
    /// Returns `true` if a pending timer was cancelled. Reversals already in
    /// flight are left running.
    pub async fn cancel(&self, id: i64) -> bool {
        let mut slots = self.inner.slots.lock().await;

        if slots.get(&id).map(|slot| slot.state) != Some(ReversalState::Pending) {
            return false;
        }

        if let Some(slot) = slots.remove(&id) {
            slot.handle.abort();
        }

        debug!(incident_id = id, "Cancelled pending reversal");
        true
    }

    /// Current scheduling state of an incident.
    pub async fn state(&self, id: i64) -> Option<ReversalState> {
        self.inner.slots.lock().await.get(&id).map(|slot| slot.state)
    }

    /// Number of incidents with an armed or in-flight reversal.
    pub async fn tracked(&self) -> usize {
        self.inner.slots.lock().await.len()
    }

    /// Number of operator alerts raised since the engine was created.
    #[must_use]
    pub fn alerts_raised(&self) -> u64 {
        self.inner.alerts.load(Ordering::Relaxed)
    }

    /// Abort every task. Outstanding incidents stay in the ledger and are
    /// picked up again by recovery on the next start.
    pub async fn shutdown(&self) {
        let mut slots = self.inner.slots.lock().await;
        let count = slots.len();

        for (_, slot) in slots.drain() {
            slot.handle.abort();
        }

        info!(count, "Reversal engine stopped");
    }

    fn next_generation(&self) -> u64 {
        self.inner.generations.fetch_add(1, Ordering::Relaxed)
    }

    fn evict_pending(slots: &mut HashMap<i64, Slot>, id: i64) -> AppResult<()> {
        match slots.get(&id).map(|slot| slot.state) {
            Some(ReversalState::Reversing) => Err(AppError::Conflict(format!(
                "Incident {id} is already being reversed"
            ))),
            Some(ReversalState::Pending) => {
                if let Some(previous) = slots.remove(&id) {
                    previous.handle.abort();
                    debug!(incident_id = id, "Replaced pending reversal");
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn fire(&self, incident: incident::Model, generation: u64) {
        {
            let mut slots = self.inner.slots.lock().await;
            match slots.get_mut(&incident.id) {
                Some(slot)
                    if slot.generation == generation && slot.state == ReversalState::Pending =>
                {
                    slot.state = ReversalState::Reversing;
                }
                // Cancelled or re-armed while waiting for the lock
                _ => return,
            }
        }

        self.run_reversal(incident, generation).await;
    }

    async fn run_reversal(&self, incident: incident::Model, generation: u64) {
        let id = incident.id;

        match self.reverse(&incident).await {
            Outcome::Reversed => info!(
                incident_id = id,
                guild = %incident.guild_id,
                user = %incident.user_id,
                action = %incident.action,
                "Reversed incident"
            ),
            Outcome::Superseded => info!(
                incident_id = id,
                "Incident concluded before reversal, skipping undo"
            ),
            Outcome::Abandoned => warn!(
                incident_id = id,
                "Reversal abandoned, incident left in the ledger for recovery"
            ),
        }

        let mut slots = self.inner.slots.lock().await;
        if slots.get(&id).is_some_and(|slot| slot.generation == generation) {
            slots.remove(&id);
        }
    }

    async fn reverse(&self, incident: &incident::Model) -> Outcome {
        let id = incident.id;
        let mut failures: u32 = 0;

        loop {
            match self.inner.ledger.find(id).await {
                Ok(None) => return Outcome::Superseded,
                Ok(Some(_)) => {}
                // Unknown ledger state: undo anyway, the obligation must not be dropped
                Err(e) => warn!(incident_id = id, error = %e, "Ledger check failed before undo"),
            }

            match self.undo(incident).await {
                Ok(()) => break,
                Err(e) if !e.is_retryable() => {
                    self.raise_alert(incident, failures + 1, &e, "Undo cannot be retried");
                    return Outcome::Abandoned;
                }
                Err(e) => {
                    failures += 1;
                    self.report_failure(incident, failures, &e, "Undo failed");
                    tokio::time::sleep(self.inner.retry.jittered_delay(failures - 1)).await;
                }
            }
        }

        failures = 0;
        loop {
            match self.inner.ledger.delete(id, Conclusion::Reversed).await {
                Ok(concluded) => {
                    if !concluded {
                        debug!(incident_id = id, "Incident already concluded");
                    }
                    return Outcome::Reversed;
                }
                Err(e) => {
                    failures += 1;
                    self.report_failure(incident, failures, &e, "Ledger delete failed");
                    tokio::time::sleep(self.inner.retry.jittered_delay(failures - 1)).await;
                }
            }
        }
    }

    async fn undo(&self, incident: &incident::Model) -> AppResult<()> {
        let platform = &self.inner.platform;
        match incident.action {
            IncidentAction::Mute => {
                platform
                    .revert_mute(&incident.guild_id, &incident.user_id)
                    .await
            }
            IncidentAction::TempBan => {
                platform
                    .revert_ban(&incident.guild_id, &incident.user_id)
                    .await
            }
            other => Err(AppError::InvalidActionKind(other.to_string())),
        }
    }

    fn report_failure(
        &self,
        incident: &incident::Model,
        failures: u32,
        err: &AppError,
        what: &str,
    ) {
        if self.inner.retry.should_alert(failures) {
            self.raise_alert(incident, failures, err, what);
        } else {
            warn!(
                incident_id = incident.id,
                attempt = failures,
                code = err.error_code(),
                error = %err,
                "{what}, retrying"
            );
        }
    }

    fn raise_alert(
        &self,
        incident: &incident::Model,
        failures: u32,
        err: &AppError,
        what: &str,
    ) {
        self.inner.alerts.fetch_add(1, Ordering::Relaxed);
        error!(
            alert = true,
            incident_id = incident.id,
            guild = %incident.guild_id,
            user = %incident.user_id,
            action = %incident.action,
            attempt = failures,
            code = err.error_code(),
            error = %err,
            "{what}; restriction is overdue"
        );
    }
}

fn ensure_time_bounded(incident: &incident::Model) -> AppResult<()> {
    if incident.action.is_time_bounded() {
        Ok(())
    } else {
        Err(AppError::InvalidActionKind(format!(
            "{} (incident {}) is not time-bounded",
            incident.action, incident.id
        )))
    }
}
