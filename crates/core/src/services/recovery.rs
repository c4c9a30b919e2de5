//! Startup recovery of outstanding reversals.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use warden_common::AppResult;
use warden_db::repositories::IncidentLedger;

use super::reversal::ReversalEngine;

/// Summary of a recovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Incidents re-armed with their remaining duration.
    pub rearmed: usize,
    /// Incidents past their deadline, reversed immediately.
    pub expired: usize,
    /// Incidents that could not be scheduled.
    pub skipped: usize,
}

/// Re-arms reversals for every active time-bounded incident in the ledger.
///
/// `run` consumes the loader so that it executes once per process.
pub struct RecoveryLoader {
    ledger: IncidentLedger,
    engine: ReversalEngine,
}

impl RecoveryLoader {
    /// Create a new recovery loader.
    #[must_use]
    pub const fn new(ledger: IncidentLedger, engine: ReversalEngine) -> Self {
        Self { ledger, engine }
    }

    /// Scan the ledger and schedule every outstanding reversal relative to `now`.
    pub async fn run(self, now: DateTime<Utc>) -> AppResult<RecoveryReport> {
        let active = self.ledger.scan_active().await?;
        let mut report = RecoveryReport::default();

        for incident in active {
            let id = incident.id;

            if incident.expires_at().is_none() {
                warn!(
                    incident_id = id,
                    action = %incident.action,
                    "Active incident has no duration, leaving it for an operator"
                );
                report.skipped += 1;
                continue;
            }

            let remaining = incident.remaining_at(now);
            let scheduled = if remaining.is_zero() {
                self.engine.reverse_now(incident).await.map(|()| {
                    report.expired += 1;
                })
            } else {
                self.engine.arm(incident, remaining).await.map(|()| {
                    report.rearmed += 1;
                })
            };

            if let Err(e) = scheduled {
                warn!(incident_id = id, error = %e, "Failed to schedule recovered incident");
                report.skipped += 1;
            }
        }

        info!(
            rearmed = report.rearmed,
            expired = report.expired,
            skipped = report.skipped,
            "Recovered outstanding reversals"
        );

        Ok(report)
    }
}
