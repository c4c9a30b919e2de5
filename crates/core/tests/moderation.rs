//! Moderation facade scenarios.

#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use common::{Call, Harness, wait_until};
use warden_common::AppError;
use warden_core::{IssueInput, ModerationService};
use warden_db::entities::incident::{Conclusion, IncidentAction};

fn issue(action: IncidentAction, duration: Option<Duration>) -> IssueInput {
    IssueInput {
        user_id: "u1".to_string(),
        actor_id: "m1".to_string(),
        guild_id: "g1".to_string(),
        action,
        reason: "  breaking rule 3  ".to_string(),
        duration,
    }
}

async fn service(h: &Harness) -> ModerationService {
    let (service, _) = ModerationService::start(h.ledger.clone(), h.engine.clone())
        .await
        .unwrap();
    service
}

#[tokio::test]
async fn test_mute_expires_without_pardon() {
    let harness = Harness::new().await;
    let h = &harness;
    let service = service(h).await;

    let mute = service
        .issue(issue(IncidentAction::Mute, Some(Duration::from_millis(200))))
        .await
        .unwrap();

    assert_eq!(mute.reason, "breaking rule 3");
    assert_eq!(mute.duration_ms, Some(200));
    assert_eq!(service.query(mute.id).await.unwrap().id, mute.id);
    assert_eq!(service.active_in_guild("g1").await.unwrap().len(), 1);

    let svc = &service;
    assert!(
        wait_until(|| async move { matches!(svc.query(mute.id).await, Err(AppError::NotFound(_))) })
            .await
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(h.platform.calls(), vec![Call::mute("g1", "u1")]);
    assert!(service.active_in_guild("g1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pardoned_temp_ban_is_never_reverted() {
    let harness = Harness::new().await;
    let h = &harness;
    let service = service(h).await;

    let ban = service
        .issue(issue(IncidentAction::TempBan, Some(Duration::from_secs(3600))))
        .await
        .unwrap();
    service.pardon(ban.id).await.unwrap();

    assert!(matches!(service.query(ban.id).await, Err(AppError::NotFound(_))));
    assert_eq!(h.engine.state(ban.id).await, None);
    assert!(h.platform.calls().is_empty());

    let record = h.ledger.find_record(ban.id).await.unwrap().unwrap();
    assert_eq!(record.conclusion, Some(Conclusion::Pardoned));
}

#[tokio::test]
async fn test_concurrent_pardons_have_one_winner() {
    let harness = Harness::new().await;
    let service = service(&harness).await;

    let ban = service
        .issue(issue(IncidentAction::TempBan, Some(Duration::from_secs(3600))))
        .await
        .unwrap();

    let (a, b) = tokio::join!(service.pardon(ban.id), service.pardon(ban.id));

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(AppError::NotFound(_))))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_pardon_unknown_incident_is_not_found() {
    let harness = Harness::new().await;
    let service = service(&harness).await;

    let result = service.pardon(12_345).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_pardon_after_reversal_is_not_found() {
    let harness = Harness::new().await;
    let h = &harness;
    let service = service(h).await;

    let mute = service
        .issue(issue(IncidentAction::Mute, Some(Duration::from_millis(20))))
        .await
        .unwrap();
    assert!(wait_until(|| async move { !h.in_ledger(mute.id).await }).await);

    assert!(matches!(service.pardon(mute.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_time_bounded_action_requires_duration() {
    let harness = Harness::new().await;
    let service = service(&harness).await;

    for duration in [None, Some(Duration::ZERO)] {
        let result = service.issue(issue(IncidentAction::Mute, duration)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    let too_long = Duration::from_secs(20 * 365 * 24 * 60 * 60);
    let result = service
        .issue(issue(IncidentAction::TempBan, Some(too_long)))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    assert!(service.history("g1", "u1", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_instantaneous_action_is_recorded_without_timer() {
    let harness = Harness::new().await;
    let service = service(&harness).await;

    let warn = service
        .issue(issue(IncidentAction::Warn, Some(Duration::from_secs(60))))
        .await
        .unwrap();

    assert_eq!(warn.duration_ms, None);
    assert_eq!(harness.engine.tracked().await, 0);
    assert_eq!(service.query(warn.id).await.unwrap().action, IncidentAction::Warn);
    assert!(service.active_in_guild("g1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let harness = Harness::new().await;
    let service = service(&harness).await;

    let mut input = issue(IncidentAction::Kick, None);
    input.guild_id = String::new();

    let result = service.issue(input).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_history_lists_all_incidents_for_member() {
    let harness = Harness::new().await;
    let service = service(&harness).await;

    let warn = service.issue(issue(IncidentAction::Warn, None)).await.unwrap();
    let ban = service
        .issue(issue(IncidentAction::TempBan, Some(Duration::from_secs(3600))))
        .await
        .unwrap();
    service.pardon(ban.id).await.unwrap();

    let history = service.history("g1", "u1", 10).await.unwrap();

    let ids: Vec<_> = history.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![ban.id, warn.id]);
    assert_eq!(history[0].conclusion, Some(Conclusion::Pardoned));
}
