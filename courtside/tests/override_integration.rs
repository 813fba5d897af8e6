//! Integration tests for host overrides and the audit trail

mod common;

use common::{EVENT, HOST, guest, harness};
use courtside::engine::GenerateOptions;
use courtside::{ErrorKind, MatchMode, MatchStatus, MatchmakingError, PlayerRef};

const G: PlayerRef = PlayerRef::Guest(1);

async fn two_matches(h: &common::Harness) -> (i64, i64) {
    let report = h
        .manager
        .generate(
            &HOST,
            EVENT,
            GenerateOptions {
                mode: Some(MatchMode::Singles),
                max_courts: None,
                skill_tolerance: Some(200),
            },
        )
        .await
        .unwrap();
    assert_eq!(report.matches.len(), 2);
    (report.matches[0].id, report.matches[1].id)
}

#[tokio::test]
async fn test_guest_override_then_second_override_conflicts() {
    let h = harness(&[1000, 1100, 1200, 1300], 2);
    let (m, n) = two_matches(&h).await;
    // Joins after generation, so the guest is idle
    h.guests.add_guest(guest(1, 1150)).unwrap();

    let updated = h
        .manager
        .override_player(&HOST, EVENT, m, PlayerRef::User(2), G)
        .await
        .unwrap();
    assert_eq!(updated.id, m);
    assert_eq!(updated.slot2, vec![G]);

    let err = h
        .manager
        .override_player(&HOST, EVENT, n, PlayerRef::User(4), G)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MatchmakingError::ReplacementAlreadyBooked { player: G, booked_in } if booked_in == m
    ));
    assert_eq!(err.kind(), ErrorKind::StateConflict);

    let status = h.manager.status(&HOST, EVENT).await.unwrap();
    let n_now = status.matches.iter().find(|x| x.id == n).unwrap();
    assert_eq!(n_now.slot1, vec![PlayerRef::User(3)]);
    assert_eq!(n_now.slot2, vec![PlayerRef::User(4)]);

    // Replaced player is back in the pool
    assert!(status.waiting.iter().any(|e| e.player.id == PlayerRef::User(2)));
}

#[tokio::test]
async fn test_override_is_audited() {
    let h = harness(&[1000, 1100, 1200, 1300], 2);
    let (m, _) = two_matches(&h).await;
    h.guests.add_guest(guest(1, 1150)).unwrap();

    h.manager
        .override_player(&HOST, EVENT, m, PlayerRef::User(1), G)
        .await
        .unwrap();

    let audit = h.manager.audit_log(&HOST, EVENT).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].match_id, m);
    assert_eq!(audit[0].removed_player, PlayerRef::User(1));
    assert_eq!(audit[0].added_player, G);
    assert_eq!(audit[0].admin_id, HOST.user_id);
}

#[tokio::test]
async fn test_failed_override_leaves_no_trace() {
    let h = harness(&[1000, 1100, 1200, 1300], 2);
    let (m, n) = two_matches(&h).await;

    // Player 3 is booked in the other match
    let err = h
        .manager
        .override_player(&HOST, EVENT, m, PlayerRef::User(1), PlayerRef::User(3))
        .await
        .unwrap_err();
    assert!(matches!(err, MatchmakingError::ReplacementAlreadyBooked { .. }));

    let err = h
        .manager
        .override_player(&HOST, EVENT, m, PlayerRef::User(4), PlayerRef::User(3))
        .await
        .unwrap_err();
    assert!(matches!(err, MatchmakingError::PlayerNotInMatch { .. }));

    let status = h.manager.status(&HOST, EVENT).await.unwrap();
    let m_now = status.matches.iter().find(|x| x.id == m).unwrap();
    assert_eq!(m_now.slot1, vec![PlayerRef::User(1)]);
    assert_eq!(m_now.slot2, vec![PlayerRef::User(2)]);
    let n_now = status.matches.iter().find(|x| x.id == n).unwrap();
    assert_eq!(n_now.slot1, vec![PlayerRef::User(3)]);
    assert!(h.manager.audit_log(&HOST, EVENT).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_override_rejects_ineligible_guest() {
    let h = harness(&[1000, 1100], 1);
    let mut gone = guest(1, 1000);
    gone.deleted_at = Some(chrono::Utc::now());
    h.guests.add_guest(gone).unwrap();
    let report = h.manager.fair_matches(&HOST, EVENT).await.unwrap();

    let err = h
        .manager
        .override_player(&HOST, EVENT, report.matches[0].id, PlayerRef::User(1), G)
        .await
        .unwrap_err();
    assert!(matches!(err, MatchmakingError::PlayerNotEligible(G)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_override_on_completed_match_is_terminal() {
    let h = harness(&[1000, 1100], 1);
    let report = h.manager.fair_matches(&HOST, EVENT).await.unwrap();
    let id = report.matches[0].id;
    h.guests.add_guest(guest(1, 1000)).unwrap();
    h.manager.assign_court(&HOST, EVENT, id, 1).await.unwrap();
    h.manager.start_match(&HOST, EVENT, id).await.unwrap();
    h.manager.end_match(&HOST, EVENT, id).await.unwrap();

    let err = h
        .manager
        .override_player(&HOST, EVENT, id, PlayerRef::User(1), G)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MatchmakingError::MatchTerminal { status: MatchStatus::Completed, .. }
    ));
}

#[tokio::test]
async fn test_override_keeps_court_on_scheduled_match() {
    let h = harness(&[1000, 1100], 1);
    let report = h.manager.fair_matches(&HOST, EVENT).await.unwrap();
    let id = report.matches[0].id;
    h.guests.add_guest(guest(1, 1000)).unwrap();
    h.manager.assign_court(&HOST, EVENT, id, 1).await.unwrap();

    let updated = h
        .manager
        .override_player(&HOST, EVENT, id, PlayerRef::User(2), G)
        .await
        .unwrap();
    assert_eq!(updated.status, MatchStatus::Scheduled);
    assert_eq!(updated.court_number, Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overrides_cannot_share_a_guest() {
    let ratings: Vec<i32> = (0..12).map(|i| 1000 + i * 10).collect();
    let h = harness(&ratings, 6);
    let report = h.manager.fair_matches(&HOST, EVENT).await.unwrap();
    assert_eq!(report.matches.len(), 6);
    h.guests.add_guest(guest(1, 1050)).unwrap();

    let handles: Vec<_> = report
        .matches
        .iter()
        .map(|m| {
            let manager = h.manager.clone();
            let (id, replace) = (m.id, m.slot1[0]);
            tokio::spawn(async move { manager.override_player(&HOST, EVENT, id, replace, G).await })
        })
        .collect();

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) => assert!(matches!(e, MatchmakingError::ReplacementAlreadyBooked { .. })),
        }
    }
    assert_eq!(ok, 1);

    let status = h.manager.status(&HOST, EVENT).await.unwrap();
    let holding = status.matches.iter().filter(|m| m.contains(&G)).count();
    assert_eq!(holding, 1);
    assert_eq!(h.manager.audit_log(&HOST, EVENT).await.unwrap().len(), 1);
}
