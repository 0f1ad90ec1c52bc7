use chrono::{Duration, Utc};
use std::sync::Arc;

use lfg_reputation::{
    EventType, MemoryStore, ParticipantOutcome, ParticipantStatus, ReportReason, Reputation,
    ReputationCalculator, ReputationConfig, ReputationError, ReputationEvent, ReputationStore,
};

fn engine() -> (Arc<MemoryStore>, ReputationCalculator<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let calculator = ReputationCalculator::new(store.clone(), ReputationConfig::default());
    (store, calculator)
}

fn good_completion() -> ParticipantOutcome {
    ParticipantOutcome {
        status: ParticipantStatus::Completed,
        minutes_late: 0,
        completion_percent: Some(100),
        was_kicked: false,
    }
}

fn seasoned_user(store: &MemoryStore, user_id: &str, bank: u32) -> Reputation {
    let mut reputation = Reputation::new(user_id, 3.0);
    reputation.is_grace_period = false;
    reputation.grace_sessions = 5;
    reputation.good_sessions_bank = bank;
    store.put_reputation(&reputation).unwrap();
    reputation
}

fn penalty_event(user_id: &str, delta: f64, age_days: i64) -> ReputationEvent {
    let mut event = ReputationEvent::new(user_id, EventType::NoShow, delta, "missed it", None);
    event.created_at = Utc::now() - Duration::days(age_days);
    event
}

#[test]
fn new_user_on_time_completion_scores_3_05() {
    let (store, calculator) = engine();

    let change = calculator
        .record_session_completion("alice", "s1", &good_completion())
        .unwrap();
    assert!((change - 0.05).abs() < 1e-6);

    let reputation = store.get_reputation("alice").unwrap().unwrap();
    assert!((reputation.current_score - 3.05).abs() < 1e-6);
    assert_eq!(reputation.total_sessions, 1);
    assert_eq!(reputation.completed_sessions, 1);
    assert_eq!(reputation.current_streak, 1);
    assert!(reputation.is_grace_period);

    let events = store.events_newest_first("alice").unwrap();
    let types: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
    assert!(types.contains(&EventType::SessionCompleted));
    assert!(types.contains(&EventType::SessionOnTime));
    assert_eq!(events.len(), 2);
}

#[test]
fn grace_period_suppresses_no_show_penalty() {
    let (store, calculator) = engine();
    calculator
        .record_session_completion("alice", "s1", &good_completion())
        .unwrap();

    let no_show = ParticipantOutcome {
        status: ParticipantStatus::NoShow,
        minutes_late: 0,
        completion_percent: Some(0),
        was_kicked: false,
    };
    let change = calculator
        .record_session_completion("alice", "s2", &no_show)
        .unwrap();
    assert_eq!(change, 0.0);

    let reputation = store.get_reputation("alice").unwrap().unwrap();
    assert!((reputation.current_score - 3.05).abs() < 1e-6);
    assert_eq!(reputation.no_shows, 1);
    assert_eq!(reputation.total_sessions, 2);
    // No ledger entry was written for the suppressed no-show.
    assert_eq!(store.events_newest_first("alice").unwrap().len(), 2);
}

#[test]
fn kicked_outside_grace_costs_0_20() {
    let (store, calculator) = engine();
    seasoned_user(&store, "boot", 0);

    let kicked = ParticipantOutcome {
        status: ParticipantStatus::Joined,
        minutes_late: 0,
        completion_percent: Some(40),
        was_kicked: true,
    };
    let change = calculator
        .record_session_completion("boot", "s1", &kicked)
        .unwrap();
    assert!((change + 0.20).abs() < 1e-6);

    let reputation = store.get_reputation("boot").unwrap().unwrap();
    assert!((reputation.current_score - 2.80).abs() < 1e-6);
}

#[test]
fn late_arrival_window_has_a_dead_zone() {
    let (store, calculator) = engine();

    for (user, minutes_late, expected_change) in [
        ("on-time", 0, 0.05),
        ("slightly-late", 5, 0.02),
        ("late", 15, 0.02), // penalty suppressed by grace, bonus withheld
        ("very-late", 25, 0.02),
    ] {
        let outcome = ParticipantOutcome {
            minutes_late,
            ..good_completion()
        };
        let change = calculator
            .record_session_completion(user, "s1", &outcome)
            .unwrap();
        assert!(
            (change - expected_change).abs() < 1e-6,
            "user {} got {}",
            user,
            change
        );
    }

    // Out of grace the 10..=20 window is an actual penalty.
    seasoned_user(&store, "punished", 0);
    let outcome = ParticipantOutcome {
        minutes_late: 12,
        ..good_completion()
    };
    let change = calculator
        .record_session_completion("punished", "s1", &outcome)
        .unwrap();
    assert!((change - (0.02 - 0.05)).abs() < 1e-6);
    let reputation = store.get_reputation("punished").unwrap().unwrap();
    assert_eq!(reputation.late_arrivals, 1);
}

#[test]
fn streak_bonus_fires_on_multiples_of_ten_only() {
    let (store, calculator) = engine();

    for session in 1..=11 {
        calculator
            .record_session_completion("streaker", &format!("s{}", session), &good_completion())
            .unwrap();

        let bonuses = store
            .events_newest_first("streaker")
            .unwrap()
            .iter()
            .filter(|e| e.event_type == EventType::StreakBonus)
            .count();
        let expected = if session >= 10 { 1 } else { 0 };
        assert_eq!(bonuses, expected, "after session {}", session);
    }

    let reputation = store.get_reputation("streaker").unwrap().unwrap();
    assert_eq!(reputation.current_streak, 11);
    assert_eq!(reputation.longest_streak, 11);
}

#[test]
fn decay_freezes_old_events_exactly_once() {
    let (store, calculator) = engine();
    seasoned_user(&store, "vet", 0);
    store.append_event(&penalty_event("vet", -0.15, 100)).unwrap();

    let score = calculator.recalculate_score("vet").unwrap();
    assert!((score - 2.925).abs() < 1e-6);

    let events = store.events_newest_first("vet").unwrap();
    assert!(events[0].decay_applied);
    assert!((events[0].decayed_score.unwrap() + 0.075).abs() < 1e-6);

    // Re-running does not recompute the frozen value.
    let score = calculator.recalculate_score("vet").unwrap();
    assert!((score - 2.925).abs() < 1e-6);
    let events = store.events_newest_first("vet").unwrap();
    assert!((events[0].decayed_score.unwrap() + 0.075).abs() < 1e-6);
}

#[test]
fn forgiveness_bank_cancels_recent_penalties_permanently() {
    let (store, calculator) = engine();
    seasoned_user(&store, "redeemed", 2);
    store.append_event(&penalty_event("redeemed", -0.15, 1)).unwrap();
    store.append_event(&penalty_event("redeemed", -0.15, 0)).unwrap();

    let score = calculator.recalculate_score("redeemed").unwrap();
    assert!((score - 3.0).abs() < 1e-6);

    let reputation = store.get_reputation("redeemed").unwrap().unwrap();
    assert_eq!(reputation.good_sessions_bank, 0);
    let events = store.events_newest_first("redeemed").unwrap();
    assert!(events.iter().all(|e| e.forgiven));

    // A later recalculation neither re-forgives nor resurrects the penalties.
    let score = calculator.recalculate_score("redeemed").unwrap();
    assert!((score - 3.0).abs() < 1e-6);
    assert_eq!(
        store
            .get_reputation("redeemed")
            .unwrap()
            .unwrap()
            .good_sessions_bank,
        0
    );
}

#[test]
fn forgiveness_skips_already_decayed_events() {
    let (store, calculator) = engine();
    seasoned_user(&store, "mixed", 1);
    store.append_event(&penalty_event("mixed", -0.15, 100)).unwrap();
    store.append_event(&penalty_event("mixed", -0.15, 0)).unwrap();

    let score = calculator.recalculate_score("mixed").unwrap();
    // Fresh penalty forgiven; old one only decayed.
    assert!((score - 2.925).abs() < 1e-6);

    let events = store.events_newest_first("mixed").unwrap();
    assert!(events[0].forgiven && !events[0].decay_applied);
    assert!(events[1].decay_applied && !events[1].forgiven);
}

#[test]
fn score_is_clamped_to_bounds() {
    let (store, calculator) = engine();

    seasoned_user(&store, "pariah", 0);
    for _ in 0..20 {
        let event =
            ReputationEvent::new("pariah", EventType::ToxicBehavior, -0.25, "reported", None);
        store.append_event(&event).unwrap();
    }
    let score = calculator.recalculate_score("pariah").unwrap();
    assert_eq!(score, 0.0);

    seasoned_user(&store, "saint", 0);
    for _ in 0..50 {
        let event =
            ReputationEvent::new("saint", EventType::HostEndorsement, 0.05, "endorsed", None);
        store.append_event(&event).unwrap();
    }
    let score = calculator.recalculate_score("saint").unwrap();
    assert_eq!(score, 5.0);
}

#[test]
fn endorsement_adds_0_05_and_rejects_duplicates() {
    let (store, calculator) = engine();

    let endorsement = calculator
        .record_endorsement("host", "alice", Some("s1"))
        .unwrap();
    assert!((endorsement.value - 0.05).abs() < 1e-6);

    let reputation = store.get_reputation("alice").unwrap().unwrap();
    assert!((reputation.current_score - 3.05).abs() < 1e-6);

    let duplicate = calculator.record_endorsement("host", "alice", Some("s1"));
    assert!(matches!(
        duplicate,
        Err(ReputationError::DuplicateEndorsement)
    ));

    // Same pair, different session is fine.
    calculator
        .record_endorsement("host", "alice", Some("s2"))
        .unwrap();
}

#[test]
fn self_endorsement_and_self_report_are_rejected() {
    let (_, calculator) = engine();

    assert!(matches!(
        calculator.record_endorsement("alice", "alice", None),
        Err(ReputationError::Validation(_))
    ));
    assert!(matches!(
        calculator.record_report("alice", "alice", ReportReason::ToxicBehavior, None, None),
        Err(ReputationError::Validation(_))
    ));
}

#[test]
fn only_toxic_report_reasons_apply_a_penalty() {
    let (store, calculator) = engine();

    calculator
        .record_report("witness", "spammer", ReportReason::Spam, None, None)
        .unwrap();
    assert!(store.events_newest_first("spammer").unwrap().is_empty());

    calculator
        .record_report(
            "witness",
            "griefer",
            ReportReason::Harassment,
            Some("abusive voice chat".to_string()),
            Some("s1"),
        )
        .unwrap();
    let reputation = store.get_reputation("griefer").unwrap().unwrap();
    assert!((reputation.current_score - 2.75).abs() < 1e-6);
    let events = store.events_newest_first("griefer").unwrap();
    assert_eq!(events[0].event_type, EventType::ToxicBehavior);
    assert_eq!(events[0].reason, "abusive voice chat");
}

#[test]
fn cancellation_window_controls_penalty_and_streak() {
    let (store, calculator) = engine();

    let mut reputation = seasoned_user(&store, "flake", 0);
    reputation.current_streak = 3;
    store.put_reputation(&reputation).unwrap();

    // Two hours or more out: free.
    let applied = calculator.record_cancellation("flake", "s1", 5.0).unwrap();
    assert!(!applied);
    let reputation = store.get_reputation("flake").unwrap().unwrap();
    assert_eq!(reputation.current_streak, 3);
    assert_eq!(reputation.cancellations, 0);
    assert!((reputation.current_score - 3.0).abs() < 1e-6);

    // Inside the window: penalty plus streak reset.
    let applied = calculator.record_cancellation("flake", "s1", 1.0).unwrap();
    assert!(applied);
    let reputation = store.get_reputation("flake").unwrap().unwrap();
    assert_eq!(reputation.current_streak, 0);
    assert_eq!(reputation.cancellations, 1);
    assert!((reputation.current_score - 2.92).abs() < 1e-6);
}

#[test]
fn seasonal_reset_drifts_toward_target() {
    let (store, calculator) = engine();

    let new_score = calculator.apply_seasonal_reset("alice", 0.1).unwrap();
    assert!((new_score - 3.05).abs() < 1e-6);

    let mut reputation = seasoned_user(&store, "hotshot", 0);
    reputation.current_score = 4.5;
    store.put_reputation(&reputation).unwrap();
    let new_score = calculator.apply_seasonal_reset("hotshot", 0.1).unwrap();
    assert!((new_score - 4.4).abs() < 1e-6);

    let events = store.events_newest_first("hotshot").unwrap();
    assert_eq!(events[0].event_type, EventType::SeasonalReset);
    assert!((events[0].score_change + 0.1).abs() < 1e-6);
}

#[test]
fn grace_ends_after_five_sessions() {
    let (store, calculator) = engine();

    for session in 1..=5 {
        calculator
            .record_session_completion("newbie", &format!("s{}", session), &good_completion())
            .unwrap();
    }
    let reputation = store.get_reputation("newbie").unwrap().unwrap();
    assert!(!reputation.is_grace_period);
    assert_eq!(reputation.grace_sessions, 5);

    // Sixth-session misbehavior is now recorded in the ledger (though the
    // accumulated good-session bank may immediately forgive it).
    let no_show = ParticipantOutcome {
        status: ParticipantStatus::NoShow,
        minutes_late: 0,
        completion_percent: Some(0),
        was_kicked: false,
    };
    calculator
        .record_session_completion("newbie", "s6", &no_show)
        .unwrap();
    let events = store.events_newest_first("newbie").unwrap();
    assert!(events.iter().any(|e| e.event_type == EventType::NoShow));
}
