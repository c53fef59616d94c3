use super::*;
use reflex_core::{apply_score, DeviceFilter, ScoreSubmission};
use tempfile::TempDir;

fn test_store() -> (SessionStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    (store, dir)
}

fn sample_session(id: &str, device: DeviceType) -> GameSession {
    GameSession::new(
        id.to_string(),
        1_700_000_000_000,
        device,
        Some("Mozilla/5.0 (X11; Linux x86_64)".to_string()),
        Some("203.0.113.7".to_string()),
    )
}

fn outcome(time: f64, attempts: u32) -> GameOutcome {
    GameOutcome {
        time_taken_seconds: time,
        attempts,
        max_level: 2,
    }
}

fn submission(name: &str, device: DeviceType, time: f64, attempts: u32) -> ScoreSubmission {
    ScoreSubmission {
        username: name.to_string(),
        device_type: device,
        time_taken_seconds: time,
        attempts,
        max_level: 2,
        session_id: format!("s-{name}-{time}"),
        is_valid: true,
    }
}

#[test]
fn insert_and_get() {
    let (store, _dir) = test_store();
    let session = sample_session("abc", DeviceType::Desktop);
    store.insert_session(&session).unwrap();

    let loaded = store.get_session("abc").unwrap().unwrap();
    assert_eq!(loaded, session);
    assert!(!loaded.is_completed);
    assert_eq!(loaded.max_level, 1);
    assert_eq!(store.count_sessions().unwrap(), 1);
}

#[test]
fn get_missing_returns_none() {
    let (store, _dir) = test_store();
    assert!(store.get_session("nope").unwrap().is_none());
}

#[test]
fn duplicate_session_id_is_an_error() {
    let (store, _dir) = test_store();
    let session = sample_session("dup", DeviceType::Mobile);
    store.insert_session(&session).unwrap();
    assert!(store.insert_session(&session).is_err());
}

#[test]
fn finalize_records_outcome() {
    let (store, _dir) = test_store();
    store
        .insert_session(&sample_session("fin", DeviceType::Desktop))
        .unwrap();

    let result = store
        .finalize_session("fin", &outcome(12.0, 4), 1_700_000_012_000, true)
        .unwrap();
    let FinalizeResult::Finalized(session) = result else {
        panic!("expected Finalized, got {result:?}");
    };
    assert!(session.is_completed);
    assert!(session.is_valid);
    assert_eq!(session.time_taken_seconds, Some(12.0));
    assert_eq!(session.attempts, 4);
    assert_eq!(session.max_level, 2);
    assert_eq!(session.end_time, Some(1_700_000_012_000));
}

#[test]
fn finalize_twice_is_rejected_and_keeps_first_outcome() {
    let (store, _dir) = test_store();
    store
        .insert_session(&sample_session("twice", DeviceType::Desktop))
        .unwrap();

    store
        .finalize_session("twice", &outcome(12.0, 4), 1, true)
        .unwrap();
    let second = store
        .finalize_session("twice", &outcome(99.0, 40), 2, false)
        .unwrap();
    assert!(matches!(second, FinalizeResult::AlreadyCompleted));

    let loaded = store.get_session("twice").unwrap().unwrap();
    assert_eq!(loaded.time_taken_seconds, Some(12.0));
    assert!(loaded.is_valid);
}

#[test]
fn finalize_unknown_is_not_found() {
    let (store, _dir) = test_store();
    let result = store
        .finalize_session("ghost", &outcome(5.0, 1), 1, true)
        .unwrap();
    assert!(matches!(result, FinalizeResult::NotFound));
}

#[test]
fn finalize_can_store_invalid() {
    let (store, _dir) = test_store();
    store
        .insert_session(&sample_session("fast", DeviceType::Mobile))
        .unwrap();
    store
        .finalize_session("fast", &outcome(1.0, 0), 1, false)
        .unwrap();
    let loaded = store.get_session("fast").unwrap().unwrap();
    assert!(loaded.is_completed);
    assert!(!loaded.is_valid);
}

#[test]
fn upsert_overwrites_and_counts_games() {
    let (store, _dir) = test_store();
    let first = store
        .upsert_score(&submission("Ada", DeviceType::Desktop, 15.0, 6), 100)
        .unwrap();
    assert_eq!(first.total_games, 1);
    assert_eq!(first.created_at, 100);

    let second = store
        .upsert_score(&submission("Ada", DeviceType::Desktop, 10.0, 12), 200)
        .unwrap();
    assert_eq!(second.best_time_seconds, 10.0);
    assert_eq!(second.best_attempts, 12);
    assert_eq!(second.total_games, 2);
    assert_eq!(second.created_at, 100);
    assert_eq!(second.updated_at, 200);

    // A slower game still replaces the stored result.
    let third = store
        .upsert_score(&submission("Ada", DeviceType::Desktop, 30.0, 2), 300)
        .unwrap();
    assert_eq!(third.best_time_seconds, 30.0);
    assert_eq!(third.total_games, 3);
}

#[test]
fn upsert_matches_core_rule() {
    let (store, _dir) = test_store();
    let subs = [
        submission("Ada", DeviceType::Desktop, 15.0, 6),
        submission("Ada", DeviceType::Desktop, 10.0, 12),
    ];

    let mut expected = None;
    let mut stored = None;
    for (i, sub) in subs.iter().enumerate() {
        let now = (i as u64 + 1) * 100;
        expected = Some(apply_score(expected, sub.clone(), now));
        stored = Some(store.upsert_score(sub, now).unwrap());
    }
    assert_eq!(stored, expected);
}

#[test]
fn entries_are_per_device() {
    let (store, _dir) = test_store();
    store
        .upsert_score(&submission("Ada", DeviceType::Desktop, 15.0, 6), 1)
        .unwrap();
    store
        .upsert_score(&submission("Ada", DeviceType::Mobile, 20.0, 3), 2)
        .unwrap();

    let scores = store.user_scores("Ada").unwrap();
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].device_type, DeviceType::Desktop);
    assert_eq!(scores[1].device_type, DeviceType::Mobile);
    assert!(store.user_scores("Bob").unwrap().is_empty());
}

#[test]
fn top_scores_sorted_valid_only_and_limited() {
    let (store, _dir) = test_store();
    let mut all = Vec::new();
    for sub in [
        submission("slow", DeviceType::Desktop, 40.0, 1),
        submission("fast", DeviceType::Desktop, 8.0, 9),
        submission("tied", DeviceType::Mobile, 8.0, 3),
        submission("mid", DeviceType::Tablet, 20.0, 2),
        ScoreSubmission {
            is_valid: false,
            ..submission("cheat", DeviceType::Desktop, 1.0, 0)
        },
    ] {
        all.push(store.upsert_score(&sub, 1).unwrap());
    }

    let top = store.top_scores(3, DeviceFilter::All).unwrap();
    let names: Vec<&str> = top.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, ["tied", "fast", "mid"]);
    assert_eq!(top, reflex_core::top_scores(&all, 3, DeviceFilter::All));

    let desktop = store
        .top_scores(10, DeviceFilter::Only(DeviceType::Desktop))
        .unwrap();
    let names: Vec<&str> = desktop.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, ["fast", "slow"]);
}

#[test]
fn session_counts_aggregate_completed_valid() {
    let (store, _dir) = test_store();
    for (id, device) in [
        ("a", DeviceType::Desktop),
        ("b", DeviceType::Desktop),
        ("c", DeviceType::Mobile),
        ("d", DeviceType::Tablet),
    ] {
        store.insert_session(&sample_session(id, device)).unwrap();
    }
    store.finalize_session("a", &outcome(10.0, 4), 1, true).unwrap();
    store.finalize_session("b", &outcome(20.0, 8), 1, true).unwrap();
    store.finalize_session("c", &outcome(1.0, 0), 1, false).unwrap();

    let counts = store.session_counts().unwrap();
    assert_eq!(counts.total, 4);
    assert_eq!(counts.completed, 3);
    assert_eq!(counts.valid, 2);
    assert_eq!(counts.average_time_seconds, Some(15.0));
    assert_eq!(counts.average_attempts, Some(6.0));
    assert_eq!(counts.valid_by_device.get(&DeviceType::Desktop), Some(&2));
    assert_eq!(counts.valid_by_device.get(&DeviceType::Mobile), None);
}

#[test]
fn session_counts_empty_store() {
    let (store, _dir) = test_store();
    let counts = store.session_counts().unwrap();
    assert_eq!(counts, SessionCounts::default());
}

#[test]
fn ranking_counts_pick_extremes() {
    let (store, _dir) = test_store();
    store
        .upsert_score(&submission("ada", DeviceType::Desktop, 10.0, 20), 1)
        .unwrap();
    store
        .upsert_score(
            &ScoreSubmission {
                max_level: 5,
                ..submission("bob", DeviceType::Desktop, 30.0, 4)
            },
            1,
        )
        .unwrap();
    store
        .upsert_score(&submission("cy", DeviceType::Mobile, 12.0, 2), 1)
        .unwrap();

    let counts = store.ranking_counts().unwrap();
    assert_eq!(counts.total_entries, 3);
    assert_eq!(
        counts.by_device.get(&DeviceType::Desktop),
        Some(&(2, Some(20.0)))
    );
    assert_eq!(counts.by_device.get(&DeviceType::Mobile), Some(&(1, Some(12.0))));
    assert_eq!(counts.best_overall_time.unwrap().username, "ada");
    assert_eq!(counts.most_attempts.unwrap().username, "ada");
    assert_eq!(counts.highest_level.unwrap().username, "bob");
}

#[test]
fn reopen_keeps_rows() {
    let dir = TempDir::new().unwrap();
    {
        let store = SessionStore::open(dir.path()).unwrap();
        store
            .insert_session(&sample_session("persist", DeviceType::Tablet))
            .unwrap();
    }
    let store = SessionStore::open(dir.path()).unwrap();
    assert!(store.get_session("persist").unwrap().is_some());
}

#[test]
fn concurrent_finalize_has_one_winner() {
    let (store, _dir) = test_store();
    for round in 0..10 {
        let id = format!("race{round}");
        store
            .insert_session(&sample_session(&id, DeviceType::Desktop))
            .unwrap();

        let results: Vec<FinalizeResult> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = &store;
                    let id = id.as_str();
                    scope.spawn(move || {
                        store
                            .finalize_session(id, &outcome(10.0 + f64::from(i), i), 1, true)
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners = results
            .iter()
            .filter(|r| matches!(r, FinalizeResult::Finalized(_)))
            .count();
        let losers = results
            .iter()
            .filter(|r| matches!(r, FinalizeResult::AlreadyCompleted))
            .count();
        assert_eq!(winners, 1, "round {round}");
        assert_eq!(losers, 7, "round {round}");
    }
}

#[test]
fn concurrent_upserts_count_every_game() {
    let (store, _dir) = test_store();
    let threads = 16u32;

    std::thread::scope(|scope| {
        for i in 0..threads {
            let store = &store;
            scope.spawn(move || {
                let sub = submission("Ada", DeviceType::Mobile, 10.0 + f64::from(i), i);
                store.upsert_score(&sub, u64::from(i)).unwrap();
            });
        }
    });

    let scores = store.user_scores("Ada").unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].total_games, threads);
}
