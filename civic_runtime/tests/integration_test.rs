//! Integration tests for civic_runtime.
//!
//! File-backed tests use temporary directories for isolation.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use std::thread;

use rand::rngs::StdRng;
use rand::SeedableRng;

use civic_engine::actions::Action;
use civic_engine::config::{RolePolicy, Rules};
use civic_engine::domain::{LawStatus, Statistic};
use civic_engine::engine::Engine;
use civic_engine::transitions::COUP_NOTICE;

use civic_runtime::clock::ManualClock;
use civic_runtime::file_store::FileStore;
use civic_runtime::oracle::TemplateOracle;
use civic_runtime::session::Session;
use civic_runtime::snapshot;
use civic_runtime::store::{KeyValueStore, MemoryStore, StoreError, AUDIT_LOG_KEY, GAME_STATE_KEY};

const T0: i64 = 1_700_000_000_000;

fn session_on(store: Arc<dyn KeyValueStore>, clock: Arc<ManualClock>) -> Session {
    Session::new(
        Engine::new(Rules::default(), RolePolicy::with_admins(["root"])),
        store,
        Arc::new(TemplateOracle::new(42)),
        clock,
    )
    .with_rng(StdRng::seed_from_u64(42))
}

// ─────────────────────────────────────────────────────────────
// File store
// ─────────────────────────────────────────────────────────────

#[test]
fn file_store_records_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let store = FileStore::open(dir.path()).expect("open");
        assert!(store.compare_and_set("state", None, "v1").expect("cas"));
        assert!(!store.compare_and_set("state", None, "v2").expect("cas"));
        assert!(store.compare_and_set("state", Some("v1"), "v2").expect("cas"));
    }
    let store = FileStore::open(dir.path()).expect("reopen");
    assert_eq!(store.get("state").expect("get").as_deref(), Some("v2"));
    store.set("state", "v3").expect("set");
    assert_eq!(store.get("state").expect("get").as_deref(), Some("v3"));
    assert!(store.get("other").expect("get").is_none());
}

#[test]
fn file_store_lists_are_newest_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let store = FileStore::open(dir.path()).expect("open");
        for v in ["one", "two", "three"] {
            store.lpush("log", v).expect("push");
        }
    }
    let store = FileStore::open(dir.path()).expect("reopen");
    assert_eq!(store.lrange("log", 0, -1).expect("range"), vec!["three", "two", "one"]);
    assert_eq!(store.lrange("log", -1, -1).expect("range"), vec!["one"]);
    assert_eq!(store.lrange("log", 1, 1).expect("range"), vec!["two"]);
}

#[test]
fn file_store_detects_truncated_frame() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::open(dir.path()).expect("open");
    store.lpush("log", "intact").expect("push");

    let mut file = OpenOptions::new()
        .append(true)
        .open(dir.path().join("log.log"))
        .expect("open log");
    file.write_all(&100u32.to_le_bytes()).expect("write");
    file.write_all(b"short").expect("write");
    drop(file);

    assert!(matches!(store.lrange("log", 0, -1), Err(StoreError::Corrupt(_))));
}

#[test]
fn file_store_push_after_crash_cuts_torn_frame() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let store = FileStore::open(dir.path()).expect("open");
        store.lpush("log", "intact").expect("push");
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(dir.path().join("log.log"))
        .expect("open log");
    file.write_all(&100u32.to_le_bytes()).expect("write");
    file.write_all(b"short").expect("write");
    drop(file);

    let store = FileStore::open(dir.path()).expect("reopen");
    assert!(matches!(store.lrange("log", 0, -1), Err(StoreError::Corrupt(_))));
    store.lpush("log", "after").expect("push after crash");
    store.lpush("log", "later").expect("push");
    assert_eq!(
        store.lrange("log", 0, -1).expect("range"),
        vec!["later", "after", "intact"]
    );

    let reopened = FileStore::open(dir.path()).expect("reopen");
    reopened.lpush("log", "last").expect("push");
    assert_eq!(reopened.lrange("log", 0, 0).expect("range"), vec!["last"]);
    assert_eq!(reopened.lrange("log", 0, -1).expect("range").len(), 4);
}

// ─────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────

#[test]
fn full_legislative_cycle_through_session() {
    let clock = Arc::new(ManualClock::new(T0));
    let session = session_on(Arc::new(MemoryStore::new()), clock.clone());

    for (voter, candidate) in [("v1", "sam"), ("v2", "sue"), ("v3", "sam")] {
        session
            .apply(voter, &Action::VoteSenator { candidate: candidate.into() })
            .expect("senator vote");
    }
    let state = session.update_senators().expect("update");
    assert_eq!(state.positions_of_power.senators, vec!["sam", "sue"]);

    session
        .apply("v1", &Action::VotePresident { candidate: "pat".into() })
        .expect("president vote");

    let state = session
        .apply("citizen", &Action::DraftLaw { text: "Fund hospitals".into() })
        .expect("draft");
    let law_id = state.laws[0].id;

    for senator in ["sam", "sue"] {
        clock.advance(1_000);
        session
            .apply(senator, &Action::VoteOnLaw { law_id, vote: true })
            .expect("law vote");
    }
    let state = session.apply("pat", &Action::PassLaw { law_id }).expect("sign");
    assert_eq!(state.laws[0].status, LawStatus::Passed);
    assert_eq!(state.version, 9);
    assert_eq!(session.state().expect("state"), state);
}

#[test]
fn admin_actions_are_audited() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let session = session_on(Arc::clone(&store), Arc::new(ManualClock::new(T0)));

    let err = session
        .apply("mallory", &Action::AdjustStatistic { statistic: Statistic::Economy, delta: 50 })
        .unwrap_err();
    assert!(err.to_string().contains("permission denied"));

    session
        .apply("root", &Action::AdjustStatistic { statistic: Statistic::Economy, delta: 50 })
        .expect("adjust");
    session
        .apply("root", &Action::ClearUserRecords { username: "v1".into() })
        .expect("clear");

    let entries = session.audit_entries().expect("audit");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, "clear_user_records");
    assert_eq!(entries[1].action, "adjust_statistic");
    assert_eq!(entries[1].timestamp, T0);
    assert_eq!(store.lrange(AUDIT_LOG_KEY, 0, -1).expect("range").len(), 2);
}

#[test]
fn coup_reset_keeps_version_monotonic() {
    let session = session_on(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(T0)));
    let mut last_version = 0;
    for i in 0..7 {
        let state = session
            .apply(&format!("rebel{}", i), &Action::JoinCoup { amount: 10 })
            .expect("join");
        assert!(state.version > last_version);
        last_version = state.version;
    }
    let state = session.state().expect("state");
    assert_eq!(state.event_history, vec![COUP_NOTICE.to_string()]);
    assert_eq!(state.citizen_actions.coup_percentage, 0);
    assert_eq!(state.version, 7);
}

#[test]
fn concurrent_sessions_lose_no_updates() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(T0));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let session = session_on(Arc::clone(&store), Arc::clone(&clock)).with_max_retries(10_000);
            thread::spawn(move || {
                for i in 0..5 {
                    session
                        .apply(&format!("author{}", t), &Action::DraftLaw { text: format!("law {}-{}", t, i) })
                        .expect("draft");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    let session = session_on(store, clock);
    let state = session.state().expect("state");
    assert_eq!(state.version, 40);
    assert_eq!(state.laws.len(), 40);
}

#[test]
fn file_backed_session_resumes_after_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new(T0));
    {
        let store = Arc::new(FileStore::open(dir.path()).expect("open"));
        let session = session_on(store, clock.clone());
        session
            .apply("v1", &Action::VotePresident { candidate: "pat".into() })
            .expect("vote");
        session.simulate_event().expect("event");
    }

    let store = Arc::new(FileStore::open(dir.path()).expect("reopen"));
    let raw = store.get(GAME_STATE_KEY).expect("get").expect("record present");
    assert!(raw.contains("\"pat\""));

    let session = session_on(store, clock);
    let state = session.state().expect("state");
    assert_eq!(state.version, 2);
    assert_eq!(state.positions_of_power.president.as_deref(), Some("pat"));
    assert_eq!(state.event_history.len(), 1);
}

#[test]
fn snapshots_written_at_interval() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snap_dir = dir.path().join("snapshots");
    let session = session_on(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(T0)))
        .with_snapshots(snap_dir.clone(), 2);

    for i in 0..5 {
        session
            .apply("citizen", &Action::DraftLaw { text: format!("law {}", i) })
            .expect("draft");
    }

    let names: Vec<String> = fs::read_dir(&snap_dir)
        .expect("read dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);

    let latest = snapshot::load_latest_snapshot(&snap_dir)
        .expect("load")
        .expect("snapshot present");
    assert_eq!(latest.version, 4);
    assert!(snapshot::verify_snapshot_hash(&latest));

    let restored = snapshot::restore_snapshot(&latest, &Rules::default()).expect("restore");
    assert_eq!(restored.laws.len(), 4);

    let mut tampered = latest;
    tampered.canonical_json = tampered.canonical_json.replace("law 0", "law X");
    assert!(!snapshot::verify_snapshot_hash(&tampered));
}
