use std::sync::Arc;
use std::time::Duration;

use learnpath::interview::InterviewSession;
use learnpath::pipeline::context::RoadmapMode;
use learnpath::store::SessionStore;

fn session(id: &str) -> InterviewSession {
    let mut session = InterviewSession::new("Rust".to_string(), RoadmapMode::Learning, 3);
    session.id = id.to_string();
    session
}

#[tokio::test]
async fn test_session_older_than_ttl_is_unreachable_after_creation_sweep() {
    let store = SessionStore::new(Duration::from_millis(25));

    store.insert(session("stale")).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The sweep is triggered by creating another session, not by a timer
    store.insert(session("fresh")).await;

    assert!(store.get("stale").await.is_none());
    assert!(store.get("fresh").await.is_some());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_live_sessions_survive_the_sweep() {
    let store = SessionStore::new(Duration::from_secs(60));

    store.insert(session("a")).await;
    store.insert(session("b")).await;
    store.insert(session("c")).await;

    assert_eq!(store.len().await, 3);
    for id in ["a", "b", "c"] {
        assert!(store.get(id).await.is_some());
    }
}

#[tokio::test]
async fn test_racing_submits_on_one_session_do_not_lose_updates() {
    let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
    store.insert(session("shared")).await;

    let mut handles = Vec::new();
    for _ in 0..25 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let entry = store.get("shared").await.expect("session exists");
            let mut session = entry.lock().await;
            // Read-modify-write that would lose updates without the
            // per-key lock
            let seen = session.invalid_count;
            tokio::task::yield_now().await;
            session.invalid_count = seen + 1;
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked");
    }

    let entry = store.get("shared").await.expect("session exists");
    assert_eq!(entry.lock().await.invalid_count, 25);
}
