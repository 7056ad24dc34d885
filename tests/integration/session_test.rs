//! Integration tests for the session coordinator.

use graph_console::backend::{BackendCall, ExecutionBackend, MockBackend, ResponseData, Value};
use graph_console::persistence::{Favorites, KeyValueStore, MemoryStore, StateDb};
use graph_console::session::{SessionConfig, SessionCoordinator, DEFAULT_STATEMENT};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

async fn create_session(backend: Arc<MockBackend>) -> SessionCoordinator {
    SessionCoordinator::new(
        backend,
        Arc::new(MemoryStore::new()),
        SessionConfig::default(),
    )
    .await
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_history_grows_newest_first_with_fresh_ids() {
    let session = create_session(Arc::new(MockBackend::new())).await;
    let mut seen = HashSet::new();

    for raw in ["SHOW SPACES;", "YIELD 1;\nYIELD 2;\nYIELD 3;", "SHOW HOSTS; YIELD 4"] {
        let before = session.snapshot().history;
        let seq = session.run(raw, None).await.unwrap();
        let after = session.snapshot().history;

        let added = after.len() - before.len();
        assert_eq!(session.snapshot().entries_for_run(seq).count(), added);
        assert!(after[..added].iter().all(|entry| entry.seq == seq));
        assert_eq!(&after[added..], &before[..]);
        for entry in &after[..added] {
            assert!(seen.insert(entry.id), "id reused: {}", entry.id);
        }
    }

    assert_eq!(session.snapshot().history.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_last_clause_wins_on_one_line() {
    let backend = Arc::new(MockBackend::new().with_spaces(&["nba"]));
    let session = create_session(backend).await;

    session.run("YIELD 1; SHOW SPACES", None).await.unwrap();

    let history = session.snapshot().history;
    assert_eq!(history.len(), 1);
    let data = history[0].response.data.as_ref().unwrap();
    assert_eq!(data.headers, vec!["Name"]);
    assert_eq!(data.rows, vec![vec![Value::from("nba")]]);
}

#[tokio::test(start_paused = true)]
async fn test_mutating_directive_triggers_param_refresh() {
    let backend = Arc::new(MockBackend::new());
    let session = create_session(backend.clone()).await;

    session.run(":set foo=1;\nSHOW SPACES;", None).await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[1], BackendCall::Single { param_directives, .. }
        if param_directives == &vec![":params".to_string()]));
    assert_eq!(session.snapshot().params, Some(Default::default()));
}

#[tokio::test(start_paused = true)]
async fn test_inspection_directive_does_not_refresh() {
    let backend = Arc::new(MockBackend::new());
    let session = create_session(backend.clone()).await;

    session.run(":PARAMS;\nSHOW SPACES;", None).await.unwrap();

    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_parameters_flow_between_runs() {
    let backend = Arc::new(MockBackend::new());
    let session = create_session(backend.clone()).await;

    session
        .run(":param player => \"Tim Duncan\"", None)
        .await
        .unwrap();
    assert_eq!(
        session.snapshot().params.unwrap().get("player"),
        Some(&Value::from("Tim Duncan"))
    );

    session.run(":param player =>", None).await.unwrap();
    assert!(session.snapshot().params.unwrap().is_empty());
    assert!(backend.params().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_statement_is_recorded_not_raised() {
    let backend = Arc::new(
        MockBackend::new().with_rejection("SHOW SPACE ", "SyntaxError: syntax error near `SPACE'"),
    );
    let session = create_session(backend).await;

    session.run("SHOW SPACE x;", None).await.unwrap();

    let history = session.snapshot().history;
    assert_eq!(history.len(), 1);
    assert!(!history[0].response.is_success());
}

#[tokio::test(start_paused = true)]
async fn test_custom_response_and_loading_cycle() {
    let data = ResponseData::with_rows(vec!["count".to_string()], vec![vec![Value::Int(51)]]);
    let backend = Arc::new(
        MockBackend::new()
            .with_response("count(*)", data)
            .with_delay("count(*)", Duration::from_millis(50)),
    );
    let session = create_session(backend).await;
    let mut updates = session.subscribe();

    let run = session.run("MATCH (v) RETURN count(*)", None);
    assert!(session.is_loading());
    run.await.unwrap();

    updates.changed().await.unwrap();
    assert!(updates.borrow_and_update().loading);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!session.is_loading());
    let history = session.snapshot().history;
    assert_eq!(
        history[0].response.data.as_ref().unwrap().rows,
        vec![vec![Value::Int(51)]]
    );
}

#[tokio::test(start_paused = true)]
async fn test_reset_model_after_activity() {
    let session = create_session(Arc::new(MockBackend::new())).await;
    session
        .run(":param a => 1;\nSHOW SPACES;", Some("edited".to_string()))
        .await
        .unwrap();
    assert_eq!(session.snapshot().last_text, "edited");

    session.reset_model();

    let state = session.snapshot();
    assert!(state.history.is_empty());
    assert!(state.params.is_none());
    assert_eq!(state.last_text, DEFAULT_STATEMENT);
}

#[tokio::test]
async fn test_favorites_survive_restart_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.db");
    let backend: Arc<dyn ExecutionBackend> = Arc::new(MockBackend::new());
    let favorites: Favorites = [("spaces", "SHOW SPACES;"), ("hosts", "SHOW HOSTS;")]
        .into_iter()
        .collect();

    {
        let store: Arc<dyn KeyValueStore> = Arc::new(StateDb::open(&path).await.unwrap());
        let session = SessionCoordinator::new(backend.clone(), store, SessionConfig::default())
            .await
            .unwrap();
        session.update_favorites(favorites.clone()).await.unwrap();
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(StateDb::open(&path).await.unwrap());
    let session = SessionCoordinator::new(backend, store, SessionConfig::default())
        .await
        .unwrap();
    assert_eq!(session.snapshot().favorites, favorites);
}

#[tokio::test]
async fn test_malformed_favorites_load_as_empty() {
    let store: Arc<dyn KeyValueStore> =
        Arc::new(MemoryStore::with_entry("favorites", "{not json"));
    let session = SessionCoordinator::new(
        Arc::new(MockBackend::new()),
        store,
        SessionConfig::default(),
    )
    .await
    .unwrap();

    assert!(session.snapshot().favorites.is_empty());
}
