//! Integration tests for the persistence layer.

use graph_console::persistence::{
    load_favorites, save_favorites, Favorites, KeyValueStore, MemoryStore, StateDb,
};
use std::sync::Arc;
use tempfile::tempdir;

async fn create_test_db() -> (StateDb, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test_state.db");
    let db = StateDb::open(&path).await.unwrap();
    (db, dir)
}

#[tokio::test]
async fn test_state_db_creation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.db");

    let db = StateDb::open(&path).await.unwrap();
    assert!(path.exists());
    db.close().await;
}

#[tokio::test]
async fn test_favorites_round_trip_through_state_db() {
    let (db, _dir) = create_test_db().await;
    let favorites = Favorites::new()
        .with("spaces", "SHOW SPACES;")
        .with("serve", "MATCH (v)-[e:serve]->() RETURN e LIMIT 10;");

    save_favorites(&db, "favorites", &favorites).await.unwrap();
    let loaded = load_favorites(&db, "favorites").await.unwrap();

    assert_eq!(loaded, favorites);
    db.close().await;
}

#[tokio::test]
async fn test_favorites_keys_are_independent() {
    let (db, _dir) = create_test_db().await;

    save_favorites(&db, "alice", &Favorites::new().with("a", "YIELD 1"))
        .await
        .unwrap();
    save_favorites(&db, "bob", &Favorites::new().with("b", "YIELD 2"))
        .await
        .unwrap();

    assert_eq!(load_favorites(&db, "alice").await.unwrap().get("a"), Some("YIELD 1"));
    assert!(load_favorites(&db, "alice").await.unwrap().get("b").is_none());
    db.close().await;
}

#[tokio::test]
async fn test_stores_behave_alike() {
    let (db, _dir) = create_test_db().await;
    let stores: Vec<Arc<dyn KeyValueStore>> = vec![Arc::new(db), Arc::new(MemoryStore::new())];

    for store in stores {
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }
}

#[tokio::test]
async fn test_concurrent_writes() {
    let (db, _dir) = create_test_db().await;
    let db = Arc::new(db);

    let mut handles = Vec::new();
    for i in 0..8 {
        let db = Arc::clone(&db);
        handles.push(tokio::spawn(async move {
            db.set(&format!("key-{i}"), &format!("value-{i}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for i in 0..8 {
        assert_eq!(
            db.get(&format!("key-{i}")).await.unwrap(),
            Some(format!("value-{i}"))
        );
    }
}
