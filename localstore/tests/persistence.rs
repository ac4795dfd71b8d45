use localstore::prelude::*;
use serde_json::json;
use std::{collections::HashMap, fs, path::Path, time::Duration};
use tempfile::TempDir;

async fn open(path: &Path) -> LocalDb {
    let db = LocalDb::builder()
        .snapshot_path(path)
        .build()
        .await
        .unwrap();
    db.wait_ready().await;
    db
}

async fn listing(db: &LocalDb, type_name: &str) -> HashMap<String, Document> {
    db.dispatch(Request::list(type_name))
        .await
        .unwrap()
        .as_list()
        .unwrap()
        .list
        .iter()
        .map(|d| (d.guid.clone(), d.clone()))
        .collect()
}

#[tokio::test]
async fn snapshot_round_trip_reproduces_reads_and_lists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".localstore").join("db.json");

    let db = open(&path).await;
    let alice = db
        .dispatch(Request::create("users", json!({ "name": "Alice" })))
        .await
        .unwrap()
        .into_document()
        .unwrap();
    db.dispatch(Request::create("users", json!([{ "name": "Bob" }, { "name": "Carol" }])))
        .await
        .unwrap();
    db.dispatch(Request::create("orders", json!({ "total": 12.5, "items": ["a", "b"] })))
        .await
        .unwrap();

    let users_before = listing(&db, "users").await;
    let orders_before = listing(&db, "orders").await;
    db.shutdown().await.unwrap();

    assert!(path.exists());

    let reopened = open(&path).await;
    assert_eq!(listing(&reopened, "users").await, users_before);
    assert_eq!(listing(&reopened, "orders").await, orders_before);
    assert_eq!(
        reopened
            .dispatch(Request::read("users", &alice.guid))
            .await
            .unwrap(),
        Response::Document(alice)
    );
}

#[tokio::test]
async fn emptied_types_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");

    let db = open(&path).await;
    let doc = db
        .dispatch(Request::create("ephemeral", json!({ "a": 1 })))
        .await
        .unwrap()
        .into_document()
        .unwrap();
    db.dispatch(Request::delete("ephemeral", &doc.guid)).await.unwrap();
    db.shutdown().await.unwrap();

    let reopened = open(&path).await;
    let listed = reopened.dispatch(Request::list("ephemeral")).await.unwrap();
    assert_eq!(listed.as_list().unwrap().count, 0);
}

#[tokio::test]
async fn missing_snapshot_starts_empty_and_ready() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir.path().join("absent.json")).await;

    assert!(db.is_ready());
    assert!(db.backend().list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_snapshot_starts_empty_and_is_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    fs::write(&path, b"{ definitely not a snapshot").unwrap();

    let db = open(&path).await;
    assert!(db.backend().list_collections().await.unwrap().is_empty());

    db.dispatch(Request::create("fresh", json!({ "ok": true })))
        .await
        .unwrap();
    db.shutdown().await.unwrap();

    let reopened = open(&path).await;
    assert_eq!(listing(&reopened, "fresh").await.len(), 1);
}

#[tokio::test]
async fn snapshot_sharing_a_guid_across_types_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    let guid = "aaaaaaaaaaaaaaaaaaaaaaaa";
    let entry = |type_name: &str| json!({ guid: { "guid": guid, "type": type_name, "fields": {} } });
    fs::write(
        &path,
        serde_json::to_vec(&json!({ "a": entry("a"), "b": entry("b") })).unwrap(),
    )
    .unwrap();

    let db = open(&path).await;
    assert!(db.backend().list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn flush_failure_is_swallowed() {
    let dir = TempDir::new().unwrap();
    // A directory where the snapshot file should be makes the rename fail.
    let path = dir.path().join("db.json");
    fs::create_dir_all(&path).unwrap();

    let db = open(&path).await;
    db.dispatch(Request::create("T", json!({ "a": 1 })))
        .await
        .unwrap();

    assert!(!db.flush().await);
    assert!(db.shutdown().await.is_ok());
}

#[tokio::test]
async fn restored_guids_are_not_reissued() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");

    let db = open(&path).await;
    db.dispatch(Request::create("T", json!((0..50).map(|i| json!({ "i": i })).collect::<Vec<_>>())))
        .await
        .unwrap();
    let before = listing(&db, "T").await;
    db.shutdown().await.unwrap();

    let reopened = open(&path).await;
    for i in 0..50 {
        let doc = reopened
            .dispatch(Request::create("T", json!({ "new": i })))
            .await
            .unwrap()
            .into_document()
            .unwrap();
        assert!(!before.contains_key(&doc.guid));
    }
    assert_eq!(listing(&reopened, "T").await.len(), 100);
}

#[tokio::test]
async fn requests_are_held_until_hydration_completes() {
    let store = InMemoryStore::new();
    let gateway = SnapshotGateway::new("unused.json");
    let dispatcher = std::sync::Arc::new(Dispatcher::with_readiness(
        store.clone(),
        gateway.readiness(),
    ));

    let pending = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .dispatch(Request::list("hydrated"))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!pending.is_finished());

    // Simulate a snapshot landing, then release the gate.
    store
        .insert_documents("hydrated", vec![json!({ "a": 1 }).as_object().cloned().unwrap()])
        .await
        .unwrap();
    gateway.readiness().mark_ready();

    let listed = pending.await.unwrap().unwrap();
    assert_eq!(listed.as_list().unwrap().count, 1);
}

#[test]
fn abandoned_hydration_releases_requests_and_keeps_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");

    let runtime = || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    };

    let seeding = runtime();
    let original = seeding.block_on(async {
        let db = open(&path).await;
        let doc = db
            .dispatch(Request::create("kept", json!({ "a": 1 })))
            .await
            .unwrap()
            .into_document()
            .unwrap();
        db.shutdown().await.unwrap();
        doc
    });
    drop(seeding);

    // The hydration task dies with the runtime that spawned it.
    let first = runtime();
    let db = first
        .block_on(LocalDb::builder().snapshot_path(&path).build())
        .unwrap();
    drop(first);
    assert!(db.is_ready());

    let second = runtime();
    second.block_on(async {
        tokio::time::timeout(
            Duration::from_secs(2),
            db.dispatch(Request::create("later", json!({ "b": 2 }))),
        )
        .await
        .unwrap()
        .unwrap();

        db.shutdown().await.unwrap();
    });

    let reopened = runtime().block_on(async {
        let db = open(&path).await;
        db.dispatch(Request::read("kept", &original.guid)).await.unwrap()
    });
    assert_eq!(reopened, Response::Document(original));
}
