// tests/cursor_store.rs
use std::sync::Arc;

use au_sentiment_harvester::cursor::CursorStore;
use au_sentiment_harvester::store::{DocumentStore, MemoryStore};

const STREAM: &str = "mastodon:public";

#[tokio::test]
async fn save_then_load_roundtrips() {
    let backend = Arc::new(MemoryStore::new());
    let cursors = CursorStore::new(Arc::clone(&backend) as Arc<dyn DocumentStore>);

    assert!(cursors.load(STREAM).await.is_none());

    cursors.save(STREAM, 123).await.unwrap();
    let c = cursors.load(STREAM).await.unwrap();
    assert_eq!(c.stream_key, STREAM);
    assert_eq!(c.position, 123);
}

#[tokio::test]
async fn load_failure_is_swallowed_as_cold_start() {
    let backend = Arc::new(MemoryStore::new());
    backend.fail_gets(true);
    let cursors = CursorStore::new(backend as Arc<dyn DocumentStore>);

    assert!(cursors.load(STREAM).await.is_none());
    // the fallible variant still reports the failure
    assert!(cursors.try_load(STREAM).await.is_err());
}

#[tokio::test]
async fn save_refuses_regression() {
    let backend = Arc::new(MemoryStore::new());
    let cursors = CursorStore::new(backend as Arc<dyn DocumentStore>);

    cursors.save(STREAM, 100).await.unwrap();
    cursors.save(STREAM, 40).await.unwrap();
    assert_eq!(cursors.load(STREAM).await.unwrap().position, 100);

    // equal and greater positions are accepted
    cursors.save(STREAM, 100).await.unwrap();
    cursors.save(STREAM, 101).await.unwrap();
    assert_eq!(cursors.load(STREAM).await.unwrap().position, 101);
}

#[tokio::test]
async fn save_failure_surfaces_an_error() {
    let backend = Arc::new(MemoryStore::new());
    backend.fail_upserts(true);
    let cursors = CursorStore::new(backend as Arc<dyn DocumentStore>);

    assert!(cursors.save(STREAM, 5).await.is_err());
}

#[tokio::test]
async fn streams_are_independent() {
    let backend = Arc::new(MemoryStore::new());
    let cursors = CursorStore::new(backend as Arc<dyn DocumentStore>);

    cursors.save("reddit:australia", 10).await.unwrap();
    cursors.save("reddit:sydney", 99).await.unwrap();

    assert_eq!(cursors.load("reddit:australia").await.unwrap().position, 10);
    assert_eq!(cursors.load("reddit:sydney").await.unwrap().position, 99);
}
