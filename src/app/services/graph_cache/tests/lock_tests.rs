//! Tests for the cross-process rebuild lock

use super::*;
use crate::app::services::graph_cache::RebuildLock;
use tempfile::TempDir;
use tokio::time::Instant;

#[tokio::test]
async fn test_acquire_creates_lock_file_and_releases_on_drop() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("graph.lock");
    let deadline = Instant::now() + Duration::from_millis(200);

    let lock = RebuildLock::acquire(&path, deadline, Duration::from_millis(10))
        .await
        .unwrap();
    assert!(path.exists());
    assert_eq!(lock.path(), path.as_path());
    drop(lock);

    let deadline = Instant::now() + Duration::from_millis(200);
    assert!(
        RebuildLock::acquire(&path, deadline, Duration::from_millis(10))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_contended_lock_times_out_at_deadline() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("graph.lock");
    let _holder = hold_lock(&path);

    let started = std::time::Instant::now();
    let deadline = Instant::now() + Duration::from_millis(150);
    let result = RebuildLock::acquire(&path, deadline, Duration::from_millis(20)).await;

    match result {
        Err(Error::LockTimeout { waited, .. }) => {
            assert!(waited >= Duration::from_millis(100));
        }
        other => panic!("expected lock timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_waiter_acquires_once_holder_releases() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("graph.lock");
    let holder = hold_lock(&path);

    let releaser = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(holder);
    });

    let deadline = Instant::now() + Duration::from_secs(2);
    let lock = RebuildLock::acquire(&path, deadline, Duration::from_millis(10)).await;
    releaser.await.unwrap();

    assert!(lock.is_ok());
}
