//! Store client operation tests.

use sso_test_utils::{test_client, MockStore};
use std::time::Duration;

#[tokio::test]
async fn test_set_and_get() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let client = test_client(&store);

    assert_eq!(client.get("key").await?, None);

    client.set("key", "first").await?;
    client.set("key", "second").await?;

    assert_eq!(client.get("key").await?.as_deref(), Some("second"));
    assert_eq!(client.ttl("key").await?, -1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_setex_and_expire() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let client = test_client(&store);

    client.setex("key", 10, "value").await?;
    assert_eq!(client.ttl("key").await?, 10);

    assert!(client.expire("key", 100).await?);
    assert_eq!(client.ttl("key").await?, 100);

    tokio::time::advance(Duration::from_secs(101)).await;
    assert_eq!(client.get("key").await?, None);
    assert_eq!(client.ttl("key").await?, -2);
    assert!(!client.expire("key", 100).await?);

    Ok(())
}

#[tokio::test]
async fn test_delete_reports_count() -> Result<(), anyhow::Error> {
    let store = MockStore::new().with_value("key", "value");
    let client = test_client(&store);

    assert_eq!(client.delete("key").await?, 1);
    assert_eq!(client.delete("key").await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_decrement() -> Result<(), anyhow::Error> {
    let store = MockStore::new().with_value("remaining", "3");
    let client = test_client(&store);

    assert_eq!(client.decrement("remaining").await?, 2);
    assert_eq!(client.decrement("remaining").await?, 1);
    assert_eq!(client.decrement("absent").await?, -1);

    Ok(())
}

#[tokio::test]
async fn test_take_reads_once() -> Result<(), anyhow::Error> {
    let store = MockStore::new().with_value("once", "value");
    let client = test_client(&store);

    assert_eq!(client.take("once").await?.as_deref(), Some("value"));
    assert_eq!(client.take("once").await?, None);
    assert!(!store.contains_key("once"));

    Ok(())
}

/// Every operation hands its connection back.
#[tokio::test]
async fn test_operations_release_connections() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let client = test_client(&store);

    client.set("a", "1").await?;
    client.get("a").await?;
    client.setex("b", 5, "2").await?;
    client.expire("b", 10).await?;
    client.ttl("b").await?;
    client.decrement("a").await?;
    client.take("b").await?;
    client.delete("a").await?;

    let status = client.pool().status();
    assert_eq!(status.in_use, 0);
    assert_eq!(status.idle, 1);
    assert_eq!(store.connections_opened(), 1);
    assert_eq!(store.commands(), 8);

    Ok(())
}
