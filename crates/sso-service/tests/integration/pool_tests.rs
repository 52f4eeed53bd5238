//! Connection pool bound, reuse and lifecycle tests.

use sso_service::errors::SsoError;
use sso_service::store::{StoreClient, StorePool};
use sso_test_utils::{test_pool, MockStore, TestPoolConfig};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_acquire_fails_when_exhausted() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let pool = test_pool(
        &store,
        TestPoolConfig::new()
            .with_max_total(2)
            .with_max_wait_ms(100)
            .build(),
    );

    let _first = pool.acquire().await?;
    let _second = pool.acquire().await?;
    assert_eq!(pool.status().in_use, 2);

    let started = tokio::time::Instant::now();
    let result = pool.acquire().await;

    assert!(
        matches!(result, Err(SsoError::PoolExhausted { waited }) if waited == Duration::from_millis(100))
    );
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(store.connections_opened(), 2);

    Ok(())
}

/// A waiter picks up the connection as soon as it is released.
#[tokio::test(start_paused = true)]
async fn test_waiter_gets_released_connection() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let pool = test_pool(
        &store,
        TestPoolConfig::new()
            .with_max_total(1)
            .with_max_idle(1)
            .with_max_wait_ms(1_000)
            .build(),
    );

    let held = pool.acquire().await?;

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(held);

    waiter.await??;
    assert_eq!(store.connections_opened(), 1, "connection should be reused");

    Ok(())
}

/// Many callers sharing a small pool all complete and never exceed the
/// bound.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bounded_under_load() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    store.set_command_delay(Some(Duration::from_millis(2)));
    let pool = test_pool(
        &store,
        TestPoolConfig::new()
            .with_max_total(3)
            .with_max_idle(3)
            .with_max_wait_ms(10_000)
            .build(),
    );
    let client = StoreClient::new(pool.clone());

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let client = client.clone();
            let store = store.clone();
            tokio::spawn(async move {
                let key = format!("key-{i}");
                client.setex(&key, 60, "value").await?;
                assert!(store.live_connections() <= 3);
                client.get(&key).await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await??.as_deref(), Some("value"));
    }

    assert!(store.connections_opened() <= 3);
    assert_eq!(pool.status().in_use, 0);

    Ok(())
}

#[tokio::test]
async fn test_idle_set_is_capped() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let pool = test_pool(
        &store,
        TestPoolConfig::new()
            .with_max_total(4)
            .with_max_idle(2)
            .build(),
    );

    let mut held = Vec::new();
    for _ in 0..4 {
        held.push(pool.acquire().await?);
    }
    assert_eq!(store.live_connections(), 4);

    drop(held);

    let status = pool.status();
    assert_eq!(status.idle, 2);
    assert_eq!(status.in_use, 0);
    assert_eq!(store.live_connections(), 2);

    Ok(())
}

#[tokio::test]
async fn test_idle_connection_is_reused() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let client = StoreClient::new(test_pool(&store, TestPoolConfig::new().build()));

    for _ in 0..5 {
        client.get("anything").await?;
    }

    assert_eq!(store.connections_opened(), 1);
    // Every reuse is health-checked
    assert_eq!(store.pings(), 4);

    Ok(())
}

/// Connections are checked when borrowed, not when handed back.
#[tokio::test]
async fn test_release_does_not_ping() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let pool = test_pool(&store, TestPoolConfig::new().build());

    drop(pool.acquire().await?);
    assert_eq!(pool.status().idle, 1);
    assert_eq!(store.pings(), 0);

    drop(pool.acquire().await?);
    assert_eq!(store.pings(), 1);

    Ok(())
}

#[tokio::test]
async fn test_health_check_can_be_disabled() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let client = StoreClient::new(test_pool(
        &store,
        TestPoolConfig::new().without_test_on_borrow().build(),
    ));

    for _ in 0..5 {
        client.get("anything").await?;
    }

    assert_eq!(store.connections_opened(), 1);
    assert_eq!(store.pings(), 0);

    Ok(())
}

#[tokio::test]
async fn test_connect_opens_and_parks_one_connection() -> Result<(), anyhow::Error> {
    let store = MockStore::new();

    let pool = StorePool::connect(store.clone(), TestPoolConfig::new().build()).await?;

    assert_eq!(store.connections_opened(), 1);
    assert_eq!(store.pings(), 1);
    assert_eq!(pool.status().idle, 1);

    Ok(())
}

#[tokio::test]
async fn test_new_rejects_invalid_limits() {
    let store = MockStore::new();
    let config = TestPoolConfig::new()
        .with_max_total(2)
        .with_max_idle(3)
        .build();

    let result = StorePool::new(store.clone(), config);

    assert!(matches!(result, Err(SsoError::Config(_))));
    assert_eq!(store.connections_opened(), 0);
}

#[tokio::test]
async fn test_new_rejects_oversized_pool() {
    let store = MockStore::new();
    let config = TestPoolConfig::new()
        .with_max_total(usize::MAX)
        .with_max_idle(0)
        .build();

    let result = StorePool::new(store.clone(), config);

    assert!(matches!(result, Err(SsoError::Config(msg)) if msg.contains("max_total")));
}

#[tokio::test]
async fn test_closed_pool_rejects_acquire() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let client = StoreClient::new(test_pool(&store, TestPoolConfig::new().build()));

    client.set("key", "value").await?;
    assert_eq!(client.pool().status().idle, 1);

    client.pool().close();

    assert!(client.pool().is_closed());
    assert!(matches!(client.get("key").await, Err(SsoError::PoolClosed)));
    assert_eq!(store.live_connections(), 0, "idle connections are closed");

    // Closing twice is harmless
    client.pool().close();

    Ok(())
}

#[tokio::test]
async fn test_connection_borrowed_during_close_is_not_parked() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let pool = test_pool(&store, TestPoolConfig::new().build());

    let held = pool.acquire().await?;
    pool.close();
    drop(held);

    assert_eq!(pool.status().idle, 0);
    assert_eq!(store.live_connections(), 0);

    Ok(())
}

/// Guards dropped on other threads while the pool closes never leave a
/// connection parked behind.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_racing_releases_leaves_no_idle() -> Result<(), anyhow::Error> {
    for _ in 0..20 {
        let store = MockStore::new();
        let pool = test_pool(
            &store,
            TestPoolConfig::new()
                .with_max_total(8)
                .with_max_idle(8)
                .build(),
        );

        let mut held = Vec::new();
        for _ in 0..8 {
            held.push(pool.acquire().await?);
        }

        let releases: Vec<_> = held
            .into_iter()
            .map(|conn| tokio::spawn(async move { drop(conn) }))
            .collect();
        pool.close();
        for release in releases {
            release.await?;
        }

        assert_eq!(pool.status().idle, 0);
        assert_eq!(store.live_connections(), 0);
    }

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_close_wakes_waiters() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let pool = test_pool(
        &store,
        TestPoolConfig::new()
            .with_max_total(1)
            .with_max_idle(1)
            .with_max_wait_ms(60_000)
            .build(),
    );

    let _held = pool.acquire().await?;
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    pool.close();

    assert!(matches!(waiter.await?, Err(SsoError::PoolClosed)));

    Ok(())
}

#[tokio::test]
async fn test_release_returns_connection() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let pool = test_pool(&store, TestPoolConfig::new().build());

    let conn = pool.acquire().await?;
    assert_eq!(pool.status().in_use, 1);
    assert!(!conn.is_broken());

    pool.release(conn);

    let status = pool.status();
    assert_eq!(status.in_use, 0);
    assert_eq!(status.idle, 1);

    Ok(())
}

#[tokio::test]
async fn test_marked_broken_connection_is_discarded() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let pool = test_pool(&store, TestPoolConfig::new().build());

    let mut conn = pool.acquire().await?;
    conn.mark_broken();
    drop(conn);

    assert_eq!(pool.status().idle, 0);
    assert_eq!(store.live_connections(), 0);

    Ok(())
}
