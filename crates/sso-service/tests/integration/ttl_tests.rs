//! Record lifetime tests.
//!
//! Time is paused; `tokio::time::advance` moves the mock store's clock.

use sso_service::store::StoreClient;
use sso_service::tickets::keys::{session_key, st_key, tgc_key};
use sso_service::tickets::TicketPolicy;
use sso_test_utils::{test_tickets, test_tickets_with_policy, MockStore, TEST_SUBJECT};
use std::time::Duration;
use tokio::time::advance;

#[tokio::test(start_paused = true)]
async fn test_tgc_refresh_resets_ttl() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let (tickets, pool) = test_tickets(&store);
    let client = StoreClient::new(pool);

    let tgc = tickets.tgc.issue(TEST_SUBJECT).await?;
    assert_eq!(client.ttl(&tgc_key(&tgc)).await?, 18_000);

    advance(Duration::from_secs(100)).await;
    assert_eq!(client.ttl(&tgc_key(&tgc)).await?, 17_900);

    assert!(tickets.tgc.refresh(&tgc).await?);
    assert_eq!(client.ttl(&tgc_key(&tgc)).await?, 18_000);
    assert_eq!(store.value(&tgc_key(&tgc)).as_deref(), Some(TEST_SUBJECT));
    assert_eq!(
        tickets.tgc.subject(&tgc).await?.as_deref(),
        Some(TEST_SUBJECT)
    );

    Ok(())
}

/// Refreshing at regular intervals keeps a TGC alive past its original
/// expiry.
#[tokio::test(start_paused = true)]
async fn test_refreshed_tgc_outlives_original_ttl() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let (tickets, _pool) = test_tickets(&store);

    let tgc = tickets.tgc.issue(TEST_SUBJECT).await?;

    for _ in 0..3 {
        advance(Duration::from_secs(10_000)).await;
        assert!(tickets.tgc.refresh(&tgc).await?);
        assert_eq!(
            tickets.tgc.subject(&tgc).await?.as_deref(),
            Some(TEST_SUBJECT)
        );
    }

    assert!(tickets.tgc.validate(&tgc).await?);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_tgc_expires() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let (tickets, _pool) = test_tickets(&store);

    let tgc = tickets.tgc.issue(TEST_SUBJECT).await?;

    advance(Duration::from_secs(18_001)).await;

    assert!(!tickets.tgc.validate(&tgc).await?);
    assert_eq!(tickets.st.issue(&tgc).await?, None);

    Ok(())
}

/// Refresh of an expired TGC does not bring it back.
#[tokio::test(start_paused = true)]
async fn test_refresh_after_expiry_is_noop() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let (tickets, _pool) = test_tickets(&store);

    let tgc = tickets.tgc.issue(TEST_SUBJECT).await?;
    advance(Duration::from_secs(18_001)).await;

    assert!(!tickets.tgc.refresh(&tgc).await?);
    assert!(!store.contains_key(&tgc_key(&tgc)));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_st_expires() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let (tickets, pool) = test_tickets(&store);
    let client = StoreClient::new(pool);

    let tgc = tickets.tgc.issue(TEST_SUBJECT).await?;
    let st = tickets.st.issue(&tgc).await?.expect("TGC is live");
    assert_eq!(client.ttl(&st_key(&st)).await?, 3_000);

    advance(Duration::from_secs(3_001)).await;

    assert_eq!(tickets.st.consume(&st).await?, None);
    // The TGC outlives the ST
    assert!(tickets.tgc.validate(&tgc).await?);

    Ok(())
}

/// The marker starts at 1800s and a refresh extends it to 18000s.
#[tokio::test(start_paused = true)]
async fn test_session_refresh_extends_beyond_initial_ttl() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let (tickets, pool) = test_tickets(&store);
    let client = StoreClient::new(pool);

    tickets.tgc.issue(TEST_SUBJECT).await?;
    assert_eq!(client.ttl(&session_key(TEST_SUBJECT)).await?, 1_800);

    assert!(tickets.sessions.refresh(TEST_SUBJECT).await?);
    assert_eq!(client.ttl(&session_key(TEST_SUBJECT)).await?, 18_000);
    assert_eq!(
        tickets.sessions.get(TEST_SUBJECT).await?.as_deref(),
        Some(TEST_SUBJECT)
    );

    Ok(())
}

/// Without a refresh the marker lapses long before the TGC does.
#[tokio::test(start_paused = true)]
async fn test_session_marker_expires_independently() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let (tickets, _pool) = test_tickets(&store);

    let tgc = tickets.tgc.issue(TEST_SUBJECT).await?;

    advance(Duration::from_secs(1_801)).await;

    assert_eq!(tickets.sessions.get(TEST_SUBJECT).await?, None);
    assert!(tickets.tgc.validate(&tgc).await?);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_session_refresh_on_missing_marker_is_noop() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let (tickets, _pool) = test_tickets(&store);

    assert!(!tickets.sessions.refresh(TEST_SUBJECT).await?);
    assert!(!store.contains_key(&session_key(TEST_SUBJECT)));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_custom_policy_lifetimes() -> Result<(), anyhow::Error> {
    let store = MockStore::new();
    let policy = TicketPolicy {
        tgc_ttl_seconds: 60,
        st_ttl_seconds: 5,
        session_ttl_seconds: 30,
        session_refresh_ttl_seconds: 90,
    };
    let (tickets, _pool) = test_tickets_with_policy(&store, policy);

    let tgc = tickets.tgc.issue(TEST_SUBJECT).await?;
    let st = tickets.st.issue(&tgc).await?.expect("TGC is live");

    assert_eq!(
        store.ttl_of(&tgc_key(&tgc)),
        Some(Some(Duration::from_secs(60)))
    );
    assert_eq!(
        store.ttl_of(&st_key(&st)),
        Some(Some(Duration::from_secs(5)))
    );

    advance(Duration::from_secs(61)).await;
    assert!(!tickets.tgc.validate(&tgc).await?);
    assert_eq!(tickets.st.consume(&st).await?, None);

    Ok(())
}
