//! Error handling and edge case tests.

mod common;

use common::{signed_in, CountScript, ScriptedRemote};
use stamp_sync::{
    FeedSpec, MemoryStore, RemoteDataStore, RemoteFailure, RowFilter, StampCountSync,
    StaticSession, StoreError, SyncConfig, SyncError,
};
use std::sync::Arc;

// --- Count Errors ---

#[test]
fn test_remote_error_without_message_uses_fallback() {
    let remote = ScriptedRemote::new();
    remote.script_count(CountScript::Fail(RemoteFailure::silent()));
    let sync = signed_in(&remote, "U1");

    match sync.current_identity_count() {
        Err(SyncError::RemoteQuery(message)) => {
            assert_eq!(message, "Failed to fetch active stamps count")
        }
        other => panic!("Expected RemoteQuery error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_custom_fallback_message() {
    let remote = ScriptedRemote::new();
    remote.script_count(CountScript::Fail(RemoteFailure::silent()));
    let sync = StampCountSync::with_config(
        remote.clone(),
        Arc::new(StaticSession::signed_in("U1")),
        SyncConfig {
            fallback_message: "stamps unavailable".into(),
            ..Default::default()
        },
    );

    let err = sync
        .count_for_identity(&"U1".into())
        .unwrap_err();
    assert_eq!(err.message(), "stamps unavailable");
}

#[test]
fn test_failed_fetch_leaves_cache_empty() {
    let remote = ScriptedRemote::new();
    remote.seed_active("U1", 4);
    remote.script_count(CountScript::Fail(RemoteFailure::new("timeout")));
    let sync = signed_in(&remote, "U1");

    assert!(sync.current_identity_count().is_err());
    assert_eq!(sync.cached(), None);

    // No retry happened, the next call queries again
    assert_eq!(remote.count_calls(), 1);
    assert_eq!(sync.current_identity_count().unwrap(), 4);
    assert_eq!(remote.count_calls(), 2);
}

#[test]
fn test_admin_failure_does_not_touch_cache() {
    let remote = ScriptedRemote::new();
    remote.seed_active("U1", 2);
    let sync = signed_in(&remote, "U1");
    sync.current_identity_count().unwrap();

    remote.script_count(CountScript::Fail(RemoteFailure::new("denied")));
    assert!(matches!(
        sync.count_for_identity(&"U9".into()),
        Err(SyncError::RemoteQuery(_))
    ));
    assert_eq!(sync.cached(), Some(2));
}

// --- Watch Errors ---

#[test]
fn test_bootstrap_failure_never_subscribes() {
    let remote = ScriptedRemote::new();
    remote.script_count(CountScript::Fail(RemoteFailure::new("db down")));
    let sync = signed_in(&remote, "U1");

    match sync.watch_current_identity_count() {
        Err(SyncError::SubscriptionBootstrap(cause)) => {
            assert!(matches!(*cause, SyncError::RemoteQuery(ref m) if m == "db down"));
        }
        Err(other) => panic!("Expected SubscriptionBootstrap, got {other}"),
        Ok(_) => panic!("Expected SubscriptionBootstrap, got a watch"),
    }

    assert_eq!(remote.subscribe_calls(), 0);
    assert_eq!(remote.store.feed_count(), 0);
    assert_eq!(sync.cached(), None);
}

#[test]
fn test_subscribe_failure_is_surfaced() {
    let remote = ScriptedRemote::new();
    remote.seed_active("U1", 3);
    remote.fail_subscribe(RemoteFailure::new("realtime quota exceeded"));
    let sync = signed_in(&remote, "U1");

    match sync.watch_current_identity_count() {
        Err(SyncError::Subscription(message)) => {
            assert_eq!(message, "realtime quota exceeded")
        }
        Err(other) => panic!("Expected Subscription error, got {other}"),
        Ok(_) => panic!("Expected Subscription error, got a watch"),
    }

    // Bootstrap still populated the cache, and nothing needs tearing down
    assert_eq!(sync.cached(), Some(3));
    assert_eq!(remote.subscribe_calls(), 1);
    assert_eq!(remote.unsubscribe_calls(), 0);
}

#[test]
fn test_subscribe_failure_without_message() {
    let remote = ScriptedRemote::new();
    remote.fail_subscribe(RemoteFailure::silent());
    let sync = signed_in(&remote, "U1");

    let err = sync.watch_current_identity_count().err().unwrap();
    assert!(matches!(err, SyncError::Subscription(_)));
    assert_eq!(err.message(), "Failed to open stamp change feed");
}

#[test]
fn test_sign_out_blocks_new_watches_only() {
    let remote = ScriptedRemote::new();
    let session = Arc::new(StaticSession::signed_in("U1"));
    let sync = StampCountSync::new(remote.clone(), session.clone());

    let mut watch = sync.watch_current_identity_count().unwrap();
    session.sign_out();

    assert!(matches!(
        sync.watch_current_identity_count(),
        Err(SyncError::Unauthenticated)
    ));
    // The open watch keeps running until cancelled
    assert_eq!(watch.try_recv().unwrap(), 0);
    assert!(!watch.is_closed());
}

// --- Store Errors ---

#[test]
fn test_store_rejects_malformed_input() {
    let store = MemoryStore::new();

    assert!(matches!(
        store.insert("stamps", serde_json::json!("not a row")),
        Err(StoreError::InvalidRow(_))
    ));
    assert!(matches!(
        store.update("stamps", "s1", serde_json::json!({"status": "used"})),
        Err(StoreError::TableNotFound(_))
    ));
    assert!(matches!(
        "user_id>5".parse::<RowFilter>(),
        Err(StoreError::InvalidFilter(_))
    ));
}

#[test]
fn test_store_unsubscribe_unknown_feed_is_noop() {
    let store = MemoryStore::new();
    let handle = store
        .subscribe(FeedSpec::new("stamps", RowFilter::eq("user_id", "U1")))
        .unwrap();

    store.unsubscribe(handle.id);
    store.unsubscribe(handle.id);
    assert_eq!(store.feed_count(), 0);
}
