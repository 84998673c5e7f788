//! Shared fixtures: a MemoryStore wrapper that counts calls and injects failures.

#![allow(dead_code)]

use parking_lot::Mutex;
use stamp_sync::{
    CountQuery, FeedHandle, FeedId, FeedSpec, MemoryStore, RemoteDataStore, RemoteFailure, Stamp,
    StampCountSync, StaticSession,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scripted answer for the next count query.
#[derive(Clone, Debug)]
pub enum CountScript {
    /// Answer with no count and no error.
    Null,
    /// Fail with this backend error.
    Fail(RemoteFailure),
}

#[derive(Default)]
pub struct ScriptedRemote {
    pub store: MemoryStore,
    count_script: Mutex<Vec<CountScript>>,
    subscribe_failure: Mutex<Option<RemoteFailure>>,
    pub count_calls: AtomicUsize,
    pub subscribe_calls: AtomicUsize,
    pub unsubscribe_calls: AtomicUsize,
}

impl ScriptedRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script the next count query. Scripts are consumed in order.
    pub fn script_count(&self, script: CountScript) {
        self.count_script.lock().push(script);
    }

    pub fn fail_subscribe(&self, failure: RemoteFailure) {
        *self.subscribe_failure.lock() = Some(failure);
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }

    /// Seed `n` active stamps for `user`.
    pub fn seed_active(&self, user: &str, n: usize) {
        for i in 0..n {
            self.store
                .insert_stamp(&Stamp::active(format!("{user}-seed-{i}"), user))
                .unwrap();
        }
    }
}

impl RemoteDataStore for ScriptedRemote {
    fn count(&self, query: &CountQuery) -> Result<Option<u64>, RemoteFailure> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);

        let script = {
            let mut scripts = self.count_script.lock();
            if scripts.is_empty() {
                None
            } else {
                Some(scripts.remove(0))
            }
        };

        match script {
            Some(CountScript::Null) => Ok(None),
            Some(CountScript::Fail(failure)) => Err(failure),
            None => self.store.count(query),
        }
    }

    fn subscribe(&self, spec: FeedSpec) -> Result<FeedHandle, RemoteFailure> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.subscribe_failure.lock().clone() {
            return Err(failure);
        }
        self.store.subscribe(spec)
    }

    fn unsubscribe(&self, id: FeedId) {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.store.unsubscribe(id);
    }
}

/// A sync signed in as `user` over a scripted remote.
pub fn signed_in(remote: &Arc<ScriptedRemote>, user: &str) -> StampCountSync {
    StampCountSync::new(remote.clone(), Arc::new(StaticSession::signed_in(user)))
}

/// A sync with nobody signed in.
pub fn anonymous(remote: &Arc<ScriptedRemote>) -> StampCountSync {
    StampCountSync::new(remote.clone(), Arc::new(StaticSession::anonymous()))
}

/// Route test logs through the test writer.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
