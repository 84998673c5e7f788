//! # Stamp Sync
//!
//! Live active-stamp counts for a loyalty program, mirrored from a remote
//! backend's row-level change feed.
//!
//! ## Core Concepts
//!
//! - **StampCountSync**: one-shot, cached, and live active-stamp counts
//! - **CountCache**: the single cached count for the authenticated identity
//! - **CountWatch**: a running count fed by insert/update/delete events
//! - **RemoteDataStore**: the backend boundary (count queries, change feeds)
//! - **MemoryStore**: an in-process backend with filtered change feeds
//!
//! ## Example
//!
//! ```ignore
//! use stamp_sync::{MemoryStore, Stamp, StampCountSync, StaticSession};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.insert_stamp(&Stamp::active("s1", "U1"))?;
//!
//! let sync = StampCountSync::new(store.clone(), Arc::new(StaticSession::signed_in("U1")));
//! assert_eq!(sync.current_identity_count()?, 1);
//!
//! let mut watch = sync.watch_current_identity_count()?;
//! assert_eq!(watch.recv()?, 1);
//!
//! store.insert_stamp(&Stamp::active("s2", "U1"))?;
//! assert_eq!(watch.recv()?, 2);
//! ```

pub mod error;
pub mod feed;
pub mod remote;
pub mod session;
pub mod sync;
pub mod types;

// Re-exports
pub use error::{Result, StoreError, StoreResult, SyncError};
pub use feed::{
    ChangeEvent, ChangeFeedManager, DropReason, FeedHandle, FeedId, FeedSpec, RowFilter,
};
pub use remote::{MemoryStore, MemoryStoreStats, RemoteDataStore};
pub use session::{SessionProvider, StaticSession};
pub use sync::{CountCache, CountDelta, CountWatch, StampCountSync, SyncConfig};
pub use types::*;
