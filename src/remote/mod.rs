//! Boundary to the hosted data backend.

mod memory;

pub use memory::{MemoryStore, MemoryStoreStats};

use crate::feed::{FeedHandle, FeedId, FeedSpec};
use crate::types::{CountQuery, RemoteFailure};

/// Queryable, authenticated data backend.
///
/// Implementations wrap a hosted backend client or, for local use and tests,
/// [`MemoryStore`].
pub trait RemoteDataStore: Send + Sync {
    /// Count rows in `query.table` matching every equality filter, without
    /// transferring row bodies.
    ///
    /// `Ok(None)` means the backend answered without a count.
    fn count(&self, query: &CountQuery) -> Result<Option<u64>, RemoteFailure>;

    /// Register a change feed for rows of `spec.table` matching `spec.filter`.
    fn subscribe(&self, spec: FeedSpec) -> Result<FeedHandle, RemoteFailure>;

    /// Unregister a change feed. Unknown ids are ignored.
    fn unsubscribe(&self, id: FeedId);
}
