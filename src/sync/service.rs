//! StampCountSync: cached and live active-stamp counts.

use crate::error::{Result, SyncError};
use crate::feed::{FeedSpec, RowFilter, DEFAULT_FEED_BUFFER};
use crate::remote::RemoteDataStore;
use crate::session::SessionProvider;
use crate::types::{CountQuery, Identity, StampStatus, STAMPS_TABLE};
use std::sync::Arc;
use tracing::{debug, warn};

use super::cache::CountCache;
use super::watch::CountWatch;

/// Message used when the backend fails a feed registration without one.
const SUBSCRIBE_FALLBACK_MESSAGE: &str = "Failed to open stamp change feed";

/// Sync configuration.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Table holding stamp rows.
    pub table: String,

    /// Column naming the owning identity.
    pub identity_column: String,

    /// Column holding the stamp status.
    pub status_column: String,

    /// Change feed buffer size.
    /// Default: 1000
    pub feed_buffer: usize,

    /// Message reported when the backend fails a count without one.
    pub fallback_message: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            table: STAMPS_TABLE.to_string(),
            identity_column: "user_id".to_string(),
            status_column: "status".to_string(),
            feed_buffer: DEFAULT_FEED_BUFFER,
            fallback_message: "Failed to fetch active stamps count".to_string(),
        }
    }
}

/// Active-stamp counts backed by a remote store.
///
/// Provides:
/// - One-shot counts for any identity (no cache)
/// - Cached counts for the authenticated identity
/// - Live counts for the authenticated identity via [`CountWatch`]
pub struct StampCountSync {
    remote: Arc<dyn RemoteDataStore>,
    session: Arc<dyn SessionProvider>,
    cache: Arc<CountCache>,
    config: SyncConfig,
}

impl StampCountSync {
    pub fn new(remote: Arc<dyn RemoteDataStore>, session: Arc<dyn SessionProvider>) -> Self {
        Self::with_config(remote, session, SyncConfig::default())
    }

    pub fn with_config(
        remote: Arc<dyn RemoteDataStore>,
        session: Arc<dyn SessionProvider>,
        config: SyncConfig,
    ) -> Self {
        Self {
            remote,
            session,
            cache: Arc::new(CountCache::new()),
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The cached count, without any remote call.
    pub fn cached(&self) -> Option<u64> {
        self.cache.get()
    }

    /// The cache shared with every watch this instance starts.
    pub fn cache(&self) -> Arc<CountCache> {
        Arc::clone(&self.cache)
    }

    // --- Counts ---

    /// Active-stamp count for any identity.
    ///
    /// Performs no authentication check and never touches the cache.
    pub fn count_for_identity(&self, identity: &Identity) -> Result<u64> {
        self.fetch_count(identity)
    }

    /// Active-stamp count for the authenticated identity.
    ///
    /// Served from the cache once populated; otherwise fetched and cached.
    pub fn current_identity_count(&self) -> Result<u64> {
        let identity = self.require_identity()?;
        self.cached_or_fetch(&identity)
    }

    /// Live active-stamp count for the authenticated identity.
    ///
    /// The returned watch yields the current count first, then a new value for
    /// every change crossing the active/inactive boundary. If the initial
    /// count cannot be obtained, no change feed is opened.
    pub fn watch_current_identity_count(&self) -> Result<CountWatch> {
        let identity = self.require_identity()?;

        let bootstrap = self
            .cached_or_fetch(&identity)
            .map_err(|e| SyncError::SubscriptionBootstrap(Box::new(e)))?;

        let spec = FeedSpec::new(
            self.config.table.clone(),
            RowFilter::eq(self.config.identity_column.clone(), identity.as_str()),
        )
        .with_buffer_size(self.config.feed_buffer);

        let feed = self.remote.subscribe(spec).map_err(|failure| {
            let message = failure.message_or(SUBSCRIBE_FALLBACK_MESSAGE);
            warn!(%identity, %message, "stamp change feed registration failed");
            SyncError::Subscription(message)
        })?;
        debug!(%identity, feed = %feed.id, bootstrap, "watching active stamp count");

        Ok(CountWatch::new(
            Arc::clone(&self.remote),
            Arc::clone(&self.cache),
            feed,
            self.config.status_column.clone(),
            bootstrap,
        ))
    }

    // --- Internals ---

    fn require_identity(&self) -> Result<Identity> {
        self.session
            .current_identity()
            .ok_or(SyncError::Unauthenticated)
    }

    fn cached_or_fetch(&self, identity: &Identity) -> Result<u64> {
        if let Some(count) = self.cache.get() {
            return Ok(count);
        }

        let count = self.fetch_count(identity)?;
        self.cache.store(count);
        Ok(count)
    }

    fn fetch_count(&self, identity: &Identity) -> Result<u64> {
        let query = CountQuery::new(self.config.table.clone())
            .eq(self.config.identity_column.clone(), identity.as_str())
            .eq(
                self.config.status_column.clone(),
                StampStatus::Active.as_str(),
            );

        match self.remote.count(&query) {
            Ok(count) => Ok(count.unwrap_or(0)),
            Err(failure) => {
                let message = failure.message_or(&self.config.fallback_message);
                warn!(%identity, %message, "active stamp count query failed");
                Err(SyncError::RemoteQuery(message))
            }
        }
    }
}
