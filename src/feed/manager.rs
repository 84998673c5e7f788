//! Feed manager for broadcasting row changes.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::types::{ChangeEvent, DropReason, FeedHandle, FeedId, FeedSpec};

/// Internal feed state.
struct Feed {
    spec: FeedSpec,
    sender: Sender<ChangeEvent>,
}

impl Feed {
    /// Try to send an event. Returns false if the buffer is full or the receiver is gone.
    fn try_send(&self, event: ChangeEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(crossbeam_channel::TrySendError::Full(_)) => false,
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => false,
        }
    }

    /// Check if this feed wants a row event on `table`.
    fn matches(&self, table: &str, event: &ChangeEvent) -> bool {
        self.spec.table == table && event.matches(&self.spec.filter)
    }
}

/// Manages change feeds and broadcasts row events to them.
pub struct ChangeFeedManager {
    /// Active feeds by ID.
    feeds: RwLock<HashMap<FeedId, Feed>>,
    /// Counter for generating feed IDs.
    next_id: AtomicU64,
}

impl ChangeFeedManager {
    /// Create a new feed manager.
    pub fn new() -> Self {
        Self {
            feeds: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new feed and return a handle for receiving its events.
    pub fn subscribe(&self, spec: FeedSpec) -> FeedHandle {
        let id = FeedId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(spec.buffer_size.max(1));

        debug!(feed = %id, table = %spec.table, filter = %spec.filter, "change feed registered");
        self.feeds.write().insert(id, Feed { spec, sender });

        FeedHandle { id, receiver }
    }

    /// Unregister a feed. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: FeedId) {
        let mut feeds = self.feeds.write();
        if let Some(feed) = feeds.remove(&id) {
            debug!(feed = %id, "change feed unregistered");
            // Best effort: the receiver may already be gone
            let _ = feed.sender.try_send(ChangeEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    /// Get feed count.
    pub fn feed_count(&self) -> usize {
        self.feeds.read().len()
    }

    /// Get the spec a feed was registered with.
    pub fn get_spec(&self, id: FeedId) -> Option<FeedSpec> {
        self.feeds.read().get(&id).map(|f| f.spec.clone())
    }

    /// Broadcast a row event on `table` to matching feeds.
    ///
    /// Feeds that fail to receive are dropped. Returns the number of feeds
    /// the event was delivered to.
    pub fn broadcast(&self, table: &str, event: ChangeEvent) -> usize {
        let mut delivered = 0;
        let mut to_remove = Vec::new();

        {
            let feeds = self.feeds.read();
            for (id, feed) in feeds.iter() {
                if !feed.matches(table, &event) {
                    continue;
                }
                if feed.try_send(event.clone()) {
                    delivered += 1;
                } else {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut feeds = self.feeds.write();
            for id in to_remove {
                if let Some(feed) = feeds.remove(&id) {
                    warn!(feed = %id, table, "dropping change feed that stopped receiving");
                    let _ = feed.sender.try_send(ChangeEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }

        delivered
    }
}

impl Default for ChangeFeedManager {
    fn default() -> Self {
        Self::new()
    }
}
