//! Live stream of the authenticated identity's active-stamp count.

use crate::feed::{ChangeEvent, FeedHandle, FeedId};
use crate::remote::RemoteDataStore;
use crossbeam_channel::{RecvError, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::cache::CountCache;
use super::delta::CountDelta;

/// A running active-stamp count driven by a change feed.
///
/// The first value received is the bootstrap count. After that, one value is
/// emitted for every change that crosses the active/inactive boundary. Events
/// are applied on the receiving thread.
///
/// The change feed is unregistered exactly once: on [`cancel`](Self::cancel),
/// on drop, or when the feed ends, whichever comes first. Nothing is emitted
/// after that.
pub struct CountWatch {
    remote: Arc<dyn RemoteDataStore>,
    cache: Arc<CountCache>,
    feed: Option<FeedHandle>,
    status_column: String,
    /// Running counter local to this watch.
    current: u64,
    /// Bootstrap value not yet handed out.
    pending: Option<u64>,
}

impl CountWatch {
    pub(crate) fn new(
        remote: Arc<dyn RemoteDataStore>,
        cache: Arc<CountCache>,
        feed: FeedHandle,
        status_column: String,
        bootstrap: u64,
    ) -> Self {
        Self {
            remote,
            cache,
            feed: Some(feed),
            status_column,
            current: bootstrap,
            pending: Some(bootstrap),
        }
    }

    /// Receive the next count (blocking).
    pub fn recv(&mut self) -> Result<u64, RecvError> {
        if let Some(count) = self.pending.take() {
            return Ok(count);
        }

        loop {
            let event = match &self.feed {
                Some(feed) => feed.recv(),
                None => return Err(RecvError),
            };
            match event {
                Ok(event) => {
                    if let Some(count) = self.handle(event) {
                        return Ok(count);
                    }
                }
                Err(RecvError) => {
                    self.close();
                    return Err(RecvError);
                }
            }
        }
    }

    /// Try to receive a count (non-blocking).
    ///
    /// Pending events that do not change the count are consumed.
    pub fn try_recv(&mut self) -> Result<u64, TryRecvError> {
        if let Some(count) = self.pending.take() {
            return Ok(count);
        }

        loop {
            let event = match &self.feed {
                Some(feed) => feed.try_recv(),
                None => return Err(TryRecvError::Disconnected),
            };
            match event {
                Ok(event) => {
                    if let Some(count) = self.handle(event) {
                        return Ok(count);
                    }
                }
                Err(TryRecvError::Empty) => return Err(TryRecvError::Empty),
                Err(TryRecvError::Disconnected) => {
                    self.close();
                    return Err(TryRecvError::Disconnected);
                }
            }
        }
    }

    /// Receive with timeout. The timeout covers any ignored events as well.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<u64, RecvTimeoutError> {
        if let Some(count) = self.pending.take() {
            return Ok(count);
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let event = match &self.feed {
                Some(feed) => feed.recv_timeout(remaining),
                None => return Err(RecvTimeoutError::Disconnected),
            };
            match event {
                Ok(event) => {
                    if let Some(count) = self.handle(event) {
                        return Ok(count);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Err(RecvTimeoutError::Timeout),
                Err(RecvTimeoutError::Disconnected) => {
                    self.close();
                    return Err(RecvTimeoutError::Disconnected);
                }
            }
        }
    }

    /// Stop watching and unregister the change feed.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.close();
    }

    /// The running count as of the last applied event.
    pub fn current(&self) -> u64 {
        self.current
    }

    /// The change feed this watch is registered on, until it is closed.
    pub fn feed_id(&self) -> Option<FeedId> {
        self.feed.as_ref().map(|feed| feed.id)
    }

    pub fn is_closed(&self) -> bool {
        self.feed.is_none()
    }

    /// Apply one event. Returns the new count if it changed.
    fn handle(&mut self, event: ChangeEvent) -> Option<u64> {
        if let ChangeEvent::Dropped { reason } = &event {
            warn!(feed = ?self.feed_id(), ?reason, "stamp change feed dropped");
            self.close();
            return None;
        }

        let delta = CountDelta::from_event(&event, &self.status_column)?;
        let count = self.cache.apply(delta, &mut self.current);
        debug!(?delta, count, "active stamp count changed");
        Some(count)
    }

    fn close(&mut self) {
        if let Some(feed) = self.feed.take() {
            debug!(feed = %feed.id, "closing stamp change feed");
            self.remote.unsubscribe(feed.id);
        }
    }
}

impl Iterator for CountWatch {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.recv().ok()
    }
}

impl Drop for CountWatch {
    fn drop(&mut self) {
        self.close();
    }
}
