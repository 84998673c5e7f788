//! Change feed types: filters, events and handles.

use crate::error::StoreError;
use crate::types::column_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Default number of buffered events before a feed is dropped.
pub const DEFAULT_FEED_BUFFER: usize = 1000;

/// What a change feed listens to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSpec {
    /// Table whose row changes are delivered.
    pub table: String,

    /// Row-level filter. Only changes to matching rows are delivered.
    pub filter: RowFilter,

    /// Max buffered events before dropping the feed.
    /// Default: 1000
    pub buffer_size: usize,
}

impl FeedSpec {
    pub fn new(table: impl Into<String>, filter: RowFilter) -> Self {
        Self {
            table: table.into(),
            filter,
            buffer_size: DEFAULT_FEED_BUFFER,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

/// Equality filter on a single column, written `column=eq.value`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

impl RowFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Check whether a JSON row satisfies the filter.
    pub fn matches(&self, row: &Value) -> bool {
        column_text(row, &self.column).as_deref() == Some(self.value.as_str())
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value)
    }
}

impl FromStr for RowFilter {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, rest) = s
            .split_once('=')
            .ok_or_else(|| StoreError::InvalidFilter(s.to_string()))?;
        let value = rest
            .strip_prefix("eq.")
            .ok_or_else(|| StoreError::InvalidFilter(format!("unsupported operator in {s}")))?;

        let column = column.trim();
        if column.is_empty() {
            return Err(StoreError::InvalidFilter(format!("missing column in {s}")));
        }

        Ok(RowFilter::eq(column, value))
    }
}

/// Events delivered on a change feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    // --- Row Events ---
    /// A row was inserted.
    Insert { table: String, new: Value },

    /// A row was updated. `old` holds the row as it was before the update.
    Update {
        table: String,
        old: Value,
        new: Value,
    },

    /// A row was deleted. `old` holds the last known row.
    Delete { table: String, old: Value },

    // --- Lifecycle Events ---
    /// The feed was dropped and will deliver nothing more.
    Dropped { reason: DropReason },
}

impl ChangeEvent {
    /// Table the event belongs to (None for lifecycle events).
    pub fn table(&self) -> Option<&str> {
        match self {
            ChangeEvent::Insert { table, .. }
            | ChangeEvent::Update { table, .. }
            | ChangeEvent::Delete { table, .. } => Some(table),
            ChangeEvent::Dropped { .. } => None,
        }
    }

    /// Check whether the event concerns a row matching `filter`.
    ///
    /// Updates match on either side so rows leaving the filter are still seen.
    pub fn matches(&self, filter: &RowFilter) -> bool {
        match self {
            ChangeEvent::Insert { new, .. } => filter.matches(new),
            ChangeEvent::Update { old, new, .. } => filter.matches(new) || filter.matches(old),
            ChangeEvent::Delete { old, .. } => filter.matches(old),
            ChangeEvent::Dropped { .. } => true,
        }
    }
}

/// Why a feed was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
    /// Backend error.
    Error(String),
}

/// Unique identifier for a change feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeedId(pub u64);

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feed-{}", self.0)
    }
}

/// Handle to a registered change feed.
pub struct FeedHandle {
    pub id: FeedId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<ChangeEvent>,
}

impl FeedHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<ChangeEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<ChangeEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<ChangeEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
