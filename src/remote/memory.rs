//! In-process backend holding tables of JSON rows.

use crate::error::{StoreError, StoreResult};
use crate::feed::{ChangeEvent, ChangeFeedManager, FeedHandle, FeedId, FeedSpec};
use crate::types::{
    column_text, scalar_text, CountQuery, RemoteFailure, Stamp, StampId, StampStatus,
    STAMPS_TABLE,
};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

use super::RemoteDataStore;

/// Column every row is keyed by.
const ID_COLUMN: &str = "id";

type Table = BTreeMap<String, Value>;

/// Store statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStoreStats {
    pub table_count: usize,
    pub row_count: usize,
    pub feed_count: usize,
}

/// In-memory [`RemoteDataStore`].
///
/// Every successful mutation is broadcast to the change feeds whose table and
/// row filter match it.
pub struct MemoryStore {
    /// Rows by table, then by id.
    tables: RwLock<HashMap<String, Table>>,

    /// Change feed hub.
    feeds: ChangeFeedManager,

    /// Serializes mutation and broadcast so feeds see commit order.
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_feed_manager(ChangeFeedManager::new())
    }

    pub fn with_feed_manager(feeds: ChangeFeedManager) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            feeds,
            write_lock: Mutex::new(()),
        }
    }

    // --- Row Operations ---

    /// Insert a row. The row must be a JSON object with a scalar `id`.
    pub fn insert(&self, table: &str, row: Value) -> StoreResult<Value> {
        let _lock = self.write_lock.lock();

        let id = row_id(&row)?;
        {
            let mut tables = self.tables.write();
            let rows = tables.entry(table.to_string()).or_default();
            if rows.contains_key(&id) {
                return Err(StoreError::DuplicateRow {
                    table: table.to_string(),
                    id,
                });
            }
            rows.insert(id, row.clone());
        }

        self.publish(
            table,
            ChangeEvent::Insert {
                table: table.to_string(),
                new: row.clone(),
            },
        );
        Ok(row)
    }

    /// Merge `patch` into an existing row and return the new row.
    pub fn update(&self, table: &str, id: &str, patch: Value) -> StoreResult<Value> {
        let _lock = self.write_lock.lock();

        let Value::Object(patch) = patch else {
            return Err(StoreError::InvalidRow("patch must be a JSON object".into()));
        };
        if let Some(new_id) = patch.get(ID_COLUMN) {
            if scalar_text(new_id).as_deref() != Some(id) {
                return Err(StoreError::InvalidRow("row id cannot be changed".into()));
            }
        }

        let (old, new) = {
            let mut tables = self.tables.write();
            let rows = tables
                .get_mut(table)
                .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
            let row = rows.get_mut(id).ok_or_else(|| StoreError::RowNotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

            let old = row.clone();
            if let Value::Object(fields) = row {
                for (key, value) in patch {
                    fields.insert(key, value);
                }
            }
            (old, row.clone())
        };

        self.publish(
            table,
            ChangeEvent::Update {
                table: table.to_string(),
                old,
                new: new.clone(),
            },
        );
        Ok(new)
    }

    /// Delete a row and return it.
    pub fn delete(&self, table: &str, id: &str) -> StoreResult<Value> {
        let _lock = self.write_lock.lock();

        let old = {
            let mut tables = self.tables.write();
            let rows = tables
                .get_mut(table)
                .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
            rows.remove(id).ok_or_else(|| StoreError::RowNotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?
        };

        self.publish(
            table,
            ChangeEvent::Delete {
                table: table.to_string(),
                old: old.clone(),
            },
        );
        Ok(old)
    }

    /// Get a row by id.
    pub fn get(&self, table: &str, id: &str) -> Option<Value> {
        self.tables.read().get(table)?.get(id).cloned()
    }

    /// All rows of a table, ordered by id.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    // --- Stamp Helpers ---

    /// Insert a stamp into the stamps table.
    pub fn insert_stamp(&self, stamp: &Stamp) -> StoreResult<Stamp> {
        let row = self.insert(STAMPS_TABLE, stamp.to_row()?)?;
        Ok(Stamp::from_row(&row)?)
    }

    /// Change a stamp's status.
    pub fn set_stamp_status(&self, id: &StampId, status: StampStatus) -> StoreResult<Stamp> {
        let patch = serde_json::json!({ "status": status });
        let row = self.update(STAMPS_TABLE, &id.0, patch)?;
        Ok(Stamp::from_row(&row)?)
    }

    /// Delete a stamp.
    pub fn delete_stamp(&self, id: &StampId) -> StoreResult<Stamp> {
        let row = self.delete(STAMPS_TABLE, &id.0)?;
        Ok(Stamp::from_row(&row)?)
    }

    // --- Feeds and Stats ---

    /// Number of live change feeds.
    pub fn feed_count(&self) -> usize {
        self.feeds.feed_count()
    }

    pub fn stats(&self) -> MemoryStoreStats {
        let tables = self.tables.read();
        MemoryStoreStats {
            table_count: tables.len(),
            row_count: tables.values().map(|rows| rows.len()).sum(),
            feed_count: self.feeds.feed_count(),
        }
    }

    fn publish(&self, table: &str, event: ChangeEvent) {
        let delivered = self.feeds.broadcast(table, event);
        trace!(table, delivered, "row change published");
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteDataStore for MemoryStore {
    fn count(&self, query: &CountQuery) -> Result<Option<u64>, RemoteFailure> {
        let tables = self.tables.read();
        let count = tables
            .get(&query.table)
            .map(|rows| rows.values().filter(|row| query.matches(row)).count())
            .unwrap_or(0);
        Ok(Some(count as u64))
    }

    fn subscribe(&self, spec: FeedSpec) -> Result<FeedHandle, RemoteFailure> {
        Ok(self.feeds.subscribe(spec))
    }

    fn unsubscribe(&self, id: FeedId) {
        self.feeds.unsubscribe(id);
    }
}

fn row_id(row: &Value) -> StoreResult<String> {
    if !row.is_object() {
        return Err(StoreError::InvalidRow("row must be a JSON object".into()));
    }
    column_text(row, ID_COLUMN)
        .ok_or_else(|| StoreError::InvalidRow("row needs a scalar id".into()))
}
