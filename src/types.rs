//! Core types shared by the sync component and the remote store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Table holding stamp rows.
pub const STAMPS_TABLE: &str = "stamps";

/// Authenticated user reference used to scope queries and feeds.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Identity(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Identity(s)
    }
}

/// Opaque stamp identifier.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StampId(pub String);

impl fmt::Debug for StampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StampId({})", self.0)
    }
}

impl fmt::Display for StampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StampId {
    fn from(s: &str) -> Self {
        StampId(s.to_string())
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or_default();
        Timestamp(micros)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Lifecycle status of a stamp. Transitions are owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampStatus {
    Active,
    Used,
    Expired,
}

impl StampStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StampStatus::Active => "active",
            StampStatus::Used => "used",
            StampStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(StampStatus::Active),
            "used" => Some(StampStatus::Used),
            "expired" => Some(StampStatus::Expired),
            _ => None,
        }
    }

    /// Read the status column of a JSON row.
    ///
    /// Missing columns and unknown values yield `None`.
    pub fn from_row(row: &Value, column: &str) -> Option<Self> {
        row.get(column).and_then(Value::as_str).and_then(Self::parse)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, StampStatus::Active)
    }
}

impl fmt::Display for StampStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stamp row as stored in the `stamps` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    pub id: StampId,
    pub user_id: Identity,
    pub status: StampStatus,
    #[serde(default)]
    pub created_at: Timestamp,
}

impl Stamp {
    /// A freshly issued active stamp.
    pub fn active(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: StampId(id.into()),
            user_id: Identity(user_id.into()),
            status: StampStatus::Active,
            created_at: Timestamp::now(),
        }
    }

    pub fn with_status(mut self, status: StampStatus) -> Self {
        self.status = status;
        self
    }

    /// Encode as a JSON row.
    pub fn to_row(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Decode from a JSON row.
    pub fn from_row(row: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(row.clone())
    }
}

/// Head-only count query: counts rows without transferring them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountQuery {
    pub table: String,
    /// Equality filters, all of which must match.
    pub filters: Vec<(String, String)>,
}

impl CountQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
        }
    }

    /// Add an equality filter.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    /// Check whether a JSON row satisfies every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(column, value)| column_text(row, column).as_deref() == Some(value.as_str()))
    }
}

/// Error payload returned by the remote store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteFailure {
    /// Backend-supplied message, if any.
    pub message: Option<String>,
}

impl RemoteFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// A failure the backend gave no message for.
    pub fn silent() -> Self {
        Self { message: None }
    }

    /// The backend message, or `fallback` when there is none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Textual value of a scalar column, so filters compare `"7"` and `7` alike.
pub(crate) fn column_text(row: &Value, column: &str) -> Option<String> {
    scalar_text(row.get(column)?)
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
