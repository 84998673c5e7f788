//! Classification of row changes into count adjustments.

use crate::feed::ChangeEvent;
use crate::types::StampStatus;
use serde_json::Value;

/// A ±1 adjustment to an active-stamp count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountDelta {
    Increment,
    Decrement,
}

impl CountDelta {
    /// Classify a change event.
    ///
    /// Only changes that cross the active/inactive boundary count: an active
    /// insert, an update into or out of active, and a delete of an active row.
    /// Everything else, including lifecycle events, yields `None`.
    pub fn from_event(event: &ChangeEvent, status_column: &str) -> Option<Self> {
        let is_active = |row: &Value| {
            StampStatus::from_row(row, status_column).is_some_and(|s| s.is_active())
        };

        match event {
            ChangeEvent::Insert { new, .. } => is_active(new).then_some(CountDelta::Increment),
            ChangeEvent::Update { old, new, .. } => match (is_active(old), is_active(new)) {
                (false, true) => Some(CountDelta::Increment),
                (true, false) => Some(CountDelta::Decrement),
                _ => None,
            },
            ChangeEvent::Delete { old, .. } => is_active(old).then_some(CountDelta::Decrement),
            ChangeEvent::Dropped { .. } => None,
        }
    }

    /// Apply to a count. Decrements stop at zero.
    pub fn apply(self, count: u64) -> u64 {
        match self {
            CountDelta::Increment => count.saturating_add(1),
            CountDelta::Decrement => count.saturating_sub(1),
        }
    }
}
