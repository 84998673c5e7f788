//! Active-stamp count synchronization.
//!
//! [`StampCountSync`] answers count queries through a single-slot
//! [`CountCache`] and hands out [`CountWatch`] streams that keep a running
//! count from a row-level change feed:
//! - active insert: +1
//! - update into active: +1, out of active: -1
//! - delete of an active row: -1
//!
//! # Example
//!
//! ```ignore
//! let sync = StampCountSync::new(store, session);
//!
//! let mut watch = sync.watch_current_identity_count()?;
//! for count in &mut watch {
//!     println!("active stamps: {count}");
//! }
//! ```

mod cache;
mod delta;
mod service;
mod watch;

pub use cache::CountCache;
pub use delta::CountDelta;
pub use service::{StampCountSync, SyncConfig};
pub use watch::CountWatch;
