//! Row-level change feeds.
//!
//! A feed is registered for one table and one row filter and receives
//! insert, update and delete events for matching rows on a bounded channel.
//! Feeds that fall behind are dropped rather than blocking writers.
//!
//! # Example
//!
//! ```ignore
//! let manager = ChangeFeedManager::new();
//! let handle = manager.subscribe(FeedSpec::new("stamps", "user_id=eq.U1".parse()?));
//!
//! loop {
//!     match handle.recv() {
//!         Ok(ChangeEvent::Insert { new, .. }) => println!("inserted {new}"),
//!         Ok(ChangeEvent::Dropped { reason }) => break,
//!         Ok(_) => {}
//!         Err(_) => break,
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::ChangeFeedManager;
pub use types::{
    ChangeEvent, DropReason, FeedHandle, FeedId, FeedSpec, RowFilter, DEFAULT_FEED_BUFFER,
};
