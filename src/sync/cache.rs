//! Single-slot cache of the authenticated identity's active-stamp count.

use parking_lot::Mutex;
use tracing::trace;

use super::delta::CountDelta;

/// Last known active-stamp count, shared by the sync component and its watches.
///
/// `None` means the count has not been fetched yet. Errors never clear it.
#[derive(Debug, Default)]
pub struct CountCache {
    slot: Mutex<Option<u64>>,
}

impl CountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<u64> {
        *self.slot.lock()
    }

    /// Overwrite the cached count.
    pub fn store(&self, count: u64) {
        Self::write(&mut self.slot.lock(), count);
    }

    /// Apply `delta` to a watch's running counter and cache the result.
    ///
    /// The counter is adjusted under the cache lock. There is no
    /// compare-and-swap against values written by other watches.
    pub fn apply(&self, delta: CountDelta, running: &mut u64) -> u64 {
        let mut slot = self.slot.lock();
        *running = delta.apply(*running);
        Self::write(&mut slot, *running);
        *running
    }

    fn write(slot: &mut Option<u64>, count: u64) {
        trace!(previous = ?*slot, count, "active stamp count cached");
        *slot = Some(count);
    }
}
