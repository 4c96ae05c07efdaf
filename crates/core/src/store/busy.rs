//! Ref-counted busy indicator
//!
//! Every in-flight operation holds a [`BusyGuard`]; the store reports loading
//! while at least one guard is alive. Overlapping operations therefore never
//! clear the flag early.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct BusyTracker {
    in_flight: Arc<AtomicUsize>,
}

impl BusyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one operation as started until the returned guard drops
    pub fn begin(&self) -> BusyGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight() > 0
    }
}

#[must_use = "the operation counts as finished as soon as the guard drops"]
#[derive(Debug)]
pub struct BusyGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
