//! Concurrency probe for instrumented fakes
//!
//! Wrap each simulated remote call in [`ConcurrencyProbe::enter`]; the probe
//! records how many calls were in flight at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Records current and peak in-flight calls. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    inner: Arc<ProbeState>,
}

#[derive(Debug, Default)]
struct ProbeState {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

/// Marks one call as in flight until dropped
#[must_use = "the call is only counted while the guard is alive"]
pub struct InFlight {
    state: Arc<ProbeState>,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a call as started
    pub fn enter(&self) -> InFlight {
        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);
        self.inner.total.fetch_add(1, Ordering::SeqCst);
        InFlight {
            state: self.inner.clone(),
        }
    }

    /// Highest number of calls in flight at the same time
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    /// Calls currently in flight
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Number of calls started so far
    pub fn total(&self) -> usize {
        self.inner.total.load(Ordering::SeqCst)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
