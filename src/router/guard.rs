// ABOUTME: Timeout guard bounding how long a queued event waits for readiness.
// ABOUTME: One armed timer at a time; cancelling or re-arming aborts the previous one.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Single-shot timer tied to a gating cycle.
///
/// Dropping the guard aborts any armed timer, so no timer outlives the
/// coordinator that owns it.
#[derive(Default)]
pub struct TimeoutGuard {
    armed: Option<(u64, JoinHandle<()>)>,
}

impl TimeoutGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the guard for `cycle`, calling `on_expiry(cycle)` after `after`.
    ///
    /// Any previously armed timer is aborted first.
    pub fn arm<F>(&mut self, cycle: u64, after: Duration, on_expiry: F)
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.abort();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            on_expiry(cycle);
        });
        self.armed = Some((cycle, handle));
    }

    /// Cancel the timer for `cycle`.
    ///
    /// Returns true if a timer for that cycle was armed. A cancel for any
    /// other cycle is ignored.
    pub fn cancel(&mut self, cycle: u64) -> bool {
        match &self.armed {
            Some((armed, _)) if *armed == cycle => {
                self.abort();
                true
            }
            _ => false,
        }
    }

    /// Cycle of the pending timer, if it has not fired yet.
    pub fn armed_cycle(&self) -> Option<u64> {
        match &self.armed {
            Some((cycle, handle)) if !handle.is_finished() => Some(*cycle),
            _ => None,
        }
    }

    fn abort(&mut self) {
        if let Some((_, handle)) = self.armed.take() {
            handle.abort();
        }
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.abort();
    }
}
