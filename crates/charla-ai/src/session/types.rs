//! Session concurrency guard.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::CompletionError;

/// Guard that clears the `busy` flag on drop, so a cancelled submit future
/// can never wedge the session.
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    /// Attempt to acquire the busy lock. Fails if a request is in flight.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self, CompletionError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(CompletionError::Other(
                "a request is already in flight for this session".into(),
            ));
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
