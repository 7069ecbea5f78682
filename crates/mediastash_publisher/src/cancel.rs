//! Cooperative cancellation for publish operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag a caller sets to abandon a publish before it commits.
///
/// A cancelled publish still rolls back its reservation; cancellation only
/// prevents the commit, never the cleanup.
///
/// # Examples
///
/// ```
/// use mediastash_publisher::CancellationFlag;
///
/// let flag = CancellationFlag::new();
/// let observer = flag.clone();
/// flag.cancel();
/// assert!(observer.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Guard that cancels the flag when dropped.
    pub(crate) fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop {
            flag: self.clone(),
            armed: true,
        }
    }
}

/// Sets its flag on drop, so an abandoned future cancels its blocking job.
#[derive(Debug)]
pub(crate) struct CancelOnDrop {
    flag: CancellationFlag,
    armed: bool,
}

impl CancelOnDrop {
    /// Disarm once the job has finished.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.cancel();
        }
    }
}
