//! Host-owned abort flag.
//!
//! Decoders poll a [`Stop`] implementation at the top of every row, channel
//! copy and pixel. Pass [`enough::Unstoppable`] when a decode can never be
//! cancelled, or an [`AbortFlag`] shared with whatever thread may cancel it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use enough::{Stop, StopReason};

/// Cloneable cancellation flag backed by an atomic.
///
/// # Example
///
/// ```rust
/// use deeprat_io::AbortFlag;
/// use enough::Stop;
///
/// let flag = AbortFlag::new();
/// let host_side = flag.clone();
/// assert!(flag.check().is_ok());
///
/// host_side.abort();
/// assert!(flag.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AbortFlag {
    aborted: Arc<AtomicBool>,
}

impl AbortFlag {
    /// Creates a flag in the "keep going" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every decode polling this flag.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    /// Clears a previous abort request.
    pub fn reset(&self) {
        self.aborted.store(false, Ordering::Release);
    }

    /// Returns `true` once [`abort`](Self::abort) has been called.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }
}

impl Stop for AbortFlag {
    fn check(&self) -> Result<(), StopReason> {
        if self.is_aborted() {
            Err(StopReason::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_and_reset() {
        let flag = AbortFlag::new();
        assert!(!flag.is_aborted());
        flag.abort();
        assert!(flag.is_aborted());
        flag.reset();
        assert!(flag.check().is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let flag = AbortFlag::new();
        let other = flag.clone();
        other.abort();
        assert!(flag.check().is_err());
    }
}
