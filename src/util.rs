//! Shared utilities.

use std::sync::atomic::{AtomicBool, Ordering};

/// An idle/running flag for operations that must not overlap.
#[derive(Debug, Default)]
pub struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark the flag running. `None` if it already was.
    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.0))
    }
}

/// Returns the flag to idle when dropped, including on early return.
#[derive(Debug)]
pub struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_guard_drops() {
        let flag = BusyFlag::new();
        assert!(!flag.is_busy());

        let guard = flag.try_acquire();
        assert!(guard.is_some());
        assert!(flag.is_busy());
        assert!(flag.try_acquire().is_none());

        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_some());
    }

    #[test]
    fn early_return_releases_the_flag() {
        fn work(flag: &BusyFlag, bail: bool) -> Option<()> {
            let _guard = flag.try_acquire()?;
            if bail {
                return None;
            }
            Some(())
        }

        let flag = BusyFlag::new();
        assert!(work(&flag, true).is_none());
        assert!(!flag.is_busy());
        assert!(work(&flag, false).is_some());
    }
}
