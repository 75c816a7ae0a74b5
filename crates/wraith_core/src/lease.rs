//! Busy leases
//!
//! A [`BusyLease`] is the reference count that tells coordinators an actor is
//! mid-transition and must not be destroyed or force-hidden. Units are only
//! ever taken through [`BusyLease::acquire`], which hands back a [`BusyGuard`];
//! the unit is returned when the guard drops, so every exit path of a sequence
//! (completion, cancellation, early `?` return) releases it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared busy counter for one actor
#[derive(Debug, Clone, Default)]
pub struct BusyLease {
    count: Arc<AtomicUsize>,
}

impl BusyLease {
    /// Create an idle lease
    pub fn new() -> Self {
        Self::default()
    }

    /// Take one unit of the lease
    #[must_use = "the lease is released as soon as the guard is dropped"]
    pub fn acquire(&self) -> BusyGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        BusyGuard {
            count: self.count.clone(),
        }
    }

    /// Number of outstanding units
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Whether any unit is outstanding
    pub fn is_busy(&self) -> bool {
        self.count() > 0
    }
}

/// One outstanding unit of a [`BusyLease`]
#[derive(Debug)]
pub struct BusyGuard {
    count: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        // Guards are the only decrementers and each holds exactly one unit.
        let _ = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_counts_guards() {
        let lease = BusyLease::new();
        assert!(!lease.is_busy());

        let a = lease.acquire();
        let b = lease.acquire();
        assert_eq!(lease.count(), 2);

        drop(a);
        assert_eq!(lease.count(), 1);
        assert!(lease.is_busy());

        drop(b);
        assert_eq!(lease.count(), 0);
        assert!(!lease.is_busy());
    }

    #[test]
    fn test_lease_released_on_unwind() {
        let lease = BusyLease::new();
        let cloned = lease.clone();

        let result = std::panic::catch_unwind(move || {
            let _guard = cloned.acquire();
            panic!("sequence blew up");
        });

        assert!(result.is_err());
        assert_eq!(lease.count(), 0);
    }

    #[test]
    fn test_clones_share_count() {
        let lease = BusyLease::new();
        let other = lease.clone();
        let _guard = other.acquire();
        assert!(lease.is_busy());
    }
}
