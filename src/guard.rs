//! Single-slot task guard.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Allows at most one task at a time; a second attempt is rejected, not
/// queued.
///
/// Cloning yields another handle to the same slot.
#[derive(Debug, Clone)]
pub struct TaskGuard {
    slot: Arc<Semaphore>,
}

impl Default for TaskGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the slot, or `None` if it is occupied.
    #[must_use]
    pub fn try_acquire(&self) -> Option<TaskPermit> {
        Arc::clone(&self.slot)
            .try_acquire_owned()
            .ok()
            .map(|permit| TaskPermit { _permit: permit })
    }

    /// Whether a task currently holds the slot.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }
}

/// Occupies the guard's slot until dropped.
#[derive(Debug)]
pub struct TaskPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_rejected() {
        let guard = TaskGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
    }

    #[test]
    fn test_release_on_drop() {
        let guard = TaskGuard::new();
        {
            let _permit = guard.try_acquire().unwrap();
            assert!(guard.is_busy());
        }
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_clones_share_slot() {
        let guard = TaskGuard::new();
        let other = guard.clone();
        let _permit = guard.try_acquire().unwrap();
        assert!(other.is_busy());
        assert!(other.try_acquire().is_none());
    }
}
