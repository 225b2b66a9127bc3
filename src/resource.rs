//! Shared resources with bounded capacity and FIFO waiting.
//!
//! A [`Resource`] only does bookkeeping: who holds it and who waits for it.
//! Suspending and resuming the processes involved is the engine's job.

use std::collections::VecDeque;

use serde::Serialize;

use crate::types::ProcessId;

/// A resource that at most `capacity` processes may hold at once.
///
/// Requests that cannot be granted immediately wait in arrival order and are
/// granted strictly first come, first served as holders release.
#[derive(Clone, Debug, Serialize)]
pub struct Resource {
    capacity: usize,
    holders: Vec<ProcessId>,
    waiting: VecDeque<ProcessId>,
    grants: u64,
}

impl Resource {
    /// Creates a resource with the given capacity.
    ///
    /// # Panics
    /// If `capacity` is zero; such a resource could never be granted.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "resource capacity must be at least 1");
        Self {
            capacity,
            holders: Vec::with_capacity(capacity),
            waiting: VecDeque::new(),
            grants: 0,
        }
    }

    /// Grants the resource to `pid` if a unit is free.
    ///
    /// Returns false, without queueing, when the resource is fully in use.
    pub fn try_acquire(&mut self, pid: ProcessId) -> bool {
        if self.holders.len() < self.capacity {
            self.grant(pid);
            true
        } else {
            false
        }
    }

    /// Appends `pid` to the wait queue.
    pub fn enqueue(&mut self, pid: ProcessId) {
        debug_assert!(!self.waiting.contains(&pid), "process {pid} queued twice");
        self.waiting.push_back(pid);
    }

    /// Releases the unit held by `pid`.
    ///
    /// If a process is waiting, the freed unit is granted to the head of the
    /// queue and its id is returned so the caller can make it runnable.
    ///
    /// # Panics
    /// If `pid` does not hold this resource.
    pub fn release(&mut self, pid: ProcessId) -> Option<ProcessId> {
        let position = self
            .holders
            .iter()
            .position(|&holder| holder == pid)
            .unwrap_or_else(|| panic!("process {pid} released a resource it does not hold"));
        self.holders.swap_remove(position);

        let next = self.waiting.pop_front()?;
        self.grant(next);
        Some(next)
    }

    fn grant(&mut self, pid: ProcessId) {
        self.holders.push(pid);
        self.grants += 1;
        assert!(
            self.holders.len() <= self.capacity,
            "resource over-granted: {} holders for capacity {}",
            self.holders.len(),
            self.capacity
        );
    }

    /// Returns true if `pid` currently holds a unit.
    pub fn is_held_by(&self, pid: ProcessId) -> bool {
        self.holders.contains(&pid)
    }

    /// Returns the capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of units currently granted.
    pub fn in_use(&self) -> usize {
        self.holders.len()
    }

    /// Returns the number of processes waiting.
    pub fn queue_len(&self) -> usize {
        self.waiting.len()
    }

    /// Returns the total number of grants made so far.
    pub fn grants(&self) -> u64 {
        self.grants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_grant() {
        let mut res = Resource::new(1);
        assert!(res.try_acquire(7));
        assert_eq!(res.in_use(), 1);
        assert!(res.is_held_by(7));
        assert!(!res.try_acquire(8));
        assert_eq!(res.queue_len(), 0);
    }

    #[test]
    fn test_release_hands_over_in_fifo_order() {
        let mut res = Resource::new(1);
        assert!(res.try_acquire(0));
        res.enqueue(3);
        res.enqueue(1);
        res.enqueue(2);

        assert_eq!(res.release(0), Some(3));
        assert!(res.is_held_by(3));
        assert_eq!(res.release(3), Some(1));
        assert_eq!(res.release(1), Some(2));
        assert_eq!(res.release(2), None);
        assert_eq!(res.in_use(), 0);
        assert_eq!(res.grants(), 4);
    }

    #[test]
    fn test_capacity_two() {
        let mut res = Resource::new(2);
        assert!(res.try_acquire(0));
        assert!(res.try_acquire(1));
        assert!(!res.try_acquire(2));
        assert_eq!(res.in_use(), res.capacity());
    }

    #[test]
    #[should_panic(expected = "does not hold")]
    fn test_release_without_grant_panics() {
        let mut res = Resource::new(1);
        res.release(4);
    }
}
