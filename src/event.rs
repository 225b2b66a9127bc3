//! Event definitions for the simulation framework.
//!
//! An event is a pending wake-up of one process at one instant. Events are the
//! only way simulated time moves forward.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{ProcessId, ResourceId, SimTime};

/// A scheduled wake-up.
///
/// Events order by `time`, then by `seq`, the insertion counter assigned by the
/// [`EventQueue`](crate::queue::EventQueue). Two events for the same instant are
/// therefore delivered in the order they were scheduled.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    /// The simulation time at which this event occurs
    pub time: SimTime,
    /// Insertion sequence number, unique per queue
    pub seq: u64,
    /// The process to resume
    pub target: ProcessId,
    /// Why the process is being resumed
    pub payload: EventPayload,
}

impl Event {
    /// Creates a new event.
    pub fn new(time: SimTime, seq: u64, target: ProcessId, payload: EventPayload) -> Self {
        Self {
            time,
            seq,
            target,
            payload,
        }
    }
}

/// The reason a process is resumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    /// Initial activation or the end of a timeout.
    Wake,
    /// A resource the process was queued on has been granted to it.
    Grant(ResourceId),
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that `BinaryHeap` pops the earliest event first
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
