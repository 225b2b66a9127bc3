//! Simulation clock and pending-event queue.

use std::collections::BinaryHeap;

use crate::event::{Event, EventPayload};
use crate::types::{ProcessId, SimTime};

/// Time-ordered set of pending events together with the clock they drive.
///
/// Popping an event advances the clock to that event's time. Events sharing a
/// timestamp come out in the order they were scheduled.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Event>,
    now: SimTime,
    next_seq: u64,
    peak_len: usize,
}

impl EventQueue {
    /// Creates an empty queue with the clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedules `target` to be resumed at `time`.
    ///
    /// # Panics
    /// If `time` is earlier than the current clock or is not finite.
    pub fn schedule(&mut self, time: SimTime, target: ProcessId, payload: EventPayload) {
        assert!(time.is_finite(), "event for process {target} at non-finite time {time}");
        assert!(
            time >= self.now,
            "event for process {target} scheduled at {time}, before current time {}",
            self.now
        );

        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Event::new(time, seq, target, payload));
        self.peak_len = self.peak_len.max(self.heap.len());
    }

    /// Removes the earliest event and advances the clock to its time.
    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.heap.pop()?;
        debug_assert!(event.time >= self.now);
        self.now = event.time;
        Some(event)
    }

    /// Returns the time of the earliest pending event without removing it.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|e| e.time)
    }

    /// Returns true if no event is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns the largest number of events that were pending at once.
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }
}
