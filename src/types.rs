//! Core type definitions for the simulation framework.
//!
//! This module defines the fundamental types used throughout the simulation engine.

/// Simulated time.
///
/// Continuous and non-negative. The scheduler's clock never moves backwards,
/// so every timestamp handed out by the engine is at least the previous one.
pub type SimTime = f64;

/// Index of a discrete slot on the multiple-access timeline.
///
/// Slots are one time unit long; slot `t` begins at `SimTime` `t as f64`.
pub type Tick = u64;

/// Handle to a process owned by an [`Environment`](crate::engine::Environment).
///
/// Handles are dense indices in spawn order and are never reused within a run.
pub type ProcessId = usize;

/// Handle to a resource owned by an [`Environment`](crate::engine::Environment).
pub type ResourceId = usize;

/// Index of a station in the multiple-access model.
pub type NodeIndex = usize;

/// Converts a simulated instant to the slot it falls in, rounding up.
///
/// An arrival strictly inside slot `t - 1 .. t` becomes eligible at slot `t`;
/// an arrival exactly on a boundary is eligible at that boundary.
pub fn ceil_to_tick(time: SimTime) -> Tick {
    debug_assert!(time >= 0.0, "negative simulated time {time}");
    time.ceil() as Tick
}
