//! Network models built on the engine.
//!
//! - [`queueing`] - finite-buffer single-server queue
//! - [`mac`] - slotted multiple access with collision backoff
//! - [`backoff`] - backoff delay algorithms used by [`mac`]

pub mod backoff;
pub mod mac;
pub mod queueing;

pub use backoff::{BackoffAlgorithm, ParseBackoffError};
pub use mac::{MacReport, MacSimulation, MacState, NodeState, PacketArrival, SlotDriver, SlotOutcome};
pub use queueing::{BufferState, PacketPhase, PacketProcess, QueueReport, QueueSimulation};
