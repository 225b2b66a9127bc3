//! # netdes
//!
//! A small process-oriented discrete-event simulation engine and two network
//! models built on it.
//!
//! ## Design
//!
//! - **Event queue**: a min-heap ordered by `(time, seq)`. Events due at the
//!   same time fire in the order they were scheduled, so a fixed seed always
//!   reproduces the same run.
//! - **Processes**: each simulated entity is a step-function state machine
//!   implementing [`Process`]. On every resume it returns the next [`Step`]:
//!   sleep for a duration, request a resource, or finish.
//! - **Resources**: counted capacity with a FIFO wait queue.
//! - **Run state**: all mutable model state lives in the environment's state
//!   value `S`, never in globals, so independent runs can execute side by side.
//!
//! ## Models
//!
//! - [`models::queueing`] - M/M/1/B queue, checked against the closed-form
//!   blocking probability in [`analysis`]
//! - [`models::mac`] - slotted multiple access with exponential or linear
//!   backoff
//!
//! ## Features
//!
//! - `parallel` - run sweep points on multiple threads using rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use netdes::{QueueConfig, QueueSimulation};
//!
//! let config = QueueConfig::new(0.5, 10).with_packet_count(1000);
//! let report = QueueSimulation::new(config).unwrap().run();
//! assert_eq!(report.dropped + report.served, 1000);
//! println!("{report}");
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use netdes::config::SimConfig;
//!
//! let config = SimConfig::from_yaml_file("simulation.yaml")?;
//! // ... build simulations from config.queue / config.mac
//! ```

pub mod types;
pub mod event;
pub mod queue;
pub mod resource;
pub mod process;
pub mod engine;
pub mod analysis;
pub mod trace;
pub mod config;
pub mod error;
pub mod stats;
pub mod models;
pub mod sweep;

// Re-export commonly used types
pub use types::{ceil_to_tick, NodeIndex, ProcessId, ResourceId, SimTime, Tick};
pub use event::{Event, EventPayload};
pub use queue::EventQueue;
pub use resource::Resource;
pub use process::{Context, Process, ProcessState, Step};
pub use engine::{EngineStats, Environment, RunOutcome};
pub use analysis::blocking_probability;
pub use trace::TraceLog;
pub use config::{ConfigError, MacConfig, QueueConfig, SimConfig, SimConfigBuilder};
pub use error::{SimError, SimResult};
pub use stats::{SweepTable, Timer};
pub use models::{
    BackoffAlgorithm, MacReport, MacSimulation, QueueReport, QueueSimulation, SlotOutcome,
};

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over `level`. Logs go to standard error so
/// that standard output carries only the reports.
///
/// # Example
///
/// ```rust,ignore
/// netdes::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
