//! The simulation environment (scheduler).
//!
//! [`Environment`] owns the clock, the pending events, every process and
//! resource, and the shared model state. It pops events in time order and
//! resumes their target process until that process suspends again.

use serde::Serialize;

use crate::event::EventPayload;
use crate::process::{release_to_next, Context, Process, ProcessState, Step};
use crate::queue::EventQueue;
use crate::resource::Resource;
use crate::types::{ProcessId, ResourceId, SimTime};

/// Statistics collected by the environment.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EngineStats {
    /// Events popped and delivered
    pub events_processed: u64,
    /// Processes created by `spawn`
    pub processes_spawned: u64,
    /// Processes whose logic completed
    pub processes_finished: u64,
}

/// Why [`Environment::run_until`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// No events were left.
    Exhausted,
    /// The stop predicate returned true.
    Stopped,
}

/// A single-threaded, cooperative discrete-event scheduler.
///
/// Exactly one process runs at a time and only suspends at the [`Step`]s it
/// returns, so the shared state `S` needs no locking.
///
/// # Example
///
/// ```
/// use netdes::{Context, Environment, Process, Step};
///
/// struct Ping { left: u32 }
///
/// impl Process<Vec<f64>> for Ping {
///     fn resume(&mut self, ctx: &mut Context<'_, Vec<f64>>) -> Step {
///         let now = ctx.now();
///         ctx.state_mut().push(now);
///         if self.left == 0 {
///             return Step::Finish;
///         }
///         self.left -= 1;
///         Step::Timeout(2.0)
///     }
/// }
///
/// let mut env = Environment::new(Vec::new());
/// env.spawn(Ping { left: 2 });
/// env.run();
/// assert_eq!(env.state(), &vec![0.0, 2.0, 4.0]);
/// ```
pub struct Environment<S> {
    queue: EventQueue,
    /// Process logic, `None` while running or once finished
    processes: Vec<Option<Box<dyn Process<S>>>>,
    states: Vec<ProcessState>,
    resources: Vec<Resource>,
    state: S,
    stats: EngineStats,
}

impl<S> Environment<S> {
    /// Creates an environment at time zero around the given model state.
    pub fn new(state: S) -> Self {
        Self {
            queue: EventQueue::new(),
            processes: Vec::new(),
            states: Vec::new(),
            resources: Vec::new(),
            state,
            stats: EngineStats::default(),
        }
    }

    /// Returns the current simulated time.
    pub fn now(&self) -> SimTime {
        self.queue.now()
    }

    /// Adds a resource and returns its handle.
    pub fn add_resource(&mut self, capacity: usize) -> ResourceId {
        self.resources.push(Resource::new(capacity));
        self.resources.len() - 1
    }

    /// Returns a resource by handle.
    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id]
    }

    /// Creates a process and runs it up to its first suspension point.
    pub fn spawn(&mut self, process: impl Process<S> + 'static) -> ProcessId {
        let pid = self.processes.len();
        self.processes.push(Some(Box::new(process)));
        self.states.push(ProcessState::Created);
        self.stats.processes_spawned += 1;

        self.dispatch(pid, EventPayload::Wake);
        pid
    }

    /// Returns the lifecycle state of a process.
    pub fn process_state(&self, pid: ProcessId) -> ProcessState {
        self.states[pid]
    }

    /// Returns the number of processes spawned so far.
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Returns the shared model state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Returns the shared model state mutably.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Consumes the environment and returns the model state.
    pub fn into_state(self) -> S {
        self.state
    }

    /// Returns the number of pending events.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Runs until no events remain.
    pub fn run(&mut self) {
        self.run_until(|_| false);
    }

    /// Runs until no events remain or `stop` returns true.
    ///
    /// The predicate is checked before every event, including the first.
    pub fn run_until<F>(&mut self, mut stop: F) -> RunOutcome
    where
        F: FnMut(&S) -> bool,
    {
        loop {
            if stop(&self.state) {
                return RunOutcome::Stopped;
            }
            if !self.step() {
                return RunOutcome::Exhausted;
            }
        }
    }

    /// Delivers the earliest pending event.
    ///
    /// Returns false if there was nothing to deliver.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.queue.pop_next() else {
            return false;
        };
        self.stats.events_processed += 1;
        tracing::trace!(time = event.time, pid = event.target, payload = ?event.payload, "event");

        self.states[event.target] = ProcessState::Runnable;
        self.dispatch(event.target, event.payload);
        true
    }

    /// Resumes `pid` until it suspends or finishes.
    fn dispatch(&mut self, pid: ProcessId, mut reason: EventPayload) {
        let mut logic = self.processes[pid]
            .take()
            .unwrap_or_else(|| panic!("process {pid} resumed after it finished"));

        loop {
            let step = {
                let mut ctx = Context {
                    pid,
                    reason,
                    state: &mut self.state,
                    queue: &mut self.queue,
                    resources: &mut self.resources,
                    states: &mut self.states,
                };
                logic.resume(&mut ctx)
            };

            match step {
                Step::Timeout(delay) => {
                    assert!(
                        delay >= 0.0 && delay.is_finite(),
                        "{} (pid {pid}) requested invalid timeout {delay}",
                        logic.name()
                    );
                    let at = self.queue.now() + delay;
                    self.queue.schedule(at, pid, EventPayload::Wake);
                    self.states[pid] = ProcessState::Waiting;
                    break;
                }
                Step::Request(resource) => {
                    assert!(
                        resource < self.resources.len(),
                        "{} (pid {pid}) requested unknown resource {resource}",
                        logic.name()
                    );
                    if self.resources[resource].try_acquire(pid) {
                        reason = EventPayload::Grant(resource);
                        continue;
                    }
                    self.resources[resource].enqueue(pid);
                    self.states[pid] = ProcessState::Waiting;
                    break;
                }
                Step::Finish => {
                    self.finish(pid);
                    return;
                }
            }
        }

        self.processes[pid] = Some(logic);
    }

    fn finish(&mut self, pid: ProcessId) {
        for resource in 0..self.resources.len() {
            while self.resources[resource].is_held_by(pid) {
                release_to_next(
                    pid,
                    resource,
                    &mut self.resources,
                    &mut self.queue,
                    &mut self.states,
                );
            }
        }
        self.states[pid] = ProcessState::Finished;
        self.stats.processes_finished += 1;
    }

    /// Returns the environment statistics.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Exports statistics from the engine and its resources.
    pub fn export_stats(&self) -> serde_json::Value {
        let resources: Vec<_> = self
            .resources
            .iter()
            .enumerate()
            .map(|(id, r)| {
                serde_json::json!({
                    "id": id,
                    "capacity": r.capacity(),
                    "in_use": r.in_use(),
                    "queue_len": r.queue_len(),
                    "grants": r.grants(),
                })
            })
            .collect();

        serde_json::json!({
            "engine": {
                "current_time": self.queue.now(),
                "events_processed": self.stats.events_processed,
                "processes_spawned": self.stats.processes_spawned,
                "processes_finished": self.stats.processes_finished,
                "pending_events": self.queue.len(),
                "peak_pending_events": self.queue.peak_len(),
            },
            "resources": resources,
        })
    }
}
