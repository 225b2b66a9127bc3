//! Process definitions and the `Process` trait.
//!
//! A process is a suspendable unit of simulation logic written as an explicit
//! state machine. Each call to [`Process::resume`] runs the logic from its
//! current resume point up to the next suspension point and reports that
//! point as a [`Step`]. The process stores where it left off in its own
//! fields, typically a phase enum.

use serde::{Deserialize, Serialize};

use crate::event::EventPayload;
use crate::queue::EventQueue;
use crate::resource::Resource;
use crate::types::{ProcessId, ResourceId, SimTime};

/// Lifecycle of a process inside an [`Environment`](crate::engine::Environment).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    /// Spawned, first activation not yet finished.
    Created,
    /// Suspended on a timeout or a resource request.
    Waiting,
    /// Wake condition satisfied; a resume event is pending.
    Runnable,
    /// Logic completed. The process will never run again.
    Finished,
}

/// A suspension point reported by [`Process::resume`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Sleep for the given non-negative duration.
    Timeout(SimTime),
    /// Acquire a unit of the resource.
    ///
    /// If a unit is free the process is resumed again immediately, at the same
    /// instant and before any other process runs. Otherwise it waits in the
    /// resource's FIFO queue.
    Request(ResourceId),
    /// The logic is complete. Any resources still held are released.
    Finish,
}

/// The core trait that all simulation processes implement.
///
/// `S` is the shared model state. Only the process being resumed can touch
/// it, so no synchronization is involved.
pub trait Process<S> {
    /// Runs the process up to its next suspension point.
    ///
    /// `ctx.wake_reason()` tells why the process is running: its first
    /// activation and expired timeouts report [`EventPayload::Wake`], granted
    /// requests report [`EventPayload::Grant`].
    fn resume(&mut self, ctx: &mut Context<'_, S>) -> Step;

    /// Short label used in diagnostics.
    fn name(&self) -> String {
        "process".to_string()
    }
}

/// Everything a process may see or change while it runs.
pub struct Context<'a, S> {
    pub(crate) pid: ProcessId,
    pub(crate) reason: EventPayload,
    pub(crate) state: &'a mut S,
    pub(crate) queue: &'a mut EventQueue,
    pub(crate) resources: &'a mut [Resource],
    pub(crate) states: &'a mut [ProcessState],
}

impl<'a, S> Context<'a, S> {
    /// Returns the current simulated time.
    pub fn now(&self) -> SimTime {
        self.queue.now()
    }

    /// Returns the id of the running process.
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Returns why the process was resumed.
    pub fn wake_reason(&self) -> EventPayload {
        self.reason
    }

    /// Returns the shared model state.
    pub fn state(&self) -> &S {
        self.state
    }

    /// Returns the shared model state mutably.
    pub fn state_mut(&mut self) -> &mut S {
        self.state
    }

    /// Returns true if the running process holds `resource`.
    pub fn holds(&self, resource: ResourceId) -> bool {
        self.resources[resource].is_held_by(self.pid)
    }

    /// Releases `resource` held by the running process.
    ///
    /// The next waiter, if any, is granted the unit and resumed at the current
    /// instant after the running process suspends.
    pub fn release(&mut self, resource: ResourceId) {
        release_to_next(
            self.pid,
            resource,
            self.resources,
            self.queue,
            self.states,
        );
    }
}

pub(crate) fn release_to_next(
    pid: ProcessId,
    resource: ResourceId,
    resources: &mut [Resource],
    queue: &mut EventQueue,
    states: &mut [ProcessState],
) {
    if let Some(next) = resources[resource].release(pid) {
        tracing::trace!(resource, from = pid, to = next, "resource handed over");
        states[next] = ProcessState::Runnable;
        queue.schedule(queue.now(), next, EventPayload::Grant(resource));
    }
}
