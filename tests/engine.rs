//! Integration tests for the environment, processes and resources.
//!
//! These tests verify:
//! - FIFO ordering of simultaneous events
//! - FIFO granting of a contended resource
//! - Release of resources still held when a process finishes
//! - Run control and exported statistics

use netdes::{Context, Environment, EventPayload, Process, ProcessState, ResourceId, SimTime, Step};

// ============================================================================
// Test Processes
// ============================================================================

/// Journal of `(label, what, time)` entries shared by all test processes.
type Journal = Vec<(u32, &'static str, SimTime)>;

#[derive(Clone, Copy, Debug, PartialEq)]
enum WorkerPhase {
    Start,
    Waiting,
    Working,
    Done,
}

/// Sleeps, takes a resource, works while holding it, then releases it.
struct Worker {
    label: u32,
    start_after: SimTime,
    work: SimTime,
    resource: ResourceId,
    release_explicitly: bool,
    phase: WorkerPhase,
}

impl Worker {
    fn new(label: u32, start_after: SimTime, work: SimTime, resource: ResourceId) -> Self {
        Self {
            label,
            start_after,
            work,
            resource,
            release_explicitly: true,
            phase: WorkerPhase::Start,
        }
    }

    fn keep_resource(mut self) -> Self {
        self.release_explicitly = false;
        self
    }
}

impl Process<Journal> for Worker {
    fn resume(&mut self, ctx: &mut Context<'_, Journal>) -> Step {
        let now = ctx.now();
        match self.phase {
            WorkerPhase::Start => {
                if now < self.start_after {
                    return Step::Timeout(self.start_after - now);
                }
                ctx.state_mut().push((self.label, "request", now));
                self.phase = WorkerPhase::Waiting;
                Step::Request(self.resource)
            }
            WorkerPhase::Waiting => {
                assert_eq!(ctx.wake_reason(), EventPayload::Grant(self.resource));
                assert!(ctx.holds(self.resource));
                ctx.state_mut().push((self.label, "granted", now));
                self.phase = WorkerPhase::Working;
                Step::Timeout(self.work)
            }
            WorkerPhase::Working => {
                if self.release_explicitly {
                    ctx.release(self.resource);
                }
                ctx.state_mut().push((self.label, "done", now));
                self.phase = WorkerPhase::Done;
                Step::Finish
            }
            WorkerPhase::Done => unreachable!("worker {} resumed after finishing", self.label),
        }
    }

    fn name(&self) -> String {
        format!("worker {}", self.label)
    }
}

fn entries(journal: &Journal, what: &str) -> Vec<(u32, SimTime)> {
    journal
        .iter()
        .filter(|(_, w, _)| *w == what)
        .map(|&(label, _, time)| (label, time))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_contended_resource_is_granted_in_request_order() {
    let mut env = Environment::new(Journal::new());
    let server = env.add_resource(1);
    env.spawn(Worker::new(1, 1.0, 4.0, server));
    env.spawn(Worker::new(2, 2.0, 1.0, server));
    env.spawn(Worker::new(3, 3.0, 1.0, server));

    env.run();

    assert_eq!(
        entries(env.state(), "granted"),
        vec![(1, 1.0), (2, 5.0), (3, 6.0)]
    );
    assert_eq!(env.now(), 7.0);
    assert_eq!(env.resource(server).grants(), 3);
    assert_eq!(env.resource(server).in_use(), 0);
}

#[test]
fn test_simultaneous_requests_keep_spawn_order() {
    let mut env = Environment::new(Journal::new());
    let server = env.add_resource(1);
    for label in 0..5 {
        env.spawn(Worker::new(label, 2.0, 1.0, server));
    }

    env.run();

    let granted: Vec<u32> = entries(env.state(), "granted").iter().map(|e| e.0).collect();
    assert_eq!(granted, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_capacity_two_serves_two_at_once() {
    let mut env = Environment::new(Journal::new());
    let pool = env.add_resource(2);
    for label in 0..4 {
        env.spawn(Worker::new(label, 0.0, 3.0, pool));
    }

    env.run();

    assert_eq!(
        entries(env.state(), "granted"),
        vec![(0, 0.0), (1, 0.0), (2, 3.0), (3, 3.0)]
    );
    assert_eq!(env.now(), 6.0);
}

#[test]
fn test_finishing_process_releases_held_resource() {
    let mut env = Environment::new(Journal::new());
    let server = env.add_resource(1);
    let holder = env.spawn(Worker::new(1, 0.0, 2.0, server).keep_resource());
    let waiter = env.spawn(Worker::new(2, 1.0, 1.0, server));

    env.run();

    assert_eq!(entries(env.state(), "granted"), vec![(1, 0.0), (2, 2.0)]);
    assert_eq!(env.process_state(holder), ProcessState::Finished);
    assert_eq!(env.process_state(waiter), ProcessState::Finished);
    assert_eq!(env.resource(server).in_use(), 0);
}

#[test]
fn test_waiting_process_state() {
    let mut env = Environment::new(Journal::new());
    let server = env.add_resource(1);
    env.spawn(Worker::new(1, 0.0, 10.0, server));
    let waiter = env.spawn(Worker::new(2, 0.0, 1.0, server));

    assert_eq!(env.process_state(waiter), ProcessState::Waiting);
    assert_eq!(env.resource(server).queue_len(), 1);
    assert_eq!(env.pending_events(), 1);
}

#[test]
fn test_step_and_stats() {
    let mut env = Environment::new(Journal::new());
    let server = env.add_resource(1);
    env.spawn(Worker::new(1, 1.0, 1.0, server));
    env.spawn(Worker::new(2, 1.0, 1.0, server));

    let mut steps = 0;
    while env.step() {
        steps += 1;
    }
    assert!(!env.step());

    let stats = env.stats();
    assert_eq!(stats.events_processed, steps);
    assert_eq!(stats.processes_spawned, 2);
    assert_eq!(stats.processes_finished, 2);

    let json = env.export_stats();
    assert_eq!(json["engine"]["events_processed"], steps);
    assert_eq!(json["resources"][0]["grants"], 2);
    assert_eq!(json["engine"]["pending_events"], 0);
}
