//! Slotted multiple-access network with collision backoff.
//!
//! Nodes share one medium divided into unit slots. A long-lived
//! [`SlotDriver`] process wakes at every slot boundary and looks at which
//! nodes planned to transmit in that slot:
//!
//! - nobody: the slot is idle;
//! - exactly one node: it delivers its head packet;
//! - two or more: they collide and each backs off by a random number of slots.
//!
//! Packets reach nodes through one [`PacketArrival`] process per packet.

use std::fmt;
use std::io;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigError, MacConfig};
use crate::engine::Environment;
use crate::error::SimResult;
use crate::models::backoff::BackoffAlgorithm;
use crate::process::{Context, Process, Step};
use crate::trace::TraceLog;
use crate::types::{ceil_to_tick, NodeIndex, SimTime, Tick};

/// Per-node transmit state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NodeState {
    /// Packets waiting at the node
    pub queued_packets: u64,
    /// Slot of the next transmit attempt; `None` exactly when the node is empty
    pub next_attempt_slot: Option<Tick>,
    /// Consecutive collisions suffered by the head packet
    pub retransmit_count: u32,
}

/// What happened in one slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SlotOutcome {
    /// No node attempted.
    Idle,
    /// One node transmitted successfully.
    Success { node: NodeIndex },
    /// Several nodes attempted at once; all of them backed off.
    Collision { nodes: Vec<NodeIndex> },
}

/// Shared state of the multiple-access model.
pub struct MacState {
    nodes: Vec<NodeState>,
    algorithm: BackoffAlgorithm,
    rng: ChaCha8Rng,
    target_successes: u64,
    successes: u64,
    collision_slots: u64,
    idle_slots: u64,
    /// First slot not yet resolved
    next_slot: Tick,
    trace: TraceLog,
    trace_error: Option<io::Error>,
}

impl MacState {
    /// Creates `node_count` empty nodes.
    ///
    /// The run is complete once `target_successes` packets have been delivered.
    pub fn new(
        node_count: usize,
        algorithm: BackoffAlgorithm,
        rng: ChaCha8Rng,
        target_successes: u64,
    ) -> Self {
        Self {
            nodes: vec![NodeState::default(); node_count],
            algorithm,
            rng,
            target_successes,
            successes: 0,
            collision_slots: 0,
            idle_slots: 0,
            next_slot: 0,
            trace: TraceLog::disabled(),
            trace_error: None,
        }
    }

    /// Sends the narrated run to `trace`.
    pub fn with_trace(mut self, trace: TraceLog) -> Self {
        self.trace = trace;
        self
    }

    fn log<F: FnOnce() -> String>(&mut self, line: F) {
        if self.trace_error.is_some() {
            return;
        }
        if let Err(e) = self.trace.line(line) {
            self.trace_error = Some(e);
        }
    }

    /// Queues a packet that arrived at `node` at time `time`.
    ///
    /// A node that was empty schedules its first attempt for the slot the
    /// arrival time rounds up to, or the next unresolved slot if that one
    /// has already passed.
    pub fn arrive(&mut self, node: NodeIndex, time: SimTime) {
        let next_slot = self.next_slot;
        let state = &mut self.nodes[node];
        state.queued_packets += 1;
        let queued = state.queued_packets;

        if queued == 1 {
            debug_assert!(state.next_attempt_slot.is_none());
            let slot = ceil_to_tick(time).max(next_slot);
            state.next_attempt_slot = Some(slot);
            self.log(|| {
                format!(
                    "---Packet arrived at node {node}. Will attempt transmit at t = {slot}, {queued} packet(s) in node---"
                )
            });
        } else {
            self.log(|| format!("---Packet arrived at node {node}. {queued} packet(s) in node.---"));
        }
    }

    /// Returns the nodes planning to transmit in `slot`, in index order.
    pub fn contenders(&self, slot: Tick) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.next_attempt_slot == Some(slot))
            .map(|(i, _)| i)
            .collect()
    }

    /// Resolves slot `tick`.
    ///
    /// The contenders are read first and every update is applied afterwards,
    /// so the outcome depends only on how many nodes were scheduled.
    pub fn resolve_slot(&mut self, tick: Tick) -> SlotOutcome {
        assert!(
            tick >= self.next_slot,
            "slot {tick} resolved after slot {}",
            self.next_slot
        );
        self.log(|| format!("Time slot {tick}:"));

        let contenders = self.contenders(tick);
        let outcome = match contenders.len() {
            0 => {
                self.idle_slots += 1;
                SlotOutcome::Idle
            }
            1 => {
                let node = contenders[0];
                self.transmit(node, tick);
                SlotOutcome::Success { node }
            }
            _ => {
                for &node in &contenders {
                    self.back_off(node, tick);
                }
                self.collision_slots += 1;
                debug!(slot = tick, nodes = ?contenders, "collision");
                SlotOutcome::Collision { nodes: contenders }
            }
        };

        self.next_slot = tick + 1;
        outcome
    }

    fn transmit(&mut self, node: NodeIndex, tick: Tick) {
        let state = &mut self.nodes[node];
        assert!(state.queued_packets > 0, "node {node} transmitted with no packet");
        state.queued_packets -= 1;
        state.retransmit_count = 0;
        let remaining = state.queued_packets;
        // The follow-up attempt goes in the very next slot even if another
        // node is already scheduled there.
        state.next_attempt_slot = (remaining > 0).then_some(tick + 1);
        self.successes += 1;

        self.log(|| format!("---Node {node} successfully transmits. {remaining} packet(s) remaining---"));
        if remaining > 0 {
            self.log(|| {
                format!(
                    "-----Node {node} still has packet(s), next transmit attempt at time {}-----",
                    tick + 1
                )
            });
        }
    }

    fn back_off(&mut self, node: NodeIndex, tick: Tick) {
        self.log(|| format!("---Node {node} attempting transmit---"));

        let max_stage = self.algorithm.max_stage();
        let state = &mut self.nodes[node];
        state.retransmit_count = (state.retransmit_count + 1).min(max_stage);
        let delay = self.algorithm.draw(state.retransmit_count, &mut self.rng);
        let slot = tick + delay;
        state.next_attempt_slot = Some(slot);

        self.log(|| format!("-----Node {node} collided, rescheduled for t = {slot}-----"));
    }

    /// Returns true once every packet has been delivered.
    pub fn is_complete(&self) -> bool {
        self.successes >= self.target_successes
    }

    /// Returns a node's state.
    pub fn node(&self, node: NodeIndex) -> &NodeState {
        &self.nodes[node]
    }

    /// Returns all node states.
    pub fn nodes(&self) -> &[NodeState] {
        &self.nodes
    }

    /// Returns the number of successful transmissions.
    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Returns the number of slots that saw a collision.
    pub fn collision_slots(&self) -> u64 {
        self.collision_slots
    }

    /// Returns the number of slots nobody used.
    pub fn idle_slots(&self) -> u64 {
        self.idle_slots
    }

    /// Returns the number of slots resolved so far.
    pub fn slots_resolved(&self) -> Tick {
        self.next_slot
    }
}

/// Delivers one packet to its node at the arrival time.
#[derive(Debug)]
pub struct PacketArrival {
    node: NodeIndex,
    arrival_time: SimTime,
    pending: bool,
}

impl PacketArrival {
    /// Creates the arrival of a packet at `node` at `arrival_time`.
    pub fn new(node: NodeIndex, arrival_time: SimTime) -> Self {
        Self {
            node,
            arrival_time,
            pending: false,
        }
    }
}

impl Process<MacState> for PacketArrival {
    fn resume(&mut self, ctx: &mut Context<'_, MacState>) -> Step {
        if !self.pending {
            self.pending = true;
            return Step::Timeout(self.arrival_time - ctx.now());
        }
        let node = self.node;
        let time = self.arrival_time;
        ctx.state_mut().arrive(node, time);
        Step::Finish
    }

    fn name(&self) -> String {
        format!("arrival at node {}", self.node)
    }
}

/// Resolves one slot per unit of time until every packet is delivered.
#[derive(Debug, Default)]
pub struct SlotDriver;

impl Process<MacState> for SlotDriver {
    fn resume(&mut self, ctx: &mut Context<'_, MacState>) -> Step {
        let tick = ctx.now() as Tick;
        let state = ctx.state_mut();
        state.resolve_slot(tick);

        if state.is_complete() {
            Step::Finish
        } else {
            Step::Timeout(1.0)
        }
    }

    fn name(&self) -> String {
        "slot driver".to_string()
    }
}

/// Outcome of one multiple-access run.
#[derive(Clone, Debug, Serialize)]
pub struct MacReport {
    pub algorithm: BackoffAlgorithm,
    pub arrival_rate: f64,
    pub node_count: usize,
    pub packets_per_node: u64,
    /// Seed actually used
    pub seed: u64,
    pub successes: u64,
    /// Slots elapsed, counting slot zero
    pub slots: Tick,
    pub collision_slots: u64,
    pub idle_slots: u64,
}

impl MacReport {
    /// Fraction of slots that carried a successful transmission.
    pub fn utilization(&self) -> f64 {
        self.successes as f64 / self.slots as f64
    }
}

impl fmt::Display for MacReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}({:.5})", self.successes, self.slots, self.utilization())
    }
}

/// A configured multiple-access run.
pub struct MacSimulation {
    config: MacConfig,
    inter_arrival: Exp<f64>,
    trace: TraceLog,
}

impl MacSimulation {
    /// Validates `config` and prepares the run.
    pub fn new(config: MacConfig) -> SimResult<Self> {
        config.validate()?;
        let inter_arrival = Exp::new(config.arrival_rate)
            .map_err(|e| ConfigError::Validation(format!("arrival_rate: {e}")))?;

        Ok(Self {
            config,
            inter_arrival,
            trace: TraceLog::disabled(),
        })
    }

    /// Narrates the run to `trace`.
    pub fn with_trace(mut self, trace: TraceLog) -> Self {
        self.trace = trace;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MacConfig {
        &self.config
    }

    /// Runs until every packet has been delivered.
    pub fn run(self) -> SimResult<MacReport> {
        let Self {
            config,
            inter_arrival,
            trace,
        } = self;
        let seed = config.resolve_seed();
        info!(
            lambda = config.arrival_rate,
            algorithm = %config.algorithm,
            nodes = config.node_count,
            packets_per_node = config.packets_per_node,
            seed,
            "starting multiple-access simulation"
        );

        // All arrival times are drawn before any backoff, node by node.
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut arrivals = Vec::with_capacity(config.total_packets() as usize);
        for node in 0..config.node_count {
            let mut time = 0.0;
            for _ in 0..config.packets_per_node {
                time += inter_arrival.sample(&mut rng);
                arrivals.push((node, time));
            }
        }

        let state = MacState::new(
            config.node_count,
            config.algorithm,
            rng,
            config.total_packets(),
        )
        .with_trace(trace);
        let mut env = Environment::new(state);
        env.spawn(SlotDriver);
        for (node, time) in arrivals {
            env.spawn(PacketArrival::new(node, time));
        }

        env.run_until(MacState::is_complete);
        let final_slot = env.now() as Tick;
        let mut state = env.into_state();

        let report = MacReport {
            algorithm: config.algorithm,
            arrival_rate: config.arrival_rate,
            node_count: config.node_count,
            packets_per_node: config.packets_per_node,
            seed,
            successes: state.successes(),
            slots: final_slot + 1,
            collision_slots: state.collision_slots(),
            idle_slots: state.idle_slots(),
        };

        state.log(String::new);
        state.log(|| format!("{report} transmit timeslots successful."));
        if let Some(e) = state.trace_error.take() {
            return Err(e.into());
        }
        state.trace.flush()?;

        info!(
            successes = report.successes,
            slots = report.slots,
            utilization = report.utilization(),
            "multiple-access simulation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(nodes: usize, algorithm: BackoffAlgorithm) -> MacState {
        MacState::new(nodes, algorithm, ChaCha8Rng::seed_from_u64(5), u64::MAX)
    }

    #[test]
    fn test_first_arrival_schedules_attempt() {
        let mut mac = state(2, BackoffAlgorithm::Exponential);
        mac.arrive(1, 2.3);
        assert_eq!(mac.node(1).next_attempt_slot, Some(3));
        assert_eq!(mac.node(1).queued_packets, 1);

        mac.arrive(1, 2.9);
        assert_eq!(mac.node(1).next_attempt_slot, Some(3));
        assert_eq!(mac.node(1).queued_packets, 2);
        assert_eq!(mac.node(0).next_attempt_slot, None);
    }

    #[test]
    fn test_idle_slot() {
        let mut mac = state(3, BackoffAlgorithm::Linear);
        assert_eq!(mac.resolve_slot(0), SlotOutcome::Idle);
        assert_eq!(mac.idle_slots(), 1);
        assert_eq!(mac.slots_resolved(), 1);
    }

    #[test]
    fn test_success_with_backlog_retries_next_slot() {
        let mut mac = state(2, BackoffAlgorithm::Exponential);
        mac.arrive(0, 0.5);
        mac.arrive(0, 0.7);

        assert_eq!(mac.resolve_slot(1), SlotOutcome::Success { node: 0 });
        assert_eq!(mac.node(0).next_attempt_slot, Some(2));
        assert_eq!(mac.node(0).queued_packets, 1);

        assert_eq!(mac.resolve_slot(2), SlotOutcome::Success { node: 0 });
        assert_eq!(mac.node(0).next_attempt_slot, None);
        assert_eq!(mac.successes(), 2);
    }

    #[test]
    fn test_collision_backs_off_every_contender() {
        let mut mac = state(3, BackoffAlgorithm::Exponential);
        mac.arrive(0, 0.4);
        mac.arrive(2, 0.9);

        let outcome = mac.resolve_slot(1);
        assert_eq!(outcome, SlotOutcome::Collision { nodes: vec![0, 2] });
        for node in [0, 2] {
            let n = mac.node(node);
            assert_eq!(n.retransmit_count, 1);
            let slot = n.next_attempt_slot.unwrap();
            assert!((2..=3).contains(&slot), "node {node} rescheduled to {slot}");
        }
        assert_eq!(mac.collision_slots(), 1);
    }

    #[test]
    fn test_retransmit_count_resets_after_success() {
        let mut mac = state(2, BackoffAlgorithm::Linear);
        mac.arrive(0, 0.1);
        mac.arrive(1, 0.2);

        // Linear stage 1 always defers exactly one slot, so they collide again
        for tick in 1..=2 {
            assert!(matches!(mac.resolve_slot(tick), SlotOutcome::Collision { .. }));
        }
        assert_eq!(mac.node(0).retransmit_count, 2);
        assert_eq!(mac.node(1).retransmit_count, 2);

        // Resolve until someone gets through
        let mut tick = 3;
        let winner = loop {
            if let SlotOutcome::Success { node } = mac.resolve_slot(tick) {
                break node;
            }
            tick += 1;
        };
        assert_eq!(mac.node(winner).retransmit_count, 0);
        assert!(mac.node(1 - winner).retransmit_count >= 2);
    }

    #[test]
    fn test_classification_ignores_node_order() {
        // Same schedule, nodes listed in reverse order
        let schedule = [(0, 0.5), (1, 1.5), (2, 0.5), (3, 2.5)];
        let mut forward = state(4, BackoffAlgorithm::Exponential);
        let mut reverse = state(4, BackoffAlgorithm::Exponential);
        for &(node, time) in &schedule {
            forward.arrive(node, time);
            reverse.arrive(3 - node, time);
        }

        for tick in 0..4 {
            let a = forward.resolve_slot(tick);
            let b = reverse.resolve_slot(tick);
            match (a, b) {
                (SlotOutcome::Idle, SlotOutcome::Idle) => {}
                (SlotOutcome::Success { node: x }, SlotOutcome::Success { node: y }) => {
                    assert_eq!(x, 3 - y)
                }
                (SlotOutcome::Collision { nodes: x }, SlotOutcome::Collision { nodes: y }) => {
                    assert_eq!(x.len(), y.len())
                }
                (a, b) => panic!("slot {tick}: {a:?} vs {b:?}"),
            }
        }
    }

    #[test]
    fn test_late_arrival_never_targets_resolved_slot() {
        let mut mac = state(1, BackoffAlgorithm::Exponential);
        mac.resolve_slot(0);
        mac.resolve_slot(1);
        mac.arrive(0, 1.0);
        assert_eq!(mac.node(0).next_attempt_slot, Some(2));
    }

    #[test]
    fn test_small_run_delivers_everything() {
        let config = MacConfig::new(0.05, BackoffAlgorithm::Exponential)
            .with_node_count(3)
            .with_packets_per_node(20);
        let report = MacSimulation::new(config).unwrap().run().unwrap();

        assert_eq!(report.successes, 60);
        assert_eq!(report.seed, 5);
        assert!(report.utilization() > 0.0 && report.utilization() <= 1.0);
        assert_eq!(
            report.to_string(),
            format!("60/{}({:.5})", report.slots, report.utilization())
        );
    }
}
