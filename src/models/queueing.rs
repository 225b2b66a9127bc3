//! Finite-buffer single-server queue (M/M/1/B).
//!
//! Every packet is its own process. It sleeps until its arrival time, is
//! dropped if the buffer is full, and otherwise queues for the single server,
//! holds it for its service time and leaves.
//!
//! The buffer occupancy counts the packet in service as well as the waiting
//! ones, so at most `B` packets are ever in the system.

use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::blocking_probability;
use crate::config::{ConfigError, QueueConfig};
use crate::engine::Environment;
use crate::error::SimResult;
use crate::process::{Context, Process, Step};
use crate::types::{ResourceId, SimTime};

/// Buffer occupancy and per-run packet counters.
#[derive(Clone, Debug, Serialize)]
pub struct BufferState {
    capacity: u32,
    occupancy: u32,
    peak_occupancy: u32,
    dropped: u64,
    served: u64,
}

impl BufferState {
    /// Creates an empty buffer holding at most `capacity` packets.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            occupancy: 0,
            peak_occupancy: 0,
            dropped: 0,
            served: 0,
        }
    }

    /// Admits an arriving packet, or counts it as dropped if the buffer is full.
    pub fn try_admit(&mut self) -> bool {
        if self.occupancy >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.occupancy += 1;
        self.peak_occupancy = self.peak_occupancy.max(self.occupancy);
        true
    }

    /// Removes a served packet.
    ///
    /// # Panics
    /// If the buffer is empty.
    pub fn depart(&mut self) {
        assert!(self.occupancy > 0, "departure from an empty buffer");
        self.occupancy -= 1;
        self.served += 1;
    }

    /// Returns the buffer capacity (B).
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the packets currently in the system.
    pub fn occupancy(&self) -> u32 {
        self.occupancy
    }

    /// Returns the highest occupancy reached.
    pub fn peak_occupancy(&self) -> u32 {
        self.peak_occupancy
    }

    /// Returns the number of packets dropped on arrival.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Returns the number of packets that completed service.
    pub fn served(&self) -> u64 {
        self.served
    }
}

/// Where a packet is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PacketPhase {
    /// Spawned, arrival not yet scheduled.
    Created,
    /// Sleeping until its arrival time.
    ArrivalPending,
    /// Admitted and waiting for the server.
    Queued,
    /// Holding the server.
    InService,
    /// Served and gone.
    Departed,
    /// Turned away by a full buffer.
    Dropped,
}

/// One packet of the queueing scenario.
#[derive(Debug)]
pub struct PacketProcess {
    index: u64,
    arrival_time: SimTime,
    service_time: SimTime,
    server: ResourceId,
    phase: PacketPhase,
}

impl PacketProcess {
    /// Creates a packet arriving at `arrival_time` that needs `service_time`
    /// on `server`.
    pub fn new(index: u64, arrival_time: SimTime, service_time: SimTime, server: ResourceId) -> Self {
        Self {
            index,
            arrival_time,
            service_time,
            server,
            phase: PacketPhase::Created,
        }
    }

    /// Returns the packet's current phase.
    pub fn phase(&self) -> PacketPhase {
        self.phase
    }
}

impl Process<BufferState> for PacketProcess {
    fn resume(&mut self, ctx: &mut Context<'_, BufferState>) -> Step {
        match self.phase {
            PacketPhase::Created => {
                self.phase = PacketPhase::ArrivalPending;
                Step::Timeout(self.arrival_time - ctx.now())
            }
            PacketPhase::ArrivalPending => {
                let now = ctx.now();
                let buffer = ctx.state_mut();
                if !buffer.try_admit() {
                    debug!(packet = self.index, time = now, "dropped, buffer full");
                    self.phase = PacketPhase::Dropped;
                    return Step::Finish;
                }
                self.phase = PacketPhase::Queued;
                Step::Request(self.server)
            }
            PacketPhase::Queued => {
                self.phase = PacketPhase::InService;
                Step::Timeout(self.service_time)
            }
            PacketPhase::InService => {
                ctx.release(self.server);
                ctx.state_mut().depart();
                self.phase = PacketPhase::Departed;
                Step::Finish
            }
            PacketPhase::Departed | PacketPhase::Dropped => {
                panic!("packet {} resumed after leaving the system", self.index)
            }
        }
    }

    fn name(&self) -> String {
        format!("packet {}", self.index)
    }
}

/// Outcome of one queueing run.
#[derive(Clone, Debug, Serialize)]
pub struct QueueReport {
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub buffer_capacity: u32,
    pub packet_count: u64,
    pub seed: u64,
    pub dropped: u64,
    pub served: u64,
    pub peak_occupancy: u32,
    /// Time the last packet left
    pub end_time: SimTime,
    /// Closed-form blocking probability for (λ, μ, B)
    pub formula_drop_ratio: f64,
}

impl QueueReport {
    /// Fraction of packets dropped in the simulation.
    pub fn drop_ratio(&self) -> f64 {
        self.dropped as f64 / self.packet_count as f64
    }
}

impl fmt::Display for QueueReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "lambda = {:.2}, mu = {:.2}, B = {}",
            self.arrival_rate, self.service_rate, self.buffer_capacity
        )?;
        writeln!(
            f,
            "{}/{}({:.5}%) packets dropped in simulation",
            self.dropped,
            self.packet_count,
            self.drop_ratio() * 100.0
        )?;
        write!(
            f,
            "{:.5}% packets dropped by formula",
            self.formula_drop_ratio * 100.0
        )
    }
}

/// A configured queueing run.
#[derive(Clone, Debug)]
pub struct QueueSimulation {
    config: QueueConfig,
    inter_arrival: Exp<f64>,
    service: Exp<f64>,
}

impl QueueSimulation {
    /// Validates `config` and prepares the run.
    pub fn new(config: QueueConfig) -> SimResult<Self> {
        config.validate()?;
        let inter_arrival = Exp::new(config.arrival_rate)
            .map_err(|e| ConfigError::Validation(format!("arrival_rate: {e}")))?;
        let service = Exp::new(config.service_rate)
            .map_err(|e| ConfigError::Validation(format!("service_rate: {e}")))?;

        Ok(Self {
            config,
            inter_arrival,
            service,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Builds the environment with every packet spawned, without running it.
    ///
    /// Arrival and service times are drawn alternately in packet order, so a
    /// given seed always yields the same packets whatever happens later.
    pub fn build(&self) -> Environment<BufferState> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut env = Environment::new(BufferState::new(self.config.buffer_capacity));
        let server = env.add_resource(1);

        let mut arrival_time = 0.0;
        for index in 0..self.config.packet_count {
            arrival_time += self.inter_arrival.sample(&mut rng);
            let service_time = self.service.sample(&mut rng);
            env.spawn(PacketProcess::new(index, arrival_time, service_time, server));
        }
        env
    }

    /// Runs to completion and reports.
    pub fn run(&self) -> QueueReport {
        let config = &self.config;
        info!(
            lambda = config.arrival_rate,
            mu = config.service_rate,
            buffer = config.buffer_capacity,
            packets = config.packet_count,
            seed = config.seed,
            "starting queue simulation"
        );

        let mut env = self.build();
        env.run();
        let end_time = env.now();
        let buffer = env.into_state();
        assert_eq!(
            buffer.dropped() + buffer.served(),
            config.packet_count,
            "every packet must be either dropped or served"
        );

        let report = QueueReport {
            arrival_rate: config.arrival_rate,
            service_rate: config.service_rate,
            buffer_capacity: config.buffer_capacity,
            packet_count: config.packet_count,
            seed: config.seed,
            dropped: buffer.dropped(),
            served: buffer.served(),
            peak_occupancy: buffer.peak_occupancy(),
            end_time,
            formula_drop_ratio: blocking_probability(
                config.arrival_rate,
                config.service_rate,
                config.buffer_capacity,
            ),
        };
        info!(
            dropped = report.dropped,
            served = report.served,
            drop_ratio = report.drop_ratio(),
            "queue simulation finished"
        );
        report
    }
}
