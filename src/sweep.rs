//! Parametric sweeps.
//!
//! Each parameter point is an independent run with its own environment and
//! random stream, so points can be simulated in any order (or in parallel
//! with the `parallel` feature) and still give the same reports. Reports are
//! always returned in input order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use tracing::info;

use crate::config::{MacConfig, QueueConfig};
use crate::error::SimResult;
use crate::models::backoff::BackoffAlgorithm;
use crate::models::mac::{MacReport, MacSimulation};
use crate::models::queueing::{QueueReport, QueueSimulation};
use crate::stats::{SweepTable, Timer};

/// Arrival rates of the reference queueing table.
pub const QUEUE_ARRIVAL_RATES: [f64; 6] = [0.2, 0.4, 0.6, 0.8, 0.9, 0.99];

/// Buffer capacities of the reference queueing table.
pub const QUEUE_BUFFER_CAPACITIES: [u32; 2] = [10, 50];

/// Arrival rates of the reference multiple-access table.
pub const MAC_ARRIVAL_RATES: [f64; 9] = [0.01, 0.02, 0.03, 0.04, 0.05, 0.06, 0.07, 0.08, 0.09];

/// Every (λ, B) pair of the reference queueing table, B-major.
pub fn queue_grid() -> Vec<QueueConfig> {
    QUEUE_BUFFER_CAPACITIES
        .iter()
        .flat_map(|&b| QUEUE_ARRIVAL_RATES.iter().map(move |&l| QueueConfig::new(l, b)))
        .collect()
}

/// Every (λ, algorithm) pair of the reference multiple-access table,
/// algorithm-major.
pub fn mac_grid() -> Vec<MacConfig> {
    [BackoffAlgorithm::Exponential, BackoffAlgorithm::Linear]
        .iter()
        .flat_map(|&a| MAC_ARRIVAL_RATES.iter().map(move |&l| MacConfig::new(l, a)))
        .collect()
}

fn run_queue(config: &QueueConfig) -> SimResult<QueueReport> {
    Ok(QueueSimulation::new(config.clone())?.run())
}

fn run_mac(config: &MacConfig) -> SimResult<MacReport> {
    MacSimulation::new(config.clone())?.run()
}

/// Runs one queueing simulation per configuration.
///
/// Stops at the first invalid configuration.
pub fn sweep_queue(configs: &[QueueConfig]) -> SimResult<Vec<QueueReport>> {
    info!(points = configs.len(), "queue sweep");

    #[cfg(feature = "parallel")]
    let reports = configs.par_iter().map(run_queue).collect();

    #[cfg(not(feature = "parallel"))]
    let reports = configs.iter().map(run_queue).collect();

    reports
}

/// Runs one multiple-access simulation per configuration.
///
/// Configurations asking for a random seed get a different one per point.
pub fn sweep_mac(configs: &[MacConfig]) -> SimResult<Vec<MacReport>> {
    info!(points = configs.len(), "multiple-access sweep");

    #[cfg(feature = "parallel")]
    let reports = configs.par_iter().map(run_mac).collect();

    #[cfg(not(feature = "parallel"))]
    let reports = configs.iter().map(run_mac).collect();

    reports
}

/// Runs a queueing sweep and tabulates it.
pub fn queue_table(configs: &[QueueConfig]) -> SimResult<SweepTable> {
    let timer = Timer::start();
    let reports = sweep_queue(configs)?;

    let mut table = SweepTable::new(
        "M/M/1/B packet drops",
        &["lambda", "mu", "B", "dropped", "packets", "sim_pct", "formula_pct"],
    );
    for r in &reports {
        table.push_row(vec![
            format!("{:.2}", r.arrival_rate),
            format!("{:.2}", r.service_rate),
            r.buffer_capacity.to_string(),
            r.dropped.to_string(),
            r.packet_count.to_string(),
            format!("{:.5}", r.drop_ratio() * 100.0),
            format!("{:.5}", r.formula_drop_ratio * 100.0),
        ]);
    }
    table.wall_time_ms = timer.elapsed_ms();
    Ok(table)
}

/// Runs a multiple-access sweep and tabulates it.
pub fn mac_table(configs: &[MacConfig]) -> SimResult<SweepTable> {
    let timer = Timer::start();
    let reports = sweep_mac(configs)?;

    let mut table = SweepTable::new(
        "Slotted multiple-access utilization",
        &["lambda", "algorithm", "successes", "slots", "utilization"],
    );
    for r in &reports {
        table.push_row(vec![
            format!("{:.2}", r.arrival_rate),
            r.algorithm.to_string(),
            r.successes.to_string(),
            r.slots.to_string(),
            format!("{:.5}", r.utilization()),
        ]);
    }
    table.wall_time_ms = timer.elapsed_ms();
    Ok(table)
}
