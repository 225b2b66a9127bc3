//! # queue-sim
//!
//! Simulates an M/M/1/B queue and compares the simulated drop ratio with the
//! closed-form blocking probability.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use netdes::config::DEFAULT_SEED;
use netdes::{sweep, ConfigError, QueueConfig, QueueSimulation, SimConfig, SimResult};

/// Finite-buffer queue simulator
#[derive(Parser, Debug)]
#[command(name = "queue-sim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Packet arrival rate (λ)
    #[arg(required_unless_present_any = ["config", "sweep"])]
    lambda: Option<f64>,

    /// Buffer capacity, counting the packet in service
    #[arg(value_name = "B", required_unless_present_any = ["config", "sweep"])]
    buffer: Option<u32>,

    /// Number of packets to simulate
    #[arg(long, default_value_t = 50_000)]
    packets: u64,

    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Read the `queue` section of a YAML or JSON file instead of positional arguments
    #[arg(long, value_name = "FILE", conflicts_with_all = ["lambda", "buffer", "sweep"])]
    config: Option<PathBuf>,

    /// Run the reference grid of λ and B and print a table
    #[arg(long, conflicts_with_all = ["lambda", "buffer"])]
    sweep: bool,

    /// Also write the sweep table as CSV
    #[arg(long, value_name = "FILE", requires = "sweep")]
    csv: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    netdes::init_logging(if cli.verbose { "debug" } else { "warn" });

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> SimResult<()> {
    if cli.sweep {
        let configs: Vec<_> = sweep::queue_grid()
            .into_iter()
            .map(|c| c.with_packet_count(cli.packets).with_seed(cli.seed))
            .collect();
        let table = sweep::queue_table(&configs)?;
        print!("{}", table.summary());
        if let Some(path) = cli.csv {
            table.to_csv_file(path)?;
        }
        return Ok(());
    }

    let config = match (cli.config, cli.lambda, cli.buffer) {
        (Some(path), _, _) => SimConfig::from_file(path)?
            .queue
            .ok_or_else(|| ConfigError::Validation("no `queue` section in config file".to_string()))?,
        (None, Some(lambda), Some(buffer)) => QueueConfig::new(lambda, buffer)
            .with_packet_count(cli.packets)
            .with_seed(cli.seed),
        _ => {
            return Err(ConfigError::Validation(
                "two arguments required: packet arrival rate and buffer capacity".to_string(),
            )
            .into())
        }
    };

    let report = QueueSimulation::new(config)?.run();
    println!("{report}");
    Ok(())
}
