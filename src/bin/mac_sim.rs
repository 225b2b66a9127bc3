//! # mac-sim
//!
//! Simulates nodes sharing a slotted medium and reports how many slots
//! carried a successful transmission.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use netdes::config::DEFAULT_SEED;
use netdes::{
    sweep, BackoffAlgorithm, ConfigError, MacConfig, MacSimulation, SimConfig, SimResult, TraceLog,
};

/// Slotted multiple-access simulator
#[derive(Parser, Debug)]
#[command(name = "mac-sim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Per-node packet arrival rate (λ)
    #[arg(required_unless_present_any = ["config", "sweep"])]
    lambda: Option<f64>,

    /// Backoff algorithm: exponential or linear
    #[arg(required_unless_present_any = ["config", "sweep"])]
    algorithm: Option<BackoffAlgorithm>,

    /// Write a trace of every slot to a log file
    #[arg(short, long)]
    log: bool,

    /// Trace file written by --log
    #[arg(long, value_name = "FILE", default_value = "log.txt")]
    log_file: PathBuf,

    /// Number of nodes
    #[arg(short = 'n', long = "nodes", default_value_t = 10)]
    nodes: usize,

    /// Packets each node must deliver
    #[arg(short = 'p', long = "packets", default_value_t = 5000)]
    packets: u64,

    /// Random seed; fixed unless given, random in 1..10000 if given without a value
    #[arg(long, value_name = "SEED", num_args = 0..=1)]
    random: Option<Option<u64>>,

    /// Read the `mac` section of a YAML or JSON file instead of positional arguments
    #[arg(long, value_name = "FILE", conflicts_with_all = ["lambda", "algorithm", "sweep"])]
    config: Option<PathBuf>,

    /// Run the reference grid of λ and both algorithms and print a table
    #[arg(long, conflicts_with_all = ["lambda", "algorithm", "log"])]
    sweep: bool,

    /// Also write the sweep table as CSV
    #[arg(long, value_name = "FILE", requires = "sweep")]
    csv: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn seed(&self) -> Option<u64> {
        match self.random {
            None => Some(DEFAULT_SEED),
            Some(seed) => seed,
        }
    }
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
    let seed = cli.seed();

    if cli.sweep {
        let configs: Vec<_> = sweep::mac_grid()
            .into_iter()
            .map(|c| {
                c.with_node_count(cli.nodes)
                    .with_packets_per_node(cli.packets)
                    .with_seed(seed)
            })
            .collect();
        let table = sweep::mac_table(&configs)?;
        print!("{}", table.summary());
        if let Some(path) = cli.csv {
            table.to_csv_file(path)?;
        }
        return Ok(());
    }

    let config = match (&cli.config, cli.lambda, cli.algorithm) {
        (Some(path), _, _) => SimConfig::from_file(path)?
            .mac
            .ok_or_else(|| ConfigError::Validation("no `mac` section in config file".to_string()))?,
        (None, Some(lambda), Some(algorithm)) => MacConfig::new(lambda, algorithm)
            .with_node_count(cli.nodes)
            .with_packets_per_node(cli.packets)
            .with_seed(seed),
        _ => {
            return Err(ConfigError::Validation(
                "two arguments required: packet arrival rate and backoff algorithm".to_string(),
            )
            .into())
        }
    };

    let mut simulation = MacSimulation::new(config)?;
    if cli.log {
        simulation = simulation.with_trace(TraceLog::create(&cli.log_file)?);
    }
    let report = simulation.run()?;
    println!("{report} transmit timeslots successful.");
    Ok(())
}
