//! Block cache simulator CLI.
//!
//! This binary drives the cache simulator from a JSON configuration and a
//! request trace. It provides:
//! 1. **Run:** Simulate a trace through the cache and memory, then print stats.
//! 2. **Check:** Validate a configuration and print the derived cache geometry.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use simcache_core::config::{Config, EvictionPolicy, PolicySelection};
use simcache_core::sim::{SimError, System, load_trace};

#[derive(Parser, Debug)]
#[command(
    name = "simcache",
    author,
    version,
    about = "Blocking block cache simulator",
    long_about = "Run a request trace through a single-outstanding-request cache with a pluggable eviction policy.\n\nExamples:\n  simcache run --trace reads.trace\n  simcache run --config cache.json --trace mixed.trace --policy fifo\n  simcache check --config cache.json"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate a trace and print the cache statistics.
    Run {
        /// JSON configuration; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Request trace (`<tick> <port> R|W <addr> <size|hexdata>` per line).
        #[arg(short, long)]
        trace: PathBuf,

        /// Override the configured eviction policy.
        #[arg(long)]
        policy: Option<EvictionPolicy>,

        /// Stop once the next event lies past this tick.
        #[arg(long)]
        max_tick: Option<u64>,

        /// Print the full report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration file.
    Check {
        /// JSON configuration.
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            trace,
            policy,
            max_tick,
            json,
        } => cmd_run(config, &trace, policy, max_tick, json),
        Commands::Check { config } => cmd_check(&config),
    };

    if let Err(e) = result {
        eprintln!("\n[!] FATAL: {e}");
        process::exit(1);
    }
}

/// Installs the fmt subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, SimError> {
    Ok(match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    })
}

/// Loads the config and trace, runs to completion (or `max_tick`), and prints the report.
fn cmd_run(
    config_path: Option<PathBuf>,
    trace_path: &PathBuf,
    policy: Option<EvictionPolicy>,
    max_tick: Option<u64>,
    json: bool,
) -> Result<(), SimError> {
    let mut config = load_config(config_path.as_ref())?;
    if let Some(policy) = policy {
        config.cache.policy = PolicySelection::One(policy);
    }
    let params = config.cache_params()?;
    let trace = load_trace(trace_path)?;

    if !json {
        println!(
            "[*] {}: {} B in {} blocks of {} B, {} eviction, {} cpu port(s)",
            params.name,
            params.capacity * params.block_size,
            params.capacity,
            params.block_size,
            params.policy,
            params.cpu_ports
        );
        println!("[*] Trace: {} ({} requests)", trace_path.display(), trace.len());
        println!();
    }

    let mut system = System::new(&config, trace)?;
    let report = system.run(max_tick)?;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("[!] cannot encode report: {e}"),
        }
    } else {
        print!("{}", report.stats);
        println!();
        println!(
            "[*] {} @ tick {} ({} refusals)",
            if report.finished { "Finished" } else { "Stopped" },
            report.final_tick,
            report.refusals
        );
    }
    Ok(())
}

/// Validates a configuration and prints the cache it describes.
fn cmd_check(config_path: &PathBuf) -> Result<(), SimError> {
    let config = Config::from_file(config_path)?;
    let params = config.cache_params()?;
    println!("[*] {} is valid", config_path.display());
    println!("    block size : {} B", params.block_size);
    println!("    capacity   : {} blocks", params.capacity);
    println!("    policy     : {}", params.policy);
    println!("    latency    : {} cycles @ {} ticks/cycle", params.latency, params.clock_period);
    println!("    cpu ports  : {}", params.cpu_ports);
    println!(
        "    memory     : {:?} [{:#x}, +{:#x})",
        config.memory.controller, config.memory.base, config.memory.size_bytes
    );
    Ok(())
}
