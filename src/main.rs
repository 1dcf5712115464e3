use clap::{Parser, Subcommand};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use netlab::loader;
use netlab::simulation::{NetworkSimulator, SimulationEvent};
use netlab::topology::Topology;
use netlab::validation::{validate_basic, validate_task, ValidationResult};

/// Network topology lab: validate topologies and simulate ping and ARP
#[derive(Parser, Debug)]
#[command(name = "netlab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the lab configuration YAML file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a topology, optionally against a task
    Validate {
        /// Topology snapshot (JSON)
        #[arg(short, long)]
        topology: PathBuf,

        /// Task definition (YAML)
        #[arg(long)]
        task: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate a ping from a device to an IP address
    Ping {
        #[arg(short, long)]
        topology: PathBuf,

        /// Source device id or name
        #[arg(long)]
        from: String,

        /// Destination IP address
        #[arg(long)]
        to: String,

        /// Number of echo requests (defaults to the configured count)
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Pause between animation steps in milliseconds (defaults to the configured delay)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Simulate an ARP request from a device
    Arp {
        #[arg(short, long)]
        topology: PathBuf,

        /// Source device id or name
        #[arg(long)]
        from: String,

        /// IP address to resolve
        #[arg(long)]
        target: String,

        /// Pause between animation steps in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show reachability between every pair of addressed devices
    Connectivity {
        #[arg(short, long)]
        topology: PathBuf,

        /// Print the matrix as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let cli = Cli::parse();

    let config = loader::load_config(cli.config.as_deref())?;

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.general.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("Starting netlab");

    match cli.command {
        Commands::Validate { topology, task, json } => {
            let topology = loader::load_topology(&topology)?;
            let result = match task {
                Some(task_path) => {
                    let task = loader::load_task(&task_path)?;
                    validate_task(&topology, &task)
                }
                None => validate_basic(&topology),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_validation(&result);
            }
        }
        Commands::Ping { topology, from, to, count, delay_ms, json } => {
            let topology = loader::load_topology(&topology)?;
            let delay = delay_ms.map(Duration::from_millis).unwrap_or(config.simulator.step_delay);
            let count = count.unwrap_or(config.simulator.default_ping_count);
            let source = device_id(&topology, &from);

            let mut simulator = NetworkSimulator::with_step_delay(&topology, delay);
            for event in simulator.simulate_ping(&source, &to, count) {
                print_event(&event, json)?;
            }
        }
        Commands::Arp { topology, from, target, delay_ms, json } => {
            let topology = loader::load_topology(&topology)?;
            let delay = delay_ms.map(Duration::from_millis).unwrap_or(config.simulator.step_delay);
            let source = device_id(&topology, &from);

            let mut simulator = NetworkSimulator::with_step_delay(&topology, delay);
            for event in simulator.simulate_arp(&source, &target) {
                print_event(&event, json)?;
            }
            if !json {
                for (ip, mac) in simulator.arp_table(&source) {
                    println!("  {:<15} {}", ip, mac);
                }
            }
        }
        Commands::Connectivity { topology, json } => {
            let topology = loader::load_topology(&topology)?;
            let matrix = NetworkSimulator::new(&topology).check_connectivity();
            if json {
                println!("{}", serde_json::to_string_pretty(&matrix)?);
            } else {
                for entry in matrix.entries() {
                    println!(
                        "{:<20} {:<20} {}",
                        device_name(&topology, &entry.from),
                        device_name(&topology, &entry.to),
                        if entry.reachable { "reachable" } else { "unreachable" }
                    );
                }
            }
        }
    }

    Ok(())
}

/// Resolve an id or display name; unknown input is passed through so the
/// simulation reports it as an error event
fn device_id(topology: &Topology, id_or_name: &str) -> String {
    topology
        .resolve_device(id_or_name)
        .map(|device| device.id().to_string())
        .unwrap_or_else(|| id_or_name.to_string())
}

fn device_name<'t>(topology: &'t Topology, device_id: &'t str) -> &'t str {
    topology
        .find_device(device_id)
        .map(|device| device.name.as_str())
        .unwrap_or(device_id)
}

fn print_event(event: &SimulationEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        println!("{}", event);
    }
    Ok(())
}

fn print_validation(result: &ValidationResult) {
    println!(
        "Score: {}/100 ({})",
        result.score,
        if result.is_valid { "valid" } else { "invalid" }
    );
    for error in &result.errors {
        println!("  [{:?}] {}", error.severity, error.message);
        if let Some(hint) = &error.hint {
            println!("      hint: {}", hint);
        }
    }
    for warning in &result.warnings {
        println!("  [Warning] {}", warning);
    }
    for requirement in &result.completed_requirements {
        println!("  [x] {}", requirement);
    }
    for requirement in &result.failed_requirements {
        println!("  [ ] {}", requirement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ping_args() {
        let cli = Cli::parse_from([
            "netlab", "--log-level", "debug", "ping", "-t", "lab.json", "--from", "PC-1", "--to", "10.0.0.2", "-n", "2",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Ping { from, count, .. } => {
                assert_eq!(from, "PC-1");
                assert_eq!(count, Some(2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
