//! HeatSync - lockstep temperature consensus
//!
//! CLI entry point for the central, an external, or a local simulation.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use heatsync::cli::{Cli, Command, EndpointArgs, OutputFormat};
use heatsync::config::Config;
use heatsync::coordinator::{Coordinator, ExternalEndpoint, RunSummary};
use heatsync::net::{accept_externals, bind_listener, connect, resolve_addr};
use heatsync::{AgentSummary, ExternalAgent, SimulationReport, SyncError, simulate};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let level = match level_str.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Central {
            initial_temperature,
            endpoint,
        } => cmd_central(&config, initial_temperature, &endpoint).await,
        Command::External {
            index,
            initial_temperature,
            endpoint,
        } => cmd_external(&config, index, initial_temperature, &endpoint).await,
        Command::Simulate {
            central_temperature,
            external_temperatures,
            format,
        } => cmd_simulate(&config, central_temperature, &external_temperatures, format).await,
    }
}

/// Host and port after applying command-line overrides
fn endpoint_addr(config: &Config, endpoint: &EndpointArgs) -> Result<std::net::SocketAddr> {
    let host = endpoint.host.as_deref().unwrap_or(&config.network.host);
    let port = endpoint.port.unwrap_or(config.network.port);
    resolve_addr(host, port)
}

/// Run the central: accept N externals, then drive rounds to DONE
async fn cmd_central(config: &Config, initial_temperature: f32, endpoint: &EndpointArgs) -> Result<()> {
    debug!(initial_temperature, "cmd_central: called");
    let addr = endpoint_addr(config, endpoint)?;
    if addr.port() == 0 {
        return Err(SyncError::InvalidConfig("central needs a fixed port".to_string()).into());
    }

    let coordinator_config = config.coordinator_config();
    let externals = coordinator_config.externals;
    let coordinator = Coordinator::new(coordinator_config, initial_temperature)?;

    let listener = bind_listener(addr, externals as u32).context(format!("Failed to listen on {}", addr))?;
    let streams = accept_externals(&listener, externals, config.network.accept_timeout())
        .await
        .context("Failed to gather externals")?;
    info!(initial_temperature, "Initial central temperature");

    let summary = coordinator
        .run(ExternalEndpoint::enumerate(streams))
        .await
        .context("Run aborted")?;

    print_run_summary(&summary);
    Ok(())
}

/// Run one external until the central says DONE
async fn cmd_external(config: &Config, index: u32, initial_temperature: f32, endpoint: &EndpointArgs) -> Result<()> {
    debug!(index, initial_temperature, "cmd_external: called");
    let agent_config = config.agent_config(index, initial_temperature);

    // Fail on a bad index before dialing anyone
    agent_config.validate()?;

    let addr = endpoint_addr(config, endpoint)?;
    let stream = connect(addr, config.network.connect_timeout())
        .await
        .context(format!("Unable to connect to central at {}", addr))?;

    let summary = ExternalAgent::new(agent_config, stream)?
        .run()
        .await
        .context("Run aborted")?;

    print_agent_summary(&summary);
    Ok(())
}

/// Run the whole protocol locally
async fn cmd_simulate(
    config: &Config,
    central_temperature: f32,
    external_temperatures: &[f32],
    format: OutputFormat,
) -> Result<()> {
    debug!(central_temperature, ?external_temperatures, ?format, "cmd_simulate: called");
    let report = simulate(config, central_temperature, external_temperatures).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_simulation(&report),
    }
    Ok(())
}

fn print_run_summary(summary: &RunSummary) {
    println!(
        "{} System stabilized after {} iterations",
        "✓".green(),
        summary.iterations.to_string().cyan()
    );
    println!("Final central temperature: {:.4}", summary.final_central);
}

fn print_agent_summary(summary: &AgentSummary) {
    println!(
        "{} External {} stabilized at {:.4} with central temperature {:.4}",
        "✓".green(),
        summary.index.to_string().cyan(),
        summary.final_temperature,
        summary.final_central
    );
}

fn print_simulation(report: &SimulationReport) {
    for round in &report.central.rounds {
        let externals: Vec<String> = round.externals.iter().map(|t| format!("{:.4}", t)).collect();
        println!(
            "{} central {:.4} -> {:.4}  externals [{}]",
            format!("#{:<4}", round.iteration).dimmed(),
            round.central_before,
            round.central_after,
            externals.join(", ")
        );
    }
    println!();
    for summary in &report.externals {
        print_agent_summary(summary);
    }
    print_run_summary(&report.central);
}
