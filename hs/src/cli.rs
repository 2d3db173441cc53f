//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// HeatSync - lockstep temperature consensus
#[derive(Parser, Debug)]
#[command(
    name = "hs",
    version,
    about = "Lockstep temperature consensus between a central and its externals"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the central coordinator
    Central {
        /// Initial central temperature
        #[arg(allow_negative_numbers = true)]
        initial_temperature: f32,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Run one external
    External {
        /// External index (1..N)
        index: u32,

        /// Initial external temperature
        #[arg(allow_negative_numbers = true)]
        initial_temperature: f32,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Run the central and all externals in this process over loopback
    Simulate {
        /// Initial central temperature
        #[arg(allow_negative_numbers = true)]
        central_temperature: f32,

        /// Initial external temperatures; defaults to N externals at 0.0
        #[arg(allow_negative_numbers = true)]
        external_temperatures: Vec<f32>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Overrides for the configured network endpoint
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EndpointArgs {
    /// Host to bind (central) or dial (external)
    #[arg(long)]
    pub host: Option<String>,

    /// TCP port
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Output format for summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
