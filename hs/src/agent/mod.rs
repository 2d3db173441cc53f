//! External peer
//!
//! An agent owns one temperature. It reports it, then answers every central
//! broadcast with a blended value until the central says DONE.

mod config;
mod core;

pub use config::AgentConfig;
pub use core::{AgentState, AgentSummary, ExternalAgent};
