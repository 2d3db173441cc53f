//! Central coordinator
//!
//! The coordinator owns the central temperature and one endpoint per
//! external. Each round it:
//! - **Collects** exactly one report from every external
//! - **Aggregates** them into the next central temperature
//! - **Broadcasts** either the next value or the terminal DONE

mod config;
mod core;
mod endpoint;
mod summary;

pub use config::{CollectMode, CoordinatorConfig};
pub use core::Coordinator;
pub use endpoint::ExternalEndpoint;
pub use summary::{RoundRecord, RunSummary};
