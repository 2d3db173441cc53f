//! HeatSync - lockstep temperature consensus
//!
//! One central coordinator and a fixed set of N external peers exchange
//! scalar temperatures over point-to-point byte streams until every value
//! stops moving.
//!
//! # Protocol
//!
//! ```text
//! external i                         central
//!     |--- TEMP_UPDATE {i, t_i} ------->|   collect one report from all N
//!     |                                  |   c' = (2c + sum t) / (N + 2)
//!     |<-- TEMP_UPDATE {0, c'} ---------|   unstable: next round
//!     |    t_i' = (3 t_i + 2 c') / 5     |
//!     |--- TEMP_UPDATE {i, t_i'} ------>|
//!     |              ...                 |
//!     |<-- DONE {0, c'} ----------------|   stable: terminal broadcast
//! ```
//!
//! # Modules
//!
//! - [`net`] - 12-byte wire record, full-transfer codec, listener and client
//! - [`convergence`] - update rules and the stability predicate
//! - [`agent`] - the external peer state machine
//! - [`coordinator`] - the central round loop
//! - [`simulate`] - central plus N externals in one process
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod convergence;
pub mod coordinator;
pub mod error;
pub mod net;
pub mod simulate;

// Re-export commonly used types
pub use agent::{AgentConfig, AgentState, AgentSummary, ExternalAgent};
pub use config::{Config, NetworkConfig, ProtocolConfig};
pub use convergence::{blend_external, is_stable, weighted_central};
pub use coordinator::{CollectMode, Coordinator, CoordinatorConfig, ExternalEndpoint, RoundRecord, RunSummary};
pub use error::SyncError;
pub use net::{Message, MessageKind};
pub use simulate::{SimulationReport, simulate};

/// Number of externals the reference deployment runs with
pub const DEFAULT_EXTERNALS: usize = 4;

/// Convergence tolerance shared by central and external deltas
pub const DEFAULT_EPSILON: f32 = 0.001;

/// Port the central listens on by default
pub const DEFAULT_PORT: u16 = 2000;

/// Host the central binds and externals dial by default
pub const DEFAULT_HOST: &str = "127.0.0.1";
