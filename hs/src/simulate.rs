//! Whole-protocol runs inside one process
//!
//! Binds the central on an ephemeral loopback port and spawns every external
//! as its own task over real TCP, so a run exercises the same code paths as
//! separate processes would.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::{AgentSummary, ExternalAgent};
use crate::config::Config;
use crate::coordinator::{Coordinator, ExternalEndpoint, RunSummary};
use crate::net::{accept_externals, bind_listener, connect, resolve_addr};

/// Both sides of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub central: RunSummary,
    /// Sorted by external index
    pub externals: Vec<AgentSummary>,
}

/// Run one central and one external per entry of `external_temperatures`
///
/// An empty slice means `protocol.externals` externals seeded at 0.0.
/// Otherwise the slice length overrides the configured external count.
pub async fn simulate(config: &Config, central_temperature: f32, external_temperatures: &[f32]) -> Result<SimulationReport> {
    let seeds = if external_temperatures.is_empty() {
        vec![0.0; config.protocol.externals]
    } else {
        external_temperatures.to_vec()
    };
    let externals = seeds.len();
    debug!(central_temperature, ?seeds, "simulate: called");

    let coordinator_config = config.coordinator_config().with_externals(externals);
    let coordinator = Coordinator::new(coordinator_config, central_temperature)?;

    let mut agent_configs = Vec::with_capacity(externals);
    for (seed, index) in seeds.iter().zip(1u32..) {
        let mut agent_config = config.agent_config(index, *seed);
        agent_config.externals = externals;
        agent_config.validate()?;
        agent_configs.push(agent_config);
    }

    let listener = bind_listener(resolve_addr(&config.network.host, 0)?, externals as u32)?;
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(%addr, externals, "Simulation listening");

    let connect_timeout = config.network.connect_timeout();
    let agents: Vec<_> = agent_configs
        .into_iter()
        .map(|agent_config| {
            tokio::spawn(async move {
                let stream = connect(addr, connect_timeout).await?;
                ExternalAgent::new(agent_config, stream)?.run().await
            })
        })
        .collect();

    let accept_timeout = config.network.accept_timeout().unwrap_or(connect_timeout);
    let central = async {
        let streams = accept_externals(&listener, externals, Some(accept_timeout)).await?;
        coordinator.run(ExternalEndpoint::enumerate(streams)).await
    }
    .await;
    // Anything still queued but never accepted sees the close instead of blocking
    drop(listener);

    let mut outcomes = Vec::with_capacity(externals);
    for agent in agents {
        outcomes.push(agent.await.context("External task panicked")?);
    }

    // The central's error explains the externals' hang-ups, so it wins
    let central = central.context("Central failed")?;
    let mut summaries = Vec::with_capacity(externals);
    for outcome in outcomes {
        summaries.push(outcome.context("External failed")?);
    }
    summaries.sort_by_key(|summary| summary.index);

    info!(iterations = central.iterations, final_central = central.final_central, "Simulation complete");
    Ok(SimulationReport {
        central,
        externals: summaries,
    })
}
