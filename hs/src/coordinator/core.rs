//! Main coordinator round loop

use futures::future::join_all;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use super::config::{CollectMode, CoordinatorConfig};
use super::endpoint::ExternalEndpoint;
use super::summary::{RoundRecord, RunSummary};
use crate::convergence::{is_stable, weighted_central};
use crate::error::SyncError;
use crate::net::messages::CENTRAL_INDEX;
use crate::net::{Message, MessageKind};

/// Run state carried between rounds
///
/// `previous` holds last round's reports and is `None` until one round has
/// closed, so history and the have-history flag change together.
#[derive(Debug)]
struct RunState {
    central: f32,
    previous: Option<Vec<f32>>,
    iteration: u32,
}

/// Reports gathered during one collect phase
struct RoundReports {
    slots: Vec<Option<f32>>,
    iteration: u32,
}

impl RoundReports {
    fn new(externals: usize, iteration: u32) -> Self {
        Self {
            slots: vec![None; externals],
            iteration,
        }
    }

    fn record(&mut self, message: &Message) -> Result<(), SyncError> {
        if message.kind != MessageKind::TempUpdate {
            return Err(SyncError::UnexpectedKind {
                kind: message.kind.as_str(),
                source_index: message.source_index,
            });
        }

        let externals = self.slots.len();
        let slot = (message.source_index as usize)
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(SyncError::IndexOutOfRange {
                index: message.source_index,
                externals,
            })?;

        if slot.is_some() {
            return Err(SyncError::DuplicateReport {
                index: message.source_index,
                iteration: self.iteration,
            });
        }
        if !message.value.is_finite() {
            return Err(SyncError::NonFiniteTemperature {
                value: message.value,
                source_index: message.source_index,
                iteration: self.iteration,
            });
        }
        *slot = Some(message.value);
        Ok(())
    }

    fn complete(self) -> Result<Vec<f32>, SyncError> {
        let iteration = self.iteration;
        self.slots
            .into_iter()
            .zip(1u32..)
            .map(|(slot, index)| slot.ok_or(SyncError::MissingReport { index, iteration }))
            .collect()
    }
}

/// Drives the collect, aggregate, broadcast loop to DONE
pub struct Coordinator {
    config: CoordinatorConfig,
    state: RunState,
}

impl Coordinator {
    /// Create a coordinator seeded with the initial central temperature
    pub fn new(config: CoordinatorConfig, initial_central: f32) -> Result<Self, SyncError> {
        debug!(?config, initial_central, "Coordinator::new: called");
        config.validate()?;
        if !initial_central.is_finite() {
            return Err(SyncError::InvalidConfig(format!(
                "initial central temperature must be finite, got {}",
                initial_central
            )));
        }
        Ok(Self {
            config,
            state: RunState {
                central: initial_central,
                previous: None,
                iteration: 0,
            },
        })
    }

    /// Run rounds until the system is stable
    ///
    /// Consumes the endpoints; their streams close when this returns, on the
    /// DONE path and on every abort path alike.
    pub async fn run<S>(mut self, mut endpoints: Vec<ExternalEndpoint<S>>) -> Result<RunSummary, SyncError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if endpoints.len() != self.config.externals {
            return Err(SyncError::ConnectionCountMismatch {
                expected: self.config.externals,
                connected: endpoints.len(),
            });
        }

        info!(central = self.state.central, externals = self.config.externals, "Coordinator started");
        let mut rounds = Vec::new();

        loop {
            let iteration = self.state.iteration + 1;

            let externals = self.collect(&mut endpoints, iteration).await.inspect_err(|e| {
                error!(iteration, error = %e, "Collect phase failed");
            })?;

            let updated = weighted_central(self.state.central, &externals);
            if !updated.is_finite() {
                error!(iteration, from = self.state.central, "Central temperature overflowed");
                return Err(SyncError::NonFiniteTemperature {
                    value: updated,
                    source_index: CENTRAL_INDEX,
                    iteration,
                });
            }
            info!(
                iteration,
                from = self.state.central,
                to = updated,
                "Central temperature updated"
            );

            let stable = is_stable(
                updated,
                self.state.central,
                &externals,
                self.state.previous.as_deref(),
                self.config.epsilon,
            );

            let response = Message::broadcast(updated, stable);
            Self::broadcast(&mut endpoints, &response).await?;

            rounds.push(RoundRecord {
                iteration,
                central_before: self.state.central,
                central_after: updated,
                externals: externals.clone(),
                stable,
            });
            self.close_round(externals, updated);

            if stable {
                info!(iterations = self.state.iteration, "System stabilized");
                break;
            }
        }

        info!(central = self.state.central, "Final central temperature");
        Ok(RunSummary {
            iterations: self.state.iteration,
            final_central: self.state.central,
            final_externals: self.state.previous.take().unwrap_or_default(),
            rounds,
        })
    }

    /// Gather exactly one valid report per external
    async fn collect<S>(&self, endpoints: &mut [ExternalEndpoint<S>], iteration: u32) -> Result<Vec<f32>, SyncError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        debug!(iteration, mode = ?self.config.collect, "Coordinator::collect: called");
        let timeout = self.config.receive_timeout;
        let mut reports = RoundReports::new(self.config.externals, iteration);

        match self.config.collect {
            CollectMode::Sequential => {
                for endpoint in endpoints.iter_mut() {
                    let message = endpoint.receive(timeout).await?;
                    Self::accept_report(&mut reports, endpoint, &message, iteration)?;
                }
            }
            CollectMode::Concurrent => {
                let received = join_all(endpoints.iter_mut().map(|endpoint| endpoint.receive(timeout))).await;
                for (endpoint, result) in endpoints.iter_mut().zip(received) {
                    let message = result?;
                    Self::accept_report(&mut reports, endpoint, &message, iteration)?;
                }
            }
        }

        reports.complete()
    }

    fn accept_report<S>(
        reports: &mut RoundReports,
        endpoint: &mut ExternalEndpoint<S>,
        message: &Message,
        iteration: u32,
    ) -> Result<(), SyncError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if let Err(e) = reports.record(message) {
            warn!(iteration, endpoint = endpoint.index(), ?message, error = %e, "Rejected report");
            return Err(e);
        }
        endpoint.record(message.value);
        info!(
            iteration,
            external = message.source_index,
            value = message.value,
            "External reported"
        );
        Ok(())
    }

    /// Send the same message to every endpoint; the first failure aborts
    async fn broadcast<S>(endpoints: &mut [ExternalEndpoint<S>], message: &Message) -> Result<(), SyncError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        debug!(?message, "Coordinator::broadcast: called");
        for endpoint in endpoints.iter_mut() {
            endpoint.send(message).await.inspect_err(|e| {
                error!(endpoint = endpoint.index(), error = %e, "Broadcast failed");
            })?;
        }
        Ok(())
    }

    fn close_round(&mut self, externals: Vec<f32>, updated: f32) {
        self.state.previous = Some(externals);
        self.state.central = updated;
        self.state.iteration += 1;
    }
}
