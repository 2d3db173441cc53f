//! External agent state machine

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use super::config::AgentConfig;
use crate::convergence::blend_external;
use crate::error::SyncError;
use crate::net::{Message, MessageKind, receive_message_within, send_message};

/// Agent lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    Active,
    Done,
}

/// Outcome of an agent that saw DONE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub index: u32,
    pub final_temperature: f32,
    pub final_central: f32,
    pub iterations: u32,
}

/// One external bound to its stream to the central
pub struct ExternalAgent<S> {
    config: AgentConfig,
    stream: S,
    state: AgentState,
    temperature: f32,
    iteration: u32,
}

impl<S> ExternalAgent<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(config: AgentConfig, stream: S) -> Result<Self, SyncError> {
        debug!(?config, "ExternalAgent::new: called");
        config.validate()?;
        Ok(Self {
            temperature: config.initial_temperature,
            config,
            stream,
            state: AgentState::Active,
            iteration: 0,
        })
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Report, then answer broadcasts until DONE
    ///
    /// Any channel failure or unexpected message ends the run; the stream is
    /// dropped on return either way.
    pub async fn run(mut self) -> Result<AgentSummary, SyncError> {
        let index = self.config.index;
        info!(index, temperature = self.temperature, "External started");

        send_message(&mut self.stream, &Message::report(index, self.temperature)).await?;

        loop {
            let message = receive_message_within(&mut self.stream, self.config.receive_timeout).await?;

            match message.kind {
                MessageKind::Done => {
                    self.state = AgentState::Done;
                    info!(
                        index,
                        temperature = self.temperature,
                        central = message.value,
                        iterations = self.iteration,
                        "External stabilized"
                    );
                    return Ok(AgentSummary {
                        index,
                        final_temperature: self.temperature,
                        final_central: message.value,
                        iterations: self.iteration,
                    });
                }
                MessageKind::TempUpdate => {
                    self.iteration += 1;
                    let central = message.value;
                    self.temperature = blend_external(self.temperature, central);
                    info!(
                        index,
                        iteration = self.iteration,
                        central,
                        temperature = self.temperature,
                        "External updated"
                    );
                    send_message(&mut self.stream, &Message::report(index, self.temperature))
                        .await
                        .inspect_err(|e| warn!(index, error = %e, "Failed to send report"))?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::receive_message;

    #[tokio::test]
    async fn test_new_rejects_bad_index() {
        let (stream, _peer) = tokio::io::duplex(64);
        let err = ExternalAgent::new(AgentConfig::new(7, 1.0, 4), stream).err().unwrap();
        assert!(matches!(err, SyncError::InvalidIndex { index: 7, externals: 4 }));
    }

    #[tokio::test]
    async fn test_initial_report_then_blend() {
        let (stream, mut central) = tokio::io::duplex(64);
        let agent = ExternalAgent::new(AgentConfig::new(3, 30.0, 4), stream).unwrap();
        assert_eq!(agent.state(), AgentState::Active);
        let task = tokio::spawn(agent.run());

        let first = receive_message(&mut central).await.unwrap();
        assert_eq!(first, Message::report(3, 30.0));

        send_message(&mut central, &Message::broadcast(20.0, false)).await.unwrap();
        let second = receive_message(&mut central).await.unwrap();
        assert_eq!(second, Message::report(3, 26.0));

        send_message(&mut central, &Message::broadcast(21.0, true)).await.unwrap();
        let summary = task.await.unwrap().unwrap();
        assert_eq!(
            summary,
            AgentSummary {
                index: 3,
                final_temperature: 26.0,
                final_central: 21.0,
                iterations: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_done_right_away() {
        let (stream, mut central) = tokio::io::duplex(64);
        let task = tokio::spawn(ExternalAgent::new(AgentConfig::new(1, 5.0, 1), stream).unwrap().run());

        receive_message(&mut central).await.unwrap();
        send_message(&mut central, &Message::broadcast(5.0, true)).await.unwrap();

        let summary = task.await.unwrap().unwrap();
        assert_eq!(summary.iterations, 0);
        assert_eq!(summary.final_temperature, 5.0);
    }

    #[tokio::test]
    async fn test_central_hangup_is_channel_failure() {
        let (stream, mut central) = tokio::io::duplex(64);
        let task = tokio::spawn(ExternalAgent::new(AgentConfig::new(1, 5.0, 4), stream).unwrap().run());

        receive_message(&mut central).await.unwrap();
        drop(central);

        let err = task.await.unwrap().unwrap_err();
        assert!(err.is_channel_failure());
    }

    #[tokio::test]
    async fn test_unknown_kind_is_protocol_violation() {
        use tokio::io::AsyncWriteExt;

        let (stream, mut central) = tokio::io::duplex(64);
        let task = tokio::spawn(ExternalAgent::new(AgentConfig::new(2, 5.0, 4), stream).unwrap().run());

        receive_message(&mut central).await.unwrap();
        let mut bogus = Message::broadcast(1.0, false).encode();
        bogus[0] = 3;
        central.write_all(&bogus).await.unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, SyncError::UnknownKind(3)));
    }
}
