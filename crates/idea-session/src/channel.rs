//! Streaming channel contracts used by the session client.

use std::time::Duration;

use tracing::debug;

use crate::errors::ChannelError;
use crate::model::SessionHandle;

/// Observable connection state of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Constructed; handshake still in flight.
    Connecting,
    /// Usable for sending and receiving.
    Open,
    /// Closed or failed; will not become usable.
    Closed,
}

/// A bidirectional message channel bound to one session.
///
/// Frames are opaque text; decoding is the client's job. `disconnect`
/// consumes the channel so it can only run once.
#[async_trait::async_trait]
pub trait Channel: Send {
    /// Current connection state.
    fn status(&self) -> ChannelStatus;

    /// Resolves once the channel is usable.
    ///
    /// The default checks `status` every `poll_interval` for transports that
    /// have no readiness notification of their own.
    async fn ready(&mut self, poll_interval: Duration) -> Result<(), ChannelError> {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut polls = 0_u32;
        loop {
            ticker.tick().await;
            polls = polls.saturating_add(1);
            match self.status() {
                ChannelStatus::Open => {
                    debug!(event = "channel.ready", polls, "channel reported open");
                    return Ok(());
                }
                ChannelStatus::Closed => {
                    return Err(ChannelError::closed("channel closed before it became ready"));
                }
                ChannelStatus::Connecting => {}
            }
        }
    }

    /// Sends one text frame.
    async fn send(&mut self, frame: String) -> Result<(), ChannelError>;

    /// Waits for the next inbound frame; `None` once the channel has ended.
    async fn next_frame(&mut self) -> Option<Result<String, ChannelError>>;

    /// Closes the channel and releases its resources.
    async fn disconnect(self: Box<Self>);
}

/// Opens channels for sessions.
#[async_trait::async_trait]
pub trait ChannelConnector: Send + Sync {
    /// Constructs a channel for `session`.
    ///
    /// Returning does not imply the channel is usable; callers await
    /// `Channel::ready` before sending.
    async fn open(
        &self,
        session: &SessionHandle,
        buffer_capacity: usize,
    ) -> Result<Box<dyn Channel>, ChannelError>;
}
