//! Client for streamed idea-generation sessions.
//!
//! A run creates a session over HTTP, opens a channel bound to it, waits for
//! the channel to become usable, sends the start signal and consumes stage
//! events until the service reports completion or failure. The idea is
//! recovered from untyped stage snapshots by structural matching and then
//! normalized into a `FinishedIdea`.
//!
//! # Usage
//!
//! ```no_run
//! use idea_session::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), IdeaError> {
//! let client = SessionClient::from_config(ClientConfig::from_env()?)?;
//!
//! let idea = client
//!     .run(
//!         GenerationRequest::new("fitness creator").theme("morning routines"),
//!         1,
//!     )
//!     .await?;
//!
//! println!("{} ({} beats)", idea.title, idea.beats.len());
//! # Ok(())
//! # }
//! ```

/// Beat labels derived from script outlines.
pub mod beats;
/// Streaming channel contracts.
pub mod channel;
/// Session client entry point and builder.
pub mod client;
/// Endpoint configuration.
pub mod config;
/// Public error types.
pub mod errors;
/// Structural search for ideas inside stage snapshots.
pub mod locator;
/// Requests, handles, and idea types.
pub mod model;
/// Common imports for typical usage.
pub mod prelude;
mod run;
/// Session-creation contract.
pub mod session;
/// Untyped snapshot graph.
pub mod state;
/// Wire events and progress items.
pub mod stream;
/// HTTP and WebSocket implementations of the client seams.
pub mod vendors;

pub use beats::extract_beats;
pub use channel::{Channel, ChannelConnector, ChannelStatus};
pub use client::{SessionClient, SessionClientBuilder};
pub use config::ClientConfig;
pub use errors::{ChannelError, IdeaError, SessionError};
pub use locator::{idea_from_snapshot, locate_idea};
pub use model::{
    ClientOptions, FinishedIdea, GenerationRequest, IdeaStatus, RawIdea, SessionHandle,
};
pub use session::SessionApi;
pub use state::{NodeId, StateGraph, StateNode};
pub use stream::{ControlMessage, Progress, StreamEvent};
