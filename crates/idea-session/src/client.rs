use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument as _;

use crate::channel::ChannelConnector;
use crate::config::ClientConfig;
use crate::errors::IdeaError;
use crate::model::{ClientOptions, FinishedIdea, GenerationRequest};
use crate::run::{RunContext, execute};
use crate::session::SessionApi;
use crate::stream::Progress;
use crate::vendors::http::HttpSessionApi;
use crate::vendors::ws::WsConnector;

/// Entry point for generating ideas.
///
/// Cloning is cheap; clones share the configured endpoints but every `run`
/// owns its own session, channel and candidate state.
#[derive(Clone)]
pub struct SessionClient {
    sessions: Arc<dyn SessionApi>,
    connector: Arc<dyn ChannelConnector>,
    options: ClientOptions,
}

impl SessionClient {
    /// Starts a builder for wiring the session API and channel connector.
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::default()
    }

    /// Builds a client that talks HTTP for sessions and WebSocket for
    /// channels.
    pub fn from_config(config: ClientConfig) -> Result<Self, IdeaError> {
        let options = config.client_options();
        let connector = WsConnector::new(config.resolved_channel_base_url()?);
        let sessions = HttpSessionApi::new(config)?;
        Self::builder()
            .session_api(Arc::new(sessions))
            .connector(Arc::new(connector))
            .options(options)
            .build()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Generates one idea for `request`.
    pub async fn run(
        &self,
        request: GenerationRequest,
        caller_id: i64,
    ) -> Result<FinishedIdea, IdeaError> {
        self.run_inner(request, caller_id, None).await
    }

    /// Like `run`, also forwarding live progress to `progress`.
    ///
    /// Delivery is best-effort: a full or closed receiver drops items without
    /// affecting the run.
    pub async fn run_with_progress(
        &self,
        request: GenerationRequest,
        caller_id: i64,
        progress: mpsc::Sender<Progress>,
    ) -> Result<FinishedIdea, IdeaError> {
        self.run_inner(request, caller_id, Some(&progress)).await
    }

    async fn run_inner(
        &self,
        request: GenerationRequest,
        caller_id: i64,
        progress: Option<&mpsc::Sender<Progress>>,
    ) -> Result<FinishedIdea, IdeaError> {
        let ctx = RunContext {
            sessions: self.sessions.as_ref(),
            connector: self.connector.as_ref(),
            options: &self.options,
            progress,
        };
        let span = tracing::info_span!("idea_run", caller_id, themes = request.themes.len());
        execute(ctx, &request, caller_id).instrument(span).await
    }
}

/// Builder used to register the endpoints before creating a `SessionClient`.
#[derive(Default)]
pub struct SessionClientBuilder {
    sessions: Option<Arc<dyn SessionApi>>,
    connector: Option<Arc<dyn ChannelConnector>>,
    options: ClientOptions,
}

impl SessionClientBuilder {
    pub fn session_api(mut self, sessions: Arc<dyn SessionApi>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn connector(mut self, connector: Arc<dyn ChannelConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Validates the wiring and options.
    pub fn build(self) -> Result<SessionClient, IdeaError> {
        let sessions = self
            .sessions
            .ok_or_else(|| IdeaError::Config("a session api is required".into()))?;
        let connector = self
            .connector
            .ok_or_else(|| IdeaError::Config("a channel connector is required".into()))?;
        if self.options.poll_interval.is_zero() {
            return Err(IdeaError::Config(
                "poll_interval must be greater than 0".into(),
            ));
        }
        if self.options.structured_stage.trim().is_empty() {
            return Err(IdeaError::Config(
                "structured_stage must not be empty".into(),
            ));
        }
        if self.options.event_buffer_capacity == 0 {
            return Err(IdeaError::Config(
                "event_buffer_capacity must be greater than 0".into(),
            ));
        }
        Ok(SessionClient {
            sessions,
            connector,
            options: self.options,
        })
    }
}
