use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::{IdeaError, SessionError};
use crate::model::{GenerationRequest, SessionHandle};
use crate::session::{CreateSessionResponse, SessionApi};

/// Session API backed by `POST {api_base_url}{session_path}`.
pub struct HttpSessionApi {
    client: reqwest::Client,
    url: String,
}

impl HttpSessionApi {
    /// Creates the API client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, IdeaError> {
        if config.api_base_url.trim().is_empty() {
            return Err(IdeaError::Config("api_base_url must not be empty".into()));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| IdeaError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: config.sessions_url(),
        })
    }
}

#[async_trait::async_trait]
impl SessionApi for HttpSessionApi {
    async fn create_session(
        &self,
        request: &GenerationRequest,
    ) -> Result<SessionHandle, SessionError> {
        debug!(
            event = "session.create_request",
            url = %self.url,
            themes = request.themes.len() as u64,
            has_prompt = request.prompt.is_some()
        );
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| SessionError::transport(format!("session request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SessionError::rejected(status.as_u16(), body));
        }

        let body: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| SessionError::invalid_response(format!("invalid session body: {e}")))?;
        body.into_handle()
    }
}
