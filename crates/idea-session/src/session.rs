//! Session-creation seam and response validation.

use crate::errors::SessionError;
use crate::model::{GenerationRequest, SessionHandle};

/// Session-creation endpoint used by the client.
///
/// Implementations perform a single attempt; the client never retries.
#[async_trait::async_trait]
pub trait SessionApi: Send + Sync {
    /// Creates a session for `request` and returns its handle.
    async fn create_session(
        &self,
        request: &GenerationRequest,
    ) -> Result<SessionHandle, SessionError>;
}

/// Body returned by the session-creation endpoint.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSessionResponse {
    pub session_id: String,
}

impl CreateSessionResponse {
    pub(crate) fn into_handle(self) -> Result<SessionHandle, SessionError> {
        if self.session_id.trim().is_empty() {
            return Err(SessionError::invalid_response("sessionId must not be empty"));
        }
        Ok(SessionHandle::new(self.session_id))
    }
}
