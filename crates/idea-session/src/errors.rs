/// Fixed message surfaced for every channel-level failure.
pub const CONNECTION_ERROR_MESSAGE: &str = "connection error";

/// Errors returned by a `SessionApi` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The endpoint answered with a non-success status.
    #[error("session creation rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// No usable response was received.
    #[error("session creation transport error: {message}")]
    Transport { message: String },
    /// The response arrived but did not carry a session id.
    #[error("invalid session response: {message}")]
    InvalidResponse { message: String },
}

impl SessionError {
    /// Creates a rejection error from a status code and response body.
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a response-shape error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Returns the HTTP status when the endpoint answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport { .. } | Self::InvalidResponse { .. } => None,
        }
    }
}

/// Errors raised by a streaming channel transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Connecting, reading, or writing failed.
    #[error("channel transport error: {message}")]
    Transport { message: String },
    /// The channel closed before the operation could complete.
    #[error("channel closed: {message}")]
    Closed { message: String },
}

impl ChannelError {
    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a closed-channel error.
    pub fn closed(message: impl Into<String>) -> Self {
        Self::Closed {
            message: message.into(),
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message } | Self::Closed { message } => message,
        }
    }
}

/// Top-level error type for the public client API.
///
/// Every variant except `Config` is terminal for a run and is only surfaced
/// after the channel (if one was opened) has been disconnected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdeaError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// The session-creation endpoint rejected the request or was unreachable.
    #[error("session creation failed: {message}")]
    SessionCreationFailed {
        status: Option<u16>,
        message: String,
    },
    /// Low-level channel failure; details are logged, not surfaced.
    #[error("{}", CONNECTION_ERROR_MESSAGE)]
    ChannelTransport,
    /// The generation service reported an error on the stream.
    #[error("{0}")]
    RemoteGeneration(String),
    /// The stream completed without producing a usable idea.
    #[error("generation completed without a result")]
    MissingResult,
}

impl From<SessionError> for IdeaError {
    fn from(value: SessionError) -> Self {
        IdeaError::SessionCreationFailed {
            status: value.status(),
            message: value.to_string(),
        }
    }
}

impl From<ChannelError> for IdeaError {
    fn from(value: ChannelError) -> Self {
        tracing::warn!(
            event = "channel.transport_error",
            closed = matches!(value, ChannelError::Closed { .. }),
            reason = value.message(),
            "channel failure"
        );
        IdeaError::ChannelTransport
    }
}
