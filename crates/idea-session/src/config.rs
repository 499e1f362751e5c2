use std::time::Duration;

use crate::errors::IdeaError;
use crate::model::{ClientOptions, DEFAULT_STRUCTURED_STAGE};

/// Endpoint and behavior settings for the HTTP/WebSocket client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the generation service API (for example
    /// `https://ideas.example.com/api`).
    pub api_base_url: String,
    /// Base URL for channels. Derived from `api_base_url` when unset.
    pub channel_base_url: Option<String>,
    /// Path of the session-creation endpoint, relative to the API base.
    pub session_path: String,
    /// Optional HTTP timeout for session creation. None by default.
    pub request_timeout: Option<Duration>,
    pub options: ClientOptions,
}

impl ClientConfig {
    /// Creates a config with defaults for everything but the API base URL.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            channel_base_url: None,
            session_path: "/sessions".to_string(),
            request_timeout: None,
            options: ClientOptions::default(),
        }
    }

    /// Builds a config from the environment.
    ///
    /// - `IDEA_API_BASE_URL` (required)
    /// - `IDEA_CHANNEL_BASE_URL`
    /// - `IDEA_SESSION_PATH`
    /// - `IDEA_STRUCTURED_STAGE`
    /// - `IDEA_POLL_INTERVAL_MS`
    pub fn from_env() -> Result<Self, IdeaError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, IdeaError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = non_empty("IDEA_API_BASE_URL").ok_or_else(|| {
            IdeaError::Config("missing IDEA_API_BASE_URL for the session api".into())
        })?;
        let mut config = Self::new(api_base_url);
        config.channel_base_url = non_empty("IDEA_CHANNEL_BASE_URL");
        if let Some(path) = non_empty("IDEA_SESSION_PATH") {
            config.session_path = path;
        }
        let stage = non_empty("IDEA_STRUCTURED_STAGE")
            .unwrap_or_else(|| DEFAULT_STRUCTURED_STAGE.to_string());
        config.options = config.options.structured_stage(stage);
        if let Some(raw) = non_empty("IDEA_POLL_INTERVAL_MS") {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                IdeaError::Config(format!("IDEA_POLL_INTERVAL_MS must be an integer, got {raw:?}"))
            })?;
            config.options = config.options.poll_interval(Duration::from_millis(millis));
        }
        Ok(config)
    }

    /// Overrides the channel base URL.
    pub fn channel_base_url(mut self, url: impl Into<String>) -> Self {
        self.channel_base_url = Some(url.into());
        self
    }

    /// Overrides the session-creation path.
    pub fn session_path(mut self, path: impl Into<String>) -> Self {
        self.session_path = path.into();
        self
    }

    /// Sets an HTTP timeout for session creation.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Replaces the runtime options.
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn client_options(&self) -> ClientOptions {
        self.options.clone()
    }

    pub(crate) fn sessions_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.session_path.trim_start_matches('/')
        )
    }

    /// Resolves the channel base URL, mapping `http(s)` to `ws(s)` when it is
    /// derived from the API base.
    pub(crate) fn resolved_channel_base_url(&self) -> Result<String, IdeaError> {
        if let Some(url) = &self.channel_base_url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        let base = self.api_base_url.trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("https://") {
            Ok(format!("wss://{rest}"))
        } else if let Some(rest) = base.strip_prefix("http://") {
            Ok(format!("ws://{rest}"))
        } else if base.starts_with("ws://") || base.starts_with("wss://") {
            Ok(base.to_string())
        } else {
            Err(IdeaError::Config(format!(
                "cannot derive a channel url from {base:?}; set IDEA_CHANNEL_BASE_URL"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn requires_api_base_url() {
        let err = ClientConfig::from_lookup(lookup(&[])).expect_err("missing");
        assert!(matches!(
            err,
            IdeaError::Config(message) if message.contains("IDEA_API_BASE_URL")
        ));
    }

    #[test]
    fn reads_overrides_from_environment() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("IDEA_API_BASE_URL", "https://ideas.example.com/api/"),
            ("IDEA_SESSION_PATH", "/v2/sessions"),
            ("IDEA_STRUCTURED_STAGE", "idea_json"),
            ("IDEA_POLL_INTERVAL_MS", "25"),
        ]))
        .expect("config");
        assert_eq!(
            config.sessions_url(),
            "https://ideas.example.com/api/v2/sessions"
        );
        assert_eq!(config.options.structured_stage, "idea_json");
        assert_eq!(config.options.poll_interval, Duration::from_millis(25));
        assert_eq!(
            config.resolved_channel_base_url().expect("channel"),
            "wss://ideas.example.com/api"
        );
    }

    #[test]
    fn rejects_non_numeric_poll_interval() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("IDEA_API_BASE_URL", "http://localhost:8000"),
            ("IDEA_POLL_INTERVAL_MS", "fast"),
        ]))
        .expect_err("invalid");
        assert!(matches!(
            err,
            IdeaError::Config(message) if message.contains("IDEA_POLL_INTERVAL_MS")
        ));
    }

    #[test]
    fn channel_url_derivation() {
        let config = ClientConfig::new("http://localhost:8000");
        assert_eq!(
            config.resolved_channel_base_url().expect("ws"),
            "ws://localhost:8000"
        );
        let config = ClientConfig::new("localhost:8000");
        assert!(config.resolved_channel_base_url().is_err());
        let config = config.channel_base_url("ws://stream.local/");
        assert_eq!(
            config.resolved_channel_base_url().expect("explicit"),
            "ws://stream.local"
        );
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new("http://localhost:8000");
        assert_eq!(config.sessions_url(), "http://localhost:8000/sessions");
        assert_eq!(config.options.poll_interval, Duration::from_millis(50));
        assert_eq!(config.options.structured_stage, DEFAULT_STRUCTURED_STAGE);
        assert!(config.request_timeout.is_none());
    }
}
