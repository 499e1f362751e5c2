use std::fmt;
use std::time::Duration;

use crate::beats::extract_beats;

/// Title used when the generated one is blank.
pub const DEFAULT_TITLE: &str = "Generated Idea";
/// Hook used when the generated one is blank after quote stripping.
pub const DEFAULT_HOOK: &str = "—";
/// Stage whose snapshots carry the structured idea.
pub const DEFAULT_STRUCTURED_STAGE: &str = "structured_generation";

const HOOK_QUOTES: &[char] = &['"', '\'', '“', '”', '‘', '’', '«', '»'];

/// Input to session creation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Free-form description of the creator profile.
    pub profile_description: String,
    /// Thematic hints, in caller order.
    pub themes: Vec<String>,
    /// Optional free-form prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl GenerationRequest {
    pub fn new(profile_description: impl Into<String>) -> Self {
        Self {
            profile_description: profile_description.into(),
            themes: Vec::new(),
            prompt: None,
        }
    }

    /// Appends a theme.
    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.themes.push(theme.into());
        self
    }

    /// Sets the free-form prompt.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// Opaque identifier returned by the session-creation endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHandle {
    pub session_id: String,
}

impl SessionHandle {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.session_id)
    }
}

/// Idea as produced by the generation service, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawIdea {
    pub title: String,
    pub hook: String,
    pub script_outline: String,
    /// Empty when the field was absent or not a list of strings.
    pub tags: Vec<String>,
    pub estimated_length: Option<String>,
}

impl RawIdea {
    /// Builds an idea from a JSON object if it has the required string fields.
    ///
    /// Optional fields are coerced: non-string tag entries are dropped and a
    /// non-string `estimated_length` is treated as absent.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |key: &str| object.get(key).and_then(|v| v.as_str()).map(str::to_owned);
        Some(Self {
            title: field("title")?,
            hook: field("hook")?,
            script_outline: field("script_outline")?,
            tags: object
                .get("tags")
                .and_then(|v| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            estimated_length: field("estimated_length"),
        })
    }
}

/// Lifecycle marker carried by every finished idea.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    #[default]
    Shown,
}

/// Normalized idea returned to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedIdea {
    /// Caller-supplied identifier.
    pub id: i64,
    pub title: String,
    pub hook: String,
    /// One to three storyboard labels.
    pub beats: Vec<String>,
    pub rationale: String,
    /// The generated script outline, verbatim.
    pub content_md: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_length: Option<String>,
    pub status: IdeaStatus,
}

impl FinishedIdea {
    /// Normalizes a raw idea for the request that produced it.
    pub fn assemble(raw: RawIdea, id: i64, request: &GenerationRequest) -> Self {
        let title = raw.title.trim();
        let title = if title.is_empty() { DEFAULT_TITLE } else { title };
        let hook = strip_quotes(&raw.hook);
        let hook = if hook.is_empty() { DEFAULT_HOOK } else { hook };
        Self {
            id,
            title: title.to_string(),
            hook: hook.to_string(),
            beats: extract_beats(&raw.script_outline),
            rationale: rationale_for(&request.themes),
            content_md: raw.script_outline,
            tags: raw.tags,
            estimated_length: raw.estimated_length,
            status: IdeaStatus::Shown,
        }
    }
}

fn strip_quotes(text: &str) -> &str {
    text.trim().trim_matches(HOOK_QUOTES).trim()
}

fn rationale_for(themes: &[String]) -> String {
    let themes: Vec<&str> = themes
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if themes.is_empty() {
        "Tailored to your creator profile.".to_string()
    } else {
        format!(
            "Tailored to your creator profile and your focus on {}.",
            themes.join(", ")
        )
    }
}

/// Runtime behavior of a `SessionClient`.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Interval between open-status checks for channels without a native
    /// readiness notification.
    pub poll_interval: Duration,
    /// Stage name whose `node_complete` snapshots are searched for the idea.
    pub structured_stage: String,
    /// Bounded buffer size for inbound channel frames.
    pub event_buffer_capacity: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            structured_stage: DEFAULT_STRUCTURED_STAGE.to_string(),
            event_buffer_capacity: 64,
        }
    }
}

impl ClientOptions {
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn structured_stage(mut self, stage: impl Into<String>) -> Self {
        self.structured_stage = stage.into();
        self
    }

    pub fn event_buffer_capacity(mut self, capacity: usize) -> Self {
        self.event_buffer_capacity = capacity;
        self
    }
}
