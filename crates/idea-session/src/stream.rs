/// Events delivered by the generation service over the channel.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Informational handshake message.
    Connected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Incremental text fragment from a stage.
    Token {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
    },
    /// A stage finished; `state` is its untyped snapshot.
    NodeComplete {
        node: String,
        #[serde(default)]
        state: serde_json::Value,
    },
    /// Terminal success.
    Complete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Terminal failure. Any `message` shape is accepted so the event is
    /// never dropped as malformed.
    Error {
        #[serde(
            default,
            deserialize_with = "lenient_message",
            skip_serializing_if = "Option::is_none"
        )]
        message: Option<String>,
    },
}

/// Message used when an `error` event carries no usable text.
pub const UNSPECIFIED_REMOTE_ERROR: &str = "generation failed";

fn lenient_message<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = <Option<serde_json::Value> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

impl StreamEvent {
    /// Parses one text frame.
    pub fn decode(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}

/// Messages the client sends on the channel.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Asks the service to begin generation.
    Start,
}

impl ControlMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Live progress forwarded to an optional observer during a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    Connected { message: Option<String> },
    Token { content: String, node: Option<String> },
    StageComplete { node: String },
}

impl Progress {
    /// Returns the progress item for non-terminal events.
    pub(crate) fn from_event(event: &StreamEvent) -> Option<Self> {
        match event {
            StreamEvent::Connected { message } => Some(Self::Connected {
                message: message.clone(),
            }),
            StreamEvent::Token { content, node } => Some(Self::Token {
                content: content.clone(),
                node: node.clone(),
            }),
            StreamEvent::NodeComplete { node, .. } => {
                Some(Self::StageComplete { node: node.clone() })
            }
            StreamEvent::Complete { .. } | StreamEvent::Error { .. } => None,
        }
    }
}
