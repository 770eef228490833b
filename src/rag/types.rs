use serde::{Deserialize, Deserializer, Serialize};

/// Who authored a conversation turn (service terminology).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A ranked piece of course material the answer was grounded on.
///
/// `index` is 1-based and dense within one `sources` event; it is what the
/// inline `[n]` markers in the answer text refer to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Source {
    #[serde(deserialize_with = "opaque_id")]
    pub resource_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub score: f64,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Excerpt of the chunk the service used as context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Source {
    /// Relevance as a whole percentage, clamped to 0..=100.
    pub fn match_percent(&self) -> u32 {
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// Resource ids arrive as strings or integers depending on the backend table.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "resource_id must be a string or number, got {other}"
        ))),
    }
}

/// One protocol unit, produced by the decoder or the demo simulator and
/// consumed immediately by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Token(String),
    Sources(Vec<Source>),
    Done,
    NoContext,
    Error(String),
}

impl StreamEvent {
    /// `Done`, `NoContext` and `Error` end a reply's streaming state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Done | StreamEvent::NoContext | StreamEvent::Error(_)
        )
    }

    /// Short tag for logging (never includes the payload).
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Token(_) => "token",
            StreamEvent::Sources(_) => "sources",
            StreamEvent::Done => "done",
            StreamEvent::NoContext => "no_context",
            StreamEvent::Error(_) => "error",
        }
    }
}

/// A prior turn sent back to the service so follow-up questions have context.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /rag/ask/`.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct AskRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryTurn>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }
}
