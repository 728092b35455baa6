use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::Snafu;

pub use futures::future::BoxFuture;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type ResponderResult<T> = Result<T, ResponderError>;

/// Failure to obtain or parse a reply from an external responder.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ResponderError {
    #[snafu(display("request failed on `{stage}`: {source}"))]
    Transport { stage: &'static str, source: BoxError },
    #[snafu(display("malformed response on `{stage}`: {source}"))]
    Decode {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("responder task on `{stage}` ended before replying"))]
    Interrupted { stage: &'static str },
}

/// Body sent to the chat responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body sent to the URL-check responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlCheckRequest {
    pub url: String,
}

impl UrlCheckRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Normalized chat responder payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// The `reply` field carried the text.
    Reply(String),
    /// No usable `reply`, but a `result` field did.
    Result(String),
    /// Neither known field was usable; the whole payload, stringified.
    Raw(String),
}

impl ChatReply {
    /// Tries `reply`, then `result`, then falls back to the compact JSON text of the payload.
    pub fn from_json(payload: &Value) -> Self {
        if let Some(text) = truthy_field(payload, "reply") {
            return Self::Reply(text);
        }
        if let Some(text) = truthy_field(payload, "result") {
            return Self::Result(text);
        }
        Self::Raw(payload.to_string())
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Reply(text) | Self::Result(text) | Self::Raw(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Reply(text) | Self::Result(text) | Self::Raw(text) => text,
        }
    }
}

/// Normalized URL-check responder payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlVerdict {
    Message(String),
    Raw(String),
}

impl UrlVerdict {
    pub fn from_json(payload: &Value) -> Self {
        match truthy_field(payload, "message") {
            Some(text) => Self::Message(text),
            None => Self::Raw(payload.to_string()),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Message(text) | Self::Raw(text) => text,
        }
    }
}

/// Admin model-info payload, kept verbatim for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub payload: Value,
}

impl ModelInfo {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    pub fn model_loaded(&self) -> bool {
        self.payload.get("model_loaded").is_some_and(is_truthy)
    }

    pub fn pretty(&self) -> String {
        pretty_json(&self.payload)
    }
}

/// External collaborator producing chat replies.
pub trait ChatResponder: Send + Sync {
    fn respond<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, ResponderResult<ChatReply>>;
}

/// External collaborator producing URL-safety verdicts.
pub trait UrlChecker: Send + Sync {
    fn check<'a>(&'a self, request: UrlCheckRequest) -> BoxFuture<'a, ResponderResult<UrlVerdict>>;
}

/// Admin endpoints: model info and token-guarded model reload.
pub trait AdminService: Send + Sync {
    fn model_info<'a>(&'a self) -> BoxFuture<'a, ResponderResult<ModelInfo>>;
    fn reload_model<'a>(&'a self, token: String) -> BoxFuture<'a, ResponderResult<Value>>;
}

pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn truthy_field(payload: &Value, field: &str) -> Option<String> {
    let value = payload.get(field)?;
    if !is_truthy(value) {
        return None;
    }

    match value {
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Mirrors the widget's loose field checks: empty strings, zero, `false` and `null` are unusable.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
