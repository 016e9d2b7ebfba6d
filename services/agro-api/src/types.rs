use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use inference::ChatMessage;

pub const DEFAULT_SYSTEM_PROMPT: &str = "Eres un asistente agrónomo.";
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// Body of `POST /chat` as sent. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct RawChatRequest {
    system: Option<String>,
    context: Option<Map<String, Value>>,
    max_tokens: Option<Value>,
}

/// A `/chat` request with defaults applied.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub context: Map<String, Value>,
    /// `None` lets the model fill the rest of its context window.
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("body is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("body must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid request field: {0}")]
    Field(#[source] serde_json::Error),

    #[error("max_tokens must be an integer, got {0}")]
    MaxTokens(Value),
}

impl RequestError {
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::Json(_) => "InvalidJson",
            RequestError::NotAnObject(_) | RequestError::Field(_) | RequestError::MaxTokens(_) => {
                "InvalidRequest"
            }
        }
    }
}

impl ChatRequest {
    /// Parses a raw body regardless of its declared content type.
    pub fn parse(body: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(body).map_err(RequestError::Json)?;
        if !value.is_object() {
            return Err(RequestError::NotAnObject(json_type_name(&value)));
        }
        let raw: RawChatRequest = serde_json::from_value(value).map_err(RequestError::Field)?;

        let max_tokens = match raw.max_tokens {
            None | Some(Value::Null) => Some(DEFAULT_MAX_TOKENS),
            Some(v) => token_limit(&v).ok_or(RequestError::MaxTokens(v))?,
        };

        Ok(Self {
            system: raw.system.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            context: raw.context.unwrap_or_default(),
            max_tokens,
        })
    }

    /// System prompt first, then the context object as compact JSON.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let user = Value::Object(self.context.clone()).to_string();
        vec![ChatMessage::system(self.system.as_str()), ChatMessage::user(user)]
    }

    /// First `max_chars` characters of `context.mensaje`, if it is a string.
    pub fn message_preview(&self, max_chars: usize) -> Option<String> {
        self.context
            .get("mensaje")?
            .as_str()
            .map(|s| s.chars().take(max_chars).collect())
    }
}

/// Integers, integer strings and floats (truncated) are accepted. Zero or
/// below means no limit. `None` when the value is not a number at all.
fn token_limit(v: &Value) -> Option<Option<u32>> {
    let n: i128 = match v {
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i as i128,
            (_, Some(u), _) => u as i128,
            (_, _, Some(f)) if f.is_finite() => f.trunc() as i128,
            _ => return None,
        },
        Value::String(s) => s.trim().parse::<i64>().ok()? as i128,
        _ => return None,
    };

    Some(if n <= 0 { None } else { Some(u32::try_from(n).unwrap_or(u32::MAX)) })
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub timestamp: String,
}

/// Local time, RFC 3339 with microseconds.
pub fn timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
