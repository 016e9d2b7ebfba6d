use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Sampling knobs for a single completion call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: f32,
    /// `None` generates until the context window is full.
    pub max_tokens: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub content: Option<String>,
}

/// Engine output, shaped like an OpenAI-style `choices` list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<CompletionChoice>,
}

impl ChatCompletion {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![CompletionChoice { content: Some(text.into()) }],
        }
    }

    /// Text of the first choice. `None` when there are no choices at all;
    /// a choice with null content yields an empty string.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|c| c.content.as_deref().unwrap_or(""))
    }
}
