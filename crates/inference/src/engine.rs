use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::chat::{ChatCompletion, ChatMessage, CompletionOptions};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineInfo {
    pub backend: String,
    pub model_path: String,
}

/// Parameters handed to a loader when the model is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineParams {
    pub n_ctx: u32,
    pub n_threads: u32,
}

impl EngineParams {
    /// Thread count in the signed form llama.cpp takes.
    pub fn thread_count(&self) -> Result<i32, EngineError> {
        i32::try_from(self.n_threads).map_err(|_| {
            EngineError::Inference(format!("thread count {} is out of range", self.n_threads))
        })
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self { n_ctx: 2048, n_threads: 1 }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("backend initialization failed: {0}")]
    Backend(String),

    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("chat template error: {0}")]
    Template(String),

    #[error("tokenization failed: {0}")]
    Tokenize(String),

    #[error("prompt needs {needed} tokens but the context holds {n_ctx}")]
    ContextOverflow { needed: usize, n_ctx: u32 },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("inference task was cancelled: {0}")]
    Cancelled(String),
}

impl EngineError {
    /// Stable category name reported to HTTP clients.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Backend(_) => "BackendError",
            EngineError::ModelLoad(_) => "ModelLoadError",
            EngineError::Template(_) => "TemplateError",
            EngineError::Tokenize(_) => "TokenizationError",
            EngineError::ContextOverflow { .. } => "ContextOverflow",
            EngineError::Inference(_) => "InferenceError",
            EngineError::Cancelled(_) => "Cancelled",
        }
    }
}

/// Number of tokens a completion may generate after a prompt of
/// `prompt_tokens`. Requests larger than the room left in the context are
/// shrunk to fit; `None` or zero takes all of it. Only a prompt that fills
/// the context on its own is an error.
pub fn generation_budget(
    prompt_tokens: usize,
    n_ctx: u32,
    max_tokens: Option<u32>,
) -> Result<usize, EngineError> {
    let n_ctx_len = n_ctx as usize;
    if prompt_tokens >= n_ctx_len {
        return Err(EngineError::ContextOverflow { needed: prompt_tokens, n_ctx });
    }

    let room = n_ctx_len - prompt_tokens;
    Ok(match max_tokens {
        Some(0) | None => room,
        Some(n) => (n as usize).min(room),
    })
}

/// An initialized model that can answer chat completions.
///
/// Implementations must be safe to call from concurrent requests; any
/// serialization they need is their own business.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ChatCompletion, EngineError>;

    fn info(&self) -> EngineInfo;
}

/// Builds an engine from a model file. Called once at startup.
pub trait EngineLoader: Send + Sync {
    fn load(&self, path: &Path, params: &EngineParams) -> Result<Arc<dyn InferenceEngine>, EngineError>;
}
