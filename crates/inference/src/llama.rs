//! llama.cpp backend built on `llama-cpp-2`.
//!
//! `LlamaModel` is `Send + Sync` and is shared for the life of the process.
//! `LlamaContext` is neither, so every completion builds its own context
//! inside `spawn_blocking`.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaChatMessage, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;
use tracing::{debug, info};

use crate::chat::{ChatCompletion, ChatMessage, CompletionOptions};
use crate::engine::{generation_budget, EngineError, EngineInfo, EngineLoader, EngineParams, InferenceEngine};

const SAMPLER_SEED: u32 = 1234;

#[derive(Debug, Default, Clone, Copy)]
pub struct LlamaLoader;

impl EngineLoader for LlamaLoader {
    fn load(&self, path: &Path, params: &EngineParams) -> Result<Arc<dyn InferenceEngine>, EngineError> {
        let engine = LlamaEngine::load(path, *params)?;
        Ok(Arc::new(engine))
    }
}

// Fields drop in declaration order: the model is freed before the backend.
struct Loaded {
    model: LlamaModel,
    backend: LlamaBackend,
}

pub struct LlamaEngine {
    inner: Arc<Loaded>,
    path: PathBuf,
    params: EngineParams,
}

impl LlamaEngine {
    pub fn load(path: &Path, params: EngineParams) -> Result<Self, EngineError> {
        let mut backend = LlamaBackend::init().map_err(|e| EngineError::Backend(e.to_string()))?;
        backend.void_logs();

        let model_params = LlamaModelParams::default();
        let model = LlamaModel::load_from_file(&backend, path, &model_params)
            .map_err(|e| EngineError::ModelLoad(e.to_string()))?;

        info!(path = %path.display(), n_ctx = params.n_ctx, n_threads = params.n_threads, "llama model loaded");

        Ok(Self {
            inner: Arc::new(Loaded { model, backend }),
            path: path.to_path_buf(),
            params,
        })
    }
}

#[async_trait]
impl InferenceEngine for LlamaEngine {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ChatCompletion, EngineError> {
        let inner = self.inner.clone();
        let params = self.params;
        let messages = messages.to_vec();
        let options = options.clone();

        let text = tokio::task::spawn_blocking(move || generate(&inner, params, &messages, &options))
            .await
            .map_err(|e| EngineError::Cancelled(e.to_string()))??;

        Ok(ChatCompletion::from_text(text))
    }

    fn info(&self) -> EngineInfo {
        EngineInfo {
            backend: "llama.cpp".to_string(),
            model_path: self.path.display().to_string(),
        }
    }
}

fn generate(
    loaded: &Loaded,
    params: EngineParams,
    messages: &[ChatMessage],
    options: &CompletionOptions,
) -> Result<String, EngineError> {
    let model = &loaded.model;

    let chat = messages
        .iter()
        .map(|m| LlamaChatMessage::new(m.role.as_str().to_string(), m.content.clone()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| EngineError::Template(e.to_string()))?;
    let template = model
        .chat_template(None)
        .map_err(|e| EngineError::Template(e.to_string()))?;
    let prompt = model
        .apply_chat_template(&template, &chat, true)
        .map_err(|e| EngineError::Template(e.to_string()))?;

    let tokens = model
        .str_to_token(&prompt, AddBos::Always)
        .map_err(|e| EngineError::Tokenize(e.to_string()))?;
    let budget = generation_budget(tokens.len(), params.n_ctx, options.max_tokens)?;

    let threads = params.thread_count()?;
    let ctx_params = LlamaContextParams::default()
        .with_n_ctx(NonZeroU32::new(params.n_ctx))
        .with_n_threads(threads)
        .with_n_threads_batch(threads);
    let mut ctx = model
        .new_context(&loaded.backend, ctx_params)
        .map_err(|e| EngineError::Inference(e.to_string()))?;

    let mut batch = LlamaBatch::new(tokens.len().max(1), 1);
    let last = tokens.len() as i32 - 1;
    for (pos, token) in (0_i32..).zip(tokens.iter().copied()) {
        batch
            .add(token, pos, &[0], pos == last)
            .map_err(|e| EngineError::Inference(e.to_string()))?;
    }
    ctx.decode(&mut batch)
        .map_err(|e| EngineError::Inference(e.to_string()))?;

    let mut sampler = LlamaSampler::chain_simple([
        LlamaSampler::temp(options.temperature),
        LlamaSampler::dist(SAMPLER_SEED),
    ]);

    let mut out: Vec<u8> = Vec::new();
    let mut n_cur = batch.n_tokens();
    for _ in 0..budget {
        let token = sampler.sample(&ctx, batch.n_tokens() - 1);
        sampler.accept(token);
        if model.is_eog_token(token) {
            break;
        }

        let piece = model
            .token_to_bytes(token, Special::Tokenize)
            .map_err(|e| EngineError::Inference(e.to_string()))?;
        out.extend_from_slice(&piece);

        batch.clear();
        batch
            .add(token, n_cur, &[0], true)
            .map_err(|e| EngineError::Inference(e.to_string()))?;
        n_cur += 1;
        ctx.decode(&mut batch)
            .map_err(|e| EngineError::Inference(e.to_string()))?;
    }

    debug!(prompt_tokens = tokens.len(), generated_bytes = out.len(), "llama generation finished");
    Ok(String::from_utf8_lossy(&out).into_owned())
}
