use axum::{extract::State, Json};
use bytes::Bytes;
use tracing::{error, info};

use inference::CompletionOptions;

use crate::error::ChatError;
use crate::state::{ModelState, SharedState};
use crate::types::{timestamp, ChatRequest, ChatResponse};

pub const CHAT_TEMPERATURE: f32 = 0.2;

pub async fn chat(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ChatError> {
    // 1) Require a loaded model
    let engine = match &state.model {
        ModelState::Failed { error } => {
            return Err(ChatError::Unavailable { details: error.to_string() })
        }
        ModelState::NotLoaded => return Err(ChatError::NotLoaded),
        ModelState::Ready { engine, .. } => engine.clone(),
    };

    // 2) Parse, build, execute
    let content = run(engine.as_ref(), &body).await.map_err(|e| {
        error!("{e}");
        e
    })?;

    Ok(Json(ChatResponse { content, timestamp: timestamp() }))
}

async fn run(engine: &dyn inference::InferenceEngine, body: &[u8]) -> Result<String, ChatError> {
    let req = ChatRequest::parse(body)?;
    if let Some(preview) = req.message_preview(50) {
        info!(mensaje = %preview, "chat request");
    }

    let messages = req.messages();
    let options = CompletionOptions {
        temperature: CHAT_TEMPERATURE,
        max_tokens: req.max_tokens,
    };

    let completion = engine.complete(&messages, &options).await?;
    let content = completion
        .first_content()
        .ok_or_else(|| ChatError::Processing {
            message: "completion returned no choices".to_string(),
            kind: "EmptyCompletion",
        })?
        .to_string();

    info!(chars = content.chars().count(), "response generated");
    Ok(content)
}
