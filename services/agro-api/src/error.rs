use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use inference::EngineError;

use crate::types::RequestError;

/// Everything `/chat` can fail with, one status code per variant.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("model not available: {details}")]
    Unavailable { details: String },

    #[error("model handle is absent although no load error was recorded")]
    NotLoaded,

    #[error("error processing request: {message}")]
    Processing { message: String, kind: &'static str },
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::Unavailable { .. } | ChatError::NotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::Processing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RequestError> for ChatError {
    fn from(e: RequestError) -> Self {
        ChatError::Processing { message: e.to_string(), kind: e.kind() }
    }
}

impl From<EngineError> for ChatError {
    fn from(e: EngineError) -> Self {
        ChatError::Processing { message: e.to_string(), kind: e.kind() }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let body = match &self {
            ChatError::Unavailable { details } => json!({
                "error": "Model not available",
                "details": details,
            }),
            ChatError::NotLoaded => json!({
                "error": "Model not loaded",
                "details": "model handle is absent",
            }),
            ChatError::Processing { kind, .. } => json!({
                "error": self.to_string(),
                "type": kind,
            }),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ChatError::Unavailable { details: "x".into() }.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ChatError::NotLoaded.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ChatError::Processing { message: "x".into(), kind: "InferenceError" }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_engine_error_keeps_kind_and_message() {
        let e: ChatError = EngineError::Inference("decode returned -1".into()).into();
        match e {
            ChatError::Processing { message, kind } => {
                assert_eq!(kind, "InferenceError");
                assert!(message.contains("decode returned -1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
