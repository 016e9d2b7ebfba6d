use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use inference::{EngineLoader, EngineParams, InferenceEngine};

use crate::config::AppConfig;
use crate::state::ModelState;

/// Why the model could not be brought up at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("model file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("model initialization failed: {message}")]
    Initialization { message: String },
}

impl LoadError {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::FileNotFound { .. } => "FileNotFound",
            LoadError::Initialization { .. } => "InitializationFailure",
        }
    }
}

/// Checks the file and hands it to the engine loader. Never retries.
pub fn try_load(
    loader: &dyn EngineLoader,
    path: &Path,
    params: &EngineParams,
) -> Result<Arc<dyn InferenceEngine>, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound { path: path.to_path_buf() });
    }
    info!(path = %path.display(), "model file found");
    info!(n_ctx = params.n_ctx, n_threads = params.n_threads, "initializing inference engine");

    loader
        .load(path, params)
        .map_err(|e| LoadError::Initialization { message: e.to_string() })
}

/// Runs the one startup load and folds the outcome into a [`ModelState`].
pub fn load_model(loader: &dyn EngineLoader, cfg: &AppConfig) -> ModelState {
    info!(path = %cfg.model_path.display(), "loading model");

    match try_load(loader, &cfg.model_path, &cfg.engine_params()) {
        Ok(engine) => {
            info!(backend = %engine.info().backend, "model loaded");
            ModelState::ready(engine)
        }
        Err(e) => {
            error!(kind = e.kind(), "{e}");
            ModelState::Failed { error: e }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inference::{ChatCompletion, ChatMessage, CompletionOptions, EngineError, EngineInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo;

    #[async_trait]
    impl InferenceEngine for Echo {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<ChatCompletion, EngineError> {
            Ok(ChatCompletion::from_text("ok"))
        }

        fn info(&self) -> EngineInfo {
            EngineInfo { backend: "echo".into(), model_path: String::new() }
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        calls: AtomicUsize,
        fail_with: Option<String>,
    }

    impl EngineLoader for CountingLoader {
        fn load(&self, _path: &Path, _params: &EngineParams) -> Result<Arc<dyn InferenceEngine>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(msg) => Err(EngineError::ModelLoad(msg.clone())),
                None => Ok(Arc::new(Echo)),
            }
        }
    }

    fn config_for(path: &Path) -> AppConfig {
        let path = path.display().to_string();
        AppConfig::from_lookup(|k| (k == "LOCAL_MODEL_PATH").then(|| path.clone())).unwrap()
    }

    #[test]
    fn test_missing_file_skips_initialization() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.gguf");
        let loader = CountingLoader::default();

        let err = try_load(&loader, &missing, &EngineParams::default()).err().unwrap();
        assert_eq!(err, LoadError::FileNotFound { path: missing.clone() });
        assert_eq!(err.kind(), "FileNotFound");
        assert!(err.to_string().contains("nope.gguf"));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_initialization_failure_is_captured() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let loader = CountingLoader { fail_with: Some("bad magic".into()), ..Default::default() };

        let state = load_model(&loader, &config_for(file.path()));
        let err = state.error().cloned().unwrap();
        assert_eq!(err.kind(), "InitializationFailure");
        assert!(err.to_string().contains("bad magic"));
        assert!(state.engine().is_none());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_present_file_yields_ready_state() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let loader = CountingLoader::default();

        let state = load_model(&loader, &config_for(file.path()));
        assert!(state.error().is_none());
        assert!(state.engine().is_some());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }
}
