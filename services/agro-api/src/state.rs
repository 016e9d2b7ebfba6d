use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local};
use inference::InferenceEngine;

use crate::loader::LoadError;

pub type SharedState = Arc<AppState>;

/// Outcome of the startup load. Built once, never mutated.
#[derive(Clone)]
pub enum ModelState {
    /// Load has not run. Unreachable once `main` has called the loader.
    NotLoaded,
    Ready { engine: Arc<dyn InferenceEngine>, loaded_at: DateTime<Local> },
    Failed { error: LoadError },
}

impl ModelState {
    pub fn ready(engine: Arc<dyn InferenceEngine>) -> Self {
        ModelState::Ready { engine, loaded_at: Local::now() }
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            ModelState::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn engine(&self) -> Option<&Arc<dyn InferenceEngine>> {
        match self {
            ModelState::Ready { engine, .. } => Some(engine),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine().is_some()
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelState::NotLoaded => f.write_str("NotLoaded"),
            ModelState::Ready { engine, loaded_at } => f
                .debug_struct("Ready")
                .field("engine", &engine.info())
                .field("loaded_at", loaded_at)
                .finish(),
            ModelState::Failed { error } => f.debug_struct("Failed").field("error", error).finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub model: ModelState,
    pub model_path: PathBuf,
}

impl AppState {
    pub fn new(model: ModelState, model_path: PathBuf) -> Self {
        Self { model, model_path }
    }
}
