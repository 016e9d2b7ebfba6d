//! Inference engine seam.
//!
//! The HTTP service only talks to a model through [`InferenceEngine`] and
//! [`EngineLoader`]; concrete backends live behind cargo features.

pub mod chat;
pub mod engine;
pub mod unavailable;

#[cfg(feature = "llama")]
pub mod llama;

pub use chat::*;
pub use engine::*;
pub use unavailable::UnavailableLoader;

#[cfg(feature = "llama")]
pub use llama::{LlamaEngine, LlamaLoader};
