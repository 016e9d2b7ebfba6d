use std::path::Path;
use std::sync::Arc;

use crate::engine::{EngineError, EngineLoader, EngineParams, InferenceEngine};

/// Loader used when the crate is built without a native backend.
///
/// Every load fails, so the service comes up in degraded mode and reports why.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableLoader;

impl EngineLoader for UnavailableLoader {
    fn load(&self, path: &Path, _params: &EngineParams) -> Result<Arc<dyn InferenceEngine>, EngineError> {
        Err(EngineError::Backend(format!(
            "no inference backend compiled in (rebuild with `--features llama`); cannot load {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_loader_always_fails() {
        let err = UnavailableLoader
            .load(Path::new("models/m.gguf"), &EngineParams::default())
            .err()
            .expect("load must fail");
        assert_eq!(err.kind(), "BackendError");
        assert!(err.to_string().contains("models/m.gguf"));
    }
}
