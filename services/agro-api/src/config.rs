use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use inference::EngineParams;

pub const DEFAULT_MODEL_PATH: &str = "models/qwen2.5-3b-instruct-q4_k_m.gguf";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub n_ctx: u32,
    pub n_threads: u32,

    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_path = lookup("LOCAL_MODEL_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        let n_ctx: u32 = parse_or(&lookup, "N_CTX", 2048)?;
        let n_threads: u32 = parse_or(&lookup, "N_THREADS", 1)?;
        let port: u16 = parse_or(&lookup, "PORT", 8080)?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        // Tiny sanity checks (fail fast, fail loud)
        if n_ctx == 0 {
            bail!("N_CTX must be greater than zero");
        }
        if n_threads == 0 {
            bail!("N_THREADS must be greater than zero");
        }

        Ok(Self {
            model_path,
            n_ctx,
            n_threads,
            host,
            port,
        })
    }

    pub fn engine_params(&self) -> EngineParams {
        EngineParams {
            n_ctx: self.n_ctx,
            n_threads: self.n_threads,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for env var {key}: {raw:?}")),
        None => Ok(default),
    }
}
