use crate::services::chunker::ChunkerConfig;
use anyhow::{Context, Result};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub llm_api_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub chunker: ChunkerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
            llm_api_url: "http://localhost:11434/api/generate".to_string(),
            llm_api_key: None,
            llm_model: "llama2".to_string(),
            chunker: ChunkerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for
    /// missing or empty keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut chunker = defaults.chunker.clone();
        chunker.semantic_min_chars =
            parse_or(&get, "CHUNK_SEMANTIC_MIN_CHARS", chunker.semantic_min_chars)?;
        chunker.semantic_max_chars =
            parse_or(&get, "CHUNK_SEMANTIC_MAX_CHARS", chunker.semantic_max_chars)?;
        chunker.fixed_target_sections =
            parse_or(&get, "CHUNK_FIXED_TARGET", chunker.fixed_target_sections)?;

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            llm_api_url: get("LLM_API_URL").unwrap_or(defaults.llm_api_url),
            llm_api_key: get("LLM_API_KEY"),
            llm_model: get("LLM_MODEL").unwrap_or(defaults.llm_model),
            chunker,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
