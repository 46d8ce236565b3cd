use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::agents::BatchPolicy;
use crate::llm::LlmConfig;
use crate::session::DEFAULT_LOG_CAPACITY;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process settings, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub bind_addr: SocketAddr,
    pub batch_policy: BatchPolicy,
    pub goal_timeout: Duration,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub log_capacity: usize,
}

impl AppConfig {
    /// Read settings from the process environment
    ///
    /// Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; missing keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LlmConfig::default();

        let base_url = lookup("LOCAL_LLM_URL").unwrap_or_else(|| {
            warn!("LOCAL_LLM_URL not set, using default");
            defaults.base_url.clone()
        });

        let llm = LlmConfig {
            base_url,
            model: lookup("LLM_MODEL").unwrap_or(defaults.model),
            temperature: parse(&lookup, "LLM_TEMPERATURE", defaults.temperature)?,
            max_tokens: parse(&lookup, "LLM_MAX_TOKENS", defaults.max_tokens)?,
            system_prompt: lookup("LLM_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt),
        };

        Ok(Self {
            llm,
            bind_addr: parse(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            batch_policy: parse(&lookup, "BATCH_POLICY", BatchPolicy::default())?,
            goal_timeout: Duration::from_secs(parse(&lookup, "GOAL_TIMEOUT_SECS", 120)?),
            canvas_width: parse(&lookup, "CANVAS_WIDTH", 800)?,
            canvas_height: parse(&lookup, "CANVAS_HEIGHT", 600)?,
            log_capacity: parse(&lookup, "LOG_CAPACITY", DEFAULT_LOG_CAPACITY)?,
        })
    }
}

fn parse<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
