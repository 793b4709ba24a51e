//! Configuration management.
//!
//! Configuration can be set via environment variables (a `.env` file in the
//! current directory is loaded first, if present):
//! - `GEMINI_API_KEY` - Required. Your Gemini API key.
//! - `GEMINI_MODEL` - Optional. Model identifier. Defaults to `gemini-2.0-flash-001`.
//! - `GEMINI_API_BASE` - Optional. API base URL.
//! - `WORKSPACE_PATH` - Optional. The sandbox root. Defaults to current directory.
//! - `MAX_ITERATIONS` - Optional. Maximum agent loop iterations. Defaults to `20`.
//! - `SCRIPT_INTERPRETER` - Optional. Program that runs scripts. Defaults to `python3`.
//! - `SCRIPT_EXTENSION` - Optional. Extension a runnable script must have. Defaults to `.py`.
//! - `SCRIPT_TIMEOUT_SECS` - Optional. Script wall-clock limit. Defaults to `30`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::agent::DEFAULT_MAX_ITERATIONS;
use crate::llm::GeminiClient;
use crate::tools::ScriptConfig;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Gemini API base URL
    pub api_base: String,

    /// Sandbox root for every tool operation
    pub workspace_path: PathBuf,

    /// Maximum iterations for the agent loop
    pub max_iterations: usize,

    /// Log tool arguments, results and token usage
    pub verbose: bool,

    /// How scripts are run
    pub script: ScriptConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GEMINI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let model = lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base = lookup("GEMINI_API_BASE")
            .unwrap_or_else(|| crate::llm::DEFAULT_API_BASE.to_string());

        let workspace_path = lookup("WORKSPACE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let max_iterations = parse_or("MAX_ITERATIONS", &lookup, DEFAULT_MAX_ITERATIONS)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let defaults = ScriptConfig::default();
        let extension = lookup("SCRIPT_EXTENSION")
            .map(|v| v.trim().to_string())
            .unwrap_or(defaults.extension.clone());
        if extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::InvalidValue(
                "SCRIPT_EXTENSION".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let language = if extension == defaults.extension {
            defaults.language.clone()
        } else {
            extension.trim_start_matches('.').to_string()
        };

        let timeout_secs = parse_or("SCRIPT_TIMEOUT_SECS", &lookup, defaults.timeout.as_secs())?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SCRIPT_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let script = ScriptConfig {
            interpreter: lookup("SCRIPT_INTERPRETER").unwrap_or(defaults.interpreter),
            extension,
            language,
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            api_key,
            model,
            api_base,
            workspace_path,
            max_iterations,
            verbose: false,
            script,
        })
    }

    /// Build the model client described by this config.
    pub fn model_client(&self) -> Result<GeminiClient, crate::llm::LlmError> {
        GeminiClient::new(&self.api_key, &self.model, &self.api_base)
    }
}

fn parse_or<T>(
    key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
