use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::Language;

pub const DEFAULT_CONFIG_PATH: &str = ".resume-review/config.yml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub feedback: FeedbackConfig,
}

/// Gemini endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub model: String,
    /// Usually supplied through GEMINI_API_KEY instead of the file
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash-preview-05-20".to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

/// Backoff settings for model requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub multiplier_secs: f64,
    pub min_wait_secs: f64,
    pub max_wait_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier_secs: 2.0,
            min_wait_secs: 5.0,
            max_wait_secs: 15.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub language: Language,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Load configuration from the default location (.resume-review/config.yml)
    pub fn load_default() -> Result<Self> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    /// Override the API key when one is supplied from the environment or command line
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api.api_key = Some(key);
        }
        self
    }
}
