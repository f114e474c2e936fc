//! Configuration management
//!
//! This module handles loading and validation of the Polyglot configuration.
//! Configuration is stored in TOML format at ~/.polyglot/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **backend**: Backend endpoint, model name, per-exchange timeout
//! - **retry**: Retry budget and backoff base
//! - **batch**: Worker count and inter-item pacing
//! - **translation**: Conversation mode, aggressive fallbacks, defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Text-generation backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Retry executor settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Batch scheduler settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Translation behavior settings
    #[serde(default)]
    pub translation: TranslationConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Backend endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend endpoint the relay should call
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Model name to use (e.g., "llama3.1:8b")
    #[serde(default = "default_model")]
    pub model: String,

    /// Deadline for one exchange, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Retry executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first (total = max_retries + 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base; the delay before attempt k is base * k
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

/// Batch scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Fixed worker count
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Minimum pause after one item before a worker claims the next, in
    /// milliseconds
    #[serde(default = "default_inter_item_delay_ms")]
    pub inter_item_delay_ms: u64,
}

/// Translation behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Enable the conversational strategy for requests that allow it
    #[serde(default = "default_true")]
    pub conversation_mode: bool,

    /// Enable the alternate-framing strategy tail
    #[serde(default)]
    pub aggressive_fallbacks: bool,

    /// Instructions applied when a request carries none
    #[serde(default = "default_instructions")]
    pub default_instructions: String,

    /// System prompt sent on the initial conversational turn
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_concurrency() -> usize {
    3
}

fn default_inter_item_delay_ms() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

fn default_instructions() -> String {
    "Translate the text into English. Output only the translation.".to_string()
}

fn default_system_prompt() -> String {
    "You are a translation engine. For every message, reply with only the \
     translated text: no commentary, no notes, no quotation marks."
        .to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            inter_item_delay_ms: default_inter_item_delay_ms(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            conversation_mode: default_true(),
            aggressive_fallbacks: false,
            default_instructions: default_instructions(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl Config {
    /// Default config file location: ~/.polyglot/config.toml
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".polyglot").join("config.toml"))
    }

    /// Load the configuration from the default location, writing a default
    /// file first if none exists.
    pub fn load_or_create() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            let config = Config::default();
            config.save_to_path(&path)?;
            tracing::info!("Created default configuration at {:?}", path);
            return Ok(config);
        }
        Self::load_from_path(&path)
    }

    /// Load the configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to the given path, creating parent
    /// directories as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {:?}", path))?;
        Ok(())
    }

    /// Validate value ranges.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.batch.concurrency >= 1,
            "batch.concurrency must be at least 1"
        );
        anyhow::ensure!(
            self.backend.timeout_secs >= 1,
            "backend.timeout_secs must be at least 1"
        );
        anyhow::ensure!(!self.backend.url.is_empty(), "backend.url must be set");
        anyhow::ensure!(!self.backend.model.is_empty(), "backend.model must be set");
        Ok(())
    }

    /// Per-exchange deadline as a [`Duration`].
    pub fn exchange_deadline(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Backoff base as a [`Duration`].
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.retry.base_delay_ms)
    }

    /// Inter-item pacing delay as a [`Duration`].
    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.batch.inter_item_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.batch.concurrency, 3);
        assert!(config.translation.conversation_mode);
        assert!(!config.translation.aggressive_fallbacks);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [backend]
            model = "qwen2.5:7b"

            [batch]
            concurrency = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.model, "qwen2.5:7b");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.batch.concurrency, 8);
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.translation.aggressive_fallbacks = true;
        config.retry.max_retries = 5;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert!(loaded.translation.aggressive_fallbacks);
        assert_eq!(loaded.retry.max_retries, 5);
    }

    #[test]
    fn test_invalid_concurrency_rejected() {
        let config: Config = toml::from_str(
            r#"
            [batch]
            concurrency = 0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
