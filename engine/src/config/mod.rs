//! Configuration management
//!
//! This module handles loading, validation, and management of the Leafdoc configuration.
//! Configuration is stored in TOML format at ~/.leafdoc/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory, optional seed file
//! - **oracle**: AI provider selection, endpoints, timeout and sampling temperatures
//! - **server**: HTTP bind address and CORS policy
//!
//! # Path Expansion
//!
//! `~` in `data_dir` and `seed_path` is expanded to the user's home directory,
//! and the data directory is created if it doesn't exist.
//!
//! # Examples
//!
//! ```no_run
//! use leafdoc_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Provider: {}", config.oracle.provider);
//! println!("Database: {:?}", config.database_path());
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Providers accepted in `oracle.provider`
pub const VALID_PROVIDERS: [&str; 2] = ["openrouter", "ollama"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// AI oracle settings
    #[serde(default)]
    pub oracle: OracleConfig,

    /// HTTP adapter settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// JSON seed file for the knowledge base; the bundled seed is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<PathBuf>,
}

/// External language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Provider used for every oracle call (openrouter, ollama)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Timeout applied to each outbound call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature for intent classification
    #[serde(default = "default_classify_temperature")]
    pub classify_temperature: f64,

    /// Sampling temperature for spelling correction
    #[serde(default = "default_correction_temperature")]
    pub correction_temperature: f64,

    /// Sampling temperature for AI diagnosis
    #[serde(default = "default_diagnosis_temperature")]
    pub diagnosis_temperature: f64,

    /// OpenRouter provider settings
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// OpenRouter (OpenAI-compatible) provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Base URL for the chat completions API
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openrouter_model")]
    pub model: String,

    /// Environment variable checked for the API key before the OS keychain
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// HTTP adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Allow any origin
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.leafdoc")
}

fn default_provider() -> String {
    "openrouter".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_classify_temperature() -> f64 {
    0.1
}

fn default_correction_temperature() -> f64 {
    0.1
}

fn default_diagnosis_temperature() -> f64 {
    0.3
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_openrouter_model() -> String {
    "mistralai/mistral-7b-instruct".to_string()
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_secs: default_timeout_secs(),
            classify_temperature: default_classify_temperature(),
            correction_temperature: default_correction_temperature(),
            diagnosis_temperature: default_diagnosis_temperature(),
            openrouter: OpenRouterConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: default_openrouter_base_url(),
            model: default_openrouter_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_permissive: true,
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.leafdoc/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default_config();

        // Serialize before processing so the file keeps the portable ~ form
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.leafdoc/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".leafdoc").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
                data_dir: default_data_dir(),
                seed_path: None,
            },
            oracle: OracleConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Path of the SQLite knowledge base inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.core.data_dir.join("plant_diseases.db")
    }

    /// Validate and process configuration
    ///
    /// Rejects unknown log levels and providers, out-of-range temperatures and
    /// a zero timeout, then expands `~` and creates the data directory.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if !VALID_PROVIDERS.contains(&self.oracle.provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid oracle provider '{}'. Must be one of: {}",
                self.oracle.provider,
                VALID_PROVIDERS.join(", ")
            )));
        }

        if self.oracle.timeout_secs == 0 {
            return Err(EngineError::Config(
                "oracle.timeout_secs must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("classify_temperature", self.oracle.classify_temperature),
            ("correction_temperature", self.oracle.correction_temperature),
            ("diagnosis_temperature", self.oracle.diagnosis_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(EngineError::Config(format!(
                    "oracle.{} must be between 0.0 and 2.0",
                    name
                )));
            }
        }

        if self.oracle.openrouter.api_key_env.trim().is_empty() {
            return Err(EngineError::Config(
                "oracle.openrouter.api_key_env cannot be empty".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        if let Some(seed_path) = &self.core.seed_path {
            self.core.seed_path = Some(expand_path(seed_path)?);
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.oracle.provider, "openrouter");
        assert_eq!(config.oracle.classify_temperature, 0.1);
        assert_eq!(config.oracle.diagnosis_temperature, 0.3);
        assert_eq!(config.oracle.openrouter.api_key_env, "OPENROUTER_API_KEY");
        assert!(config.server.cors_permissive);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_timeout_duration() {
        let mut config = Config::default_config();
        config.oracle.timeout_secs = 7;
        assert_eq!(config.oracle.timeout(), Duration::from_secs(7));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_config();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.oracle.provider, deserialized.oracle.provider);
        assert_eq!(config.server.bind_addr, deserialized.server.bind_addr);
    }
}
