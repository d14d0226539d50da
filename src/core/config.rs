//! Application configuration management
//!
//! Handles loading and saving client settings including:
//! - Backend server URL
//! - AI model selection
//! - Validation and refresh timings

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{LoomError, Result};

/// Environment variable overriding the configured server URL
pub const API_URL_ENV: &str = "LOOM_API_URL";

/// AI models offered by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AiModel {
    /// Gemini 2.5 Flash Lite (default)
    #[default]
    #[serde(rename = "gemini-2.5-flash-lite")]
    FlashLite,
    /// Gemini 2.5 Flash
    #[serde(rename = "gemini-2.5-flash")]
    Flash,
    /// Gemini 2.5 Pro
    #[serde(rename = "gemini-2.5-pro")]
    Pro,
}

impl AiModel {
    /// Get the API model identifier
    pub fn api_name(&self) -> &'static str {
        match self {
            AiModel::FlashLite => "gemini-2.5-flash-lite",
            AiModel::Flash => "gemini-2.5-flash",
            AiModel::Pro => "gemini-2.5-pro",
        }
    }

    /// Get a human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            AiModel::FlashLite => "Gemini 2.5 Flash Lite",
            AiModel::Flash => "Gemini 2.5 Flash",
            AiModel::Pro => "Gemini 2.5 Pro",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gemini-2.5-flash-lite" => Some(AiModel::FlashLite),
            "gemini-2.5-flash" => Some(AiModel::Flash),
            "gemini-2.5-pro" => Some(AiModel::Pro),
            _ => None,
        }
    }

    /// Get all available models
    pub fn all() -> &'static [AiModel] {
        &[AiModel::FlashLite, AiModel::Flash, AiModel::Pro]
    }

    /// The next model in the list, wrapping around
    pub fn next(&self) -> AiModel {
        let all = Self::all();
        let idx = all.iter().position(|m| m == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

impl std::fmt::Display for AiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the storyloom server
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model used for AI generation requests
    #[serde(default)]
    pub ai_model: AiModel,

    /// Quiet period before a field is validated while typing
    #[serde(default = "default_debounce_ms")]
    pub validation_debounce_ms: u64,

    /// How often the open project is re-read from the server
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Per-request timeout (AI endpoints can be slow)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ai_model: AiModel::default(),
            validation_debounce_ms: default_debounce_ms(),
            refresh_interval_secs: default_refresh_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from the default file, or defaults if it does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the configuration directory
    pub fn config_dir() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "storyloom", "storyloom")
            .ok_or_else(|| LoomError::Config("Could not determine config directory".into()))?;

        Ok(project_dirs.config_dir().to_path_buf())
    }

    /// Server URL after applying the environment override
    pub fn effective_api_url(&self) -> String {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => self.api_url.clone(),
        }
    }

    /// Resolve the server URL for this run: `--api-url`, then `LOOM_API_URL`, then the file
    pub fn apply_overrides(&mut self, cli_url: Option<&str>) -> Result<()> {
        let url = match cli_url {
            Some(url) => url.to_string(),
            None => self.effective_api_url(),
        };
        self.set_api_url(&url)
    }

    /// Set the server URL, rejecting anything that does not parse as http(s)
    pub fn set_api_url(&mut self, value: &str) -> Result<()> {
        let parsed = url::Url::parse(value.trim())?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LoomError::InvalidInput(format!(
                "Server URL must start with http:// or https:// (got '{}')",
                value
            )));
        }
        self.api_url = value.trim().trim_end_matches('/').to_string();
        Ok(())
    }

    /// Set the AI model
    pub fn set_ai_model(&mut self, model: AiModel) {
        self.ai_model = model;
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.validation_debounce_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
