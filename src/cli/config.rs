//! Configuration CLI command handlers

use std::path::Path;

use crate::cli::commands::{ConfigCommand, ConfigKey};
use crate::core::config::{AiModel, Config};
use crate::error::{LoomError, Result};

/// Handle configuration commands against the file at `path`
pub fn handle_config(command: ConfigCommand, path: &Path) -> Result<()> {
    match command {
        ConfigCommand::Set { key, value } => handle_set(key, &value, path),
        ConfigCommand::Get { key } => handle_get(key, path),
        ConfigCommand::Remove { key } => handle_remove(key, path),
    }
}

fn parse_number(key: ConfigKey, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        LoomError::InvalidInput(format!(
            "'{}' needs a whole number (got '{}')",
            key_name(key),
            value
        ))
    })
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::ApiUrl => "api-url",
        ConfigKey::AiModel => "ai-model",
        ConfigKey::ValidationDebounceMs => "validation-debounce-ms",
        ConfigKey::RefreshIntervalSecs => "refresh-interval-secs",
        ConfigKey::RequestTimeoutSecs => "request-timeout-secs",
    }
}

/// Handle setting a configuration value
fn handle_set(key: ConfigKey, value: &str, path: &Path) -> Result<()> {
    let mut config = Config::load_from(path)?;
    match key {
        ConfigKey::ApiUrl => {
            config.set_api_url(value)?;
            println!("Server URL set to: {}", config.api_url);
        }
        ConfigKey::AiModel => {
            let model = AiModel::from_str(value).ok_or_else(|| {
                LoomError::InvalidInput(format!(
                    "Invalid model '{}'. Available models: {}",
                    value,
                    AiModel::all()
                        .iter()
                        .map(|m| m.api_name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;
            config.set_ai_model(model);
            println!("AI model set to: {}", model.display_name());
        }
        ConfigKey::ValidationDebounceMs => {
            config.validation_debounce_ms = parse_number(key, value)?;
            println!("Validation delay set to {} ms", config.validation_debounce_ms);
        }
        ConfigKey::RefreshIntervalSecs => {
            config.refresh_interval_secs = parse_number(key, value)?;
            println!("Refresh interval set to {} s", config.refresh_interval_secs);
        }
        ConfigKey::RequestTimeoutSecs => {
            config.request_timeout_secs = parse_number(key, value)?;
            println!("Request timeout set to {} s", config.request_timeout_secs);
        }
    }
    config.save_to(path)?;
    tracing::debug!("Saved {} to {}", key_name(key), path.display());
    Ok(())
}

/// Handle getting a configuration value
fn handle_get(key: ConfigKey, path: &Path) -> Result<()> {
    let config = Config::load_from(path)?;
    match key {
        ConfigKey::ApiUrl => {
            let effective = config.effective_api_url();
            if effective == config.api_url {
                println!("Server URL: {}", config.api_url);
            } else {
                println!(
                    "Server URL: {} (from LOOM_API_URL, configured: {})",
                    effective, config.api_url
                );
            }
        }
        ConfigKey::AiModel => println!(
            "AI model: {} ({})",
            config.ai_model.display_name(),
            config.ai_model.api_name()
        ),
        ConfigKey::ValidationDebounceMs => {
            println!("Validation delay: {} ms", config.validation_debounce_ms)
        }
        ConfigKey::RefreshIntervalSecs => {
            println!("Refresh interval: {} s", config.refresh_interval_secs)
        }
        ConfigKey::RequestTimeoutSecs => {
            println!("Request timeout: {} s", config.request_timeout_secs)
        }
    }
    Ok(())
}

/// Handle resetting a configuration value
fn handle_remove(key: ConfigKey, path: &Path) -> Result<()> {
    let mut config = Config::load_from(path)?;
    let defaults = Config::default();
    match key {
        ConfigKey::ApiUrl => config.api_url = defaults.api_url,
        ConfigKey::AiModel => config.ai_model = defaults.ai_model,
        ConfigKey::ValidationDebounceMs => {
            config.validation_debounce_ms = defaults.validation_debounce_ms
        }
        ConfigKey::RefreshIntervalSecs => {
            config.refresh_interval_secs = defaults.refresh_interval_secs
        }
        ConfigKey::RequestTimeoutSecs => config.request_timeout_secs = defaults.request_timeout_secs,
    }
    config.save_to(path)?;
    println!("'{}' reset to its default", key_name(key));
    Ok(())
}
