//! Environment configuration.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_COMMAND_TIMEOUT_SEC: u64 = 120;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100 * 1024;
pub const DEFAULT_READ_MAX_BYTES: usize = 1024 * 1024;
pub const DEFAULT_SNAPSHOT_CAP: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub command_timeout_sec: u64,
    pub max_output_bytes: usize,
    pub read_max_bytes: usize,
    pub snapshot_cap: usize,
    pub models_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command_timeout_sec: DEFAULT_COMMAND_TIMEOUT_SEC,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            read_max_bytes: DEFAULT_READ_MAX_BYTES,
            snapshot_cap: DEFAULT_SNAPSHOT_CAP,
            models_path: None,
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            command_timeout_sec: env_positive("LOO_COMMAND_TIMEOUT_SEC")?
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SEC),
            max_output_bytes: env_positive("LOO_MAX_OUTPUT_BYTES")?
                .map(|value| value as usize)
                .unwrap_or(DEFAULT_MAX_OUTPUT_BYTES),
            read_max_bytes: env_positive("LOO_READ_MAX_BYTES")?
                .map(|value| value as usize)
                .unwrap_or(DEFAULT_READ_MAX_BYTES),
            snapshot_cap: env_positive("LOO_SNAPSHOT_CAP")?
                .map(|value| value as usize)
                .unwrap_or(DEFAULT_SNAPSHOT_CAP),
            models_path: env_string_opt("LOO_MODELS_PATH").map(PathBuf::from),
        })
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_positive(key: &'static str) -> Result<Option<u64>, ConfigError> {
    let Some(value) = env_string_opt(key) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(Some(parsed)),
        _ => Err(ConfigError::InvalidNumber { key, value }),
    }
}
