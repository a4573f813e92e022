use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::{BackoffMode, ClassificationLists, RetryPolicy};

/// Retry defaults (optional `[retry]` section in config.toml).
/// Missing keys fall back to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub mode: BackoffMode,
    /// Fixed wait, linear increment or exponential base, in seconds.
    pub multiplier: u32,
    /// Retries allowed after the first attempt.
    pub max_retry: u32,
    /// Error keys that end the loop with the error.
    pub stop_on: Vec<String>,
    /// Error keys that end the loop quietly, with a warning.
    pub continue_on: Vec<String>,
    /// Report loop decisions as warnings instead of verbose lines.
    pub warning: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            mode: policy.mode,
            multiplier: policy.multiplier,
            max_retry: policy.max_retry,
            stop_on: Vec::new(),
            continue_on: Vec::new(),
            warning: policy.warning,
        }
    }
}

impl RetryConfig {
    /// Build an (unvalidated) policy from these defaults.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            mode: self.mode,
            multiplier: self.multiplier,
            max_retry: self.max_retry,
            lists: ClassificationLists::new(
                self.stop_on.iter().cloned(),
                self.continue_on.iter().cloned(),
            ),
            message: None,
            warning: self.warning,
        }
    }
}

/// Global configuration loaded from `~/.config/again/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgainConfig {
    /// Optional retry defaults; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl AgainConfig {
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("again")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Read configuration from an explicit path. The file must exist.
pub fn load_from(path: &Path) -> Result<AgainConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: AgainConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from `path`, creating a default file there if none exists.
pub fn load_or_init_at(path: &Path) -> Result<AgainConfig> {
    if !path.exists() {
        let default_cfg = AgainConfig {
            retry: Some(RetryConfig::default()),
        };
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write config {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(path)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AgainConfig> {
    load_or_init_at(&config_path()?)
}
