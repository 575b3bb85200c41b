// Configuration loader
//
// Layers, lowest to highest: defaults, ~/.gpsmodel/config.toml (or --config),
// GPSMODEL_* environment variables, command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use super::constants::{
    CONFIG_DIR, CONFIG_FILE, ENV_BAUD, ENV_DEVICE, ENV_MODEL, ENV_RETRIES, ENV_TIMEOUT_MS,
};
use super::settings::{FileConfig, Settings};

/// Values given on the command line; `None` means "not given"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub device: Option<String>,
    pub baud: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
}

/// Load settings from config file, environment and CLI overrides
///
/// An explicit `config_path` must exist; the default location is optional.
pub fn load_settings(config_path: Option<&Path>, overrides: &Overrides) -> Result<Settings> {
    let file = match config_path {
        Some(path) => Some(read_config_file(path)?),
        None => match default_config_path() {
            Some(path) if path.exists() => Some(read_config_file(&path)?),
            _ => None,
        },
    };

    resolve(file, |key| std::env::var(key).ok(), overrides)
}

/// ~/.gpsmodel/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn read_config_file(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

    let file: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

    debug!(path = %path.display(), "Loaded configuration file");
    Ok(file)
}

/// Merge layers into validated settings
///
/// `env` looks up an environment variable; empty values count as unset.
pub fn resolve<E>(file: Option<FileConfig>, env: E, overrides: &Overrides) -> Result<Settings>
where
    E: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();

    if let Some(file) = file {
        settings.apply_file(file);
    }

    let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    if let Some(device) = lookup(ENV_DEVICE) {
        settings.device = device;
    }
    if let Some(baud) = lookup(ENV_BAUD) {
        settings.baud = parse_env(ENV_BAUD, &baud)?;
    }
    if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
        settings.timeout_ms = parse_env(ENV_TIMEOUT_MS, &timeout)?;
    }
    if let Some(retries) = lookup(ENV_RETRIES) {
        settings.retries = parse_env(ENV_RETRIES, &retries)?;
    }
    if let Some(model) = lookup(ENV_MODEL) {
        settings.model = Some(parse_env(ENV_MODEL, &model)?);
    }

    if let Some(device) = &overrides.device {
        settings.device = device.clone();
    }
    if let Some(baud) = overrides.baud {
        settings.baud = baud;
    }
    if let Some(timeout_ms) = overrides.timeout_ms {
        settings.timeout_ms = timeout_ms;
    }
    if let Some(retries) = overrides.retries {
        settings.retries = retries;
    }

    settings
        .validate()
        .context("Configuration validation failed")?;

    Ok(settings)
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid value for {}: '{}' ({})", key, value, e))
}
