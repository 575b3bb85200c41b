// Configuration structs

use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_BAUD, DEFAULT_DEVICE, DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS};
use crate::receiver::{DynamicModel, ReceiverOptions};

/// Resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Serial device path (e.g. "/dev/ttyACM0", "COM3")
    pub device: String,

    /// Serial baud rate
    pub baud: u32,

    /// Per-attempt response timeout in milliseconds
    pub timeout_ms: u64,

    /// Extra attempts after an unanswered request
    pub retries: u32,

    /// Model used by `set` when none is given on the command line
    pub model: Option<DynamicModel>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            baud: DEFAULT_BAUD,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retries: DEFAULT_RETRIES,
            model: None,
        }
    }
}

impl Settings {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.device.trim().is_empty() {
            bail!("device must not be empty");
        }

        if self.baud == 0 {
            bail!("baud must be greater than 0");
        }

        if self.timeout_ms == 0 {
            bail!("timeout_ms must be greater than 0");
        }

        if self.timeout_ms > 60_000 {
            bail!(
                "timeout_ms ({}) is very high\n\
                 Receivers answer within a few hundred milliseconds; 1000-5000 is plenty",
                self.timeout_ms
            );
        }

        Ok(())
    }

    pub fn receiver_options(&self) -> ReceiverOptions {
        ReceiverOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            retries: self.retries,
        }
    }

    /// Overlay values present in the config file
    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(device) = file.device {
            self.device = device;
        }
        if let Some(baud) = file.baud {
            self.baud = baud;
        }
        if let Some(timeout_ms) = file.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(retries) = file.retries {
            self.retries = retries;
        }
        if let Some(model) = file.model {
            self.model = Some(model);
        }
    }
}

/// On-disk format of ~/.gpsmodel/config.toml
///
/// ```toml
/// device = "/dev/serial0"
/// baud = 9600
/// timeout_ms = 1000
/// retries = 2
/// model = "automotive"
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baud: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<DynamicModel>,
}
