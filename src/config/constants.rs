// Project-wide constants
//
// Centralised here so defaults and environment variable names have one
// source of truth. Import via `use crate::config::constants::*;`.

/// Default serial device (u-blox USB CDC ACM on Linux)
#[cfg(not(windows))]
pub const DEFAULT_DEVICE: &str = "/dev/ttyACM0";

/// Default serial device
#[cfg(windows)]
pub const DEFAULT_DEVICE: &str = "COM1";

/// Factory UART1 baud rate of u-blox 8 / M8 receivers
pub const DEFAULT_BAUD: u32 = 9600;

/// Time to wait for each answer from the receiver.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Extra attempts after an unanswered request.
pub const DEFAULT_RETRIES: u32 = 2;

/// Config directory under the user's home.
pub const CONFIG_DIR: &str = ".gpsmodel";

/// Config file name inside `CONFIG_DIR`.
pub const CONFIG_FILE: &str = "config.toml";

pub const ENV_DEVICE: &str = "GPSMODEL_DEVICE";
pub const ENV_BAUD: &str = "GPSMODEL_BAUD";
pub const ENV_TIMEOUT_MS: &str = "GPSMODEL_TIMEOUT_MS";
pub const ENV_RETRIES: &str = "GPSMODEL_RETRIES";
pub const ENV_MODEL: &str = "GPSMODEL_MODEL";
