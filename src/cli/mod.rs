// CLI module
// Argument parsing and command dispatch

mod commands;
mod report;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::Overrides;
use crate::receiver::DynamicModel;

pub use commands::run;

/// Read or set the dynamic platform model of u-blox 8 / u-blox M8 receivers
#[derive(Parser, Debug)]
#[command(name = "gpsmodel", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.gpsmodel/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Serial device the receiver is attached to
    #[arg(short, long, global = true)]
    pub device: Option<String>,

    /// Serial baud rate
    #[arg(short, long, global = true)]
    pub baud: Option<u32>,

    /// Milliseconds to wait for each response
    #[arg(long, global = true, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Extra attempts when the receiver does not answer
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    #[command(flatten)]
    Receiver(ReceiverCommand),

    /// List the dynamic platform models
    List,
}

impl Default for Command {
    fn default() -> Self {
        Command::Receiver(ReceiverCommand::default())
    }
}

/// Commands that talk to the receiver
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ReceiverCommand {
    /// Show the current dynamic platform model (default)
    Get {
        /// Show every navigation engine setting (CFG-NAV5)
        #[arg(long)]
        all: bool,
    },

    /// Change the dynamic platform model
    Set {
        /// Model name, alias or code (falls back to `model` in the config file)
        #[arg(value_parser = parse_model)]
        model: Option<DynamicModel>,

        /// Save the navigation configuration to non-volatile storage afterwards
        #[arg(long)]
        save: bool,

        /// Send the change even if the receiver already uses this model
        #[arg(long)]
        force: bool,

        /// Skip reading the model back after the change
        #[arg(long)]
        no_verify: bool,
    },

    /// Save the current receiver configuration to non-volatile storage
    Save,

    /// Show receiver software, hardware and protocol version
    Info,
}

impl Default for ReceiverCommand {
    fn default() -> Self {
        ReceiverCommand::Get { all: false }
    }
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            device: self.device.clone(),
            baud: self.baud,
            timeout_ms: self.timeout,
            retries: self.retries,
        }
    }
}

fn parse_model(s: &str) -> Result<DynamicModel, String> {
    s.parse()
}
