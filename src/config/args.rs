//! Command-line argument parsing
//!
//! `-c/--config` selects the configuration file for every mode; the
//! subcommand selects the mode. No subcommand means server mode.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::DEFAULT_CONFIG_PATH;

#[derive(Debug, Parser)]
#[command(name = "geocountry", version, about)]
pub struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Resolve one or more IPs through the configured providers
    Lookup {
        #[arg(required = true)]
        ips: Vec<String>,
    },
    /// Print a sample configuration file
    Config {
        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Args {
    /// 未指定子命令时以服务器模式运行
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
