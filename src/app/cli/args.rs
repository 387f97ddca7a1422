//! Command line arguments
//!
//! Global options come first and override the configuration file; each
//! subcommand carries its own options.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "packet-dispatch")]
#[command(about = "Priority packet queue with per-module dispatch over TCP")]
#[command(version = crate::app::cli::version_string())]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Color output control: --color true|false, unspecified = auto (TTY)
    #[arg(short = 'g', long = "color", global = true)]
    pub color: Option<bool>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", global = true,
          value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to log to stderr)
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", global = true,
          value_parser = crate::core::logging::LOG_FORMATS)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a server that dispatches received packets to the configured modules
    Serve(ServeArgs),
    /// Connect to a server and send one packet
    Send(SendArgs),
}

#[derive(ClapArgs, Debug, Clone, Default, PartialEq)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Port to bind (0 picks a free port)
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Packets taken from one module before the next module gets a turn
    #[arg(short = 'b', long = "burst", value_name = "COUNT")]
    pub burst_per_pass: Option<usize>,
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct SendArgs {
    /// Server host
    #[arg(long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: String,

    /// Target module identifier
    #[arg(short = 'm', long = "module", value_name = "MODULE")]
    pub module: String,

    /// Serialized payload
    #[arg(short = 'd', long = "data", value_name = "DATA")]
    pub data: String,
}

impl Args {
    /// Log file from the command line, with the magic values `none` and `-` cleared
    pub fn log_file_override(&self) -> Option<Option<PathBuf>> {
        self.log_file.as_ref().map(|path| {
            let text = path.to_string_lossy();
            if text.eq_ignore_ascii_case("none") || text == "-" {
                None
            } else {
                Some(path.clone())
            }
        })
    }
}
