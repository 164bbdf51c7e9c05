// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::Stdio;

/// Command-line arguments for `spell`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "spell",
    version,
    about = "Launch a program with controlled arguments, environment and stdio.",
    long_about = None
)]
pub struct CliArgs {
    /// Command line to run, e.g. `spell "cargo build --release"`.
    ///
    /// Split with shell-like quoting (spaces, '...', "...", backslash).
    #[arg(value_name = "COMMAND_LINE", required_unless_present = "profile")]
    pub command: Option<String>,

    /// Load a TOML launch profile instead of a command line.
    #[arg(long, value_name = "PATH", conflicts_with = "command")]
    pub profile: Option<String>,

    /// Working directory for the program.
    #[arg(short = 'C', long = "dir", value_name = "DIR")]
    pub dir: Option<String>,

    /// Set an environment variable (repeatable).
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Start from an empty environment.
    #[arg(long)]
    pub env_clear: bool,

    #[arg(long, value_enum, value_name = "MODE")]
    pub stdin: Option<StdioArg>,

    #[arg(long, value_enum, value_name = "MODE")]
    pub stdout: Option<StdioArg>,

    #[arg(long, value_enum, value_name = "MODE")]
    pub stderr: Option<StdioArg>,

    /// Collect stdout/stderr and print them after the program exits.
    #[arg(long)]
    pub capture: bool,

    /// Print the resolved launch description, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SPELL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Stream mode as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum StdioArg {
    Default,
    Inherit,
    Piped,
    Null,
}

impl From<StdioArg> for Stdio {
    fn from(arg: StdioArg) -> Self {
        match arg {
            StdioArg::Default => Stdio::Default,
            StdioArg::Inherit => Stdio::Inherit,
            StdioArg::Piped => Stdio::Piped,
            StdioArg::Null => Stdio::Null,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, _)) if key.is_empty() => Err(format!("missing variable name in {s:?}")),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected KEY=VALUE, got {s:?}")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
