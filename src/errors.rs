// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpellError {
    /// The OS could not start the program (not found, permission denied,
    /// bad working directory, resource exhaustion before `exec`).
    ///
    /// `source` is the OS error reported by the spawn call, or read back
    /// from the child over the error channel on Unix.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command line contains no program")]
    EmptyCommand,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl SpellError {
    /// Raw OS error code behind a spawn or I/O failure, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            SpellError::Spawn { source, .. } => source.raw_os_error(),
            SpellError::IoError(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SpellError>;
