// src/types.rs

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How one standard stream of a child is wired up.
///
/// - `Default`: decided at launch time. `cast`/`cast_status` treat it as
///   `Inherit`, `cast_output` treats it as `Piped`.
/// - `Inherit`: the child shares the parent's own stream.
/// - `Piped`: the child's stream is connected to a pipe the caller owns
///   through the returned [`Child`](crate::Child).
/// - `Null`: the stream is redirected to the platform's null device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stdio {
    Default,
    Inherit,
    Piped,
    Null,
}

impl Default for Stdio {
    fn default() -> Self {
        Stdio::Default
    }
}

impl Stdio {
    /// Replace `Default` with the launch mode's fallback.
    pub fn resolve(self, fallback: Stdio) -> Stdio {
        match self {
            Stdio::Default => fallback,
            other => other,
        }
    }
}

/// One of the parent's own standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Input,
    Output,
    Error,
}

impl StdStream {
    /// True for stdin, where the child reads and the parent writes.
    pub fn is_input(self) -> bool {
        matches!(self, StdStream::Input)
    }
}

/// Terminal result code of a finished process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitStatus {
    code: i32,
}

impl ExitStatus {
    pub fn new(code: i32) -> Self {
        Self { code }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExitStatus({})", self.code)
    }
}

/// Exit status plus everything the child left in its stdout and stderr
/// pipes, collected after it exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Output {
    pub fn new(status: ExitStatus) -> Self {
        Self {
            status,
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }

    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}
