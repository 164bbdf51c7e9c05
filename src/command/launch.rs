// src/command/launch.rs

//! Launch sequence.
//!
//! All three entry points share one launch routine; they only differ in what
//! `Stdio::Default` becomes and in what happens after the child started.
//!
//! For every stream a pair of pipe ends is created according to its
//! resolved mode. The child's ends go into the spawn request, the parent's
//! ends of `Piped` streams end up in the returned [`Child`]. Everything else
//! is dropped (and therefore closed) when this function returns, whether the
//! spawn worked or not.

use tracing::{debug, info};

use super::Spell;
use crate::child::Child;
use crate::env::is_valid_key;
use crate::errors::{Result, SpellError};
use crate::pipe::Pipe;
use crate::sys::{Platform, SpawnRequest, Sys};
use crate::types::{ExitStatus, Output, StdStream, Stdio};

/// Parent and child ends for one stream.
struct StreamEnds {
    parent: Pipe,
    child: Pipe,
}

impl StreamEnds {
    fn open(stream: StdStream, mode: Stdio) -> std::io::Result<Self> {
        let (parent, child) = match mode {
            Stdio::Piped => {
                let (read, write) = Pipe::create()?;
                if stream.is_input() {
                    (write, read)
                } else {
                    (read, write)
                }
            }
            Stdio::Null => Pipe::create_null()?,
            Stdio::Inherit | Stdio::Default => Pipe::create_inherit(stream)?,
        };
        // Only piped streams leave a handle with the caller.
        let parent = if mode == Stdio::Piped {
            parent
        } else {
            Pipe::invalid()
        };
        Ok(Self { parent, child })
    }
}

impl Spell {
    /// Start the program and hand back a live [`Child`].
    ///
    /// Streams left at `Stdio::Default` are inherited.
    pub fn cast(&self) -> Result<Child> {
        self.launch(Stdio::Inherit)
    }

    /// Start the program, wait for it and return only its exit status.
    ///
    /// Streams left at `Stdio::Default` are inherited.
    pub fn cast_status(&self) -> Result<ExitStatus> {
        self.launch(Stdio::Inherit)?.wait()
    }

    /// Start the program, wait for it and collect its stdout and stderr.
    ///
    /// Streams left at `Stdio::Default` are piped. Everything the child
    /// writes is held in memory; see [`Child::wait_with_output`].
    pub fn cast_output(&self) -> Result<Output> {
        self.launch(Stdio::Piped)?.wait_with_output()
    }

    fn launch(&self, fallback: Stdio) -> Result<Child> {
        let stdin_mode = self.stdin.resolve(fallback);
        let stdout_mode = self.stdout.resolve(fallback);
        let stderr_mode = self.stderr.resolve(fallback);

        debug!(
            program = %self.program,
            args = ?self.args,
            cwd = ?self.working_dir,
            inherit_env = self.env.is_none(),
            stdin = ?stdin_mode,
            stdout = ?stdout_mode,
            stderr = ?stderr_mode,
            "casting process"
        );

        let spawn_error = |source: std::io::Error| SpellError::Spawn {
            program: self.program.clone(),
            source,
        };

        if let Some(var) = self.env.iter().flatten().find(|var| !is_valid_key(var.key())) {
            return Err(spawn_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid environment variable name {:?}", var.key()),
            )));
        }

        let stdin = StreamEnds::open(StdStream::Input, stdin_mode).map_err(spawn_error)?;
        let stdout = StreamEnds::open(StdStream::Output, stdout_mode).map_err(spawn_error)?;
        let stderr = StreamEnds::open(StdStream::Error, stderr_mode).map_err(spawn_error)?;

        let (Some(child_in), Some(child_out), Some(child_err)) =
            (stdin.child.owned(), stdout.child.owned(), stderr.child.owned())
        else {
            return Err(spawn_error(std::io::Error::other("missing child stdio handle")));
        };

        let request = SpawnRequest {
            program: &self.program,
            args: &self.args,
            env: self.env.as_ref(),
            current_dir: &self.working_dir,
            stdio: [child_in, child_out, child_err],
        };

        let process = match Sys::spawn(&request) {
            Ok(process) => process,
            Err(source) => {
                debug!(program = %self.program, error = %source, "failed to start process");
                return Err(spawn_error(source));
            }
        };

        let child = Child::new(process, stdin.parent, stdout.parent, stderr.parent);
        info!(program = %self.program, pid = child.id(), "process started");
        // The child ends (`*.child`) drop here, closing the parent's copies.
        Ok(child)
    }
}
