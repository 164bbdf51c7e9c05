// src/child.rs

//! Handle to a spawned process.

use std::fmt;
use std::io::{self, Read};
use std::thread;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::pipe::Pipe;
use crate::sys::{Platform, Process, Sys};
use crate::types::{ExitStatus, Output};

/// A process started by one of the `cast` entry points.
///
/// The exit status is fetched from the OS once and cached, so `wait` and
/// `try_wait` can be called any number of times. Dropping a `Child` neither
/// waits for nor kills the process.
pub struct Child {
    process: Process,
    status: Option<ExitStatus>,
    stdin: Pipe,
    stdout: Pipe,
    stderr: Pipe,
}

impl Child {
    pub(crate) fn new(process: Process, stdin: Pipe, stdout: Pipe, stderr: Pipe) -> Self {
        Self {
            process,
            status: None,
            stdin,
            stdout,
            stderr,
        }
    }

    /// OS process id.
    pub fn id(&self) -> u32 {
        Sys::process_id(&self.process)
    }

    /// Exit status if the process has already finished, without blocking.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if let Some(status) = self.status {
            return Ok(Some(status));
        }
        let status = Sys::try_wait(&mut self.process)?.map(ExitStatus::new);
        if let Some(status) = status {
            debug!(pid = self.id(), code = status.code(), "process exited");
            self.status = Some(status);
        }
        Ok(status)
    }

    /// Block until the process exits.
    ///
    /// The first call closes our end of the child's stdin, so a child that
    /// reads until end of input cannot keep both sides waiting on each
    /// other.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.status {
            return Ok(status);
        }
        self.stdin.close();
        let status = ExitStatus::new(Sys::wait(&mut self.process)?);
        debug!(pid = self.id(), code = status.code(), "process exited");
        self.status = Some(status);
        Ok(status)
    }

    /// Close stdin, read stdout and stderr until the child closes them, then
    /// [`wait`](Self::wait).
    ///
    /// Both pipes are drained while the child is still running (stderr on a
    /// helper thread), so output larger than the pipe buffer cannot stall
    /// the child. A grandchild that inherited either pipe keeps this call
    /// blocked until it exits too. Streams that were not piped come back
    /// empty.
    pub fn wait_with_output(&mut self) -> Result<Output> {
        self.stdin.close();
        let (stdout, stderr) = drain_both(&mut self.stdout, &mut self.stderr)?;
        let mut output = Output::new(self.wait()?);
        output.stdout = stdout;
        output.stderr = stderr;
        Ok(output)
    }

    /// Ask the OS to terminate the process immediately.
    ///
    /// Returns `false` if the process was already reaped or is gone. Does
    /// not wait for it to die; call [`wait`](Self::wait) for that.
    pub fn kill(&mut self) -> bool {
        if self.status.is_some() {
            return false;
        }
        match Sys::kill(&mut self.process) {
            Ok(sent) => sent,
            Err(e) => {
                warn!(pid = self.id(), error = %e, "failed to kill process");
                false
            }
        }
    }

    /// Our end of the child's stdin. Invalid unless stdin was piped.
    pub fn stdin(&mut self) -> &mut Pipe {
        &mut self.stdin
    }

    /// Our end of the child's stdout. Invalid unless stdout was piped.
    pub fn stdout(&mut self) -> &mut Pipe {
        &mut self.stdout
    }

    /// Our end of the child's stderr. Invalid unless stderr was piped.
    pub fn stderr(&mut self) -> &mut Pipe {
        &mut self.stderr
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Child")
            .field("id", &self.id())
            .field("status", &self.status)
            .field("stdin", &self.stdin)
            .field("stdout", &self.stdout)
            .field("stderr", &self.stderr)
            .finish()
    }
}

fn drain(pipe: &mut Pipe) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if pipe.is_valid() {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn drain_both(stdout: &mut Pipe, stderr: &mut Pipe) -> io::Result<(Vec<u8>, Vec<u8>)> {
    if !stderr.is_valid() {
        return Ok((drain(stdout)?, Vec::new()));
    }
    thread::scope(|scope| {
        let err = scope.spawn(move || drain(stderr));
        let out = drain(stdout);
        let err = err.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        Ok((out?, err?))
    })
}

/// Let the OS reap finished children on its own, for fire-and-forget
/// launches.
///
/// On Unix this ignores `SIGCHLD` for the whole process. After that, exit
/// statuses are no longer collectable: `wait` on any child fails with
/// `ECHILD`. No-op on Windows.
pub fn ignore_child_exits() -> Result<()> {
    Sys::ignore_child_exits()?;
    Ok(())
}
