// src/sys/mod.rs

//! Platform services.
//!
//! Everything that touches the OS goes through the [`Platform`] trait, which
//! has exactly one implementation per target family:
//!
//! - [`unix`]: `pipe`/`fork`/`exec`/`waitpid`, with an error pipe that lets
//!   the forked child report a failed `exec` back to the parent.
//! - [`windows`]: anonymous pipes and `CreateProcessW`.
//!
//! The public types (`Pipe`, `Child`, `Spell`) only ever talk to [`Sys`], so
//! the contract is written once and only the internals differ.
//!
//! This module also owns the process-wide null device. It is opened on first
//! use under a mutex, handed out as per-request duplicates, and closed by an
//! `atexit` hook.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::debug;

use crate::env::Env;
use crate::types::StdStream;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub(crate) use unix::Unix as Sys;
#[cfg(windows)]
pub(crate) use windows::Windows as Sys;

#[cfg(unix)]
pub(crate) type OwnedHandle = std::os::fd::OwnedFd;
#[cfg(windows)]
pub(crate) type OwnedHandle = std::os::windows::io::OwnedHandle;

#[cfg(unix)]
pub type RawHandle = std::os::fd::RawFd;
#[cfg(windows)]
pub type RawHandle = std::os::windows::io::RawHandle;

pub(crate) type Process = <Sys as Platform>::Process;

/// Everything the platform needs to start one child.
pub(crate) struct SpawnRequest<'a> {
    pub program: &'a str,
    pub args: &'a [String],
    /// `None` means the child inherits the parent's live environment.
    pub env: Option<&'a Env>,
    pub current_dir: &'a Path,
    /// Child-side ends for stdin, stdout and stderr, in that order.
    pub stdio: [&'a OwnedHandle; 3],
}

/// The OS operations the launcher is built on.
///
/// Handles returned by `pipe` and `std_stream` are never inheritable; the
/// spawn call is the only place a handle is allowed to cross into a child,
/// and only the three `stdio` ends of the request do.
pub(crate) trait Platform {
    type Process;

    /// Connected `(read, write)` pair.
    fn pipe() -> io::Result<(OwnedHandle, OwnedHandle)>;

    /// Fresh duplicate of one of the parent's own standard streams.
    fn std_stream(stream: StdStream) -> io::Result<OwnedHandle>;

    fn read(handle: &OwnedHandle, buf: &mut [u8]) -> io::Result<usize>;

    /// Bytes currently buffered in the OS, or `None` when the platform has
    /// no way to ask.
    fn available(handle: &OwnedHandle) -> io::Result<Option<usize>>;

    fn write(handle: &OwnedHandle, buf: &[u8]) -> io::Result<usize>;

    /// Start the child. An `Err` here means the program never ran.
    fn spawn(request: &SpawnRequest<'_>) -> io::Result<Self::Process>;

    fn process_id(process: &Self::Process) -> u32;

    fn try_wait(process: &mut Self::Process) -> io::Result<Option<i32>>;

    fn wait(process: &mut Self::Process) -> io::Result<i32>;

    /// `Ok(false)` when the process is already gone.
    fn kill(process: &mut Self::Process) -> io::Result<bool>;

    fn ignore_child_exits() -> io::Result<()>;
}

/// Non-inheritable duplicate of `handle`.
pub(crate) fn duplicate(handle: &OwnedHandle) -> io::Result<OwnedHandle> {
    handle.try_clone()
}

#[cfg(unix)]
const NULL_DEVICE_PATH: &str = "/dev/null";
#[cfg(windows)]
const NULL_DEVICE_PATH: &str = "NUL";

static NULL_DEVICE: Mutex<Option<OwnedHandle>> = Mutex::new(None);

/// Duplicate of the shared null-device handle, opening it on first use.
pub(crate) fn null_device() -> io::Result<OwnedHandle> {
    let mut device = NULL_DEVICE.lock().unwrap_or_else(|e| e.into_inner());
    if device.is_none() {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(NULL_DEVICE_PATH)?;
        *device = Some(OwnedHandle::from(file));
        // SAFETY: `close_null_device` is a plain `extern "C" fn` with no
        // preconditions.
        if unsafe { libc::atexit(close_null_device) } != 0 {
            debug!("could not register null device cleanup hook");
        }
        debug!(path = NULL_DEVICE_PATH, "opened shared null device");
    }
    match device.as_ref() {
        Some(handle) => duplicate(handle),
        None => Err(io::Error::other("null device unavailable")),
    }
}

extern "C" fn close_null_device() {
    if let Ok(mut device) = NULL_DEVICE.lock() {
        device.take();
    }
}
