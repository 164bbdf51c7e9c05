// src/sys/unix.rs

//! fork/exec backend.
//!
//! Launch outline:
//!
//! 1. Build every `CString` and pointer array the child will need while
//!    still in the parent, so the child never allocates.
//! 2. Open a close-on-exec error pipe and `fork`.
//! 3. The child wires the three stdio ends onto fds 0-2, changes directory
//!    and execs. If any of that fails it writes its `errno` (4 bytes) to the
//!    error pipe and `_exit`s.
//! 4. The parent reads the error pipe. A successful exec closes the write
//!    end (close-on-exec), so the read sees end-of-stream; four bytes mean
//!    the program never started.

use std::ffi::{CStr, CString, OsStr};
use std::io;
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::ptr;

use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};
use tracing::{debug, trace};

use super::{Platform, SpawnRequest};
use crate::types::StdStream;

pub(crate) struct Unix;

#[derive(Debug)]
pub(crate) struct UnixProcess {
    pid: Pid,
}

impl Platform for Unix {
    type Process = UnixProcess;

    fn pipe() -> io::Result<(OwnedFd, OwnedFd)> {
        cloexec_pipe()
    }

    fn std_stream(stream: StdStream) -> io::Result<OwnedFd> {
        match stream {
            StdStream::Input => io::stdin().as_fd().try_clone_to_owned(),
            StdStream::Output => io::stdout().as_fd().try_clone_to_owned(),
            StdStream::Error => io::stderr().as_fd().try_clone_to_owned(),
        }
    }

    fn read(handle: &OwnedFd, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            // SAFETY: `buf` is valid for `buf.len()` writable bytes.
            let ret = unsafe { libc::read(handle.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
            if ret >= 0 {
                return Ok(ret as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn available(handle: &OwnedFd) -> io::Result<Option<usize>> {
        let mut pending: libc::c_int = 0;
        // SAFETY: FIONREAD writes a single c_int through the pointer.
        match cvt(unsafe { libc::ioctl(handle.as_raw_fd(), libc::FIONREAD as _, &mut pending) }) {
            Ok(_) => Ok(Some(pending.max(0) as usize)),
            // Character devices and regular files have no queue to ask about.
            Err(e) if matches!(e.raw_os_error(), Some(libc::ENOTTY | libc::EINVAL)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(handle: &OwnedFd, buf: &[u8]) -> io::Result<usize> {
        loop {
            // SAFETY: `buf` is valid for `buf.len()` readable bytes.
            let ret = unsafe { libc::write(handle.as_raw_fd(), buf.as_ptr().cast(), buf.len()) };
            if ret >= 0 {
                return Ok(ret as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn spawn(request: &SpawnRequest<'_>) -> io::Result<UnixProcess> {
        let argv = CStringArray::new(
            std::iter::once(request.program).chain(request.args.iter().map(String::as_str)),
        )?;
        let envp = match request.env {
            Some(env) => Some(CStringArray::new(env.iter().map(|var| var.as_str()))?),
            None => None,
        };
        // `execvp` searches the parent's PATH; with an explicit environment
        // we call `execve`, so the search happens here against the child's
        // PATH (falling back to ours when the child has none).
        let program = match request.env {
            Some(env) => {
                let search = env
                    .get("PATH")
                    .map(str::to_owned)
                    .or_else(|| std::env::var("PATH").ok());
                resolve_program(request.program, search.as_deref())?
            }
            None => cstring(request.program.as_bytes())?,
        };
        let dir = cstring(request.current_dir.as_os_str().as_bytes())?;
        let stdio = request.stdio.map(|end| end.as_raw_fd());

        let (err_read, err_write) = cloexec_pipe()?;

        // SAFETY: the child branch only makes async-signal-safe calls before
        // it execs or `_exit`s.
        match unsafe { fork() }? {
            ForkResult::Child => {
                let code = unsafe { exec_child(&program, &argv, envp.as_ref(), &dir, stdio) };
                let bytes = code.to_ne_bytes();
                unsafe {
                    libc::write(err_write.as_raw_fd(), bytes.as_ptr().cast(), bytes.len());
                    libc::_exit(127);
                }
            }
            ForkResult::Parent { child } => {
                drop(err_write);
                trace!(pid = child.as_raw(), "forked child, checking exec result");
                match read_exec_error(&err_read) {
                    Ok(None) => Ok(UnixProcess { pid: child }),
                    Ok(Some(code)) => {
                        reap(child);
                        Err(io::Error::from_raw_os_error(code))
                    }
                    Err(err) => {
                        let _ = signal::kill(child, Signal::SIGKILL);
                        reap(child);
                        Err(err)
                    }
                }
            }
        }
    }

    fn process_id(process: &UnixProcess) -> u32 {
        process.pid.as_raw() as u32
    }

    fn try_wait(process: &mut UnixProcess) -> io::Result<Option<i32>> {
        loop {
            match waitpid(process.pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => return Ok(None),
                Ok(status) => return Ok(decode_status(status)),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn wait(process: &mut UnixProcess) -> io::Result<i32> {
        loop {
            match waitpid(process.pid, None) {
                Ok(status) => {
                    if let Some(code) = decode_status(status) {
                        return Ok(code);
                    }
                }
                Err(Errno::EINTR) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn kill(process: &mut UnixProcess) -> io::Result<bool> {
        match signal::kill(process.pid, Signal::SIGKILL) {
            Ok(()) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn ignore_child_exits() -> io::Result<()> {
        // SAFETY: installs SIG_IGN, no handler code runs.
        unsafe { signal::signal(Signal::SIGCHLD, SigHandler::SigIgn) }?;
        debug!("SIGCHLD ignored, children are reaped automatically");
        Ok(())
    }
}

/// Exit code for a terminated child; signals map to `128 + signo`.
fn decode_status(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
        _ => None,
    }
}

fn reap(pid: Pid) {
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            _ => break,
        }
    }
}

/// Runs in the forked child. Returns only on failure, with the errno.
unsafe fn exec_child(
    program: &CStr,
    argv: &CStringArray,
    envp: Option<&CStringArray>,
    dir: &CStr,
    stdio: [RawFd; 3],
) -> i32 {
    let mut stdio = stdio;
    unsafe {
        // An end sitting on another stream's target would be overwritten by
        // that stream's dup2, so lift it above 2 first.
        for (target, fd) in stdio.iter_mut().enumerate() {
            if (0..=2).contains(fd) && *fd != target as RawFd {
                let moved = libc::fcntl(*fd, libc::F_DUPFD_CLOEXEC, 3);
                if moved == -1 {
                    return Errno::last() as i32;
                }
                *fd = moved;
            }
        }
        for (target, fd) in stdio.into_iter().enumerate() {
            let target = target as RawFd;
            if fd == target {
                // dup2 onto itself would keep FD_CLOEXEC set.
                if libc::fcntl(fd, libc::F_SETFD, 0) == -1 {
                    return Errno::last() as i32;
                }
            } else if libc::dup2(fd, target) == -1 {
                return Errno::last() as i32;
            }
        }
        if libc::chdir(dir.as_ptr()) == -1 {
            return Errno::last() as i32;
        }
        // The Rust runtime ignores SIGPIPE and exec keeps ignored signals.
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        match envp {
            Some(envp) => libc::execve(program.as_ptr(), argv.as_ptr(), envp.as_ptr()),
            None => libc::execvp(program.as_ptr(), argv.as_ptr()),
        };
        Errno::last() as i32
    }
}

fn read_exec_error(pipe: &OwnedFd) -> io::Result<Option<i32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        let n = Unix::read(pipe, &mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok((filled == buf.len()).then(|| i32::from_ne_bytes(buf)))
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    Ok(nix::unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)?)
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let (read, write) = nix::unistd::pipe()?;
    for fd in [&read, &write] {
        // SAFETY: plain flag update on an fd we own.
        cvt(unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) })?;
    }
    Ok((read, write))
}

fn cvt(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

fn cstring(bytes: &[u8]) -> io::Result<CString> {
    CString::new(bytes).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("nul byte in {:?}", String::from_utf8_lossy(bytes)),
        )
    })
}

/// Resolve a bare program name against `search` the way `execvp` would.
///
/// Names containing `/` are used as-is. When nothing matches, the bare name
/// is returned and `execve` reports the failure from the child.
fn resolve_program(program: &str, search: Option<&str>) -> io::Result<CString> {
    if program.contains('/') {
        return cstring(program.as_bytes());
    }
    if let Some(search) = search {
        for dir in std::env::split_paths(OsStr::new(search)) {
            let dir = if dir.as_os_str().is_empty() { PathBuf::from(".") } else { dir };
            let candidate = dir.join(program);
            if is_executable(&candidate) {
                trace!(?candidate, "resolved program on PATH");
                return cstring(candidate.as_os_str().as_bytes());
            }
        }
    }
    cstring(program.as_bytes())
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// NUL-terminated array of C strings, as `execve` wants it.
struct CStringArray {
    _items: Vec<CString>,
    ptrs: Vec<*const libc::c_char>,
}

impl CStringArray {
    fn new<'a, I>(items: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let items = items
            .into_iter()
            .map(|s| cstring(s.as_bytes()))
            .collect::<io::Result<Vec<_>>>()?;
        let ptrs = items
            .iter()
            .map(|s| s.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();
        Ok(Self { _items: items, ptrs })
    }

    fn as_ptr(&self) -> *const *const libc::c_char {
        self.ptrs.as_ptr()
    }
}
