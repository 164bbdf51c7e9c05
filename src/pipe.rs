// src/pipe.rs

//! Owned OS pipe endpoints.
//!
//! A [`Pipe`] owns at most one OS handle and closes it when dropped. It is
//! move-only: there is no `Clone`, and pairs that refer to the same device
//! (null device, inherited standard streams) are made of two independent
//! duplicates, so no handle ever has two owners.

use std::io;

use crate::sys::{self, OwnedHandle, Platform, Sys};
use crate::types::StdStream;

pub use crate::sys::RawHandle;

/// Chunk size for platforms that cannot report how many bytes are pending.
const READ_CHUNK: usize = 4096;

#[derive(Debug, Default)]
pub struct Pipe {
    handle: Option<OwnedHandle>,
}

impl Pipe {
    /// A pipe that owns nothing. Reads and writes on it fail.
    pub fn invalid() -> Self {
        Self { handle: None }
    }

    fn from_owned(handle: OwnedHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Connected `(reader, writer)` pair.
    ///
    /// Neither end is inheritable. The launcher makes the child's end
    /// visible to the child during the spawn itself.
    pub fn create() -> io::Result<(Pipe, Pipe)> {
        let (read, write) = Sys::pipe()?;
        Ok((Pipe::from_owned(read), Pipe::from_owned(write)))
    }

    /// Two duplicates of the parent's own `stream`.
    pub fn create_inherit(stream: StdStream) -> io::Result<(Pipe, Pipe)> {
        let first = Sys::std_stream(stream)?;
        let second = sys::duplicate(&first)?;
        Ok((Pipe::from_owned(first), Pipe::from_owned(second)))
    }

    /// Two duplicates of the process-wide null device.
    pub fn create_null() -> io::Result<(Pipe, Pipe)> {
        let first = sys::null_device()?;
        let second = sys::duplicate(&first)?;
        Ok((Pipe::from_owned(first), Pipe::from_owned(second)))
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    pub fn as_raw(&self) -> Option<RawHandle> {
        self.handle.as_ref().map(raw_of)
    }

    pub(crate) fn owned(&self) -> Option<&OwnedHandle> {
        self.handle.as_ref()
    }

    /// One OS read. `Ok(0)` means end of stream.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Sys::read(self.live()?, buf)
    }

    /// Replace `out` with whatever the OS has buffered right now.
    ///
    /// An empty result is not an error. Where the pending byte count cannot
    /// be queried, reads fixed-size chunks until end of stream instead.
    pub fn read_all(&mut self, out: &mut Vec<u8>) -> io::Result<()> {
        out.clear();
        let Some(handle) = self.handle.as_ref() else {
            return Ok(());
        };
        match Sys::available(handle)? {
            Some(pending) => {
                out.resize(pending, 0);
                let mut filled = 0;
                while filled < pending {
                    let n = Sys::read(handle, &mut out[filled..])?;
                    if n == 0 {
                        break;
                    }
                    filled += n;
                }
                out.truncate(filled);
            }
            None => {
                let mut chunk = [0u8; READ_CHUNK];
                loop {
                    let n = Sys::read(handle, &mut chunk)?;
                    if n == 0 {
                        break;
                    }
                    out.extend_from_slice(&chunk[..n]);
                }
            }
        }
        Ok(())
    }

    /// One OS write.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Sys::write(self.live()?, buf)
    }

    /// Write until `buf` is exhausted or a write fails.
    pub fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf)? {
                0 => return Err(io::ErrorKind::WriteZero.into()),
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }

    /// Close the handle now. Calling it again is a no-op.
    pub fn close(&mut self) {
        self.handle = None;
    }

    /// Give up ownership of the raw handle; the caller must close it.
    ///
    /// Named so it cannot be shadowed by `io::Read::take` when that trait is
    /// in scope.
    pub fn take_raw(&mut self) -> Option<RawHandle> {
        self.handle.take().map(into_raw)
    }

    fn live(&self) -> io::Result<&OwnedHandle> {
        self.handle
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "pipe is closed"))
    }
}

impl io::Read for Pipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Pipe::read(self, buf)
    }
}

impl io::Write for Pipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Pipe::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(unix)]
fn raw_of(handle: &OwnedHandle) -> RawHandle {
    use std::os::fd::AsRawFd;
    handle.as_raw_fd()
}

#[cfg(unix)]
fn into_raw(handle: OwnedHandle) -> RawHandle {
    use std::os::fd::IntoRawFd;
    handle.into_raw_fd()
}

#[cfg(windows)]
fn raw_of(handle: &OwnedHandle) -> RawHandle {
    use std::os::windows::io::AsRawHandle;
    handle.as_raw_handle()
}

#[cfg(windows)]
fn into_raw(handle: OwnedHandle) -> RawHandle {
    use std::os::windows::io::IntoRawHandle;
    handle.into_raw_handle()
}
