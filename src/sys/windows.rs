// src/sys/windows.rs

//! CreateProcessW backend.
//!
//! Spawn failures come straight back from `CreateProcessW`, so this side
//! needs no error channel. Handle inheritance is opt-in: all our handles
//! are created non-inheritable, and the three child ends are flipped to
//! inheritable only while the spawn lock is held.

use std::ffi::c_void;
use std::io;
use std::mem;
use std::os::windows::ffi::OsStrExt;
use std::os::windows::io::{AsHandle, AsRawHandle, FromRawHandle, OwnedHandle};
use std::ptr;
use std::sync::Mutex;

use tracing::{debug, trace};
use windows_sys::Win32::Foundation::{
    ERROR_BROKEN_PIPE, FALSE, GetLastError, HANDLE, HANDLE_FLAG_INHERIT, SetHandleInformation,
    TRUE, WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows_sys::Win32::Storage::FileSystem::{ReadFile, WriteFile};
use windows_sys::Win32::System::Pipes::CreatePipe;
use windows_sys::Win32::System::Threading::{
    CREATE_UNICODE_ENVIRONMENT, CreateProcessW, GetExitCodeProcess, INFINITE,
    PROCESS_INFORMATION, STARTF_USESTDHANDLES, STARTUPINFOW, TerminateProcess,
    WaitForSingleObject,
};

use super::{Platform, SpawnRequest};
use crate::env::Env;
use crate::types::StdStream;

const STILL_ACTIVE: u32 = 259;

static SPAWN_LOCK: Mutex<()> = Mutex::new(());

pub(crate) struct Windows;

#[derive(Debug)]
pub(crate) struct WindowsProcess {
    /// Released once the exit code has been collected.
    handle: Option<OwnedHandle>,
    pid: u32,
}

impl Platform for Windows {
    type Process = WindowsProcess;

    fn pipe() -> io::Result<(OwnedHandle, OwnedHandle)> {
        let mut read: HANDLE = ptr::null_mut();
        let mut write: HANDLE = ptr::null_mut();
        // SAFETY: out-pointers are valid; null attributes mean "not inheritable".
        cvt(unsafe { CreatePipe(&mut read, &mut write, ptr::null(), 0) })?;
        // SAFETY: CreatePipe succeeded, both handles are fresh and ours.
        unsafe {
            Ok((
                OwnedHandle::from_raw_handle(read as _),
                OwnedHandle::from_raw_handle(write as _),
            ))
        }
    }

    fn std_stream(stream: StdStream) -> io::Result<OwnedHandle> {
        match stream {
            StdStream::Input => io::stdin().as_handle().try_clone_to_owned(),
            StdStream::Output => io::stdout().as_handle().try_clone_to_owned(),
            StdStream::Error => io::stderr().as_handle().try_clone_to_owned(),
        }
    }

    fn read(handle: &OwnedHandle, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(u32::MAX as usize) as u32;
        let mut read = 0u32;
        // SAFETY: `buf` is valid for `len` writable bytes.
        let ok = unsafe {
            ReadFile(raw(handle), buf.as_mut_ptr(), len, &mut read, ptr::null_mut())
        };
        if ok == FALSE {
            // SAFETY: no preconditions.
            if unsafe { GetLastError() } == ERROR_BROKEN_PIPE {
                return Ok(0);
            }
            return Err(io::Error::last_os_error());
        }
        Ok(read as usize)
    }

    fn available(_handle: &OwnedHandle) -> io::Result<Option<usize>> {
        Ok(None)
    }

    fn write(handle: &OwnedHandle, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len().min(u32::MAX as usize) as u32;
        let mut written = 0u32;
        // SAFETY: `buf` is valid for `len` readable bytes.
        cvt(unsafe { WriteFile(raw(handle), buf.as_ptr(), len, &mut written, ptr::null_mut()) })?;
        Ok(written as usize)
    }

    fn spawn(request: &SpawnRequest<'_>) -> io::Result<WindowsProcess> {
        let mut command_line = make_command_line(request.program, request.args)?;
        let env_block = request.env.map(make_env_block).transpose()?;
        let dir = to_wide(request.current_dir.as_os_str().encode_wide())?;

        // SAFETY: both structs are plain C data for which all-zero is valid.
        let mut startup: STARTUPINFOW = unsafe { mem::zeroed() };
        startup.cb = mem::size_of::<STARTUPINFOW>() as u32;
        startup.dwFlags |= STARTF_USESTDHANDLES;
        startup.hStdInput = raw(request.stdio[0]);
        startup.hStdOutput = raw(request.stdio[1]);
        startup.hStdError = raw(request.stdio[2]);
        let mut info: PROCESS_INFORMATION = unsafe { mem::zeroed() };

        let env_ptr = env_block
            .as_ref()
            .map_or(ptr::null(), |block| block.as_ptr() as *const c_void);

        // Any handle marked inheritable leaks into *every* CreateProcess call
        // made meanwhile, so the window is kept behind a lock.
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for end in request.stdio {
            set_inherit(end, true)?;
        }
        // SAFETY: every pointer refers to a live, NUL-terminated buffer.
        let result = cvt(unsafe {
            CreateProcessW(
                ptr::null(),
                command_line.as_mut_ptr(),
                ptr::null(),
                ptr::null(),
                TRUE,
                CREATE_UNICODE_ENVIRONMENT,
                env_ptr,
                dir.as_ptr(),
                &startup,
                &mut info,
            )
        });
        for end in request.stdio {
            let _ = set_inherit(end, false);
        }
        result?;

        // SAFETY: CreateProcessW succeeded; both handles belong to us.
        let process = unsafe { OwnedHandle::from_raw_handle(info.hProcess as _) };
        drop(unsafe { OwnedHandle::from_raw_handle(info.hThread as _) });
        trace!(pid = info.dwProcessId, "created process");

        Ok(WindowsProcess {
            handle: Some(process),
            pid: info.dwProcessId,
        })
    }

    fn process_id(process: &WindowsProcess) -> u32 {
        process.pid
    }

    fn try_wait(process: &mut WindowsProcess) -> io::Result<Option<i32>> {
        let handle = live_handle(process)?;
        // SAFETY: `handle` is a valid process handle.
        match unsafe { WaitForSingleObject(raw(handle), 0) } {
            WAIT_OBJECT_0 => {
                let code = exit_code(handle)?;
                process.handle = None;
                Ok(Some(code))
            }
            WAIT_TIMEOUT => Ok(None),
            _ => Err(io::Error::last_os_error()),
        }
    }

    fn wait(process: &mut WindowsProcess) -> io::Result<i32> {
        let handle = live_handle(process)?;
        // SAFETY: `handle` is a valid process handle.
        if unsafe { WaitForSingleObject(raw(handle), INFINITE) } != WAIT_OBJECT_0 {
            return Err(io::Error::last_os_error());
        }
        let code = exit_code(handle)?;
        process.handle = None;
        Ok(code)
    }

    fn kill(process: &mut WindowsProcess) -> io::Result<bool> {
        let Some(handle) = process.handle.as_ref() else {
            return Ok(false);
        };
        // SAFETY: `handle` is a valid process handle.
        if unsafe { TerminateProcess(raw(handle), 1) } != FALSE {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        // Terminating an already exited process fails with access denied.
        let mut code = 0u32;
        // SAFETY: `handle` is valid, `code` is a valid out-pointer.
        if unsafe { GetExitCodeProcess(raw(handle), &mut code) } != FALSE && code != STILL_ACTIVE {
            return Ok(false);
        }
        Err(err)
    }

    fn ignore_child_exits() -> io::Result<()> {
        debug!("child exit notifications need no handling on windows");
        Ok(())
    }
}

fn raw(handle: &OwnedHandle) -> HANDLE {
    handle.as_raw_handle() as HANDLE
}

fn cvt(ok: i32) -> io::Result<()> {
    if ok == FALSE {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn live_handle(process: &WindowsProcess) -> io::Result<&OwnedHandle> {
    process
        .handle
        .as_ref()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "process handle already released"))
}

fn exit_code(handle: &OwnedHandle) -> io::Result<i32> {
    let mut code = 0u32;
    // SAFETY: `handle` is valid, `code` is a valid out-pointer.
    cvt(unsafe { GetExitCodeProcess(raw(handle), &mut code) })?;
    Ok(code as i32)
}

fn set_inherit(handle: &OwnedHandle, inherit: bool) -> io::Result<()> {
    let flags = if inherit { HANDLE_FLAG_INHERIT } else { 0 };
    // SAFETY: plain flag update on a handle we own.
    cvt(unsafe { SetHandleInformation(raw(handle), HANDLE_FLAG_INHERIT, flags) })
}

fn to_wide<I: IntoIterator<Item = u16>>(units: I) -> io::Result<Vec<u16>> {
    let mut wide: Vec<u16> = units.into_iter().collect();
    if wide.contains(&0) {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "nul character in string"));
    }
    wide.push(0);
    Ok(wide)
}

/// Command line that `CommandLineToArgvW` splits back into exactly
/// `program` followed by `args`.
fn make_command_line(program: &str, args: &[String]) -> io::Result<Vec<u16>> {
    let mut cmd: Vec<u16> = Vec::new();
    // The program is always quoted; paths cannot contain quotes.
    cmd.push('"' as u16);
    cmd.extend(program.encode_utf16());
    cmd.push('"' as u16);
    for arg in args {
        cmd.push(' ' as u16);
        append_arg(&mut cmd, arg);
    }
    to_wide(cmd)
}

fn append_arg(cmd: &mut Vec<u16>, arg: &str) {
    let quote = arg.is_empty() || arg.contains([' ', '\t']);
    if quote {
        cmd.push('"' as u16);
    }
    let mut backslashes = 0usize;
    for unit in arg.encode_utf16() {
        if unit == '\\' as u16 {
            backslashes += 1;
        } else {
            if unit == '"' as u16 {
                // Double the run of backslashes and escape the quote itself.
                cmd.extend(std::iter::repeat_n('\\' as u16, backslashes + 1));
            }
            backslashes = 0;
        }
        cmd.push(unit);
    }
    if quote {
        cmd.extend(std::iter::repeat_n('\\' as u16, backslashes));
        cmd.push('"' as u16);
    }
}

/// `KEY=VALUE\0...\0\0`, sorted case-insensitively as Windows expects.
fn make_env_block(env: &Env) -> io::Result<Vec<u16>> {
    let mut entries: Vec<&str> = env.iter().map(|var| var.as_str()).collect();
    entries.sort_by_key(|entry| entry.to_uppercase());
    let mut block = Vec::new();
    if entries.is_empty() {
        block.push(0);
    }
    for entry in entries {
        if entry.contains('\0') {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "nul character in environment"));
        }
        block.extend(entry.encode_utf16());
        block.push(0);
    }
    block.push(0);
    Ok(block)
}
