// src/bin/spell-probe.rs

//! Tiny fixture program for the integration tests.
//!
//! `spell-probe <mode> [ARGS...]`
//!
//! - `args A B ..`      print the arguments joined by one space
//! - `env K ..`         print `K=value` or `K not found` per name
//! - `echo-byte`        copy one byte from stdin to stdout
//! - `hello`            print "Hello world" to stdout
//! - `hello-stderr`     print "Hello world" to stderr
//! - `count-args A ..`  exit with the number of arguments
//! - `exit N`           exit with code N
//! - `flood N`          write N bytes of `o` to stdout and of `e` to stderr
//! - `sleep SECS`       sleep, then exit 0
//! - `pwd`              print the working directory
//! - `relaunch-without-stdio`
//!                      (Unix) close fds 0-2, then capture `hello` from a
//!                      copy of itself launched with a null stdin; exit 0
//!                      if the output is right

use std::io::{self, Read, Write};
use std::time::Duration;

use anyhow::{Context, Result, bail};
#[cfg(unix)]
use spell::{Spell, Stdio};

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("spell-probe error: {err:?}");
            std::process::exit(101);
        }
    }
}

fn run() -> Result<i32> {
    let mut argv = std::env::args().skip(1);
    let mode = argv.next().context("missing mode")?;
    let rest: Vec<String> = argv.collect();

    let mut stdout = io::stdout().lock();
    match mode.as_str() {
        "args" => writeln!(stdout, "{}", rest.join(" "))?,
        "env" => {
            for key in &rest {
                match std::env::var(key) {
                    Ok(value) => writeln!(stdout, "{key}={value}")?,
                    Err(_) => writeln!(stdout, "{key} not found")?,
                }
            }
        }
        "echo-byte" => {
            let mut byte = [0u8; 1];
            let n = io::stdin().lock().read(&mut byte)?;
            stdout.write_all(&byte[..n])?;
        }
        "hello" => writeln!(stdout, "Hello world")?,
        "hello-stderr" => writeln!(io::stderr(), "Hello world")?,
        "count-args" => return Ok(rest.len() as i32),
        "exit" => {
            let code = rest.first().context("missing exit code")?;
            return code.parse().with_context(|| format!("bad exit code {code:?}"));
        }
        "flood" => {
            let n: usize = rest.first().context("missing byte count")?.parse()?;
            let chunk = [b'o'; 4096];
            let echunk = [b'e'; 4096];
            let mut stderr = io::stderr().lock();
            let mut left = n;
            while left > 0 {
                let len = left.min(chunk.len());
                stdout.write_all(&chunk[..len])?;
                stderr.write_all(&echunk[..len])?;
                left -= len;
            }
        }
        "sleep" => {
            let secs: u64 = rest.first().context("missing duration")?.parse()?;
            std::thread::sleep(Duration::from_secs(secs));
        }
        "pwd" => writeln!(stdout, "{}", std::env::current_dir()?.display())?,
        #[cfg(unix)]
        "relaunch-without-stdio" => {
            for fd in 0..=2 {
                // SAFETY: nothing in this process uses the raw std fds again;
                // the std handles treat EBADF as success.
                unsafe { libc::close(fd) };
            }
            let exe = std::env::current_exe()?;
            let mut spell = Spell::new(exe.to_string_lossy());
            spell.arg("hello").stdin(Stdio::Null);
            let output = spell.cast_output()?;
            let ok = output.status.success()
                && output.stdout == b"Hello world\n"
                && output.stderr.is_empty();
            return Ok(if ok { 0 } else { 1 });
        }
        other => bail!("unknown mode {other:?}"),
    }
    stdout.flush()?;
    Ok(0)
}
