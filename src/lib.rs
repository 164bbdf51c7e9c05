// src/lib.rs

pub mod child;
pub mod cli;
pub mod command;
pub mod config;
pub mod env;
pub mod errors;
pub mod logging;
pub mod pipe;
mod sys;
pub mod types;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

pub use crate::child::{Child, ignore_child_exits};
pub use crate::command::{Spell, split_command_line};
pub use crate::env::{Env, EnvVar};
pub use crate::errors::SpellError;
pub use crate::pipe::{Pipe, RawHandle};
pub use crate::types::{ExitStatus, Output, StdStream, Stdio};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, profile_dir};

/// High-level entry point used by `main.rs`.
///
/// Builds the descriptor from either a profile or a command line, layers
/// the CLI overrides on top and runs it. Returns the exit code the binary
/// should exit with.
pub fn run(args: CliArgs) -> Result<i32> {
    let (mut spell, base_dir, mut capture) = match &args.profile {
        Some(path) => {
            let path = PathBuf::from(path);
            let profile = load_and_validate(&path)
                .with_context(|| format!("loading profile {}", path.display()))?;
            let base_dir = profile_dir(&path);
            (profile.to_spell(&base_dir), base_dir, profile.capture)
        }
        None => {
            let line = args.command.as_deref().unwrap_or_default();
            let cwd = std::env::current_dir().context("reading current directory")?;
            (Spell::from_string(line)?, cwd, false)
        }
    };

    apply_overrides(&mut spell, &args, &base_dir);
    capture |= args.capture;

    if args.dry_run {
        print_dry_run(&spell, capture);
        return Ok(0);
    }

    let status = if capture {
        let output = spell.cast_output()?;
        let mut out = std::io::stdout().lock();
        out.write_all(&output.stdout)?;
        out.flush()?;
        let mut err = std::io::stderr().lock();
        err.write_all(&output.stderr)?;
        err.flush()?;
        output.status
    } else {
        spell.cast_status()?
    };

    info!(program = spell.get_program(), %status, "program finished");
    Ok(status.code())
}

fn apply_overrides(spell: &mut Spell, args: &CliArgs, base_dir: &Path) {
    if let Some(dir) = &args.dir {
        spell.current_dir(base_dir).current_dir(dir);
    }
    if args.env_clear {
        spell.env_clear();
    }
    if !args.env.is_empty() {
        spell.envs(args.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    if let Some(mode) = args.stdin {
        spell.stdin(mode.into());
    }
    if let Some(mode) = args.stdout {
        spell.stdout(mode.into());
    }
    if let Some(mode) = args.stderr {
        spell.stderr(mode.into());
    }
}

/// Simple dry-run output: print what would be launched.
fn print_dry_run(spell: &Spell, capture: bool) {
    println!("spell dry-run");
    println!("  program: {}", spell.get_program());
    if !spell.get_args().is_empty() {
        println!("  args: {:?}", spell.get_args());
    }
    println!("  current_dir: {}", spell.get_current_dir().display());
    println!(
        "  stdin: {:?}, stdout: {:?}, stderr: {:?}",
        spell.get_stdin(),
        spell.get_stdout(),
        spell.get_stderr()
    );
    if capture {
        println!("  capture: true");
    }

    match spell.get_envs() {
        None => println!("  env: inherited"),
        Some(env) => {
            println!("  env ({}):", env.len());
            for var in env.to_sorted() {
                println!("    {var}");
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
