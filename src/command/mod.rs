// src/command/mod.rs

//! Process descriptor.
//!
//! [`Spell`] collects everything about a process that is not yet running:
//! program, arguments, environment, working directory and the wiring of
//! its three standard streams. Building one has no side effects; the
//! launch entry points live in [`launch`].
//!
//! - [`parse`] splits a single command-line string into tokens.
//! - [`dir`] resolves working directories.
//! - [`launch`] turns a `Spell` into a running [`Child`](crate::Child).

pub mod dir;
pub mod launch;
pub mod parse;

use std::path::{Path, PathBuf};

use crate::env::Env;
use crate::errors::{Result, SpellError};
use crate::types::Stdio;

pub use parse::split_command_line;

#[derive(Debug, Clone)]
pub struct Spell {
    program: String,
    args: Vec<String>,
    /// `None` means "inherit the parent's environment at launch time".
    env: Option<Env>,
    working_dir: PathBuf,
    stdin: Stdio,
    stdout: Stdio,
    stderr: Stdio,
}

impl Spell {
    /// Describe a run of `program` with no arguments, the inherited
    /// environment, the current directory and default stream wiring.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: None,
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            stdin: Stdio::Default,
            stdout: Stdio::Default,
            stderr: Stdio::Default,
        }
    }

    /// Build a descriptor from one command line: the first token is the
    /// program, the rest are arguments. See [`parse`] for the quoting rules.
    pub fn from_string(line: &str) -> Result<Self> {
        let mut tokens = split_command_line(line).into_iter();
        let program = tokens.next().ok_or(SpellError::EmptyCommand)?;
        let mut spell = Spell::new(program);
        spell.args(tokens);
        Ok(spell)
    }

    pub fn get_program(&self) -> &str {
        &self.program
    }

    // Arguments

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn args_mut(&mut self) -> &mut Vec<String> {
        &mut self.args
    }

    // Environment

    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.envs_mut().set(key, value);
        self
    }

    pub fn envs<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.envs_mut().extend(vars);
        self
    }

    pub fn env_remove(&mut self, key: &str) -> &mut Self {
        self.envs_mut().remove(key);
        self
    }

    /// Launch with no variables at all, not even inherited ones.
    pub fn env_clear(&mut self) -> &mut Self {
        match self.env.as_mut() {
            Some(env) => env.clear(),
            None => self.env = Some(Env::empty()),
        }
        self
    }

    /// `None` while the child would simply inherit the parent environment.
    pub fn get_envs(&self) -> Option<&Env> {
        self.env.as_ref()
    }

    /// Explicit environment for the child, snapshotting the parent's
    /// environment first if none was set up yet.
    pub fn envs_mut(&mut self) -> &mut Env {
        self.env.get_or_insert_with(Env::from_process)
    }

    // Directory

    pub fn current_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.working_dir = dir::resolve_dir(&self.working_dir, dir.as_ref());
        self
    }

    pub fn get_current_dir(&self) -> &Path {
        &self.working_dir
    }

    // Streams

    pub fn stdin(&mut self, cfg: Stdio) -> &mut Self {
        self.stdin = cfg;
        self
    }

    pub fn stdout(&mut self, cfg: Stdio) -> &mut Self {
        self.stdout = cfg;
        self
    }

    pub fn stderr(&mut self, cfg: Stdio) -> &mut Self {
        self.stderr = cfg;
        self
    }

    pub fn get_stdin(&self) -> Stdio {
        self.stdin
    }

    pub fn get_stdout(&self) -> Stdio {
        self.stdout
    }

    pub fn get_stderr(&self) -> Stdio {
        self.stderr
    }
}
