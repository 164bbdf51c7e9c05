// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::Spell;
use crate::types::Stdio;

/// Launch profile as read from a TOML file.
///
/// ```toml
/// command = "cargo build --release"
/// current_dir = "subproject"
/// env_remove = ["CARGO_TARGET_DIR"]
/// stdin = "null"
///
/// [env]
/// RUST_LOG = "debug"
/// ```
///
/// Either `command` (one command-line string) or `program` plus `args` must
/// be given. Everything else is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProfile {
    /// Full command line, split with the usual quoting rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Program to run when `command` is not used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Arguments for `program`, passed through untouched.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory. Relative paths are resolved against the
    /// directory containing the profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_dir: Option<PathBuf>,

    /// Start from an empty environment instead of the parent's.
    #[serde(default)]
    pub env_clear: bool,

    /// Variables to drop from the inherited environment.
    #[serde(default)]
    pub env_remove: Vec<String>,

    #[serde(default)]
    pub stdin: Stdio,

    #[serde(default)]
    pub stdout: Stdio,

    #[serde(default)]
    pub stderr: Stdio,

    /// Collect stdout/stderr and report them after the run.
    #[serde(default)]
    pub capture: bool,

    /// Variables to set (or override) in the child.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Validated launch profile. Obtain one through `TryFrom<RawProfile>` or
/// [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub env_clear: bool,
    pub env_remove: Vec<String>,
    pub stdin: Stdio,
    pub stdout: Stdio,
    pub stderr: Stdio,
    pub capture: bool,
}

impl Profile {
    /// Turn the profile into a descriptor.
    ///
    /// `base_dir` anchors a relative `current_dir`; without a
    /// `current_dir` the process's own working directory is kept.
    pub fn to_spell(&self, base_dir: &Path) -> Spell {
        let mut spell = Spell::new(self.program.clone());
        spell.args(self.args.iter().cloned());

        if self.env_clear {
            spell.env_clear();
        }
        for key in &self.env_remove {
            spell.env_remove(key);
        }
        if !self.env.is_empty() {
            spell.envs(&self.env);
        }

        if let Some(dir) = &self.current_dir {
            spell.current_dir(base_dir).current_dir(dir);
        }

        spell
            .stdin(self.stdin)
            .stdout(self.stdout)
            .stderr(self.stderr);
        spell
    }
}
