#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use spell::Stdio;
use spell::config::{Profile, RawProfile};

/// Builder for launch profiles to simplify test setup.
///
/// Either build a validated [`Profile`] directly or write the TOML to disk
/// and go through the loader.
pub struct ProfileBuilder {
    profile: RawProfile,
}

impl ProfileBuilder {
    /// Profile running a whole command line.
    pub fn command(line: &str) -> Self {
        Self {
            profile: RawProfile {
                command: Some(line.to_string()),
                ..RawProfile::default()
            },
        }
    }

    /// Profile running `program` with explicit arguments.
    pub fn program(program: &str) -> Self {
        Self {
            profile: RawProfile {
                program: Some(program.to_string()),
                ..RawProfile::default()
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.profile.args.push(arg.to_string());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile.current_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.profile.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn env_clear(mut self, val: bool) -> Self {
        self.profile.env_clear = val;
        self
    }

    pub fn env_remove(mut self, key: &str) -> Self {
        self.profile.env_remove.push(key.to_string());
        self
    }

    pub fn stdin(mut self, mode: Stdio) -> Self {
        self.profile.stdin = mode;
        self
    }

    pub fn stdout(mut self, mode: Stdio) -> Self {
        self.profile.stdout = mode;
        self
    }

    pub fn stderr(mut self, mode: Stdio) -> Self {
        self.profile.stderr = mode;
        self
    }

    pub fn capture(mut self, val: bool) -> Self {
        self.profile.capture = val;
        self
    }

    pub fn raw(self) -> RawProfile {
        self.profile
    }

    pub fn build(self) -> Profile {
        Profile::try_from(self.profile).expect("Failed to build valid profile from builder")
    }

    /// Serialize the profile into `dir/name` and return the file's path.
    pub fn write_to(self, dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
        let path = dir.join(name);
        let contents = toml::to_string(&self.profile)?;
        fs::write(&path, contents)?;
        Ok(path)
    }
}
