// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{Profile, RawProfile};
use crate::errors::Result;

/// Load a launch profile from `path` without validating it.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] to
/// get a [`Profile`] that is ready to launch.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawProfile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let profile: RawProfile = toml::from_str(&contents)?;
    debug!(?path, "loaded launch profile");

    Ok(profile)
}

/// Load a launch profile from `path` and validate it:
///
/// - exactly one of `command` / `program` is set,
/// - `command` names a program,
/// - environment variable names are usable.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Profile> {
    let raw = load_from_path(&path)?;
    let profile = Profile::try_from(raw)?;
    Ok(profile)
}

/// Directory that relative paths inside the profile at `path` refer to.
///
/// For a bare filename like `build.toml` that is the current working
/// directory.
pub fn profile_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
