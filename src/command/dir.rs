// src/command/dir.rs

//! Working-directory resolution for the builder.

use std::path::{Component, Path, PathBuf};

/// Resolve `dir` against `base`.
///
/// Absolute paths are taken as given. Relative ones are joined onto `base`
/// and weakly canonicalized, so the path does not need to exist yet.
pub fn resolve_dir(base: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    weakly_canonicalize(&base.join(dir))
}

/// Canonicalize the longest prefix of `path` that exists (resolving any
/// symlinks in it) and fold `.`/`..` in the remaining suffix lexically.
pub fn weakly_canonicalize(path: &Path) -> PathBuf {
    for prefix in path.ancestors() {
        if prefix.as_os_str().is_empty() {
            break;
        }
        let (Ok(canonical), Ok(rest)) = (prefix.canonicalize(), path.strip_prefix(prefix)) else {
            continue;
        };
        if rest.as_os_str().is_empty() {
            return canonical;
        }
        return normalize_lexically(&canonical.join(rest));
    }
    normalize_lexically(path)
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root (or above the start of a relative
/// path).
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(out.components().next_back(), None | Some(Component::RootDir | Component::Prefix(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
