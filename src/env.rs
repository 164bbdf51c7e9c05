// src/env.rs

//! Environment map handed to a child process.
//!
//! Each variable is stored as a single `KEY=VALUE` buffer, which is also the
//! shape both platforms want when the map is flattened for the spawn call.
//! Equality and hashing only look at the key, so the map is a plain
//! `HashSet<EnvVar>` that can be queried with a `&str` key.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::collections::hash_set;
use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::debug;

/// A single `KEY=VALUE` variable.
///
/// The first `=` is the split point, so values may contain `=` but keys
/// cannot.
#[derive(Clone)]
pub struct EnvVar {
    data: String,
    eq: usize,
}

impl EnvVar {
    pub fn new(key: &str, value: &str) -> Self {
        let mut data = String::with_capacity(key.len() + 1 + value.len());
        data.push_str(key);
        data.push('=');
        data.push_str(value);
        Self {
            data,
            eq: key.len(),
        }
    }

    /// Parse a raw `KEY=VALUE` entry. An entry without `=` is a key with an
    /// empty value.
    pub fn parse(entry: &str) -> Self {
        match entry.find('=') {
            Some(eq) => Self {
                data: entry.to_string(),
                eq,
            },
            None => Self::new(entry, ""),
        }
    }

    pub fn key(&self) -> &str {
        &self.data[..self.eq]
    }

    pub fn value(&self) -> &str {
        &self.data[self.eq + 1..]
    }

    pub fn set_key(&mut self, key: &str) {
        self.data.replace_range(..self.eq, key);
        self.eq = key.len();
    }

    pub fn set_value(&mut self, value: &str) {
        self.data.truncate(self.eq + 1);
        self.data.push_str(value);
    }

    /// The whole `KEY=VALUE` buffer.
    pub fn as_str(&self) -> &str {
        &self.data
    }
}

impl PartialEq for EnvVar {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EnvVar {}

impl Hash for EnvVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Borrow<str> for EnvVar {
    fn borrow(&self) -> &str {
        self.key()
    }
}

impl fmt::Debug for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

impl fmt::Display for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

/// Whether `key` can name a variable in a child's environment: non-empty,
/// without `=` and without nul bytes.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['=', '\0'])
}

/// Set of environment variables, unique by key, unordered.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashSet<EnvVar>,
}

impl Env {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    ///
    /// Variables whose key or value is not valid Unicode are skipped, and so
    /// are Windows' hidden per-drive `=C:` entries.
    pub fn from_process() -> Self {
        let mut vars = HashSet::new();
        for (key, value) in std::env::vars_os() {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) if is_valid_key(&key) => {
                    vars.insert(EnvVar::new(&key, &value));
                }
                (Ok(key), Ok(_)) => {
                    debug!(%key, "skipping environment variable with unusable name");
                }
                (key, _) => {
                    debug!(?key, "skipping non-unicode environment variable");
                }
            }
        }
        Self { vars }
    }

    /// `None` when the key is absent; an explicitly empty value is
    /// `Some("")`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(EnvVar::value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains(key)
    }

    /// Insert or overwrite `key`.
    ///
    /// The key is stored as given. A key that is empty or contains `=` or a
    /// nul byte cannot be passed to a child, and launching a descriptor that
    /// holds one fails with an `InvalidInput` spawn error.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.vars.take(key) {
            Some(mut var) => {
                var.set_value(value);
                self.vars.insert(var);
            }
            None => {
                self.vars.insert(EnvVar::new(key, value));
            }
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.vars.remove(key);
    }

    /// Move the value of `key` to `new_key`, replacing anything already
    /// stored under `new_key`. Does nothing when `key` is absent.
    pub fn rename(&mut self, key: &str, new_key: &str) {
        if let Some(mut var) = self.vars.take(key) {
            var.set_key(new_key);
            self.vars.replace(var);
        }
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate in unspecified order.
    pub fn iter(&self) -> hash_set::Iter<'_, EnvVar> {
        self.vars.iter()
    }

    /// All `KEY=VALUE` entries, sorted, for callers that need stable output.
    pub fn to_sorted(&self) -> Vec<String> {
        let mut entries: Vec<String> = self.vars.iter().map(|v| v.as_str().to_string()).collect();
        entries.sort();
        entries
    }
}

impl<'a> IntoIterator for &'a Env {
    type Item = &'a EnvVar;
    type IntoIter = hash_set::Iter<'a, EnvVar>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Env {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Env::empty();
        env.extend(iter);
        env
    }
}

impl<K: AsRef<str>, V: AsRef<str>> Extend<(K, V)> for Env {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key.as_ref(), value.as_ref());
        }
    }
}
