use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Variables and working directory of one interpreter session.
///
/// Lookups of an undefined name yield an empty string, never an error. The
/// store is mutated by the `export` built-in or by the embedding caller.
/// Spawned processes see these variables on top of the inherited process
/// environment and run in [`Environment::current_dir`].
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    current_dir: PathBuf,
}

impl Environment {
    /// An empty store rooted at the process's current directory.
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Capture the current process state: every variable from
    /// `std::env::vars()` plus the current directory.
    pub fn from_process() -> Self {
        let mut env = Self::new();
        env.vars.extend(stdenv::vars());
        env
    }

    /// Value of `key`, or `""` when it is not defined.
    pub fn get(&self, key: &str) -> &str {
        self.vars.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Set or override a variable.
    pub fn set(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn set_current_dir(&mut self, dir: impl Into<PathBuf>) {
        self.current_dir = dir.into();
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Self::new();
        for (k, v) in iter {
            env.set(k, v);
        }
        env
    }
}
