//! Session settings gathered from the environment and the command line.

use crate::env::Environment;
use crate::interpreter::Interpreter;
use crate::verbosity::{ParseVerbosityError, Verbosity};
use std::path::PathBuf;

/// Environment variable names read by [`SessionConfig::from_env`].
pub mod env_keys {
    /// Initial verbosity, one of `trace|debug|info|warn|error|none`.
    pub const LOG_LEVEL: &str = "SHELL_SCRIPT_LOG_LEVEL";
    /// `1`/`true`/`yes`/`on` starts the session with failures ignored.
    pub const IGNORE_ERRORS: &str = "SHELL_SCRIPT_IGNORE_ERRORS";
}

/// Knobs for a new [`Interpreter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub verbosity: Verbosity,
    pub ignore_errors: bool,
    /// Copy the process environment into the session store.
    pub inherit_env: bool,
    /// Extra variables, applied after the inherited ones.
    pub vars: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            ignore_errors: false,
            inherit_env: true,
            vars: Vec::new(),
            current_dir: None,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, ParseVerbosityError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`SessionConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ParseVerbosityError> {
        let mut config = Self::default();
        if let Some(level) = lookup(env_keys::LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            config.verbosity = level.parse()?;
        }
        if let Some(flag) = lookup(env_keys::IGNORE_ERRORS) {
            config.ignore_errors = parse_flag(&flag);
        }
        Ok(config)
    }

    pub fn build(self) -> Interpreter {
        let mut env = if self.inherit_env {
            Environment::from_process()
        } else {
            Environment::new()
        };
        for (key, value) in self.vars {
            env.set(key, value);
        }
        if let Some(dir) = self.current_dir {
            env.set_current_dir(dir);
        }
        let mut shell = Interpreter::new(self.verbosity, env);
        shell.set_ignore_errors(self.ignore_errors);
        shell
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse `NAME=VALUE`; the value may be empty or contain further `=`.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got `{}`", s)),
    }
}
