use thiserror::Error;

/// Every way a line, statement or script can fail.
///
/// Spawn failures, uncaught non-zero exits and assumption failures unwind
/// through every nesting level and abort the whole run.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to spawn command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed with exit code {code}: {command}")]
    CommandFailed { command: String, code: i32 },

    #[error("empty command")]
    EmptyCommand,

    #[error("assume: expected {expected} line(s), got {actual}:\n{content}")]
    Assumption {
        expected: usize,
        actual: usize,
        content: String,
    },

    #[error("{command}: missing argument, usage: {usage}")]
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },

    #[error("{command}: {message}")]
    InvalidArguments { command: String, message: String },

    #[error("{command}: no piped input available")]
    NoPipedInput { command: &'static str },

    #[error("invalid regular expression `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure reported by a command registered at runtime.
    #[error("{0}")]
    Message(String),
}

impl ShellError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
