use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Severity threshold gating which diagnostics a session emits.
///
/// Variants are ordered from most to least verbose; a message at level `L` is
/// emitted when the session verbosity is `<= L`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Verbosity {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    None,
}

impl Verbosity {
    pub const ALL: [Verbosity; 6] = [
        Verbosity::Trace,
        Verbosity::Debug,
        Verbosity::Info,
        Verbosity::Warn,
        Verbosity::Error,
        Verbosity::None,
    ];

    /// Whether a message at `level` passes this threshold.
    pub fn enabled(self, level: Verbosity) -> bool {
        level != Verbosity::None && self <= level
    }

    pub fn is_trace(self) -> bool {
        self.enabled(Verbosity::Trace)
    }

    pub fn is_debug(self) -> bool {
        self.enabled(Verbosity::Debug)
    }

    pub fn is_info(self) -> bool {
        self.enabled(Verbosity::Info)
    }

    pub fn is_warn(self) -> bool {
        self.enabled(Verbosity::Warn)
    }

    pub fn is_error(self) -> bool {
        self.enabled(Verbosity::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verbosity::Trace => "trace",
            Verbosity::Debug => "debug",
            Verbosity::Info => "info",
            Verbosity::Warn => "warn",
            Verbosity::Error => "error",
            Verbosity::None => "none",
        }
    }

    /// The matching `tracing` filter; `None` turns everything off.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Trace => LevelFilter::TRACE,
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Warn => LevelFilter::WARN,
            Verbosity::Error => LevelFilter::ERROR,
            Verbosity::None => LevelFilter::OFF,
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown verbosity `{0}`, expected one of trace|debug|info|warn|error|none")]
pub struct ParseVerbosityError(pub String);

impl FromStr for Verbosity {
    type Err = ParseVerbosityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Verbosity::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseVerbosityError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_from_most_verbose() {
        assert!(Verbosity::Trace < Verbosity::Debug);
        assert!(Verbosity::Debug < Verbosity::Info);
        assert!(Verbosity::Error < Verbosity::None);
    }

    #[test]
    fn info_threshold_hides_debug_but_shows_warn() {
        let v = Verbosity::Info;
        assert!(!v.is_trace());
        assert!(!v.is_debug());
        assert!(v.is_info());
        assert!(v.is_warn());
        assert!(v.is_error());
    }

    #[test]
    fn none_silences_everything() {
        let v = Verbosity::None;
        assert!(!v.is_error());
        assert!(!v.enabled(Verbosity::None));
        assert_eq!(v.level_filter(), LevelFilter::OFF);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("DEBUG".parse::<Verbosity>(), Ok(Verbosity::Debug));
        assert_eq!(" Warn ".parse::<Verbosity>(), Ok(Verbosity::Warn));
        assert_eq!("none".parse::<Verbosity>(), Ok(Verbosity::None));
    }

    #[test]
    fn rejects_unknown_level() {
        let err = "loud".parse::<Verbosity>().unwrap_err();
        assert_eq!(err, ParseVerbosityError("loud".to_string()));
        assert!(err.to_string().contains("trace|debug"));
    }
}
