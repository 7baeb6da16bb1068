use crate::command::InternalCommand;
use crate::error::ShellError;
use crate::external::ProcessRequest;
use crate::interpreter::Interpreter;
use argh::{EarlyExit, FromArgs};
use regex::Regex;

/// Internal commands every session starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `start <url>`: open a URL or path with the platform's default handler.
    Start,
    /// `export NAME=EXPR`: store the evaluated expression in the environment.
    Export,
    /// `assume <n>`: fail unless the piped input has exactly `n` non-blank lines.
    Assume,
    /// `regexp <pattern>`: first capture group of `pattern` in the piped input.
    Regexp,
}

impl Builtin {
    pub const ALL: [Builtin; 4] = [
        Builtin::Start,
        Builtin::Export,
        Builtin::Assume,
        Builtin::Regexp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Start => "start",
            Builtin::Export => "export",
            Builtin::Assume => "assume",
            Builtin::Regexp => "regexp",
        }
    }
}

impl InternalCommand for Builtin {
    fn execute(
        &self,
        shell: &mut Interpreter,
        segment: &str,
        piped_input: &str,
    ) -> Result<String, ShellError> {
        match self {
            Builtin::Start => start(shell, segment),
            Builtin::Export => export(shell, segment),
            Builtin::Assume => assume(segment, piped_input),
            Builtin::Regexp => regexp(shell, segment, piped_input),
        }
    }
}

/// Text after the leading command name.
fn remainder<'a>(segment: &'a str, name: &str) -> &'a str {
    segment.trim_start().strip_prefix(name).unwrap_or(segment).trim()
}

/// Host family used to pick the `start` launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    /// No known launcher; `start` asks the user to open the URL manually.
    Other,
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            _ => Platform::Other,
        }
    }

    /// Command prefix that opens a URL, if the platform has one.
    pub fn launcher(self) -> Option<&'static [&'static str]> {
        match self {
            Platform::Windows => Some(&["cmd", "/c", "start"]),
            Platform::MacOs => Some(&["open"]),
            Platform::Linux => Some(&["xdg-open"]),
            Platform::Other => None,
        }
    }
}

fn start(shell: &mut Interpreter, segment: &str) -> Result<String, ShellError> {
    let url = shell.interpolate(remainder(segment, Builtin::Start.name()))?;
    let Some(launcher) = shell.platform().launcher() else {
        if shell.verbosity().is_info() {
            tracing::info!("Open this url manually: {}", url);
        }
        return Ok(String::new());
    };

    let mut argv: Vec<String> = launcher.iter().map(|s| s.to_string()).collect();
    argv.extend(url.split_whitespace().map(str::to_string));
    let request = ProcessRequest {
        argv: &argv,
        stdin: None,
        env: shell.env(),
        prefix: "",
        trace_stdout: false,
    };
    // best effort: a missing launcher must not abort the script, and the
    // handler it starts is never waited for
    if let Err(e) = shell.runner().launch(&request) {
        if shell.verbosity().is_warn() {
            tracing::warn!("start: {}", e);
        }
    }
    Ok(String::new())
}

fn export(shell: &mut Interpreter, segment: &str) -> Result<String, ShellError> {
    let assignment = remainder(segment, Builtin::Export.name());
    let (key, value_expr) = match assignment.split_once('=') {
        Some((key, value_expr)) if !key.trim().is_empty() => (key.trim(), value_expr),
        _ => {
            if shell.verbosity().is_error() {
                tracing::error!("Invalid export syntax: {}", segment);
            }
            return Ok(String::new());
        }
    };

    let value_expr = value_expr.trim();
    // pipes are handled by the executor, which interpolates nothing itself
    let value = if value_expr.contains('|') {
        shell.run_pipeline(value_expr, "")?
    } else {
        shell.interpolate(value_expr)?
    };
    if shell.verbosity().is_debug() {
        tracing::debug!("export {}={}", key, value);
    }
    shell.env_mut().set(key, value);
    Ok(String::new())
}

#[derive(FromArgs)]
/// Fail unless the piped input holds exactly COUNT non-blank lines; pass them through.
struct Assume {
    #[argh(positional)]
    /// expected number of non-blank lines.
    count: usize,

    #[argh(positional, greedy)]
    /// ignored, kept so trailing words do not fail parsing.
    _rest: Vec<String>,
}

fn assume(segment: &str, piped_input: &str) -> Result<String, ShellError> {
    let name = Builtin::Assume.name();
    let args: Vec<&str> = remainder(segment, name).split_whitespace().collect();
    if args.is_empty() {
        return Err(ShellError::MissingArgument {
            command: name,
            usage: "assume <count>",
        });
    }
    let expected = match Assume::from_args(&[name], &args) {
        Ok(parsed) => parsed.count,
        Err(EarlyExit { output, status }) => {
            return match status {
                Ok(()) => Ok(output),
                Err(()) => Err(ShellError::InvalidArguments {
                    command: name.to_string(),
                    message: output.trim().to_string(),
                }),
            };
        }
    };

    if piped_input.is_empty() {
        return Err(ShellError::NoPipedInput { command: name });
    }
    let lines: Vec<&str> = piped_input
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.len() != expected {
        return Err(ShellError::Assumption {
            expected,
            actual: lines.len(),
            content: piped_input.to_string(),
        });
    }
    Ok(lines.join("\n"))
}

fn regexp(shell: &Interpreter, segment: &str, piped_input: &str) -> Result<String, ShellError> {
    let pattern = remainder(segment, Builtin::Regexp.name());
    if pattern.is_empty() {
        return Err(ShellError::MissingArgument {
            command: Builtin::Regexp.name(),
            usage: "regexp <pattern>",
        });
    }
    let re = Regex::new(pattern).map_err(|source| ShellError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let captured = re
        .captures(piped_input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    if shell.verbosity().is_trace() {
        tracing::trace!("regexp {} on {:?} => {:?}", pattern, piped_input, captured);
    }
    Ok(captured)
}
