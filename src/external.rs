//! Spawning external processes for pipeline segments.

use crate::env::Environment;
use crate::error::ShellError;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

/// One process invocation: `argv[0]` plus arguments, already tokenized.
pub struct ProcessRequest<'a> {
    pub argv: &'a [String],
    /// Text written to the child's stdin; `None` leaves stdin empty.
    pub stdin: Option<&'a str>,
    pub env: &'a Environment,
    /// Prepended to each stderr line forwarded to our own stderr, and to each
    /// stdout line traced while the child runs.
    pub prefix: &'a str,
    /// Emit every stdout line at trace level as soon as it is read.
    pub trace_stdout: bool,
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Seam between the interpreter and the operating system.
pub trait ProcessRunner {
    /// Run the process to completion and capture its output.
    ///
    /// A non-zero exit is reported through [`ProcessOutput::code`], not as an
    /// error; only failing to launch or to talk to the child is an error.
    fn run(&self, request: &ProcessRequest<'_>) -> Result<ProcessOutput, ShellError>;

    /// Start the process detached from our stdio and return without waiting
    /// for it. Only failing to launch is an error.
    fn launch(&self, request: &ProcessRequest<'_>) -> Result<(), ShellError>;
}

/// Spawns real processes, draining stdout and stderr on separate threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, request: &ProcessRequest<'_>) -> Result<ProcessOutput, ShellError> {
        let Some(name) = request.argv.first() else {
            return Err(ShellError::EmptyCommand);
        };
        let env = request.env;
        let program = resolve_program(env, name);

        let mut child = Command::new(program)
            .args(&request.argv[1..])
            .envs(env.vars())
            .current_dir(env.current_dir())
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ShellError::Spawn {
                command: request.argv.join(" "),
                source,
            })?;

        let child_stdin = child.stdin.take();
        let child_stdout = child.stdout.take();
        let child_stderr = child.stderr.take();
        let prefix = request.prefix;
        let trace_stdout = request.trace_stdout;

        // Both pipes are drained while the child runs; reading one to the end
        // first deadlocks once the other fills its buffer.
        let (stdout, stderr) = thread::scope(|scope| {
            if let (Some(mut pipe), Some(input)) = (child_stdin, request.stdin) {
                scope.spawn(move || {
                    // the child may exit without consuming its input
                    let _ = pipe.write_all(input.as_bytes());
                    if !input.ends_with('\n') {
                        let _ = pipe.write_all(b"\n");
                    }
                });
            }
            let out = scope.spawn(move || {
                drain_lines(child_stdout, |line| {
                    if trace_stdout {
                        tracing::trace!("{}{}", prefix, line);
                    }
                })
            });
            let err = scope.spawn(move || {
                drain_lines(child_stderr, |line| {
                    let mut stderr = io::stderr().lock();
                    let _ = writeln!(stderr, "{}{}", prefix, line);
                })
            });
            (join_reader(out.join()), join_reader(err.join()))
        });
        // reap the child even when a reader failed
        let status = child.wait();
        let stdout = stdout?;
        let stderr = stderr?;
        let status = status?;
        let code = match status.code() {
            Some(x) => x,
            None => terminated_by_signal(status),
        };
        Ok(ProcessOutput {
            code,
            stdout,
            stderr,
        })
    }

    fn launch(&self, request: &ProcessRequest<'_>) -> Result<(), ShellError> {
        let Some(name) = request.argv.first() else {
            return Err(ShellError::EmptyCommand);
        };
        let env = request.env;
        let mut child = Command::new(resolve_program(env, name))
            .args(&request.argv[1..])
            .envs(env.vars())
            .current_dir(env.current_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ShellError::Spawn {
                command: request.argv.join(" "),
                source,
            })?;
        // whatever the launcher leaves behind may outlive the script
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

fn join_reader(joined: thread::Result<io::Result<Vec<String>>>) -> io::Result<Vec<String>> {
    joined.unwrap_or_else(|_| Err(io::Error::other("output reader thread panicked")))
}

/// Read `reader` line by line until EOF, handing each line to `on_line`.
///
/// Invalid UTF-8 is replaced rather than aborting the read.
fn drain_lines<R: Read>(reader: Option<R>, mut on_line: impl FnMut(&str)) -> io::Result<Vec<String>> {
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };
    let mut reader = BufReader::new(reader);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        on_line(line);
        lines.push(line.to_string());
    }
    Ok(lines)
}

/// Resolve `name` against the session `PATH`, falling back to the process
/// `PATH`. Unresolved names are handed to the OS unchanged so it can report
/// the failure.
fn resolve_program(env: &Environment, name: &str) -> OsString {
    let search_paths = match env.get("PATH") {
        "" => std::env::var_os("PATH").unwrap_or_default(),
        paths => OsString::from(paths),
    };
    match find_command_path(&search_paths, Path::new(name)) {
        Some(found) => found.into_owned().into_os_string(),
        None => OsString::from(name),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(single), None) => find_in_path(search_paths, single.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| candidate.is_file())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
