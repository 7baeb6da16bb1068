use crate::builtin::Platform;
use crate::command::{CommandRegistry, InternalCommand};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::{ProcessRunner, SystemRunner};
use crate::verbosity::Verbosity;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fmt::Display;

/// One scripting session: environment, verbosity, internal commands and the
/// output of the most recent pipeline.
///
/// Sessions are independent; nothing is global. A session is not meant to run
/// two scripts at once.
///
/// Example
/// ```no_run
/// use shell_script::{Interpreter, Verbosity};
/// use shell_script::env::Environment;
///
/// let mut sh = Interpreter::new(Verbosity::Warn, Environment::from_process());
/// let out = sh
///     .run_script("export WHO=$(whoami)\necho hello $WHO")
///     .unwrap();
/// assert!(out.starts_with("hello "));
/// ```
pub struct Interpreter {
    env: Environment,
    verbosity: Verbosity,
    commands: CommandRegistry,
    ignore_errors: bool,
    last_pipe_output: String,
    platform: Platform,
    runner: Box<dyn ProcessRunner>,
    depth: usize,
}

impl Interpreter {
    /// Create a session with the built-in commands, spawning real processes.
    pub fn new(verbosity: Verbosity, env: Environment) -> Self {
        Self {
            env,
            verbosity,
            commands: CommandRegistry::with_builtins(),
            ignore_errors: false,
            last_pipe_output: String::new(),
            platform: Platform::current(),
            runner: Box::new(SystemRunner),
            depth: 0,
        }
    }

    /// Replace how external processes are launched.
    pub fn with_runner(mut self, runner: impl ProcessRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Pin the platform used by `start`.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Register (or replace) an internal command under `name`.
    pub fn register(&mut self, name: impl Into<String>, command: impl InternalCommand + 'static) {
        self.commands.register(name, command);
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    /// When set, a non-zero exit is logged as a warning instead of failing.
    /// The flag is session-wide; callers relaxing it for a few lines must
    /// restore it themselves.
    pub fn ignore_errors(&self) -> bool {
        self.ignore_errors
    }

    pub fn set_ignore_errors(&mut self, ignore: bool) {
        self.ignore_errors = ignore;
    }

    /// Trimmed output of the last pipeline that ran.
    pub fn last_pipe_output(&self) -> &str {
        &self.last_pipe_output
    }

    pub(crate) fn set_last_pipe_output(&mut self, output: String) {
        self.last_pipe_output = output;
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    /// Nesting level of the script currently running, 0 at the top.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn enter_nested(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn leave_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Interleave `fragments` with `values` and run the result as a script.
    ///
    /// `run_template(&["adb pull ", " ", ""], &[&src, &dst])` runs
    /// `adb pull <src> <dst>`. Surplus values are ignored.
    pub fn run_template(
        &mut self,
        fragments: &[&str],
        values: &[&dyn Display],
    ) -> Result<String, ShellError> {
        let mut script = String::new();
        for (i, fragment) in fragments.iter().enumerate() {
            script.push_str(fragment);
            if let Some(value) = values.get(i) {
                script.push_str(&value.to_string());
            }
        }
        if self.verbosity.is_trace() {
            tracing::trace!("template {:?} rendered as [{}]", fragments, script);
        }
        self.run_script(&script)
    }

    /// Read-eval-print loop: every entered line runs as a script in this
    /// session, so exported variables persist. Failures are reported and the
    /// loop goes on.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline("$ ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    match self.run_script(&line) {
                        Ok(output) if !self.verbosity.is_info() && !output.is_empty() => {
                            println!("{}", output);
                        }
                        Ok(_) => {}
                        Err(err) if !self.verbosity.is_error() => eprintln!("error: {}", err),
                        Err(_) => {}
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    /// Info verbosity, an empty environment and the built-in commands.
    fn default() -> Self {
        Self::new(Verbosity::Info, Environment::new())
    }
}
