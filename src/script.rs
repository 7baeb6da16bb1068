//! Multi-line scripts: preprocessing into statements and running them in order.

use crate::error::ShellError;
use crate::interpreter::Interpreter;

/// One logical script line after preprocessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// A `#` line; logged, never executed.
    Comment { line: usize, text: String },
    /// A command, possibly merged from several physical lines.
    Command { line: usize, text: String },
}

impl Statement {
    /// 1-based physical line the statement starts on.
    pub fn line(&self) -> usize {
        match self {
            Statement::Comment { line, .. } | Statement::Command { line, .. } => *line,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Statement::Comment { text, .. } | Statement::Command { text, .. } => text,
        }
    }
}

/// Split `script` into statements.
///
/// Blank lines are dropped and every line is trimmed. An `export` line with
/// more `$(` than `)` absorbs the following physical lines, joined by
/// newlines, until the count balances or the script ends.
pub fn parse_script(script: &str) -> Vec<Statement> {
    let raw: Vec<&str> = script.lines().collect();
    let mut statements = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        let line = i + 1;
        let text = raw[i].trim();
        i += 1;
        if text.is_empty() {
            continue;
        }
        if text.starts_with('#') {
            statements.push(Statement::Comment {
                line,
                text: text.to_string(),
            });
            continue;
        }

        let mut text = text.to_string();
        if text.starts_with("export ") && text.contains("$(") {
            while paren_balance(&text) > 0 && i < raw.len() {
                text.push('\n');
                text.push_str(raw[i].trim());
                i += 1;
            }
        }
        statements.push(Statement::Command { line, text });
    }
    statements
}

fn paren_balance(text: &str) -> isize {
    text.matches("$(").count() as isize - text.matches(')').count() as isize
}

impl Interpreter {
    /// Run a multi-line script and return the output of its last statement.
    ///
    /// Statements run strictly in order; the first failure is logged and
    /// returned, and nothing after it runs. An internal command at the start of
    /// a statement receives the previous statement's output as piped input.
    pub fn run_script(&mut self, script: &str) -> Result<String, ShellError> {
        if self.verbosity().is_trace() {
            tracing::trace!("script: [{}]", script);
        }
        let indent = "  ".repeat(self.depth());
        let mut last_output = String::new();
        for statement in parse_script(script) {
            match statement {
                Statement::Comment { text, .. } => {
                    if self.verbosity().is_info() {
                        tracing::info!("{}{}", indent, text);
                    }
                }
                Statement::Command { line, text } => {
                    last_output = self.run_statement(line, &text, &indent, &last_output)?;
                }
            }
        }
        Ok(last_output)
    }

    /// Run `script` one indentation level deeper, as `$(...)` spanning several
    /// lines does.
    pub(crate) fn run_nested_script(&mut self, script: &str) -> Result<String, ShellError> {
        self.enter_nested();
        let result = self.run_script(script);
        self.leave_nested();
        result
    }

    fn run_statement(
        &mut self,
        line: usize,
        raw: &str,
        indent: &str,
        previous: &str,
    ) -> Result<String, ShellError> {
        if self.verbosity().is_debug() {
            tracing::debug!("{}Script: {}", indent, raw);
        }

        let interpolated = match self.interpolate(raw) {
            Ok(text) => text,
            Err(err) => {
                let label = statement_label(first_word(raw), line);
                self.report_failure(indent, &label, &err);
                return Err(err);
            }
        };
        let name = first_word(&interpolated);
        let label = statement_label(name, line);
        let out_prefix = format!("{}{}< ", indent, label);
        if self.verbosity().is_info() {
            tracing::info!("{}{}> {}", indent, label, interpolated);
        }

        let result = match self.commands().get(name) {
            Some(command) => command.execute(self, &interpolated, previous),
            None => self.run_pipeline(&interpolated, &out_prefix),
        };
        match result {
            Ok(output) => {
                if self.verbosity().is_info() {
                    for out_line in output.split('\n') {
                        tracing::info!("{}{}", out_prefix, out_line);
                    }
                }
                Ok(output)
            }
            Err(err) => {
                self.report_failure(indent, &label, &err);
                Err(err)
            }
        }
    }

    fn report_failure(&self, indent: &str, label: &str, err: &ShellError) {
        if self.verbosity().is_error() {
            tracing::error!("{}{}err> {}", indent, label, err);
        }
    }
}

fn first_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

/// `<command>:<line>` padded to a fixed width so log columns line up.
fn statement_label(name: &str, line: usize) -> String {
    format!("{:<10}", format!("{}:{}", name, line))
}
