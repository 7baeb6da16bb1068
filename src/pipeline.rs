//! Execution of one interpolated line, segment by segment.

use crate::error::ShellError;
use crate::external::ProcessRequest;
use crate::interpreter::Interpreter;

impl Interpreter {
    /// Execute one already-interpolated command line and return the trimmed
    /// output of its last segment.
    pub fn run_line(&mut self, command: &str) -> Result<String, ShellError> {
        self.run_pipeline(command, "")
    }

    /// Run `command` segment by segment; `prefix` decorates stderr and trace
    /// output of spawned processes.
    ///
    /// Each segment starts only after the previous one finished, and receives
    /// its complete output as input.
    pub(crate) fn run_pipeline(&mut self, command: &str, prefix: &str) -> Result<String, ShellError> {
        let command = normalize_command(command);
        let segments = split_segments(&command);
        let total = segments.len();

        let mut piped = String::new();
        for (i, segment) in segments.iter().enumerate() {
            let intermediate = i + 1 < total;
            if intermediate && self.verbosity().is_debug() {
                tracing::debug!("{}[SEGMENT {}/{}]: {}", prefix, i + 1, total, segment);
            }
            let output = self.run_segment(segment, &piped, prefix)?;
            if intermediate && self.verbosity().is_debug() {
                tracing::debug!("{}[SEGMENT {}/{}]: {} =>\n{}", prefix, i + 1, total, segment, output);
            }
            piped = output;
        }

        let result = piped.trim().to_string();
        self.set_last_pipe_output(result.clone());
        Ok(result)
    }

    fn run_segment(&mut self, segment: &str, piped: &str, prefix: &str) -> Result<String, ShellError> {
        let argv: Vec<String> = segment.split_whitespace().map(str::to_string).collect();
        let Some(name) = argv.first() else {
            return Err(ShellError::EmptyCommand);
        };

        if let Some(command) = self.commands().get(name) {
            return command.execute(self, segment, piped.trim());
        }

        let request = ProcessRequest {
            argv: &argv,
            stdin: if piped.is_empty() { None } else { Some(piped) },
            env: self.env(),
            prefix,
            trace_stdout: self.verbosity().is_trace(),
        };
        let output = self.runner().run(&request)?;

        if !output.success() {
            if self.ignore_errors() {
                if self.verbosity().is_warn() {
                    tracing::warn!("Ignored error (exit code {}): {}", output.code, segment);
                }
            } else if !is_tolerated_exit(name, output.code) {
                return Err(ShellError::CommandFailed {
                    command: segment.to_string(),
                    code: output.code,
                });
            }
        }
        Ok(output.stdout.join("\n"))
    }
}

/// `grep` exits with 1 when nothing matched, which is not a failure.
fn is_tolerated_exit(program: &str, code: i32) -> bool {
    program == "grep" && code == 1
}

/// Fold the line onto one row and downgrade `kubectl exec -it` to `-i`: no
/// terminal can be allocated for a process whose stdio is captured.
pub(crate) fn normalize_command(command: &str) -> String {
    let flat = command.replace('\n', " ");
    let flat = flat.trim();
    if !(flat.contains("kubectl exec") && flat.contains("-it")) {
        return flat.to_string();
    }
    flat.split(' ')
        .map(|token| if token == "-it" { "-i" } else { token })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `|`-delimited segments, each trimmed.
pub(crate) fn split_segments(command: &str) -> Vec<&str> {
    command.split('|').map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::external::testing::RecordingRunner;
    use crate::verbosity::Verbosity;

    fn shell() -> (Interpreter, RecordingRunner) {
        let runner = RecordingRunner::default();
        let shell = Interpreter::new(Verbosity::None, Environment::new()).with_runner(runner.clone());
        (shell, runner)
    }

    #[test]
    fn kubectl_exec_it_is_downgraded() {
        assert_eq!(
            normalize_command("kubectl exec -it pod -- ls"),
            "kubectl exec -i pod -- ls"
        );
        assert_eq!(normalize_command("docker run -it img"), "docker run -it img");
        assert_eq!(normalize_command("kubectl exec --items x"), "kubectl exec --items x");
    }

    #[test]
    fn kubectl_argv_reaches_the_runner_rewritten() {
        let (mut shell, runner) = shell();
        shell.run_line("kubectl exec -it my-pod -- cat /etc/hosts").unwrap();
        assert_eq!(
            runner.calls()[0],
            ["kubectl", "exec", "-i", "my-pod", "--", "cat", "/etc/hosts"]
        );
    }

    #[test]
    fn newlines_are_folded_into_one_line() {
        assert_eq!(normalize_command("  echo a\nb  "), "echo a b");
    }

    #[test]
    fn segments_are_trimmed() {
        assert_eq!(split_segments("a x | b |c"), vec!["a x", "b", "c"]);
        assert_eq!(split_segments("single"), vec!["single"]);
    }

    #[test]
    fn each_segment_receives_previous_output() {
        let (mut shell, runner) = shell();
        runner.respond("producer", "one\ntwo\n");
        let out = shell.run_line("producer | cat | cat").unwrap();
        assert_eq!(out, "one\ntwo");
        assert_eq!(
            runner.stdins(),
            vec![None, Some("one\ntwo".to_string()), Some("one\ntwo".to_string())]
        );
        assert_eq!(shell.last_pipe_output(), "one\ntwo");
    }

    #[test]
    fn first_segment_gets_no_input() {
        let (mut shell, runner) = shell();
        shell.run_line("echo hi").unwrap();
        assert_eq!(runner.stdins(), vec![None]);
    }

    #[test]
    fn internal_commands_take_part_in_pipes() {
        let (mut shell, runner) = shell();
        runner.respond("lister", "alpha\nbeta\n\n");
        let out = shell.run_line("lister | assume 2 | cat").unwrap();
        assert_eq!(out, "alpha\nbeta");
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn grep_exit_one_is_tolerated() {
        let (mut shell, runner) = shell();
        runner.fail("grep", 1);
        assert_eq!(shell.run_line("echo abc | grep zzz").unwrap(), "");
    }

    #[test]
    fn grep_exit_two_still_fails() {
        let (mut shell, runner) = shell();
        runner.fail("grep", 2);
        let err = shell.run_line("echo abc | grep zzz").unwrap_err();
        assert!(matches!(err, ShellError::CommandFailed { code: 2, .. }));
    }

    #[test]
    fn other_non_zero_exit_fails_with_segment_text() {
        let (mut shell, runner) = shell();
        runner.fail("false", 1);
        match shell.run_line("echo x | false now").unwrap_err() {
            ShellError::CommandFailed { command, code } => {
                assert_eq!(command, "false now");
                assert_eq!(code, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ignore_errors_keeps_going() {
        let (mut shell, runner) = shell();
        runner.fail("false", 1);
        shell.set_ignore_errors(true);
        assert_eq!(shell.run_line("false | echo after").unwrap(), "after");
    }

    #[test]
    fn empty_segment_is_an_error() {
        let (mut shell, _) = shell();
        assert!(matches!(shell.run_line("echo a | "), Err(ShellError::EmptyCommand)));
        assert!(matches!(shell.run_line(""), Err(ShellError::EmptyCommand)));
    }
}
