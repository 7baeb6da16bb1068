//! `$(...)` command substitution and `$NAME` / `${NAME}` expansion.

use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Interpreter;
use std::ops::Range;

impl Interpreter {
    /// Resolve every command substitution and variable reference in `text`.
    ///
    /// Substitutions resolve inside-out: the inner text of `$(...)` is
    /// interpolated first, then executed, as a nested script when it spans
    /// several lines and as a single pipeline otherwise. The trimmed output
    /// replaces the span and scanning resumes right after it instead of at the
    /// start of the text, so output that itself contains `$(` is never
    /// executed. Variables are expanded last; undefined ones become `""`.
    pub fn interpolate(&mut self, text: &str) -> Result<String, ShellError> {
        let mut text = text.to_string();
        let mut cursor = 0;
        while let Some(span) = find_substitution(&text, cursor) {
            let inner = text[span.start + 2..span.end - 1].trim().to_string();
            let resolved = self.interpolate(&inner)?;
            let output = if resolved.contains('\n') {
                self.run_nested_script(&resolved)?
            } else {
                self.run_pipeline(&resolved, "")?
            };
            let output = output.trim();
            text.replace_range(span.clone(), output);
            cursor = span.start + output.len();
        }

        let text = expand_variables(&text, self.env());
        if self.verbosity().is_debug() {
            tracing::debug!("interpolate: {}", text);
        }
        Ok(text)
    }
}

/// Byte range of the first `$( ... )` at or after `from` whose parentheses
/// balance, including the `$(` and the closing `)`.
///
/// Nested parentheses raise the depth; a backslash-escaped parenthesis does
/// not count. A `$(` that never closes is skipped and the search continues
/// after it.
pub(crate) fn find_substitution(text: &str, from: usize) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    let mut start = from;
    while start + 1 < bytes.len() {
        if bytes[start] != b'$' || bytes[start + 1] != b'(' {
            start += 1;
            continue;
        }
        let mut depth = 1usize;
        let mut i = start + 2;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(start..i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        start += 2;
    }
    None
}

/// Replace `$NAME` and `${NAME}` with their values, left to right.
///
/// A name is ASCII letters, digits and underscores, not starting with a digit;
/// the token ends at the first other character, so `$X-suffix` reads `X`.
/// Anything else after `$` is kept literally. Substituted values are not
/// rescanned.
pub(crate) fn expand_variables(text: &str, env: &Environment) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                let name = &braced[..end];
                if identifier_len(name) == name.len() && !name.is_empty() {
                    out.push_str(env.get(name));
                    rest = &braced[end + 1..];
                    continue;
                }
            }
        } else {
            let len = identifier_len(after);
            if len > 0 {
                out.push_str(env.get(&after[..len]));
                rest = &after[len..];
                continue;
            }
        }

        out.push('$');
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Length in bytes of the identifier at the start of `s`, 0 if there is none.
fn identifier_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::testing::RecordingRunner;
    use crate::verbosity::Verbosity;

    fn env() -> Environment {
        [("X", "hello"), ("LONG_NAME_2", "v2"), ("EMPTY", "")]
            .into_iter()
            .collect()
    }

    fn shell() -> (Interpreter, RecordingRunner) {
        let runner = RecordingRunner::default();
        let shell = Interpreter::new(Verbosity::None, env()).with_runner(runner.clone());
        (shell, runner)
    }

    #[test]
    fn text_without_dollar_is_unchanged() {
        let (mut shell, runner) = shell();
        for text in ["", "plain words", "a | b | c", "paren (x) and )(", "100% {braces}"] {
            assert_eq!(shell.interpolate(text).unwrap(), text);
        }
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn expands_plain_and_braced_names() {
        let env = env();
        assert_eq!(expand_variables("$X", &env), "hello");
        assert_eq!(expand_variables("${X}", &env), "hello");
        assert_eq!(expand_variables("$X-world", &env), "hello-world");
        assert_eq!(expand_variables("${X}world", &env), "helloworld");
        assert_eq!(expand_variables("a$LONG_NAME_2.b", &env), "av2.b");
    }

    #[test]
    fn undefined_names_become_empty() {
        let env = env();
        assert_eq!(expand_variables("[$MISSING]", &env), "[]");
        assert_eq!(expand_variables("[${MISSING}]", &env), "[]");
        assert_eq!(expand_variables("[$EMPTY]", &env), "[]");
    }

    #[test]
    fn non_identifiers_stay_literal() {
        let env = env();
        assert_eq!(expand_variables("cost $5", &env), "cost $5");
        assert_eq!(expand_variables("end $", &env), "end $");
        assert_eq!(expand_variables("${unclosed", &env), "${unclosed");
        assert_eq!(expand_variables("${bad-name}", &env), "${bad-name}");
        assert_eq!(expand_variables("$$X", &env), "$hello");
    }

    #[test]
    fn values_are_not_rescanned() {
        let env: Environment = [("A", "$B"), ("B", "nope")].into_iter().collect();
        assert_eq!(expand_variables("$A", &env), "$B");
    }

    #[test]
    fn finds_balanced_spans() {
        assert_eq!(find_substitution("x $(echo a) y", 0), Some(2..11));
        let nested = "$(echo $(date))";
        assert_eq!(find_substitution(nested, 0), Some(0..nested.len()));
        assert_eq!(find_substitution("$(echo (a)) b", 0), Some(0..11));
        assert_eq!(find_substitution("no subst", 0), None);
    }

    #[test]
    fn unterminated_span_never_resolves() {
        assert_eq!(find_substitution("$(echo a", 0), None);
        assert_eq!(find_substitution("$( $(echo a)", 0), Some(3..12));
    }

    #[test]
    fn escaped_parens_do_not_change_depth() {
        let text = r"$(echo \)) tail";
        assert_eq!(find_substitution(text, 0), Some(0..10));
    }

    #[test]
    fn unterminated_substitution_is_left_in_place() {
        let (mut shell, runner) = shell();
        assert_eq!(shell.interpolate("echo $(date").unwrap(), "echo $(date");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn nested_substitutions_resolve_inside_out() {
        let (mut shell, runner) = shell();
        runner.respond("date", "2024-01-01\n");
        let out = shell.interpolate("today: $(echo $(date))").unwrap();
        assert_eq!(out, "today: 2024-01-01");
        assert_eq!(
            runner.calls(),
            vec![
                vec!["date".to_string()],
                vec!["echo".to_string(), "2024-01-01".to_string()],
            ]
        );
    }

    #[test]
    fn variables_inside_substitutions_are_expanded_first() {
        let (mut shell, runner) = shell();
        let out = shell.interpolate("$(echo $X) and ${X}").unwrap();
        assert_eq!(out, "hello and hello");
        assert_eq!(runner.calls()[0], ["echo", "hello"]);
    }

    #[test]
    fn substitution_output_is_not_executed_again() {
        let (mut shell, runner) = shell();
        runner.respond("printer", "$(boom)\n");
        let out = shell.interpolate("got $(printer)").unwrap();
        assert_eq!(out, "got $(boom)");
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn multi_line_substitution_runs_as_script() {
        let (mut shell, runner) = shell();
        let out = shell.interpolate("last=$(echo one\necho two)").unwrap();
        assert_eq!(out, "last=two");
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn substitution_failure_propagates() {
        let (mut shell, runner) = shell();
        runner.fail("broken", 2);
        let err = shell.interpolate("x $(broken) y").unwrap_err();
        assert!(matches!(err, ShellError::CommandFailed { code: 2, .. }), "{err:?}");
    }
}
