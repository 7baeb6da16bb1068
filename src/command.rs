use crate::builtin::Builtin;
use crate::error::ShellError;
use crate::interpreter::Interpreter;
use std::collections::HashMap;
use std::rc::Rc;

/// A pseudo-process intercepted by name before anything is spawned.
///
/// `segment` is the full segment (or statement) text including the command
/// name; handlers re-parse their own arguments from it. `piped_input` is the
/// trimmed output of the previous segment or statement, empty when there is
/// none. The returned string becomes the segment's output.
///
/// Handlers receive the whole [`Interpreter`] so they can interpolate text,
/// run nested lines or update the session [`Environment`](crate::env::Environment).
pub trait InternalCommand {
    fn execute(
        &self,
        shell: &mut Interpreter,
        segment: &str,
        piped_input: &str,
    ) -> Result<String, ShellError>;
}

impl<F> InternalCommand for F
where
    F: Fn(&mut Interpreter, &str, &str) -> Result<String, ShellError>,
{
    fn execute(
        &self,
        shell: &mut Interpreter,
        segment: &str,
        piped_input: &str,
    ) -> Result<String, ShellError> {
        self(shell, segment, piped_input)
    }
}

/// Mapping from a leading token to its internal command.
///
/// Names are unique; registering an existing name replaces the previous
/// handler.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Rc<dyn InternalCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every [`Builtin`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for builtin in Builtin::ALL {
            registry.register(builtin.name(), builtin);
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, command: impl InternalCommand + 'static) {
        self.commands.insert(name.into(), Rc::new(command));
    }

    /// Register a closure; its signature is inferred from this bound.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, command: F)
    where
        F: Fn(&mut Interpreter, &str, &str) -> Result<String, ShellError> + 'static,
    {
        self.register(name, command);
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.commands.remove(name).is_some()
    }

    /// Handler registered under `name`; the handle outlives the borrow of the
    /// registry so it can be invoked with the interpreter that owns it.
    pub fn get(&self, name: &str) -> Option<Rc<dyn InternalCommand>> {
        self.commands.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(_: &mut Interpreter, _: &str, piped: &str) -> Result<String, ShellError> {
        Ok(piped.to_uppercase())
    }

    #[test]
    fn builtins_are_registered_by_name() {
        let registry = CommandRegistry::with_builtins();
        for name in ["start", "export", "assume", "regexp"] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert!(!registry.contains("echo"));
    }

    #[test]
    fn later_registration_overwrites_earlier() {
        let mut registry = CommandRegistry::new();
        registry.register_fn("x", |_, _, _| Ok("first".to_string()));
        registry.register_fn("x", |_, _, _| Ok("second".to_string()));
        assert_eq!(registry.names().count(), 1);

        let mut shell = Interpreter::default();
        let out = registry.get("x").unwrap().execute(&mut shell, "x", "").unwrap();
        assert_eq!(out, "second");
    }

    #[test]
    fn plain_functions_are_commands() {
        let mut registry = CommandRegistry::new();
        registry.register("upper", upper);
        let mut shell = Interpreter::default();
        let out = registry
            .get("upper")
            .unwrap()
            .execute(&mut shell, "upper", "abc")
            .unwrap();
        assert_eq!(out, "ABC");
        assert!(registry.unregister("upper"));
        assert!(registry.get("upper").is_none());
    }
}
