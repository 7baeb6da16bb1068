//! A small embeddable script runner for driving external tools.
//!
//! Scripts are plain line-oriented text: each line is a command, `|` chains
//! segments, `$(...)` substitutes the output of a command and `$NAME`/`${NAME}`
//! substitute session variables. Lines whose leading word names an internal
//! command (`export`, `assume`, `regexp`, `start`, or anything registered at
//! runtime) are handled in-process; everything else is spawned directly,
//! without a host shell.
//!
//! The main entry point is [`Interpreter`]. The public modules [`command`],
//! [`env`] and [`external`] expose the traits and types needed to add your own
//! internal commands or to replace process spawning.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
mod error;
pub mod external;
mod interpolate;
mod interpreter;
pub mod observability;
mod pipeline;
mod script;
mod verbosity;

pub use builtin::{Builtin, Platform};
pub use error::ShellError;
pub use interpreter::Interpreter;
pub use script::{Statement, parse_script};
pub use verbosity::{ParseVerbosityError, Verbosity};

/// Run a `format!`-style template as a script.
///
/// ```no_run
/// use shell_script::{Interpreter, script};
/// let mut sh = Interpreter::default();
/// let dir = "/tmp";
/// let listing = script!(sh, "ls {}", dir).unwrap();
/// # let _ = listing;
/// ```
#[macro_export]
macro_rules! script {
    ($shell:expr, $($arg:tt)*) => {
        $shell.run_script(&format!($($arg)*))
    };
}
