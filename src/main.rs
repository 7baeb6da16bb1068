use anyhow::{Context, Result};
use argh::FromArgs;
use shell_script::Verbosity;
use shell_script::config::{SessionConfig, parse_assignment};
use shell_script::observability::init_tracing;
use std::io::Read;
use std::path::PathBuf;

#[derive(FromArgs)]
/// Run a line-oriented script that drives external tools.
///
/// The script is read from --file, else from the positional words joined by
/// spaces, else from standard input. The output of the last line is printed.
struct Args {
    #[argh(option, short = 'l')]
    /// diagnostics threshold: trace, debug, info, warn, error or none.
    log_level: Option<Verbosity>,

    #[argh(switch)]
    /// log failing commands as warnings and keep going.
    ignore_errors: bool,

    #[argh(switch)]
    /// start with an empty variable store instead of the process environment.
    clean_env: bool,

    #[argh(option, short = 'e', from_str_fn(parse_assignment))]
    /// set a session variable, NAME=VALUE; may be repeated.
    var: Vec<(String, String)>,

    #[argh(option, short = 'C')]
    /// working directory for spawned commands.
    dir: Option<PathBuf>,

    #[argh(option, short = 'f')]
    /// read the script from this file.
    file: Option<PathBuf>,

    #[argh(switch, short = 'i')]
    /// read lines interactively.
    interactive: bool,

    #[argh(positional, greedy)]
    /// script text.
    script: Vec<String>,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let mut config = SessionConfig::from_env()?;
    if let Some(level) = args.log_level {
        config.verbosity = level;
    }
    config.ignore_errors |= args.ignore_errors;
    config.inherit_env = !args.clean_env;
    config.vars = args.var;
    config.current_dir = args.dir;

    init_tracing(config.verbosity);
    let mut shell = config.build();

    if args.interactive {
        shell.repl()?;
        return Ok(());
    }

    let script = match (&args.file, args.script.is_empty()) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("can't read script {}", path.display()))?,
        (None, false) => args.script.join(" "),
        (None, true) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("can't read script from stdin")?;
            buf
        }
    };

    let output = shell.run_script(&script)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
