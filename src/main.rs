use anyhow::{Context, Result};
use argh::FromArgs;
use myshell::Interpreter;
use myshell::env::Environment;
use myshell::input::{Batch, Interactive, LineSource};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "MYSHELL_LOG";

#[derive(FromArgs)]
/// A simple command interpreter. Reads commands from the terminal, or from a
/// batch file when one is given.
struct Cli {
    #[argh(positional)]
    /// file to read commands from, one per line, without prompting.
    batchfile: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let shell = std::env::current_exe()
        .and_then(fs::canonicalize)
        .context("cannot resolve own path")?;

    let mut env = Environment::from_process();
    env.set_var("shell", shell.to_string_lossy());
    tracing::debug!(shell = %shell.display(), "starting");

    let mut source: Box<dyn LineSource> = match &cli.batchfile {
        Some(path) => Box::new(Batch::open(path)?),
        None => Box::new(Interactive::new()?),
    };

    Interpreter::new(env).run(source.as_mut(), &mut io::stdout())
}

fn main() -> ExitCode {
    init_tracing();
    // More than one positional argument is a usage error; argh exits with 1.
    let cli: Cli = argh::from_env();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("myshell: {err:#}");
            ExitCode::FAILURE
        }
    }
}
