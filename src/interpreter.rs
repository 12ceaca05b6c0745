use crate::builtin::Builtin;
use crate::command::{CommandLine, Flow};
use crate::env::Environment;
use crate::external::{ExternalCommand, Launched};
use crate::input::LineSource;
use crate::parser::parse_line;
use crate::reaper::reap_zombies;
use crate::redirect::OutputSink;
use anyhow::Result;
use std::io::{self, Write};

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter owns the [`Environment`] that built-ins read and modify and
/// that every external command inherits.
///
/// Example
/// ```
/// use myshell::Interpreter;
/// use myshell::command::Flow;
/// use myshell::env::Environment;
///
/// let mut sh = Interpreter::new(Environment::from_process());
/// let mut out = Vec::new();
/// let flow = sh.execute_line("echo hello   world", &mut out).unwrap();
/// assert_eq!(flow, Flow::Continue);
/// assert_eq!(out, b"hello world\n");
/// ```
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// `>myshell:<absolute-cwd>$ `
    pub fn prompt(&self) -> String {
        let cwd = std::env::current_dir().unwrap_or_else(|_| self.env.current_dir.clone());
        format!(">myshell:{}$ ", cwd.display())
    }

    /// Parse and dispatch one input line.
    ///
    /// `stdout` is the interpreter's current output: built-ins write there unless
    /// redirected, and background launches print their notice there. External
    /// commands write straight to the process's own descriptors.
    ///
    /// Errors are per-command failures; the caller reports them and carries on.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Write) -> Result<Flow> {
        let Some(command) = parse_line(line) else {
            return Ok(Flow::Continue);
        };
        match Builtin::lookup(&command.name) {
            Some(builtin) => self.run_builtin(builtin, &command, stdout),
            None => self.run_external(&command, stdout),
        }
    }

    fn run_builtin(
        &mut self,
        builtin: Builtin,
        command: &CommandLine,
        stdout: &mut dyn Write,
    ) -> Result<Flow> {
        tracing::debug!(
            builtin = builtin.name(),
            output = ?command.output,
            "dispatching built-in"
        );
        if command.input.is_some() {
            tracing::debug!("input redirection has no effect on built-ins");
        }

        // The sink (and any file behind it) is released when this scope ends.
        let mut sink = OutputSink::open(command.output.as_ref(), stdout)?;
        let mut stdin = io::stdin().lock();
        let flow = builtin.execute(&command.args, &mut stdin, &mut sink, &mut self.env)?;
        sink.flush()?;
        Ok(flow)
    }

    fn run_external(&mut self, command: &CommandLine, stdout: &mut dyn Write) -> Result<Flow> {
        tracing::debug!(name = %command.name, background = command.background, "dispatching external");
        let external = ExternalCommand::prepare(command, &self.env)?;
        stdout.flush()?;

        if let Launched::Background(pid) = external.launch(command.background)? {
            writeln!(stdout, "[background pid {pid}]")?;
            stdout.flush()?;
        }
        Ok(Flow::Continue)
    }

    /// Main loop: reap finished children, prompt, read, dispatch.
    ///
    /// Returns when `quit` runs or the source reaches end of input. Per-command
    /// failures are printed to standard error and do not stop the loop; only a
    /// failure to read input does.
    pub fn run(&mut self, source: &mut dyn LineSource, stdout: &mut dyn Write) -> Result<()> {
        loop {
            let reaped = reap_zombies();
            if reaped > 0 {
                tracing::debug!(reaped, "collected background children");
            }

            let prompt = if source.wants_prompt() {
                self.prompt()
            } else {
                String::new()
            };
            let Some(line) = source.read_line(&prompt)? else {
                tracing::debug!("end of input");
                return Ok(());
            };

            match self.execute_line(&line, stdout) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => return Ok(()),
                Err(err) => eprintln!("myshell: {err:#}"),
            }
        }
    }
}
