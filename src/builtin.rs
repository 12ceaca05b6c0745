use crate::command::Flow;
use crate::env::Environment;
use crate::redirect::OutputSink;
use anyhow::{Context, Result};
use nix::dir::Dir as DirStream;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use std::env;
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};

/// Text shown by `help`.
const HELP_TEXT: &str = include_str!("../resources/help.txt");

/// Pager used by `help` when `PAGER` is not set.
const DEFAULT_PAGER: &str = "more";

/// Terminal sequence for "erase display, cursor home".
const CLEAR_SCREEN: &[u8] = b"\x1b[2J\x1b[H";

/// Built-in commands known to the shell at compile time.
///
/// Builtins run directly in the interpreter process, writing to whatever
/// [`OutputSink`] the dispatcher hands them.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command using provided IO streams and environment.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut OutputSink<'_>,
        env: &mut Environment,
    ) -> Result<Flow>;
}

/// The closed set of built-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Quit,
    Environ,
    Echo,
    Cd,
    Clr,
    Help,
    Pause,
    Dir,
}

impl Builtin {
    /// Exact, case-sensitive lookup of a command name.
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "quit" => Builtin::Quit,
            "environ" => Builtin::Environ,
            "echo" => Builtin::Echo,
            "cd" => Builtin::Cd,
            "clr" => Builtin::Clr,
            "help" => Builtin::Help,
            "pause" => Builtin::Pause,
            "dir" => Builtin::Dir,
            _ => return None,
        })
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Builtin::Quit => Quit::name(),
            Builtin::Environ => Environ::name(),
            Builtin::Echo => Echo::name(),
            Builtin::Cd => Cd::name(),
            Builtin::Clr => Clr::name(),
            Builtin::Help => Help::name(),
            Builtin::Pause => Pause::name(),
            Builtin::Dir => Dir::name(),
        }
    }

    /// Run the built-in with `args` (command name first).
    ///
    /// Arguments beyond the ones a command understands are ignored.
    pub(crate) fn execute(
        self,
        args: &[String],
        stdin: &mut dyn Read,
        stdout: &mut OutputSink<'_>,
        env: &mut Environment,
    ) -> Result<Flow> {
        let first = args.get(1).cloned();
        match self {
            Builtin::Quit => Quit.execute(stdin, stdout, env),
            Builtin::Environ => Environ.execute(stdin, stdout, env),
            Builtin::Echo => Echo {
                args: args.get(1..).unwrap_or_default().to_vec(),
            }
            .execute(stdin, stdout, env),
            Builtin::Cd => Cd { target: first }.execute(stdin, stdout, env),
            Builtin::Clr => Clr.execute(stdin, stdout, env),
            Builtin::Help => Help.execute(stdin, stdout, env),
            Builtin::Pause => Pause.execute(stdin, stdout, env),
            Builtin::Dir => Dir { path: first }.execute(stdin, stdout, env),
        }
    }
}

/// Leave the shell.
pub struct Quit;

impl BuiltinCommand for Quit {
    fn name() -> &'static str {
        "quit"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut OutputSink<'_>,
        _env: &mut Environment,
    ) -> Result<Flow> {
        Ok(Flow::Quit)
    }
}

/// Print every `KEY=VALUE` pair of the environment, one per line.
pub struct Environ;

impl BuiltinCommand for Environ {
    fn name() -> &'static str {
        "environ"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut OutputSink<'_>,
        env: &mut Environment,
    ) -> Result<Flow> {
        for (key, value) in env.iter() {
            writeln!(stdout, "{key}={value}")?;
        }
        Ok(Flow::Continue)
    }
}

/// Write the arguments to standard output, separated by single spaces,
/// followed by a newline.
pub struct Echo {
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut OutputSink<'_>,
        _env: &mut Environment,
    ) -> Result<Flow> {
        writeln!(stdout, "{}", self.args.join(" "))?;
        Ok(Flow::Continue)
    }
}

/// Change the current working directory.
/// If no target is provided, prints the current working directory instead.
pub struct Cd {
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut OutputSink<'_>,
        env: &mut Environment,
    ) -> Result<Flow> {
        let Some(target) = self.target else {
            let cwd = env::current_dir().context("cd: getcwd")?;
            writeln!(stdout, "{}", cwd.display())?;
            return Ok(Flow::Continue);
        };

        env::set_current_dir(&target).with_context(|| format!("cd: {target}"))?;
        let cwd = env::current_dir().context("cd: getcwd")?;
        env.set_var("PWD", cwd.to_string_lossy());
        env.current_dir = cwd;
        Ok(Flow::Continue)
    }
}

/// Clear the terminal.
pub struct Clr;

impl BuiltinCommand for Clr {
    fn name() -> &'static str {
        "clr"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut OutputSink<'_>,
        _env: &mut Environment,
    ) -> Result<Flow> {
        stdout.write_all(CLEAR_SCREEN)?;
        stdout.flush()?;
        Ok(Flow::Continue)
    }
}

/// Show the user manual.
///
/// Redirected output receives the plain text; otherwise the text is piped
/// through a pager so it can be read interactively.
pub struct Help;

impl Help {
    fn page(env: &Environment, stdout: &mut OutputSink<'_>) -> Result<()> {
        let pager = env.get_var("PAGER").unwrap_or(DEFAULT_PAGER);
        stdout.flush()?;

        let mut child = Command::new(pager)
            .stdin(Stdio::piped())
            .envs(env.iter())
            .current_dir(&env.current_dir)
            .spawn()
            .with_context(|| format!("help: {pager}"))?;

        if let Some(mut pipe) = child.stdin.take() {
            match pipe.write_all(HELP_TEXT.as_bytes()) {
                // The pager may quit before reading everything.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                other => other.with_context(|| format!("help: {pager}"))?,
            }
        }

        let status = child.wait().with_context(|| format!("help: {pager}"))?;
        tracing::debug!(%status, pager, "pager finished");
        Ok(())
    }
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut OutputSink<'_>,
        env: &mut Environment,
    ) -> Result<Flow> {
        if stdout.is_redirected() {
            for line in HELP_TEXT.lines() {
                writeln!(stdout, "{line}")?;
            }
        } else {
            Help::page(env, stdout)?;
        }
        Ok(Flow::Continue)
    }
}

/// Wait until the user presses Enter.
pub struct Pause;

impl BuiltinCommand for Pause {
    fn name() -> &'static str {
        "pause"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut OutputSink<'_>,
        _env: &mut Environment,
    ) -> Result<Flow> {
        write!(stdout, "Press Enter to continue...")?;
        stdout.flush()?;

        let mut byte = [0u8; 1];
        loop {
            match stdin.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e).context("pause"),
            }
        }
        Ok(Flow::Continue)
    }
}

/// List the entries of a directory in the order the directory stream
/// returns them.
pub struct Dir {
    /// directory to list; defaults to the current directory.
    pub path: Option<String>,
}

impl BuiltinCommand for Dir {
    fn name() -> &'static str {
        "dir"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut OutputSink<'_>,
        _env: &mut Environment,
    ) -> Result<Flow> {
        let path = self.path.as_deref().unwrap_or(".");
        let mut dir = DirStream::open(
            path,
            OFlag::O_RDONLY | OFlag::O_DIRECTORY | OFlag::O_CLOEXEC,
            Mode::empty(),
        )
        .with_context(|| format!("dir: {path}"))?;

        for entry in dir.iter() {
            let entry = entry.with_context(|| format!("dir: {path}"))?;
            stdout.write_all(entry.file_name().to_bytes())?;
            stdout.write_all(b"\n")?;
        }
        Ok(Flow::Continue)
    }
}
