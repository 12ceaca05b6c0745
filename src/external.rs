use crate::command::CommandLine;
use crate::env::Environment;
use crate::error::ShellError;
use crate::redirect::ChildRedirects;
use nix::errno::Errno;
use nix::sys::wait;
use nix::unistd::{self, ForkResult, Pid};
use std::borrow::Cow;
use std::ffi::{CString, OsStr};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Outcome of a successful launch, as seen by the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Launched {
    /// The child ran in the foreground and has been waited for.
    Finished,
    /// The child keeps running; the reaper collects it later.
    Background(Pid),
}

/// Command that is not a builtin.
///
/// Everything the child needs is encoded as C strings before `fork`, so the
/// child only performs system calls until `execve` replaces it.
#[derive(Debug)]
pub(crate) struct ExternalCommand {
    program: CString,
    argv: Vec<CString>,
    envp: Vec<CString>,
    redirects: ChildRedirects,
}

impl ExternalCommand {
    /// Resolve the program and encode argv, environment and redirections.
    ///
    /// A name that cannot be found in `PATH` is kept as-is so the failure is
    /// reported by the child when `execve` rejects it.
    pub(crate) fn prepare(line: &CommandLine, env: &Environment) -> Result<Self, ShellError> {
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let name = Path::new(&line.name);
        let program = find_command_path(OsStr::new(search_paths), name)
            .unwrap_or(Cow::Borrowed(name));
        let program = CString::new(program.as_os_str().as_bytes())?;

        let argv = line
            .args
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut child_env = env.clone();
        if let Some(shell) = env.get_var("shell") {
            child_env.set_var("parent", shell);
        }

        Ok(Self {
            program,
            argv,
            envp: child_env.to_envp(),
            redirects: ChildRedirects::prepare(line)?,
        })
    }

    /// Fork and exec the command.
    ///
    /// In the foreground the parent blocks until this child terminates; its
    /// exit status is only logged. In the background the parent returns at once.
    pub(crate) fn launch(&self, background: bool) -> Result<Launched, ShellError> {
        // Anything still buffered would otherwise be written twice.
        let _ = io::stdout().flush();

        // SAFETY: the child branch only issues async-signal-safe system calls
        // on data prepared before the fork, then execs or exits.
        match unsafe { unistd::fork() }.map_err(ShellError::Fork)? {
            ForkResult::Child => self.exec_child(),
            ForkResult::Parent { child } => {
                tracing::debug!(%child, program = ?self.program, background, "forked");
                if background {
                    Ok(Launched::Background(child))
                } else {
                    wait_for(child)?;
                    Ok(Launched::Finished)
                }
            }
        }
    }

    fn exec_child(&self) -> ! {
        if let Err((path, err)) = self.redirects.install() {
            child_fail(path.to_bytes(), err);
        }
        let err = match unistd::execve(&self.program, &self.argv, &self.envp) {
            Ok(never) => match never {},
            Err(err) => err,
        };
        let name = self.argv.first().unwrap_or(&self.program);
        child_fail(name.to_bytes(), err)
    }
}

/// Report a failure from the forked child and terminate it.
fn child_fail(what: &[u8], err: Errno) -> ! {
    let mut stderr = io::stderr();
    let _ = stderr.write_all(b"myshell: ");
    let _ = stderr.write_all(what);
    let _ = stderr.write_all(b": ");
    let _ = stderr.write_all(err.desc().as_bytes());
    let _ = stderr.write_all(b"\n");
    // SAFETY: `_exit` skips atexit handlers and buffered I/O inherited from the
    // interpreter, which the child must not run.
    unsafe { libc::_exit(1) }
}

fn wait_for(child: Pid) -> Result<(), ShellError> {
    loop {
        match wait::waitpid(child, None) {
            Ok(status) => {
                tracing::debug!(?status, "foreground child finished");
                return Ok(());
            }
            Err(Errno::EINTR) => continue,
            Err(err) => return Err(ShellError::Wait(err)),
        }
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an executable file.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it is an executable file.
/// - `./foo`: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first executable file, skipping directories and entries
///   without an execute bit.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    if path.starts_with("./") && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => {
            // Empty path -> not found
            None
        }
        (Some(x), None) => {
            // Single component -> search in PATH
            find_in_path(search_paths, x.as_os_str()).map(Cow::Owned)
        }
        _ => {
            // Multiple components -> search in current dir
            find_by_path(path).map(Cow::Borrowed)
        }
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let path = dir.join(cmd);
        if let Some(path) = find_by_path(&path) {
            return Some(path.to_owned());
        }
    }
    None
}

/// Accept `path` only if it is a regular file with an execute bit set.
fn find_by_path(path: &Path) -> Option<&Path> {
    let metadata = path.metadata().ok()?;
    if metadata.is_file() && metadata.permissions().mode() & 0o111 != 0 {
        Some(path)
    } else {
        None
    }
}
