//! Standard input/output redirection.
//!
//! Built-ins never touch the real descriptors: they write into an
//! [`OutputSink`], which is either the interpreter's current output or a file
//! opened for this one command. The file is released when the sink is dropped,
//! on every exit path. External commands get their redirections installed on
//! descriptors 0 and 1 inside the forked child, right before `execve`.

use crate::command::{CommandLine, OutputTarget};
use crate::error::ShellError;
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::unistd;
use std::ffi::{CStr, CString};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

const CREATE_MODE: u32 = 0o644;

/// Output destination of one built-in invocation.
pub enum OutputSink<'a> {
    /// Whatever the interpreter currently writes to.
    Inherited(&'a mut dyn Write),
    /// A `>`/`>>` target, owned for the duration of the command.
    File(File),
}

impl<'a> OutputSink<'a> {
    /// Resolve the sink for a command: the redirection target when there is one,
    /// `inherited` otherwise.
    ///
    /// Fails without side effects on `inherited` when the target cannot be opened.
    pub fn open(
        target: Option<&OutputTarget>,
        inherited: &'a mut dyn Write,
    ) -> Result<Self, ShellError> {
        match target {
            None => Ok(OutputSink::Inherited(inherited)),
            Some(target) => open_target(target).map(OutputSink::File),
        }
    }

    /// Whether output goes somewhere other than the interpreter's own output.
    pub fn is_redirected(&self) -> bool {
        matches!(self, OutputSink::File(_))
    }
}

impl Write for OutputSink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Inherited(w) => w.write(buf),
            OutputSink::File(f) => f.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Inherited(w) => w.flush(),
            OutputSink::File(f) => f.flush(),
        }
    }
}

fn open_target(target: &OutputTarget) -> Result<File, ShellError> {
    let mut options = OpenOptions::new();
    options.create(true).mode(CREATE_MODE);
    if target.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(&target.path).map_err(|source| ShellError::Redirect {
        path: target.path.clone(),
        source,
    })
}

fn path_to_cstring(path: &Path) -> Result<CString, ShellError> {
    Ok(CString::new(path.as_os_str().as_bytes())?)
}

/// Redirections of an external command, encoded up front so that the forked
/// child only has to issue system calls.
#[derive(Debug, Default)]
pub(crate) struct ChildRedirects {
    input: Option<CString>,
    output: Option<(CString, bool)>,
}

impl ChildRedirects {
    pub(crate) fn prepare(line: &CommandLine) -> Result<Self, ShellError> {
        let input = line.input.as_deref().map(path_to_cstring).transpose()?;
        let output = line
            .output
            .as_ref()
            .map(|t| path_to_cstring(&t.path).map(|p| (p, t.append)))
            .transpose()?;
        Ok(Self { input, output })
    }

    /// Open the files and install them as descriptors 0 and 1.
    ///
    /// Only meant to run in the child between `fork` and `execve`. On failure
    /// returns the path that could not be set up.
    pub(crate) fn install(&self) -> Result<(), (&CStr, nix::Error)> {
        if let Some(path) = &self.input {
            let fd = fcntl::open(path.as_c_str(), OFlag::O_RDONLY, Mode::empty())
                .map_err(|e| (path.as_c_str(), e))?;
            move_fd(fd, libc::STDIN_FILENO).map_err(|e| (path.as_c_str(), e))?;
        }
        if let Some((path, append)) = &self.output {
            let mode = if *append { OFlag::O_APPEND } else { OFlag::O_TRUNC };
            let fd = fcntl::open(
                path.as_c_str(),
                OFlag::O_WRONLY | OFlag::O_CREAT | mode,
                Mode::from_bits_truncate(CREATE_MODE as libc::mode_t),
            )
            .map_err(|e| (path.as_c_str(), e))?;
            move_fd(fd, libc::STDOUT_FILENO).map_err(|e| (path.as_c_str(), e))?;
        }
        Ok(())
    }
}

fn move_fd(fd: RawFd, target: RawFd) -> nix::Result<()> {
    if fd != target {
        unistd::dup2(fd, target)?;
        unistd::close(fd)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn target(path: PathBuf, append: bool) -> OutputTarget {
        OutputTarget { path, append }
    }

    #[test]
    fn test_no_target_uses_inherited_output() {
        let mut buf = Vec::new();
        {
            let mut sink = OutputSink::open(None, &mut buf).unwrap();
            assert!(!sink.is_redirected());
            write!(sink, "hello").unwrap();
        }
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn test_truncate_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "old contents\n").unwrap();

        let mut terminal = Vec::new();
        {
            let mut sink =
                OutputSink::open(Some(&target(path.clone(), false)), &mut terminal).unwrap();
            assert!(sink.is_redirected());
            writeln!(sink, "first").unwrap();
        }
        {
            let mut sink =
                OutputSink::open(Some(&target(path.clone(), true)), &mut terminal).unwrap();
            writeln!(sink, "second").unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert!(terminal.is_empty());
    }

    #[test]
    fn test_unopenable_target_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");

        let mut terminal = Vec::new();
        let err = OutputSink::open(Some(&target(path.clone(), false)), &mut terminal)
            .err()
            .unwrap();
        match err {
            ShellError::Redirect { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_prepare_child_redirects() {
        let line = crate::parser::parse_line("sort < in >> out").unwrap();
        let redirects = ChildRedirects::prepare(&line).unwrap();
        assert_eq!(redirects.input.as_deref(), Some(c"in"));
        assert_eq!(
            redirects.output.as_ref().map(|(p, a)| (p.as_c_str(), *a)),
            Some((c"out", true))
        );
    }
}
