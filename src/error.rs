use std::ffi::NulError;
use std::io;
use std::path::PathBuf;

/// Recoverable failures of a single dispatched line.
///
/// None of these end the interpreter loop; they are reported and the next line
/// is read. The messages name the failing operation only; the cause is the
/// error source, printed by `{:#}`.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// A `>`/`>>` target could not be opened for a built-in.
    #[error("{}", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// `fork` failed; no child exists.
    #[error("fork")]
    Fork(#[source] nix::Error),
    /// Waiting for a foreground child failed.
    #[error("waitpid")]
    Wait(#[source] nix::Error),
    /// An argument, path or variable cannot be handed to `execve`.
    #[error("invalid argument")]
    InvalidString(#[from] NulError),
}
