use std::path::PathBuf;

/// What the main loop should do after a line has been dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Stop the loop; the interpreter exits normally.
    Quit,
}

/// Destination of a `>` or `>>` redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// File to write to, relative to the working directory at dispatch time.
    pub path: PathBuf,
    /// `true` for `>>` (append), `false` for `>` (truncate).
    pub append: bool,
}

/// One parsed input line, ready to dispatch.
///
/// Built fresh for every non-empty line and discarded after dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// The command word, also stored as `args[0]`.
    pub name: String,
    /// Positional words, command name first. Redirection operators, their
    /// operands and the `&` marker are never part of this list.
    pub args: Vec<String>,
    /// Set by `<`.
    pub input: Option<PathBuf>,
    /// Set by `>` or `>>`; the last operator on the line wins.
    pub output: Option<OutputTarget>,
    /// Set when a bare `&` token appears anywhere after the command word.
    pub background: bool,
}

impl CommandLine {
    /// Arguments after the command name.
    pub fn operands(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }
}
