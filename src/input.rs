//! Where command lines come from.

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// A supplier of input lines for the interpreter loop.
pub trait LineSource {
    /// Whether a prompt should be displayed before each read.
    fn wants_prompt(&self) -> bool;

    /// Read the next line, showing `prompt` if the source displays one.
    ///
    /// `Ok(None)` means end of input, which ends the loop like `quit`.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Lines typed at the terminal, with line editing and in-memory history.
pub struct Interactive {
    editor: DefaultEditor,
}

impl Interactive {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("cannot initialise line editor")?;
        Ok(Self { editor })
    }
}

impl LineSource for Interactive {
    fn wants_prompt(&self) -> bool {
        true
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            // Invalid UTF-8. The line is consumed and the loop goes on.
            Err(ReadlineError::Io(err)) if err.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(%err, "discarding unreadable input line");
                Ok(Some(String::new()))
            }
            Err(err) => Err(err).context("cannot read input"),
        }
    }
}

/// Lines read from a file (or any buffered reader) without a prompt.
pub struct Batch<R> {
    reader: R,
}

impl Batch<BufReader<File>> {
    /// Open a batch file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| path.display().to_string())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Batch<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for Batch<R> {
    fn wants_prompt(&self) -> bool {
        false
    }

    /// Bytes that are not valid UTF-8 are replaced with U+FFFD.
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let mut buf = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut buf)
            .context("cannot read batch input")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}
