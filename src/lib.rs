//! A small line-oriented command interpreter.
//!
//! Each input line is split into a command word, its arguments, optional
//! `<`, `>` and `>>` redirections and an optional `&` background marker.
//! A fixed set of built-in commands runs inside the interpreter process;
//! everything else is forked and exec'd as an external program. Finished
//! background children are reclaimed before every prompt.
//!
//! The main entry point is [`Interpreter`], which owns the [`env::Environment`]
//! and drives lines from any [`input::LineSource`].

mod builtin;
pub mod command;
pub mod env;
mod error;
mod external;
pub mod input;
mod interpreter;
mod lexer;
mod parser;
pub mod reaper;
mod redirect;
#[cfg(test)]
mod testutil;

/// Just a convenient re-export of the line interpreter.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
