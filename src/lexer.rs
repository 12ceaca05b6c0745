//! Lexical analysis (tokenization) of a single command line.
//!
//! Words are separated by runs of spaces and tabs. There is no quoting, escaping
//! or expansion: every token is inspected on its own, and operators are only
//! recognized when a whole token is exactly `<`, `>`, `>>` or `&`.

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Any token that is not an operator.
    Word(String),
    /// Input redirection, `<`.
    RedirectIn,
    /// Output redirection, truncating, `>`.
    RedirectOut,
    /// Output redirection, appending, `>>`.
    RedirectAppend,
    /// Background marker, `&`.
    Background,
}

impl Token {
    fn classify(raw: &str) -> Self {
        match raw {
            "<" => Token::RedirectIn,
            ">" => Token::RedirectOut,
            ">>" => Token::RedirectAppend,
            "&" => Token::Background,
            word => Token::Word(word.to_string()),
        }
    }
}

/// Remove one trailing `\n` (or `\r\n`) if present.
pub fn strip_line_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
        .unwrap_or(line)
}

/// Splits a raw input line into tokens.
///
/// A single trailing line terminator is ignored. An empty or all-whitespace line
/// yields an empty vector.
///
/// # Arguments
/// * `line` - The string to be tokenized.
pub fn split_into_tokens(line: &str) -> Vec<Token> {
    strip_line_terminator(line)
        .split([' ', '\t'])
        .filter(|raw| !raw.is_empty())
        .map(Token::classify)
        .collect()
}
