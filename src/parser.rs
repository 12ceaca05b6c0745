use crate::command::{CommandLine, OutputTarget};
use crate::lexer::{self, Token};
use std::path::PathBuf;

impl Token {
    /// The source text this token was read from.
    fn text(&self) -> &str {
        match self {
            Token::Word(word) => word,
            Token::RedirectIn => "<",
            Token::RedirectOut => ">",
            Token::RedirectAppend => ">>",
            Token::Background => "&",
        }
    }
}

struct CommandBuilder {
    tokens: Vec<Token>,
    pos: usize,
}

impl CommandBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        CommandBuilder { tokens, pos: 0 }
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Operand of a redirection operator: the very next token, whatever it is.
    fn parse_operand(&mut self, operator: &Token) -> Option<PathBuf> {
        let operand = self.consume().map(|t| PathBuf::from(t.text()));
        if operand.is_none() {
            tracing::warn!(operator = operator.text(), "redirection without a target, ignored");
        }
        operand
    }

    fn build(mut self) -> Option<CommandLine> {
        // The first token names the command even if it looks like an operator.
        let name = self.consume()?.text().to_string();
        let mut line = CommandLine {
            args: vec![name.clone()],
            name,
            input: None,
            output: None,
            background: false,
        };

        while let Some(token) = self.consume() {
            match token {
                Token::Word(word) => line.args.push(word),
                Token::RedirectIn => line.input = self.parse_operand(&token),
                Token::RedirectOut | Token::RedirectAppend => {
                    let append = token == Token::RedirectAppend;
                    line.output = self
                        .parse_operand(&token)
                        .map(|path| OutputTarget { path, append });
                }
                Token::Background => line.background = true,
            }
        }

        Some(line)
    }
}

/// Parses one raw input line into a [`CommandLine`].
///
/// Returns `None` when the line holds no command (empty or whitespace only),
/// in which case nothing should be dispatched.
///
/// Malformed redirections are tolerated: an operator at the end of the line
/// leaves its target unset, and when several output operators appear the last
/// one wins.
pub fn parse_line(line: &str) -> Option<CommandLine> {
    CommandBuilder::from(lexer::split_into_tokens(line)).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_plain_command() {
        let line = parse_line("echo a b c\n").unwrap();
        assert_eq!(line.name, "echo");
        assert_eq!(line.args, args(&["echo", "a", "b", "c"]));
        assert_eq!(line.operands(), &args(&["a", "b", "c"])[..]);
        assert_eq!(line.input, None);
        assert_eq!(line.output, None);
        assert!(!line.background);
    }

    #[test]
    fn test_empty_lines_yield_nothing() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   \t \n").is_none());
    }

    #[test]
    fn test_redirections_and_background_are_consumed() {
        let line = parse_line("sort < in.txt > out.txt & -r").unwrap();
        assert_eq!(line.args, args(&["sort", "-r"]));
        assert_eq!(line.input, Some(PathBuf::from("in.txt")));
        assert_eq!(
            line.output,
            Some(OutputTarget {
                path: PathBuf::from("out.txt"),
                append: false,
            })
        );
        assert!(line.background);
    }

    #[test]
    fn test_last_output_operator_wins() {
        let line = parse_line("echo hi > a >> b").unwrap();
        assert_eq!(
            line.output,
            Some(OutputTarget {
                path: PathBuf::from("b"),
                append: true,
            })
        );

        let line = parse_line("echo hi >> a > b").unwrap();
        assert_eq!(line.output.unwrap().append, false);
    }

    #[test]
    fn test_missing_operand_leaves_target_unset() {
        let line = parse_line("echo hi >").unwrap();
        assert_eq!(line.args, args(&["echo", "hi"]));
        assert_eq!(line.output, None);

        let line = parse_line("cat <").unwrap();
        assert_eq!(line.input, None);

        // A dangling operator also clears an earlier target.
        let line = parse_line("echo hi > a >>").unwrap();
        assert_eq!(line.output, None);
    }

    #[test]
    fn test_operand_is_next_token_even_if_operator() {
        let line = parse_line("echo > &").unwrap();
        assert_eq!(line.output.unwrap().path, PathBuf::from("&"));
        assert!(!line.background);
    }

    #[test]
    fn test_operator_in_command_position_is_the_name() {
        let line = parse_line("> out").unwrap();
        assert_eq!(line.name, ">");
        assert_eq!(line.args, args(&[">", "out"]));
        assert_eq!(line.output, None);
    }

    proptest! {
        #[test]
        fn reparsing_normalized_words_is_stable(
            words in prop::collection::vec("[a-zA-Z0-9./_-]{1,8}", 1..12),
            background in any::<bool>(),
            target in prop::option::of("[a-z]{1,6}"),
        ) {
            let mut raw = words.join(" \t");
            if let Some(t) = &target {
                raw.push_str(" > ");
                raw.push_str(t);
            }
            if background {
                raw.push_str(" &");
            }

            let first = parse_line(&raw).unwrap();
            let second = parse_line(&first.args.join(" ")).unwrap();

            prop_assert_eq!(&first.args, &words);
            prop_assert_eq!(&first.name, &second.name);
            prop_assert_eq!(&first.args, &second.args);
            prop_assert_eq!(first.background, background);
        }
    }
}
