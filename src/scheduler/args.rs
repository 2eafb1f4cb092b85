//! Argument string tokenization.
//!
//! A raw argument string is split once, at dispatch time, using shell-style
//! quoting:
//!
//! - unquoted whitespace separates tokens
//! - `'...'` keeps its contents literally
//! - `"..."` keeps its contents, except that `\"`, `\\`, `\$` and `` \` ``
//!   are unescaped
//! - outside quotes, `\` escapes the next character; a trailing `\` is kept
//! - a `#` at the start of a word begins a comment running to the end of input
//! - quoted and unquoted pieces that touch form a single token (`a"b c"` is `ab c`)
//!
//! Nothing else is interpreted: there is no variable, glob or command
//! expansion, and the tokens are handed straight to the process argument
//! vector without a shell.

use crate::error::{GonkError, Result};

/// Split `raw` into process arguments.
pub fn split_args(raw: &str) -> Result<Vec<String>> {
    shell_words::split(raw).map_err(|e| GonkError::InvalidArguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(raw: &str) -> Vec<String> {
        split_args(raw).unwrap()
    }

    #[test]
    fn empty_and_blank_strings_have_no_tokens() {
        assert!(split("").is_empty());
        assert!(split("   \t ").is_empty());
    }

    #[test]
    fn splits_on_whitespace_runs() {
        assert_eq!(split("--x 1   --y\t2"), vec!["--x", "1", "--y", "2"]);
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            split(r#"--name "Ada Lovelace" 'a b'"#),
            vec!["--name", "Ada Lovelace", "a b"]
        );
    }

    #[test]
    fn adjacent_pieces_concatenate() {
        assert_eq!(split(r#"--msg="hello world"x"#), vec!["--msg=hello worldx"]);
    }

    #[test]
    fn empty_quotes_make_empty_token() {
        assert_eq!(split(r#"a "" b"#), vec!["a", "", "b"]);
    }

    #[test]
    fn single_quotes_are_literal() {
        assert_eq!(split(r#"'$HOME \n "x"'"#), vec![r#"$HOME \n "x""#]);
    }

    #[test]
    fn escapes() {
        assert_eq!(split(r"a\ b"), vec!["a b"]);
        assert_eq!(split(r#""say \"hi\"""#), vec![r#"say "hi""#]);
        assert_eq!(split(r#""c:\dir""#), vec![r"c:\dir"]);
    }

    #[test]
    fn shell_metacharacters_are_not_interpreted() {
        assert_eq!(split("; rm -rf / | cat"), vec![";", "rm", "-rf", "/", "|", "cat"]);
    }

    #[test]
    fn unbalanced_input_is_rejected() {
        assert!(matches!(
            split_args("'open"),
            Err(GonkError::InvalidArguments(_))
        ));
        assert!(matches!(
            split_args("\"open"),
            Err(GonkError::InvalidArguments(_))
        ));
    }

    #[test]
    fn trailing_backslash_is_literal() {
        assert_eq!(split("trailing\\"), vec!["trailing\\"]);
    }

    #[test]
    fn comments_start_only_at_word_boundaries() {
        assert_eq!(split("a#b c # dropped"), vec!["a#b", "c"]);
    }

    #[test]
    fn quote_escape_inside_single_quotes() {
        assert_eq!(split(r"'it'\''s'"), vec!["it's"]);
    }
}
