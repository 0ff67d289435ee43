//! Parser for smallsh command lines.
//!
//! Transforms the token stream from the lexer into a [`ParsedCommand`]:
//! an argument vector plus optional redirection targets and a background
//! flag. Blank lines and comments parse to `None` and cost the cycle
//! nothing.

use std::path::PathBuf;

use thiserror::Error;

use crate::lexer::{self, Token};

/// Longest accepted input line, in bytes, before `$$` expansion.
pub const MAX_LINE_LEN: usize = 2048;

/// Most arguments a single command may carry.
pub const MAX_ARGS: usize = 512;

/// One fully parsed command line, ready for dispatch.
///
/// Invariant: `argv` is never empty — a line that reduces to nothing is a
/// parse error, and a blank or comment line never produces a
/// `ParsedCommand` at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Command name followed by its arguments.
    pub argv: Vec<String>,
    /// Path whose contents become the command's standard input.
    pub input: Option<PathBuf>,
    /// Path that receives the command's standard output.
    pub output: Option<PathBuf>,
    /// Trailing `&` was present. The dispatcher still consults the
    /// foreground-only flag before honoring it.
    pub background: bool,
}

/// Parse anomalies. All are local to one line: the interpreter reports
/// them and reads the next prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Line longer than [`MAX_LINE_LEN`] bytes.
    #[error("input line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    /// More than [`MAX_ARGS`] arguments.
    #[error("too many arguments (limit is {limit})")]
    TooManyArguments { limit: usize },

    /// `<` or `>` with no file name after it.
    #[error("missing file name after `{marker}`")]
    MissingRedirectTarget { marker: char },

    /// The line held only redirections or a lone `&`.
    #[error("missing command name")]
    MissingCommand,
}

/// Parse one raw input line.
///
/// Returns `Ok(None)` for a blank line or a comment (first non-space
/// character is `#`). Every `$$` in the line is expanded to this
/// process's pid before tokenization.
pub fn parse_line(line: &str) -> Result<Option<ParsedCommand>, ParseError> {
    parse_line_with_pid(line, std::process::id())
}

/// [`parse_line`] with an explicit pid, so expansion is testable.
pub fn parse_line_with_pid(line: &str, pid: u32) -> Result<Option<ParsedCommand>, ParseError> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    if line.len() > MAX_LINE_LEN {
        return Err(ParseError::LineTooLong { limit: MAX_LINE_LEN });
    }

    let expanded = lexer::expand_pid(line, pid);
    let mut tokens = lexer::tokenize(&expanded).into_iter();

    let mut argv: Vec<String> = Vec::new();
    let mut input = None;
    let mut output = None;

    while let Some(token) = tokens.next() {
        match token {
            Token::RedirectIn => input = Some(redirect_target(&mut tokens, '<')?),
            Token::RedirectOut => output = Some(redirect_target(&mut tokens, '>')?),
            // A `&` that is not the last argument is plain text; the
            // trailing-position check below decides whether it backgrounds.
            Token::Ampersand => argv.push("&".into()),
            Token::Word(word) => argv.push(word),
        }
        if argv.len() > MAX_ARGS {
            return Err(ParseError::TooManyArguments { limit: MAX_ARGS });
        }
    }

    let background = match argv.last().map(String::as_str) {
        Some("&") => {
            argv.pop();
            true
        }
        _ => false,
    };

    if argv.is_empty() {
        return Err(ParseError::MissingCommand);
    }

    Ok(Some(ParsedCommand {
        argv,
        input,
        output,
        background,
    }))
}

/// Pull the token after a redirection marker and require it to be a word.
fn redirect_target(
    tokens: &mut impl Iterator<Item = Token>,
    marker: char,
) -> Result<PathBuf, ParseError> {
    match tokens.next() {
        Some(Token::Word(path)) => Ok(PathBuf::from(path)),
        _ => Err(ParseError::MissingRedirectTarget { marker }),
    }
}
