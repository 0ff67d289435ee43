//! Lexer for smallsh input lines.
//!
//! Two stages: [`expand_pid`] rewrites every `$$` into the interpreter's
//! process id over the raw line, then [`tokenize`] splits the result with
//! logos. Redirection markers and `&` are tokens only when they stand
//! alone between blanks — `a>b` is a single word, matching whitespace-split
//! shell semantics.

use logos::Logos;

/// A token of a command line.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
pub enum Token {
    /// Input redirection marker, `<`.
    #[token("<")]
    RedirectIn,

    /// Output redirection marker, `>`.
    #[token(">")]
    RedirectOut,

    /// Background marker, `&`.
    #[token("&")]
    Ampersand,

    /// Any other whitespace-delimited run of characters.
    ///
    /// Longest-match beats the single-character tokens above, so `<`, `>`
    /// and `&` embedded in a longer run stay part of the word. The lowered
    /// priority lets the exact markers win when the lengths tie.
    #[regex(r"[^ \t\r\n]+", |lex| lex.slice().to_owned(), priority = 1)]
    Word(String),
}

/// Replace every occurrence of `$$` in `line` with the decimal `pid`.
///
/// Single-pass builder: the output is never re-scanned, so substitutions
/// whose replacement differs in length from `$$` cannot corrupt later
/// matches. `$$$$` expands to two pids, `$$$` to a pid followed by `$`,
/// and a `$$` at the very end of the line is handled like any other.
pub fn expand_pid(line: &str, pid: u32) -> String {
    let pid = pid.to_string();
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(idx) = rest.find("$$") {
        out.push_str(&rest[..idx]);
        out.push_str(&pid);
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    out
}

/// Tokenize an (already expanded) line.
///
/// The word pattern covers every non-blank byte sequence, so lexing
/// cannot fail and errors from logos are unreachable.
pub fn tokenize(line: &str) -> Vec<Token> {
    Token::lexer(line).flatten().collect()
}
