//! smallsh-kernel: the core of smallsh.
//!
//! This crate provides:
//!
//! - **Lexer**: `$$` pid expansion and whitespace tokenization using logos
//! - **Parser**: turns a token stream into a [`ParsedCommand`]
//! - **Job table**: background pid tracking and the non-blocking reaper
//! - **Signals**: the SIGTSTP-driven foreground-only mode toggle
//! - **Redirection**: scoped stdin/stdout rebinding for the forked child
//! - **Shell**: the dispatcher that ties one interpreter cycle together
//!
//! The outer prompt loop lives in `smallsh-repl`; everything that decides
//! *what happens* to a line of input lives here.

pub mod builtins;
#[cfg(unix)]
pub mod jobs;
pub mod lexer;
pub mod parser;
#[cfg(unix)]
pub mod redirect;
#[cfg(unix)]
pub mod shell;
pub mod signals;
pub mod status;

pub use parser::{ParseError, ParsedCommand};
#[cfg(unix)]
pub use shell::{CycleOutput, Shell};
pub use status::WaitOutcome;
