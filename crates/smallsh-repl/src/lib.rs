//! smallsh prompt loop.
//!
//! Reads one line per cycle, feeds it to the kernel's [`Shell`], and
//! prints whatever the cycle produced. All interpreter semantics live in
//! `smallsh-kernel`; this crate only owns presentation: the prompt, line
//! reading, and message flushing.
//!
//! Plain blocking stdin instead of a line editor on purpose: raw-mode
//! editing would swallow the Ctrl-Z/SIGTSTP delivery the foreground-only
//! toggle depends on. `SA_RESTART` on that handler keeps the blocked
//! read alive across a delivery.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use smallsh_kernel::shell::Shell;
use smallsh_kernel::signals;

/// Fixed prompt printed before every read.
pub const PROMPT: &str = ": ";

/// Run the interpreter until `exit`, end-of-input, or a fatal spawn
/// failure.
pub fn run() -> Result<()> {
    signals::install().context("failed to install signal handlers")?;

    let mut shell = Shell::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        write!(stdout, "{PROMPT}")?;
        stdout.flush()?;

        line.clear();
        let read = stdin.lock().read_line(&mut line)?;
        if read == 0 {
            // End of input is an implicit `exit`: background jobs still
            // get their best-effort SIGTERM.
            tracing::debug!("stdin closed, exiting");
            print_messages(&mut stdout, &shell.run_line("exit")?.messages)?;
            break;
        }

        let out = shell.run_line(line.trim_end_matches('\n'))?;
        print_messages(&mut stdout, &out.messages)?;
        if out.should_exit {
            break;
        }
    }

    Ok(())
}

fn print_messages(stdout: &mut impl Write, messages: &[String]) -> io::Result<()> {
    for message in messages {
        writeln!(stdout, "{message}")?;
    }
    stdout.flush()
}
