//! Completion state of a waited-for child.

use std::fmt;

/// How a child process finished: a normal exit code or the number of the
/// signal that terminated it.
///
/// The `Display` form is exactly what the `status` builtin and the
/// background reaper print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Process exited with a status code.
    Exited(i32),
    /// Process was killed by a signal.
    Signaled(i32),
}

impl Default for WaitOutcome {
    /// Before any foreground command has run, `status` reports a clean
    /// exit rather than leftover memory.
    fn default() -> Self {
        WaitOutcome::Exited(0)
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitOutcome::Exited(code) => write!(f, "exit value {code}"),
            WaitOutcome::Signaled(sig) => write!(f, "terminated by signal {sig}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_exit_code() {
        assert_eq!(WaitOutcome::Exited(0).to_string(), "exit value 0");
        assert_eq!(WaitOutcome::Exited(1).to_string(), "exit value 1");
    }

    #[test]
    fn formats_signal_number() {
        assert_eq!(WaitOutcome::Signaled(2).to_string(), "terminated by signal 2");
        assert_eq!(WaitOutcome::Signaled(15).to_string(), "terminated by signal 15");
    }

    #[test]
    fn default_is_clean_exit() {
        assert_eq!(WaitOutcome::default(), WaitOutcome::Exited(0));
    }
}
