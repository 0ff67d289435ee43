//! Stdin/stdout rebinding for the not-yet-exec'd child.
//!
//! A [`Redirections`] plan is built in the parent from the parsed command
//! and applied only inside the forked child, after fork and before
//! program replacement. Opened files are scoped resources: std opens them
//! close-on-exec, `dup2` clears that flag on the rebound copies, so a
//! successful exec closes the originals automatically and a failed later
//! step cannot leak descriptors.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParsedCommand;

/// Created output files: owner-writable, readable by everyone.
const OUTPUT_MODE: u32 = 0o644;

const STDIN_FILENO: RawFd = 0;
const STDOUT_FILENO: RawFd = 1;

/// Redirection failures. Fatal to the child only; the parent learns of
/// them through the wait-status channel.
#[derive(Debug, Error)]
pub enum RedirectError {
    /// The target could not be opened. Rendered with the file's name and
    /// fixed wording, whatever the underlying errno.
    #[error("{}: No such file or directory", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `dup2` refused the rebind.
    #[error("cannot rebind standard descriptor: {0}")]
    Rebind(#[from] nix::errno::Errno),
}

/// Keeps the opened files alive until `execvp` replaces the image.
#[derive(Debug)]
pub struct RedirectGuard {
    _held: Vec<File>,
}

/// The I/O plan for one spawned command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Redirections {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Redirections {
    /// Build the plan for a command.
    ///
    /// A backgrounded command gets an empty plan: it inherits the
    /// terminal's descriptors unchanged. There is no
    /// `/dev/null` fallback, so a chatty background command still writes
    /// to the terminal — see the tests for the shape of that gap.
    pub fn for_command(cmd: &ParsedCommand) -> Self {
        if cmd.background {
            return Self::default();
        }
        Self {
            input: cmd.input.clone(),
            output: cmd.output.clone(),
        }
    }

    /// True when nothing will be rebound.
    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none()
    }

    /// Open the targets and rebind stdin/stdout. Child-side only.
    pub fn apply(&self) -> Result<RedirectGuard, RedirectError> {
        let mut held = Vec::new();

        if let Some(path) = &self.input {
            let file = File::open(path).map_err(|source| RedirectError::Open {
                path: path.clone(),
                source,
            })?;
            nix::unistd::dup2(file.as_raw_fd(), STDIN_FILENO)?;
            held.push(file);
        }

        if let Some(path) = &self.output {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(OUTPUT_MODE)
                .open(path)
                .map_err(|source| RedirectError::Open {
                    path: path.clone(),
                    source,
                })?;
            nix::unistd::dup2(file.as_raw_fd(), STDOUT_FILENO)?;
            held.push(file);
        }

        Ok(RedirectGuard { _held: held })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(input: Option<&str>, output: Option<&str>, background: bool) -> ParsedCommand {
        ParsedCommand {
            argv: vec!["cat".into()],
            input: input.map(PathBuf::from),
            output: output.map(PathBuf::from),
            background,
        }
    }

    #[test]
    fn foreground_plan_carries_both_targets() {
        let plan = Redirections::for_command(&command(Some("in"), Some("out"), false));
        assert_eq!(
            plan,
            Redirections {
                input: Some(PathBuf::from("in")),
                output: Some(PathBuf::from("out")),
            }
        );
    }

    #[test]
    fn background_plan_is_empty() {
        // Known usability gap, reproduced on purpose: a background command
        // keeps the terminal's stdin/stdout instead of /dev/null, so its
        // redirections are dropped entirely.
        let plan = Redirections::for_command(&command(Some("in"), Some("out"), true));
        assert!(plan.is_empty());
    }

    #[test]
    fn open_failure_reports_the_path() {
        let plan = Redirections::for_command(&command(Some("/no/such/file"), None, false));
        match plan.apply() {
            Err(e @ RedirectError::Open { .. }) => {
                assert_eq!(e.to_string(), "/no/such/file: No such file or directory");
            }
            other => panic!("expected open failure, got {other:?}"),
        }
    }
}
