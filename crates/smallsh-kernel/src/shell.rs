//! The dispatcher: one interpreter cycle from parsed line to reaped jobs.
//!
//! A cycle classifies the line as built-in or external, runs it (waiting
//! for foreground children, recording background ones), then sweeps the
//! job table. Messages are collected in order and printed by the caller
//! after the cycle, which is what keeps background-completion notices
//! from interleaving with the cycle's own output.

use std::ffi::CString;
use std::io::Write;

use nix::errno::Errno;
use nix::libc;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid};
use thiserror::Error;

use crate::builtins::{self, Builtin};
use crate::jobs::JobTable;
use crate::parser::{self, ParsedCommand};
use crate::redirect::Redirections;
use crate::signals;
use crate::status::WaitOutcome;

/// Process creation failed. Fatal to the whole interpreter, unlike every
/// child-local failure.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("fork failed: {0}")]
    Fork(Errno),
}

/// Everything one cycle wants printed, in order, plus whether the
/// interpreter should terminate.
#[derive(Debug, Default)]
pub struct CycleOutput {
    pub messages: Vec<String>,
    pub should_exit: bool,
}

/// The interpreter's cross-cycle state: the background job table and the
/// last foreground outcome that `status` reports.
#[derive(Debug, Default)]
pub struct Shell {
    jobs: JobTable,
    last_status: WaitOutcome,
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shell whose job table holds at most `capacity` background pids.
    pub fn with_job_capacity(capacity: usize) -> Self {
        Self {
            jobs: JobTable::with_capacity(capacity),
            last_status: WaitOutcome::default(),
        }
    }

    /// Outcome of the most recent foreground command.
    pub fn last_status(&self) -> WaitOutcome {
        self.last_status
    }

    /// Number of background jobs currently tracked.
    pub fn background_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Run one interpreter cycle over a raw input line.
    ///
    /// Parse anomalies become messages and the interpreter carries on;
    /// only a failed fork escapes as an error. The reaper sweep runs on
    /// every cycle — blank, comment, and malformed lines included — after
    /// the cycle's own command has been fully handled.
    pub fn run_line(&mut self, line: &str) -> Result<CycleOutput, SpawnError> {
        let mut out = CycleOutput::default();
        match parser::parse_line(line) {
            Ok(None) => {}
            Ok(Some(cmd)) => self.dispatch(cmd, &mut out)?,
            Err(e) => out.messages.push(format!("smallsh: {e}")),
        }
        for done in self.jobs.reap() {
            out.messages
                .push(format!("background pid {} is done: {}", done.pid, done.outcome));
        }
        Ok(out)
    }

    fn dispatch(&mut self, cmd: ParsedCommand, out: &mut CycleOutput) -> Result<(), SpawnError> {
        match Builtin::from_name(&cmd.argv[0]) {
            // cd never backgrounds, even with a trailing `&`.
            Some(Builtin::Cd) => {
                if let Err(e) = builtins::change_directory(&cmd.argv[1..]) {
                    out.messages.push(format!("smallsh: {e}"));
                }
            }
            Some(Builtin::Status) => out.messages.push(self.last_status.to_string()),
            Some(Builtin::Exit) => {
                self.jobs.terminate_all();
                out.should_exit = true;
            }
            None => self.spawn(cmd, out)?,
        }
        Ok(())
    }

    /// Fork and exec an external command.
    #[allow(unsafe_code)]
    fn spawn(&mut self, cmd: ParsedCommand, out: &mut CycleOutput) -> Result<(), SpawnError> {
        // The background request is honored only while foreground-only
        // mode is off; otherwise it is silently dropped.
        let cmd = ParsedCommand {
            background: cmd.background && !signals::foreground_only(),
            ..cmd
        };
        let redirections = Redirections::for_command(&cmd);

        // Arguments with interior NUL bytes can never name an executable;
        // report them like any other unfindable command, without forking.
        let Some(argv) = c_argv(&cmd.argv) else {
            out.messages
                .push(format!("smallsh: {}: No such file or directory", cmd.argv[0]));
            self.last_status = WaitOutcome::Exited(1);
            return Ok(());
        };

        tracing::debug!(command = %cmd.argv[0], background = cmd.background, "spawning");

        // SAFETY: the interpreter's main loop is single-threaded, and the
        // child performs only exec-safe operations (sigaction, open, dup2,
        // execvp) before replacing itself or calling _exit.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => run_child(&cmd.argv[0], &argv, &redirections),
            Ok(ForkResult::Parent { child }) => {
                if cmd.background {
                    match self.jobs.record(child) {
                        Ok(()) => out.messages.push(format!("background pid is {child}")),
                        Err(e) => {
                            // The child is already running; never lose its
                            // pid. Degrade to a foreground wait instead.
                            out.messages
                                .push(format!("smallsh: {e}; running in the foreground"));
                            self.wait_foreground(child, out);
                        }
                    }
                } else {
                    self.wait_foreground(child, out);
                }
                Ok(())
            }
            Err(e) => Err(SpawnError::Fork(e)),
        }
    }

    /// Block until `pid` completes, then record the outcome. Termination
    /// by signal is announced here; a plain exit code is only visible
    /// through `status`.
    fn wait_foreground(&mut self, pid: Pid, out: &mut CycleOutput) {
        let outcome = wait_for(pid);
        self.last_status = outcome;
        if let WaitOutcome::Signaled(sig) = outcome {
            out.messages.push(format!("terminated by signal {sig}"));
        }
    }
}

/// Blocking wait for one specific child.
fn wait_for(pid: Pid) -> WaitOutcome {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return WaitOutcome::Exited(code),
            Ok(WaitStatus::Signaled(_, sig, _)) => return WaitOutcome::Signaled(sig as i32),
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return WaitOutcome::Exited(0),
            Err(e) => {
                tracing::error!("waitpid failed: {e}");
                return WaitOutcome::Exited(1);
            }
        }
    }
}

fn c_argv(argv: &[String]) -> Option<Vec<CString>> {
    argv.iter().map(|arg| CString::new(arg.as_bytes()).ok()).collect()
}

/// Child side of the fork. Restores default SIGINT handling, applies the
/// redirection plan, and replaces the image. Never returns: every failure
/// path ends in `_exit(1)`, the distinguished child-failure status, and
/// the parent learns of it only through the wait-status channel.
#[allow(unsafe_code)]
fn run_child(name: &str, argv: &[CString], redirections: &Redirections) -> ! {
    if let Err(e) = signals::reset_sigint_default() {
        child_fail(&format!("smallsh: cannot reset signal handling: {e}"));
    }

    // The guard keeps the opened files alive until exec closes them.
    let _guard = match redirections.apply() {
        Ok(guard) => guard,
        Err(e) => child_fail(&format!("smallsh: {e}")),
    };

    // execvp only ever returns on failure.
    let _ = unistd::execvp(&argv[0], argv);
    child_fail(&format!("smallsh: {name}: No such file or directory"));
}

/// Report a child-local failure and terminate the child without running
/// the parent's atexit handlers or destructors.
#[allow(unsafe_code)]
fn child_fail(message: &str) -> ! {
    println!("{message}");
    let _ = std::io::stdout().flush();
    // SAFETY: _exit is always safe to call; it only ends this process.
    unsafe { libc::_exit(1) }
}
