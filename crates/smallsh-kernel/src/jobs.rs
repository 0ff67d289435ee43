//! Background job table and the non-blocking reaper.
//!
//! The table is mutated only by the interpreter's main thread — recorded
//! on spawn, pruned by [`JobTable::reap`] — so it needs no locking. The
//! reaper polls `waitpid` with `WNOHANG` and never blocks: a cycle with
//! no finished children costs one syscall.

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use thiserror::Error;

use crate::status::WaitOutcome;

/// Default bound on concurrently tracked background jobs.
pub const MAX_BACKGROUND_JOBS: usize = 512;

/// A background child observed to have finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub pid: Pid,
    pub outcome: WaitOutcome,
}

/// Job table failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    /// The table already tracks its capacity in live jobs.
    #[error("background job table is full ({capacity} jobs)")]
    TableFull { capacity: usize },
}

/// Ordered set of live background pids.
///
/// Every entry was running (or at least unreaped) when recorded; entries
/// leave only through [`JobTable::reap`] after a confirmed completion,
/// so a pid can never be silently lost.
#[derive(Debug)]
pub struct JobTable {
    pids: Vec<Pid>,
    capacity: usize,
}

impl JobTable {
    /// Table with the default capacity, [`MAX_BACKGROUND_JOBS`].
    pub fn new() -> Self {
        Self::with_capacity(MAX_BACKGROUND_JOBS)
    }

    /// Table with an explicit capacity. Zero is allowed and makes every
    /// `record` fail, which the dispatcher turns into a foreground wait.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pids: Vec::new(),
            capacity,
        }
    }

    /// Track a freshly spawned background pid.
    pub fn record(&mut self, pid: Pid) -> Result<(), JobError> {
        if self.pids.len() >= self.capacity {
            return Err(JobError::TableFull {
                capacity: self.capacity,
            });
        }
        tracing::debug!(pid = pid.as_raw(), "recording background job");
        self.pids.push(pid);
        Ok(())
    }

    /// Non-blocking sweep over finished children.
    ///
    /// Polls until no completion is immediately available. Each finished
    /// child is dropped from the table and reported with its outcome.
    pub fn reap(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        loop {
            // -1: any child of this process.
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(pid, code)) => {
                    self.forget(pid);
                    done.push(Completion {
                        pid,
                        outcome: WaitOutcome::Exited(code),
                    });
                }
                Ok(WaitStatus::Signaled(pid, sig, _)) => {
                    self.forget(pid);
                    done.push(Completion {
                        pid,
                        outcome: WaitOutcome::Signaled(sig as i32),
                    });
                }
                // StillAlive: nothing ready right now. Without WUNTRACED
                // no other status can be reported.
                Ok(_) => break,
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => break,
                Err(e) => {
                    tracing::error!("waitpid failed during reap: {e}");
                    break;
                }
            }
        }
        done
    }

    /// Best-effort SIGTERM to every tracked pid. Failures (a pid that
    /// already exited and was reaped) are ignored; this runs on `exit`
    /// when the table is about to be discarded anyway.
    pub fn terminate_all(&mut self) {
        for pid in self.pids.drain(..) {
            if let Err(e) = signal::kill(pid, Signal::SIGTERM) {
                tracing::debug!(pid = pid.as_raw(), "kill on exit failed: {e}");
            }
        }
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> usize {
        self.pids.len()
    }

    /// True when no background job is tracked.
    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn forget(&mut self, pid: Pid) {
        self.pids.retain(|&p| p != pid);
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::process::Command;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use super::*;

    // wait(2) state is shared by the whole test process; tests that spawn
    // or reap children must not interleave.
    static CHILD_LOCK: Mutex<()> = Mutex::new(());

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        CHILD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn spawn(cmd: &str, args: &[&str]) -> std::process::Child {
        Command::new(cmd).args(args).spawn().expect("spawn failed")
    }

    #[test]
    fn record_rejects_overflow() {
        let mut table = JobTable::with_capacity(2);
        assert_eq!(table.record(Pid::from_raw(101)), Ok(()));
        assert_eq!(table.record(Pid::from_raw(102)), Ok(()));
        assert_eq!(
            table.record(Pid::from_raw(103)),
            Err(JobError::TableFull { capacity: 2 })
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn reap_reports_exited_child_and_drops_it() {
        let _guard = lock();
        let child = spawn("true", &[]);
        let pid = Pid::from_raw(child.id() as i32);

        let mut table = JobTable::new();
        table.record(pid).expect("record failed");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut reaped = Vec::new();
        while reaped.is_empty() && Instant::now() < deadline {
            reaped = table.reap();
            std::thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(
            reaped,
            vec![Completion {
                pid,
                outcome: WaitOutcome::Exited(0)
            }]
        );
        assert!(table.is_empty());
    }

    #[test]
    fn reap_with_running_child_reports_nothing() {
        let _guard = lock();
        let mut child = spawn("sleep", &["30"]);
        let pid = Pid::from_raw(child.id() as i32);

        let mut table = JobTable::new();
        table.record(pid).expect("record failed");
        assert!(table.reap().is_empty());
        assert_eq!(table.len(), 1);

        child.kill().expect("kill failed");
        // Leave the corpse to this table, not to std.
        let deadline = Instant::now() + Duration::from_secs(5);
        while table.reap().is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(table.is_empty());
    }

    #[test]
    fn terminate_all_kills_running_and_ignores_dead() {
        let _guard = lock();
        let running = spawn("sleep", &["30"]);
        let running_pid = Pid::from_raw(running.id() as i32);

        let mut dead = spawn("true", &[]);
        dead.wait().expect("wait failed"); // reaped by std; pid is gone
        let dead_pid = Pid::from_raw(dead.id() as i32);

        let mut table = JobTable::new();
        table.record(running_pid).expect("record failed");
        table.record(dead_pid).expect("record failed");

        // Must not panic on the already-reaped pid.
        table.terminate_all();
        assert!(table.is_empty());

        let status = waitpid(running_pid, None).expect("waitpid failed");
        assert_eq!(status, WaitStatus::Signaled(running_pid, Signal::SIGTERM, false));
    }
}
