//! Signal disposition and the foreground-only mode toggle.
//!
//! SIGTSTP flips a process-wide flag that makes the dispatcher ignore
//! trailing `&` markers; SIGINT is ignored by the interpreter itself and
//! restored to default in every spawned child.
//!
//! Signal disposition (`sigaction`) requires unsafe per POSIX. This module
//! and the fork in `shell` are the only places in smallsh that use unsafe
//! code, each limited to well-understood patterns every shell must perform.

#[cfg(unix)]
#[allow(unsafe_code)]
mod unix {
    use std::os::unix::io::BorrowedFd;
    use std::sync::atomic::{AtomicBool, Ordering};

    use nix::libc;
    use nix::sys::signal::{self, SigHandler, Signal};

    /// Process-wide foreground-only flag.
    ///
    /// Single asynchronous writer (the SIGTSTP handler), single reader
    /// (the dispatcher). Rust atomics are async-signal-safe, and `SeqCst`
    /// makes the handler's flip visible to the next dispatcher load.
    static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);

    /// Fixed notices, prompt included: the interrupted prompt read resumes
    /// without reprinting one.
    const ENTER_NOTICE: &[u8] = b"Entering foreground-only mode (& is now ignored)\n: ";
    const EXIT_NOTICE: &[u8] = b"Exiting foreground-only mode\n: ";

    fn stdout_fd() -> BorrowedFd<'static> {
        // SAFETY: stdout (fd 1) is valid for the lifetime of the process.
        unsafe { BorrowedFd::borrow_raw(1) }
    }

    /// SIGTSTP handler. May run at an arbitrary point in the main loop, so
    /// it is restricted to async-signal-safe operations: one atomic
    /// read-modify-write and one raw `write(2)`.
    extern "C" fn handle_sigtstp(_sig: libc::c_int) {
        let was_on = FOREGROUND_ONLY.fetch_xor(true, Ordering::SeqCst);
        let notice = if was_on { EXIT_NOTICE } else { ENTER_NOTICE };
        let _ = nix::unistd::write(stdout_fd(), notice);
    }

    /// Whether background requests are currently suppressed.
    pub fn foreground_only() -> bool {
        FOREGROUND_ONLY.load(Ordering::SeqCst)
    }

    /// Install the interpreter's signal disposition:
    ///
    /// - SIGTSTP toggles foreground-only mode. `SA_RESTART` keeps the
    ///   blocked prompt read alive across the delivery.
    /// - SIGINT is ignored, so an interrupt at the prompt never kills the
    ///   interpreter. Spawned children undo this via
    ///   [`reset_sigint_default`] before program replacement.
    pub fn install() -> nix::Result<()> {
        // SAFETY: the handler only performs async-signal-safe operations;
        // see handle_sigtstp. All signals are masked while it runs.
        unsafe {
            signal::sigaction(
                Signal::SIGTSTP,
                &signal::SigAction::new(
                    SigHandler::Handler(handle_sigtstp),
                    signal::SaFlags::SA_RESTART,
                    signal::SigSet::all(),
                ),
            )?;
        }
        ignore_signal(Signal::SIGINT)
    }

    /// Restore default SIGINT handling. Runs in the forked child before
    /// exec so an interrupt delivered while a foreground command runs
    /// terminates that command normally.
    pub fn reset_sigint_default() -> nix::Result<()> {
        // SAFETY: SIG_DFL restores the default disposition. No handler
        // code of ours can run afterwards.
        unsafe {
            signal::sigaction(
                Signal::SIGINT,
                &signal::SigAction::new(
                    SigHandler::SigDfl,
                    signal::SaFlags::empty(),
                    signal::SigSet::empty(),
                ),
            )?;
        }
        Ok(())
    }

    /// Set a signal to SIG_IGN.
    fn ignore_signal(sig: Signal) -> nix::Result<()> {
        // SAFETY: SIG_IGN is a well-defined, safe signal disposition.
        // No custom handler code is executed.
        unsafe {
            signal::sigaction(
                sig,
                &signal::SigAction::new(
                    SigHandler::SigIgn,
                    signal::SaFlags::empty(),
                    signal::SigSet::empty(),
                ),
            )?;
        }
        Ok(())
    }
}

#[cfg(unix)]
pub use unix::{foreground_only, install, reset_sigint_default};
