//! Built-in commands.
//!
//! Three commands run inside the interpreter's own process instead of a
//! child: `cd`, `status`, and `exit`. `status` and `exit` are thin reads
//! over dispatcher state and live in `shell`; the directory change and
//! its error taxonomy live here.

use std::path::PathBuf;

use thiserror::Error;

/// A command name the dispatcher must not hand to exec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Status,
    Exit,
}

impl Builtin {
    /// Classify a command name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Builtin::Cd),
            "status" => Some(Builtin::Status),
            "exit" => Some(Builtin::Exit),
            _ => None,
        }
    }
}

/// Directory-change failures. Reported, never fatal: the interpreter
/// keeps its working directory and reads the next prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CdError {
    #[error("cd: too many arguments")]
    TooManyArguments,

    #[error("cd: No such file or directory")]
    NoSuchDirectory,

    /// Bare `cd` with no home directory to fall back to.
    #[error("cd: HOME not set")]
    HomeNotSet,
}

/// Change the interpreter's working directory.
///
/// `args` are the words after `cd`. With none, the target is `$HOME`;
/// with one, that path; more than one is rejected outright rather than
/// only after a failed change.
pub fn change_directory(args: &[String]) -> Result<(), CdError> {
    let target = match args {
        [] => PathBuf::from(std::env::var("HOME").map_err(|_| CdError::HomeNotSet)?),
        [path] => PathBuf::from(path),
        _ => return Err(CdError::TooManyArguments),
    };
    std::env::set_current_dir(&target).map_err(|_| CdError::NoSuchDirectory)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // The working directory is process state shared by every test thread.
    static CWD_LOCK: Mutex<()> = Mutex::new(());

    /// Run `f` with the cwd saved and restored.
    fn with_cwd_guard(f: impl FnOnce()) {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved = std::env::current_dir().expect("cwd unavailable");
        f();
        std::env::set_current_dir(saved).expect("cwd restore failed");
    }

    #[test]
    fn classifies_builtin_names() {
        assert_eq!(Builtin::from_name("cd"), Some(Builtin::Cd));
        assert_eq!(Builtin::from_name("status"), Some(Builtin::Status));
        assert_eq!(Builtin::from_name("exit"), Some(Builtin::Exit));
        assert_eq!(Builtin::from_name("ls"), None);
        assert_eq!(Builtin::from_name("CD"), None);
    }

    #[test]
    fn cd_with_path_changes_directory() {
        with_cwd_guard(|| {
            let dir = tempfile::tempdir().expect("tempdir failed");
            let path = dir.path().canonicalize().expect("canonicalize failed");
            change_directory(&[path.to_string_lossy().into_owned()]).expect("cd failed");
            assert_eq!(std::env::current_dir().expect("cwd unavailable"), path);
        });
    }

    #[test]
    fn cd_missing_directory_leaves_cwd_unchanged() {
        with_cwd_guard(|| {
            let before = std::env::current_dir().expect("cwd unavailable");
            let result = change_directory(&["/definitely/not/a/dir".into()]);
            assert_eq!(result, Err(CdError::NoSuchDirectory));
            assert_eq!(std::env::current_dir().expect("cwd unavailable"), before);
        });
    }

    #[test]
    fn cd_rejects_extra_arguments() {
        assert_eq!(
            change_directory(&["a".into(), "b".into()]),
            Err(CdError::TooManyArguments)
        );
    }

    #[test]
    fn cd_error_messages_match_the_shell_prefix_convention() {
        assert_eq!(CdError::NoSuchDirectory.to_string(), "cd: No such file or directory");
        assert_eq!(CdError::TooManyArguments.to_string(), "cd: too many arguments");
        assert_eq!(CdError::HomeNotSet.to_string(), "cd: HOME not set");
    }
}
