//! git::runner
//!
//! External command execution.
//!
//! Every subprocess spawned by gitvendor goes through a [`CommandRunner`].
//! Invocations are synchronous: the calling thread blocks until the child
//! exits. There are no retries.
//!
//! The trait exists so that the check pipeline and the vendor cache can be
//! driven by a recording runner in tests; production code uses
//! [`SystemRunner`].

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// A command exited non-zero or could not be started.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} failed ({}): {}", .argv.join(" "), exit_description(.exit_code), .stderr.trim())]
pub struct CommandFailure {
    /// Program and arguments as invoked
    pub argv: Vec<String>,
    /// Exit code, or `None` if the process never ran or was killed by a signal
    pub exit_code: Option<i32>,
    /// Captured standard error (or the spawn error message)
    pub stderr: String,
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

/// Executes external commands.
pub trait CommandRunner: std::fmt::Debug + Send + Sync {
    /// Run `argv` (program first) in `cwd`, returning captured stdout.
    ///
    /// # Errors
    ///
    /// Returns [`CommandFailure`] if the program cannot be spawned or exits
    /// with a non-zero status.
    fn run(&self, argv: &[String], cwd: &Path) -> Result<String, CommandFailure>;
}

/// Runs commands as real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], cwd: &Path) -> Result<String, CommandFailure> {
        let (program, args) = argv.split_first().ok_or_else(|| CommandFailure {
            argv: Vec::new(),
            exit_code: None,
            stderr: "empty command line".to_string(),
        })?;

        debug!(cwd = %cwd.display(), command = %argv.join(" "), "running");

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| CommandFailure {
                argv: argv.to_vec(),
                exit_code: None,
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(CommandFailure {
                argv: argv.to_vec(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Build an argv vector from string-like parts.
///
/// ```
/// use gitvendor::git::argv;
///
/// assert_eq!(argv(["git", "status"]), vec!["git".to_string(), "status".to_string()]);
/// ```
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

/// Render a path as a single command-line argument.
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
