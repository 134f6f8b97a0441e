//! git::status
//!
//! Working tree cleanliness.
//!
//! A checkout is inspected by a fixed sequence of index checks followed by an
//! untracked-file listing. Each index check is a [`DirtyCheck`]: a command
//! whose non-zero exit means the tree is dirty for the attached
//! [`DirtyReason`]. [`first_failure`] evaluates the checks in order and stops
//! at the first one that fails, so later (more expensive) checks never run
//! once a tree is known to be dirty.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::runner::{argv, CommandRunner};

/// Why a working tree is considered dirty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirtyReason {
    /// `git update-index --refresh` failed
    IndexRefresh,
    /// Tracked files differ from the index
    Unstaged,
    /// The index differs from HEAD
    Uncommitted,
    /// Untracked or deleted-but-unstaged files exist
    Untracked,
}

impl DirtyReason {
    /// Human-readable description for a checkout at `path`.
    ///
    /// ```
    /// use gitvendor::git::DirtyReason;
    /// use std::path::Path;
    ///
    /// assert_eq!(
    ///     DirtyReason::Unstaged.describe(Path::new("modules/foo")),
    ///     "'modules/foo' has unstaged changes"
    /// );
    /// ```
    pub fn describe(&self, path: &Path) -> String {
        let path = path.display();
        match self {
            DirtyReason::IndexRefresh => format!("could not update git index for '{}'", path),
            DirtyReason::Unstaged => format!("'{}' has unstaged changes", path),
            DirtyReason::Uncommitted => format!("'{}' has uncommitted changes", path),
            DirtyReason::Untracked => format!("'{}' has untracked files", path),
        }
    }
}

/// Result of a cleanliness check. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DirtyStatus {
    /// Nothing to report
    Clean,
    /// The first problem found
    Dirty {
        reason: DirtyReason,
        path: PathBuf,
    },
}

impl DirtyStatus {
    pub fn is_clean(&self) -> bool {
        matches!(self, DirtyStatus::Clean)
    }

    pub fn is_dirty(&self) -> bool {
        !self.is_clean()
    }

    /// The reason, if dirty.
    pub fn reason(&self) -> Option<DirtyReason> {
        match self {
            DirtyStatus::Clean => None,
            DirtyStatus::Dirty { reason, .. } => Some(*reason),
        }
    }
}

impl fmt::Display for DirtyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirtyStatus::Clean => write!(f, "clean"),
            DirtyStatus::Dirty { reason, path } => write!(f, "{}", reason.describe(path)),
        }
    }
}

/// One index check: the command to run and the reason reported if it fails.
#[derive(Debug, Clone, Copy)]
pub struct DirtyCheck {
    pub reason: DirtyReason,
    pub args: &'static [&'static str],
}

/// The index checks, in evaluation order.
pub const INDEX_CHECKS: [DirtyCheck; 3] = [
    DirtyCheck {
        reason: DirtyReason::IndexRefresh,
        args: &["update-index", "-q", "--ignore-submodules", "--refresh"],
    },
    DirtyCheck {
        reason: DirtyReason::Unstaged,
        args: &["diff-files", "--quiet", "--ignore-submodules", "--"],
    },
    DirtyCheck {
        reason: DirtyReason::Uncommitted,
        args: &[
            "diff-index",
            "--cached",
            "--quiet",
            "HEAD",
            "--ignore-submodules",
            "--",
        ],
    },
];

/// Arguments of the untracked-file listing that follows the index checks.
pub const UNTRACKED_LISTING: &[&str] = &["ls-files", "-o", "-d", "--exclude-standard"];

/// Run `checks` in order inside `cwd`, returning the reason of the first
/// one whose command fails. Checks after the first failure are not run.
pub fn first_failure(
    runner: &dyn CommandRunner,
    cwd: &Path,
    checks: &[DirtyCheck],
) -> Option<DirtyReason> {
    checks.iter().find_map(|check| {
        let cmd = argv(std::iter::once("git").chain(check.args.iter().copied()));
        runner.run(&cmd, cwd).err().map(|_| check.reason)
    })
}
