//! git
//!
//! Everything gitvendor does to a git working tree.
//!
//! # Responsibilities
//!
//! - Running external commands ([`CommandRunner`])
//! - Resolving references to commit ids ([`Repository::hash_from`])
//! - Detecting local modifications ([`Repository::dirty`])
//! - Clone/fetch/checkout primitives for the base fetch capability
//!
//! # Invariants
//!
//! - No other module spawns git or imports `git2`
//! - Resolution returns a validated [`Oid`](crate::core::types::Oid) or an error
//! - Dirty checks run in a fixed order and stop at the first problem
//!
//! # Example
//!
//! ```ignore
//! use gitvendor::git::Repository;
//!
//! let repo = Repository::open_system("vendor/checkouts/foo");
//! match repo.dirty()? {
//!     status if status.is_clean() => println!("safe to overwrite"),
//!     status => println!("{}", status),
//! }
//! ```

mod repository;
mod runner;
mod status;

pub use repository::{parse_remote_branches, GitError, Repository};
pub use runner::{argv, CommandFailure, CommandRunner, SystemRunner};
pub use status::{
    first_failure, DirtyCheck, DirtyReason, DirtyStatus, INDEX_CHECKS, UNTRACKED_LISTING,
};

pub(crate) use runner::path_arg;
