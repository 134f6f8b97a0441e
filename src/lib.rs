//! gitvendor - git source adapter for dependency managers
//!
//! Given a remote URL and a reference (branch, tag, or commit id), gitvendor
//! produces a checked-out directory pinned to a resolved commit, optionally
//! served from a compressed on-disk cache keyed by commit id, and reports
//! whether a checkout has been modified locally.
//!
//! # Architecture
//!
//! Data flows one way, top to bottom:
//!
//! - [`cli`] - Command-line interface (parses args, builds the context)
//! - [`source`] - `GitSource`: vendor lookup, fetch, vendor store
//! - [`vendor`] - Content-addressed `.tar.gz` snapshot cache
//! - [`git`] - Reference resolution, dirty checks, command execution
//! - [`core`] - Types, configuration, storage paths, locking
//! - [`ui`] - Output and logging
//!
//! # Invariants
//!
//! 1. A resolved commit is always a complete, validated id
//! 2. Dirty checks run in a fixed order and stop at the first problem
//! 3. A visible vendor archive is always a complete snapshot
//! 4. Vendor lookup precedes fetch, which precedes vendor store

pub mod cli;
pub mod core;
pub mod git;
pub mod source;
pub mod ui;
pub mod vendor;
