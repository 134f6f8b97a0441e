//! cli
//!
//! Command-line interface layer for gitvendor.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, resolves the project
//! root, and dispatches to handlers that call into [`crate::source`],
//! [`crate::git`] and [`crate::vendor`].

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell, VendorAction};

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};

use crate::ui::output::{self, Verbosity};

/// Per-invocation settings shared by all handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Project root
    pub project: PathBuf,
    pub verbosity: Verbosity,
    /// Emit JSON instead of text
    pub json: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();

    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    output::init_logging(verbosity);

    let project = match cli.project.clone() {
        Some(project) => project,
        None => std::env::current_dir().context("could not determine current directory")?,
    };

    let ctx = Context {
        project,
        verbosity,
        json: cli.json,
    };

    commands::dispatch(cli.command, &ctx)
}
