//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--project <path>`: Project root (defaults to the current directory)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// gitvendor - fetch, pin and vendor git dependencies
#[derive(Parser, Debug)]
#[command(name = "gitvendor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root; configuration and default cache paths hang off it
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a reference to a full commit id in an existing checkout
    Resolve {
        /// Path to the checkout
        path: PathBuf,

        /// Remote name (e.g. origin)
        remote: String,

        /// Branch, tag, or commit id
        reference: String,
    },

    /// Report whether a checkout has local modifications
    ///
    /// Exits with status 1 when the checkout is dirty.
    Status {
        /// Path to the checkout
        path: PathBuf,
    },

    /// Populate the source checkout for a remote, using the vendor cache
    Cache {
        /// Remote URL
        uri: String,

        /// Branch, tag, or commit id to check out
        #[arg(long = "ref", default_value = "master")]
        reference: String,

        /// Pin to this commit (e.g. from a lockfile)
        #[arg(long)]
        sha: Option<String>,

        /// Never fetch; only use an existing checkout or the vendor cache
        #[arg(long)]
        local: bool,

        /// Store fetched snapshots in the vendor cache
        #[arg(long)]
        vendor: bool,
    },

    /// Inspect the vendor cache
    Vendor {
        #[command(subcommand)]
        action: VendorAction,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Vendor cache subcommands.
#[derive(Subcommand, Debug)]
pub enum VendorAction {
    /// List commits with a stored snapshot
    List,

    /// Print the archive path for a commit
    Path {
        /// Full commit id
        commit: String,
    },
}

/// Supported shells for completion.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
