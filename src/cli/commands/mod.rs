//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler validates its arguments, calls into the library, and
//! formats the result as text or JSON. Handlers return the process exit
//! code; errors propagate to `main`.

mod cache;
mod completion;
mod resolve;
mod status;
mod vendor;

pub use cache::cache;
pub use completion::completion;
pub use resolve::resolve;
pub use status::status;
pub use vendor::{vendor_list, vendor_path};

use std::process::ExitCode;

use anyhow::Result;

use super::args::{Command, VendorAction};
use super::Context;
use crate::core::config::Config;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    match command {
        Command::Resolve {
            path,
            remote,
            reference,
        } => resolve(ctx, &path, &remote, &reference),
        Command::Status { path } => status(ctx, &path),
        Command::Cache {
            uri,
            reference,
            sha,
            local,
            vendor,
        } => cache(
            ctx,
            cache::CacheArgs {
                uri,
                reference,
                sha,
                local,
                vendor,
            },
        ),
        Command::Vendor { action } => match action {
            VendorAction::List => vendor_list(ctx),
            VendorAction::Path { commit } => vendor_path(ctx, &commit),
        },
        Command::Completion { shell } => completion(shell).map(|()| ExitCode::SUCCESS),
    }
}

/// Load configuration for the context's project.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    Ok(Config::load(&ctx.project)?)
}
