//! status command - Report whether a checkout is dirty

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;

use crate::cli::Context;
use crate::git::Repository;
use crate::ui::output;

/// Print `clean` or the dirty reason. Exit code 1 when dirty.
pub fn status(ctx: &Context, path: &Path) -> Result<ExitCode> {
    let path = ctx.project.join(path);
    let status = Repository::open_system(&path).dirty()?;

    if ctx.json {
        output::json(&status)?;
    } else {
        output::print(&status, ctx.verbosity);
    }

    Ok(if status.is_dirty() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}
