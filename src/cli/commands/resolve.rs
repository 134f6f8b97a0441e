//! resolve command - Print the full commit id for a reference

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context as _, Result};
use serde::Serialize;

use crate::cli::Context;
use crate::git::Repository;
use crate::ui::output;

#[derive(Serialize)]
struct Resolved<'a> {
    remote: &'a str,
    reference: &'a str,
    commit: String,
}

/// Resolve `reference` against `remote` in the checkout at `path`.
pub fn resolve(ctx: &Context, path: &Path, remote: &str, reference: &str) -> Result<ExitCode> {
    let path = ctx.project.join(path);
    let repository = Repository::open_system(&path);
    if !repository.is_git() {
        bail!("'{}' is not a git checkout", path.display());
    }

    let commit = repository
        .hash_from(remote, reference)
        .with_context(|| format!("could not resolve '{}' in '{}'", reference, path.display()))?;

    if ctx.json {
        output::json(&Resolved {
            remote,
            reference,
            commit: commit.to_string(),
        })?;
    } else {
        output::print(&commit, ctx.verbosity);
    }
    Ok(ExitCode::SUCCESS)
}
