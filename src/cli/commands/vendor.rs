//! vendor command - Inspect the vendor cache

use std::process::ExitCode;

use anyhow::{Context as _, Result};

use super::load_config;
use crate::cli::Context;
use crate::core::types::Oid;
use crate::ui::output;
use crate::vendor::VendorCache;

fn open(ctx: &Context) -> Result<VendorCache> {
    let config = load_config(ctx)?;
    Ok(VendorCache::open_system(config.vendor_dir()))
}

/// List commits with a stored snapshot.
pub fn vendor_list(ctx: &Context) -> Result<ExitCode> {
    let commits = open(ctx)?.list()?;

    if ctx.json {
        output::json(&commits)?;
    } else if !commits.is_empty() {
        output::print(output::format_list(&commits, ""), ctx.verbosity);
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the archive path for `commit`. Exit code 1 when it is not stored.
pub fn vendor_path(ctx: &Context, commit: &str) -> Result<ExitCode> {
    let oid = Oid::new(commit).with_context(|| format!("invalid commit '{}'", commit))?;
    let cache = open(ctx)?;
    let path = cache.archive_path(&oid);
    let exists = cache.exists(&oid);

    if ctx.json {
        output::json(&serde_json::json!({
            "commit": oid,
            "path": path,
            "exists": exists,
        }))?;
    } else {
        output::print(path.display(), ctx.verbosity);
    }

    Ok(if exists {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
