//! cache command - Populate a source checkout

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::load_config;
use crate::cli::Context;
use crate::core::types::Oid;
use crate::source::{CacheState, ExecutionContext, GitFetcher, GitSource};
use crate::ui::output;

/// Arguments for [`cache`].
#[derive(Debug)]
pub struct CacheArgs {
    pub uri: String,
    pub reference: String,
    pub sha: Option<String>,
    /// Force local-only mode on top of configuration
    pub local: bool,
    /// Force vendor caching on top of configuration
    pub vendor: bool,
}

#[derive(Serialize)]
struct Cached {
    uri: String,
    reference: String,
    path: PathBuf,
    commit: Option<Oid>,
    state: CacheState,
}

/// Run [`GitSource::cache`] and report where the checkout landed.
pub fn cache(ctx: &Context, args: CacheArgs) -> Result<ExitCode> {
    let config = load_config(ctx)?;
    let mut exec = ExecutionContext::from_config(&config);
    if args.local {
        exec = exec.with_local(true);
    }
    if args.vendor {
        exec = exec.with_vendor(true);
    }

    let mut source = GitSource::for_context(&exec, &args.uri, &args.reference, GitFetcher);
    if let Some(sha) = &args.sha {
        let sha = Oid::new(sha).with_context(|| format!("invalid --sha '{}'", sha))?;
        source = source.with_sha(sha);
    }

    let state = source.cache(&exec)?;

    let result = Cached {
        uri: args.uri,
        reference: args.reference,
        path: source.repository().path().to_path_buf(),
        commit: source.sha().cloned(),
        state,
    };

    if ctx.json {
        output::json(&result)?;
    } else {
        output::print(result.path.display(), ctx.verbosity);
        if let Some(commit) = &result.commit {
            output::print(format!("commit {}", commit), ctx.verbosity);
        }
        output::print(format!("state  {}", result.state), ctx.verbosity);
    }
    Ok(ExitCode::SUCCESS)
}
