//! source::fetch
//!
//! The base git source capability: populate a working tree from a remote.
//!
//! [`GitSource`](super::GitSource) only adds vendor caching and offline
//! handling on top of a [`Fetch`] implementation. [`GitFetcher`] is the
//! default one; it clones on first use and afterwards reuses the checkout as
//! a local object cache, fetching only when the wanted commit is not already
//! checked out.

use std::fs;

use tracing::debug;

use crate::core::types::Oid;
use crate::git::{GitError, Repository};

/// What to fetch.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    /// Remote URI to clone from
    pub uri: &'a str,
    /// Branch, tag or commit id requested by the caller
    pub reference: &'a str,
    /// Commit the reference is already pinned to, if known
    pub sha: Option<&'a Oid>,
}

/// Populates a repository's working path from a remote.
pub trait Fetch {
    /// Make `repository` a checkout of `request` and return its commit.
    fn fetch(&self, request: &FetchRequest<'_>, repository: &Repository) -> Result<Oid, GitError>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch(&self, request: &FetchRequest<'_>, repository: &Repository) -> Result<Oid, GitError> {
        (**self).fetch(request, repository)
    }
}

impl<F: Fetch + ?Sized> Fetch for Box<F> {
    fn fetch(&self, request: &FetchRequest<'_>, repository: &Repository) -> Result<Oid, GitError> {
        (**self).fetch(request, repository)
    }
}

/// Clone/fetch/checkout through the git CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitFetcher;

impl GitFetcher {
    fn ensure_clone(uri: &str, repository: &Repository) -> Result<(), GitError> {
        if repository.is_git() {
            return Ok(());
        }

        let path = repository.path();
        let io = |source: std::io::Error| GitError::Io {
            path: path.to_path_buf(),
            source,
        };
        if path.exists() {
            fs::remove_dir_all(path).map_err(io)?;
        }
        fs::create_dir_all(path).map_err(io)?;

        debug!(uri, path = %path.display(), "cloning");
        repository.clone_from(uri)?;

        if !repository.is_git() {
            return Err(GitError::CloneFailed {
                uri: uri.to_string(),
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}

impl Fetch for GitFetcher {
    fn fetch(&self, request: &FetchRequest<'_>, repository: &Repository) -> Result<Oid, GitError> {
        Self::ensure_clone(request.uri, repository)?;

        repository.reset_hard()?;
        repository.clean()?;

        if let Some(sha) = request.sha {
            if repository.checked_out(sha) {
                debug!(%sha, "already checked out");
                return Ok(sha.clone());
            }
        }

        let remote = repository
            .default_remote()?
            .ok_or_else(|| GitError::NoRemote {
                path: repository.path().to_path_buf(),
            })?;
        repository.fetch(&remote, false)?;
        repository.fetch(&remote, true)?;

        let sha = match request.sha {
            Some(sha) => sha.clone(),
            None => repository.hash_from(&remote, request.reference)?,
        };

        if !repository.checked_out(&sha) {
            repository.checkout(sha.as_str(), true)?;
        }
        if !repository.checked_out(&sha) {
            return Err(GitError::CheckoutFailed {
                oid: sha,
                path: repository.path().to_path_buf(),
            });
        }

        debug!(uri = request.uri, %sha, "checked out");
        Ok(sha)
    }
}
