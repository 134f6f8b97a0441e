//! source
//!
//! Git dependency sources with vendor caching.
//!
//! # Architecture
//!
//! [`GitSource`] wraps a base [`Fetch`] capability and adds:
//! - serving a pinned commit straight from the vendor cache
//! - refusing network access in local-only mode
//! - storing freshly fetched commits in the vendor cache
//!
//! Environment flags travel in an explicit [`ExecutionContext`]; nothing is
//! read from process-wide state.
//!
//! # Lifecycle
//!
//! ```text
//! start ─┬─ archive exists ──────────────► extract ─► Vendored
//!        └─ no archive ─┬─ local-only ─┬─ checkout satisfies ─► Local
//!                       │              └─ otherwise ─► LocalCopyMissing
//!                       └─ fetch ─┬─ vendor off ─► Fetched
//!                                 └─ vendor on ─► store ─► Archived
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gitvendor::source::{ExecutionContext, GitFetcher, GitSource};
//!
//! let ctx = ExecutionContext::new("vendor/source", ".tmp/cache").with_vendor(true);
//! let mut source = GitSource::for_context(&ctx, "https://example.com/mod.git", "v1.2.0", GitFetcher);
//! let state = source.cache(&ctx)?;
//! println!("{} at {} ({})", source.uri(), source.sha().unwrap(), state);
//! ```

mod fetch;

pub use fetch::{Fetch, FetchRequest, GitFetcher};

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::paths::source_checkout_dir;
use crate::core::types::Oid;
use crate::git::{DirtyStatus, GitError, Repository};
use crate::vendor::{VendorCache, VendorError};

/// Failures of a source, with enough context to name the dependency.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Local-only mode and no usable checkout on disk.
    #[error("could not find a local copy of {uri}{}", at(.sha))]
    LocalCopyMissing {
        /// The remote URI
        uri: String,
        /// The pinned commit, if any
        sha: Option<Oid>,
    },

    /// The base fetch failed.
    #[error("could not checkout {uri}{}: {source}", at(.sha))]
    Checkout {
        /// The remote URI
        uri: String,
        /// The pinned commit, if any
        sha: Option<Oid>,
        /// What went wrong underneath
        source: GitError,
    },

    /// Vendor cache extraction or store failed.
    #[error(transparent)]
    Vendor(#[from] VendorError),

    /// Inspecting the checkout failed.
    #[error(transparent)]
    Git(#[from] GitError),
}

fn at(sha: &Option<Oid>) -> String {
    match sha {
        Some(sha) => format!(" at {}", sha),
        None => String::new(),
    }
}

/// Environment flags for one run. Passed in, never global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionContext {
    local: bool,
    vendor: bool,
    vendor_root: PathBuf,
    cache_root: PathBuf,
}

impl ExecutionContext {
    /// Networked, vendor caching disabled.
    pub fn new(vendor_root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            local: false,
            vendor: false,
            vendor_root: vendor_root.into(),
            cache_root: cache_root.into(),
        }
    }

    /// Build from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            local: config.local(),
            vendor: config.vendor(),
            vendor_root: config.vendor_dir(),
            cache_root: config.cache_dir(),
        }
    }

    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    pub fn with_vendor(mut self, vendor: bool) -> Self {
        self.vendor = vendor;
        self
    }

    /// No network fetches permitted.
    pub fn local(&self) -> bool {
        self.local
    }

    /// Fetched commits are stored in the vendor cache.
    pub fn vendor(&self) -> bool {
        self.vendor
    }

    pub fn vendor_root(&self) -> &Path {
        &self.vendor_root
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }
}

/// How a [`GitSource::cache`] call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    /// Extracted from the vendor cache; no git fetch happened
    Vendored,
    /// Local-only mode, existing checkout already at the wanted commit
    Local,
    /// Fetched; vendor caching disabled
    Fetched,
    /// Fetched and stored in the vendor cache
    Archived,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CacheState::Vendored => "vendored",
            CacheState::Local => "local",
            CacheState::Fetched => "fetched",
            CacheState::Archived => "archived",
        };
        write!(f, "{}", s)
    }
}

/// A git dependency source.
///
/// Not safe to drive concurrently against the same working path.
#[derive(Debug)]
pub struct GitSource<F = GitFetcher> {
    uri: String,
    reference: String,
    sha: Option<Oid>,
    repository: Repository,
    base: F,
    cached: bool,
}

impl<F: Fetch> GitSource<F> {
    /// A source for `uri` at `reference`, checked out into `repository`.
    pub fn new(
        uri: impl Into<String>,
        reference: impl Into<String>,
        repository: Repository,
        base: F,
    ) -> Self {
        Self {
            uri: uri.into(),
            reference: reference.into(),
            sha: None,
            repository,
            base,
            cached: false,
        }
    }

    /// A source whose checkout lives under the context's cache root.
    pub fn for_context(
        ctx: &ExecutionContext,
        uri: impl Into<String>,
        reference: impl Into<String>,
        base: F,
    ) -> Self {
        let uri = uri.into();
        let repository = Repository::open_system(source_checkout_dir(ctx.cache_root(), &uri));
        Self::new(uri, reference, repository, base)
    }

    /// Pin the source to a known commit (e.g. from a lockfile).
    pub fn with_sha(mut self, sha: Oid) -> Self {
        self.sha = Some(sha);
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The pinned or resolved commit.
    pub fn sha(&self) -> Option<&Oid> {
        self.sha.as_ref()
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Whether the working path has been populated in this process.
    pub fn is_cached(&self) -> bool {
        self.cached
    }

    fn vendor_cache(&self, ctx: &ExecutionContext) -> VendorCache {
        VendorCache::new(ctx.vendor_root(), self.repository.runner().clone())
    }

    /// Archive path for the current commit, if one is known.
    pub fn vendor_archive(&self, ctx: &ExecutionContext) -> Option<PathBuf> {
        let cache = self.vendor_cache(ctx);
        self.sha.as_ref().map(|sha| cache.archive_path(sha))
    }

    /// Whether the checkout has local modifications.
    pub fn dirty(&self) -> Result<DirtyStatus, GitError> {
        self.repository.dirty()
    }

    /// Populate the working path.
    ///
    /// Order is fixed: vendor lookup, then (unless local-only) fetch, then
    /// vendor store.
    ///
    /// # Errors
    ///
    /// - [`SourceError::LocalCopyMissing`] in local-only mode without a usable checkout
    /// - [`SourceError::Checkout`] wrapping any failure of the base fetch
    /// - [`SourceError::Vendor`] if extraction or store fails; never downgraded
    pub fn cache(&mut self, ctx: &ExecutionContext) -> Result<CacheState, SourceError> {
        let vendor = self.vendor_cache(ctx);

        if let Some(sha) = &self.sha {
            if vendor.exists(sha) {
                vendor.extract(sha, self.repository.path())?;
                self.cached = true;
                info!(uri = %self.uri, %sha, "served from vendor cache");
                return Ok(CacheState::Vendored);
            }
        }

        if ctx.local() {
            if self.local_copy_satisfies() {
                self.cached = true;
                debug!(uri = %self.uri, "using existing local checkout");
                return Ok(CacheState::Local);
            }
            return Err(SourceError::LocalCopyMissing {
                uri: self.uri.clone(),
                sha: self.sha.clone(),
            });
        }

        let request = FetchRequest {
            uri: &self.uri,
            reference: &self.reference,
            sha: self.sha.as_ref(),
        };
        let sha = self
            .base
            .fetch(&request, &self.repository)
            .map_err(|source| SourceError::Checkout {
                uri: self.uri.clone(),
                sha: self.sha.clone(),
                source,
            })?;

        self.sha = Some(sha.clone());
        self.cached = true;

        if ctx.vendor() {
            vendor.store(&sha, self.repository.path())?;
            return Ok(CacheState::Archived);
        }
        Ok(CacheState::Fetched)
    }

    /// Whether the existing checkout already holds the wanted commit.
    ///
    /// Without a pinned commit the reference is resolved against local
    /// refs only; a hit pins it.
    fn local_copy_satisfies(&mut self) -> bool {
        if !self.repository.is_git() {
            return false;
        }

        if let Some(sha) = &self.sha {
            return self.repository.checked_out(sha);
        }

        let Ok(Some(remote)) = self.repository.default_remote() else {
            return false;
        };
        match self.repository.hash_from(&remote, &self.reference) {
            Ok(sha) if self.repository.checked_out(&sha) => {
                self.sha = Some(sha);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn oid() -> Oid {
        Oid::new(SHA).unwrap()
    }

    /// Base fetch that never touches git.
    struct StubFetch {
        calls: Cell<usize>,
        result: fn() -> Result<Oid, GitError>,
    }

    impl StubFetch {
        fn ok() -> Self {
            Self {
                calls: Cell::new(0),
                result: || Ok(oid()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: Cell::new(0),
                result: || {
                    Err(GitError::NoRemote {
                        path: PathBuf::from("/x"),
                    })
                },
            }
        }
    }

    impl Fetch for StubFetch {
        fn fetch(&self, _: &FetchRequest<'_>, _: &Repository) -> Result<Oid, GitError> {
            self.calls.set(self.calls.get() + 1);
            (self.result)()
        }
    }

    fn context(temp: &TempDir) -> ExecutionContext {
        ExecutionContext::new(temp.path().join("vendor"), temp.path().join("cache"))
    }

    #[test]
    fn local_mode_without_checkout_fails_with_context() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp).with_local(true);
        let fetch = StubFetch::ok();
        let mut source = GitSource::for_context(&ctx, "https://example.com/m.git", "main", &fetch)
            .with_sha(oid());

        let err = source.cache(&ctx).unwrap_err();
        assert!(matches!(err, SourceError::LocalCopyMissing { .. }));
        let message = err.to_string();
        assert!(message.contains("https://example.com/m.git"));
        assert!(message.contains(SHA));
        assert_eq!(fetch.calls.get(), 0);
    }

    #[test]
    fn local_mode_message_without_sha() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp).with_local(true);
        let mut source =
            GitSource::for_context(&ctx, "https://example.com/m.git", "main", StubFetch::ok());

        let err = source.cache(&ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "could not find a local copy of https://example.com/m.git"
        );
    }

    #[test]
    fn fetch_failure_is_wrapped() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let mut source =
            GitSource::for_context(&ctx, "https://example.com/m.git", "main", StubFetch::failing())
                .with_sha(oid());

        let err = source.cache(&ctx).unwrap_err();
        match &err {
            SourceError::Checkout { uri, sha, .. } => {
                assert_eq!(uri, "https://example.com/m.git");
                assert_eq!(sha.as_ref(), Some(&oid()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with(&format!(
            "could not checkout https://example.com/m.git at {}: ",
            SHA
        )));
        assert!(!source.is_cached());
    }

    #[test]
    fn fetch_without_vendor_does_not_store() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let mut source =
            GitSource::for_context(&ctx, "https://example.com/m.git", "main", StubFetch::ok());

        assert_eq!(source.cache(&ctx).unwrap(), CacheState::Fetched);
        assert_eq!(source.sha(), Some(&oid()));
        assert!(source.is_cached());
        assert!(!ctx.vendor_root().exists());
    }

    #[test]
    fn corrupt_vendor_archive_is_fatal() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp).with_local(true);
        let fetch = StubFetch::ok();
        let mut source = GitSource::for_context(&ctx, "u", "main", &fetch).with_sha(oid());

        let archive = source.vendor_archive(&ctx).unwrap();
        std::fs::create_dir_all(archive.parent().unwrap()).unwrap();
        std::fs::write(&archive, b"not a tarball").unwrap();

        let err = source.cache(&ctx).unwrap_err();
        assert!(matches!(err, SourceError::Vendor(VendorError::Command(_))));
        assert_eq!(fetch.calls.get(), 0);
        assert!(!source.is_cached());
    }

    #[test]
    fn vendor_archive_requires_sha() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let source = GitSource::for_context(&ctx, "u", "main", StubFetch::ok());
        assert!(source.vendor_archive(&ctx).is_none());
    }

    #[test]
    fn checkout_path_derived_from_uri() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let a = GitSource::for_context(&ctx, "https://example.com/a.git", "main", GitFetcher);
        let b = GitSource::for_context(&ctx, "https://example.com/b.git", "main", GitFetcher);
        assert!(a.repository().path().starts_with(ctx.cache_root()));
        assert_ne!(a.repository().path(), b.repository().path());
    }

    #[test]
    fn context_from_config_defaults() {
        let config = Config::defaults(Path::new("/p"));
        let ctx = ExecutionContext::from_config(&config);
        assert!(!ctx.local());
        assert!(!ctx.vendor());
        assert_eq!(ctx.vendor_root(), Path::new("/p/vendor/source"));
        assert_eq!(ctx.cache_root(), Path::new("/p/.tmp/gitvendor/cache"));
    }

    #[test]
    fn cache_state_display() {
        assert_eq!(CacheState::Vendored.to_string(), "vendored");
        assert_eq!(CacheState::Archived.to_string(), "archived");
        assert_eq!(
            serde_json::to_string(&CacheState::Local).unwrap(),
            "\"local\""
        );
    }
}
