//! core::paths
//!
//! Centralized path routing for gitvendor storage locations.
//!
//! **Hard rule:** no code outside this module computes storage paths by
//! hand. The vendor cache in particular has no index file: the archive file
//! name *is* the index, so the naming scheme lives in exactly one place.
//!
//! # Storage Layout
//!
//! Relative to a project root (defaults; both roots are configurable):
//! - `.gitvendor/config.toml` - Project configuration
//! - `vendor/source/` - Vendor cache root
//!   - `<commit>.tar.gz` - One archive per cached commit
//!   - `.<commit>.lock` - Writer lock for that commit
//!   - `.<commit>.<pid>.tar[.gz]` - Transient staging files
//! - `.tmp/gitvendor/cache/source/git/<key>/` - Working checkouts, keyed by
//!   the SHA-256 of the remote URI
//!
//! # Example
//!
//! ```
//! use gitvendor::core::paths::{ProjectPaths, VendorPaths};
//! use gitvendor::core::types::Oid;
//! use std::path::PathBuf;
//!
//! let project = ProjectPaths::new("/project");
//! assert_eq!(project.default_vendor_dir(), PathBuf::from("/project/vendor/source"));
//!
//! let vendor = VendorPaths::new(project.default_vendor_dir());
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(
//!     vendor.archive_path(&oid),
//!     PathBuf::from("/project/vendor/source/abc123def4567890abc123def4567890abc12345.tar.gz")
//! );
//! ```

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::core::types::Oid;

/// Extension of a vendor archive.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Paths derived from a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project configuration file: `<root>/.gitvendor/config.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(".gitvendor").join("config.toml")
    }

    /// Default vendor cache root: `<root>/vendor/source`.
    pub fn default_vendor_dir(&self) -> PathBuf {
        self.root.join("vendor").join("source")
    }

    /// Default checkout cache root: `<root>/.tmp/gitvendor/cache`.
    pub fn default_cache_dir(&self) -> PathBuf {
        self.root.join(".tmp").join("gitvendor").join("cache")
    }

    /// Resolve a configured path; relative paths are taken from the root.
    ///
    /// ```
    /// use gitvendor::core::paths::ProjectPaths;
    /// use std::path::{Path, PathBuf};
    ///
    /// let project = ProjectPaths::new("/project");
    /// assert_eq!(project.resolve(Path::new("cache")), PathBuf::from("/project/cache"));
    /// assert_eq!(project.resolve(Path::new("/abs")), PathBuf::from("/abs"));
    /// ```
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Paths inside the vendor cache root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorPaths {
    root: PathBuf,
}

impl VendorPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The vendor cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<commit>.tar.gz`
    pub fn archive_path(&self, oid: &Oid) -> PathBuf {
        self.root.join(format!("{}{}", oid, ARCHIVE_SUFFIX))
    }

    /// `<root>/.<commit>.lock`
    pub fn lock_path(&self, oid: &Oid) -> PathBuf {
        self.root.join(format!(".{}.lock", oid))
    }

    /// Uncompressed staging file for one writer: `<root>/.<commit>.<tag>.tar`.
    ///
    /// `gzip` turns it into the same name with `.gz` appended.
    pub fn staging_tar_path(&self, oid: &Oid, tag: u32) -> PathBuf {
        self.root.join(format!(".{}.{}.tar", oid, tag))
    }

    /// The commit a vendor directory entry caches, if it is an archive.
    ///
    /// ```
    /// use gitvendor::core::paths::VendorPaths;
    ///
    /// let name = "abc123def4567890abc123def4567890abc12345.tar.gz";
    /// assert!(VendorPaths::commit_of(name).is_some());
    /// assert!(VendorPaths::commit_of(".abc123def4567890abc123def4567890abc12345.lock").is_none());
    /// assert!(VendorPaths::commit_of("README.tar.gz").is_none());
    /// ```
    pub fn commit_of(file_name: &str) -> Option<Oid> {
        let stem = file_name.strip_suffix(ARCHIVE_SUFFIX)?;
        if !Oid::is_valid(stem) || stem.chars().any(|c| c.is_ascii_uppercase()) {
            return None;
        }
        Oid::new(stem).ok()
    }
}

/// Stable directory name for a remote's working checkout.
///
/// ```
/// use gitvendor::core::paths::source_cache_key;
///
/// let key = source_cache_key("https://example.com/a.git");
/// assert_eq!(key.len(), 64);
/// assert_eq!(key, source_cache_key("https://example.com/a.git"));
/// assert_ne!(key, source_cache_key("https://example.com/b.git"));
/// ```
pub fn source_cache_key(uri: &str) -> String {
    hex::encode(Sha256::digest(uri.as_bytes()))
}

/// Working checkout directory for `uri` under `cache_root`:
/// `<cache_root>/source/git/<key>`.
pub fn source_checkout_dir(cache_root: &Path, uri: &str) -> PathBuf {
    cache_root
        .join("source")
        .join("git")
        .join(source_cache_key(uri))
}
