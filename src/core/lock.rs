//! core::lock
//!
//! Per-commit writer lock for the vendor cache.
//!
//! # Architecture
//!
//! Archives are content-addressed, so two writers for the same commit
//! produce the same bytes. The lock only serialises the *work*: the second
//! writer waits, then sees the finished archive and skips. Readers never
//! take the lock; they are protected by the staging-file + rename scheme in
//! [`crate::vendor`].
//!
//! # Storage
//!
//! - `<vendor_root>/.<commit>.lock` - OS-level exclusive lock via `fs2`
//!
//! # Invariants
//!
//! - Lock is released on drop (RAII)
//! - Locks for different commits never contend

use std::fs::{self, File, OpenOptions};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::VendorPaths;
use crate::core::types::Oid;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on one commit's vendor archive, held until dropped.
#[derive(Debug)]
pub struct VendorLock {
    file: File,
}

impl VendorLock {
    /// Acquire the lock for `oid`, blocking until it is available.
    ///
    /// Creates the vendor root if it does not exist.
    pub fn acquire(paths: &VendorPaths, oid: &Oid) -> Result<Self, LockError> {
        fs::create_dir_all(paths.root()).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", paths.root().display(), e))
        })?;

        let path = paths.lock_path(oid);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        file.lock_exclusive()
            .map_err(|e| LockError::AcquireFailed(e.to_string()))?;
        Ok(Self { file })
    }
}

impl Drop for VendorLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
