//! core::config::schema
//!
//! Configuration schema types.
//!
//! The same schema is used for the global and the project file; the project
//! file wins key by key.
//!
//! # Validation
//!
//! Config values are validated after parsing. Unknown keys are rejected so
//! that a typo (`vendr = true`) cannot silently disable caching.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// One configuration file.
///
/// # Example
///
/// ```toml
/// local = false
/// vendor = true
/// vendor_dir = "vendor/source"
/// cache_dir = "/var/cache/gitvendor"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Never touch the network; only use existing checkouts and archives
    pub local: Option<bool>,

    /// Store every fetched commit in the vendor cache
    pub vendor: Option<bool>,

    /// Vendor cache root
    pub vendor_dir: Option<PathBuf>,

    /// Root for working checkouts
    pub cache_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a directory is set but empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("vendor_dir", &self.vendor_dir), ("cache_dir", &self.cache_dir)] {
            if let Some(path) = value {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue(format!("{} cannot be empty", key)));
                }
            }
        }
        Ok(())
    }

    /// Overlay `other` onto `self`; values set in `other` win.
    pub fn merged_with(&self, other: &ConfigFile) -> ConfigFile {
        ConfigFile {
            local: other.local.or(self.local),
            vendor: other.vendor.or(self.vendor),
            vendor_dir: other.vendor_dir.clone().or_else(|| self.vendor_dir.clone()),
            cache_dir: other.cache_dir.clone().or_else(|| self.cache_dir.clone()),
        }
    }
}
