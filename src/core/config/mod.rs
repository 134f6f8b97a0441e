//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! gitvendor has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Overrides for one project root
//!
//! # Precedence
//!
//! Later overrides earlier:
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$GITVENDOR_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitvendor/config.toml`
//! 3. `~/.gitvendor/config.toml`
//!
//! # Project Config Location
//!
//! `<project>/.gitvendor/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use gitvendor::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("/path/to/project")).unwrap();
//! println!("vendor caching: {}", config.vendor());
//! println!("vendor root: {}", config.vendor_dir().display());
//! ```

pub mod schema;

pub use schema::ConfigFile;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::paths::ProjectPaths;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence and defaults; relative directories resolve
/// against the project root.
#[derive(Debug, Clone)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Project configuration, if the project has one
    pub project: Option<ConfigFile>,
    paths: ProjectPaths,
    global_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration for the project rooted at `project_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated. Missing files are not an error.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        Self::load_with(project_root, |key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Load with an explicit environment lookup and home directory.
    pub fn load_with(
        project_root: &Path,
        env: impl Fn(&str) -> Option<String>,
        home: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let paths = ProjectPaths::new(project_root);

        let global_path = Self::global_candidates(&env, home)
            .into_iter()
            .find(|p| p.exists());
        let global = match &global_path {
            Some(path) => Self::read(path)?,
            None => ConfigFile::default(),
        };

        let candidate = paths.config_path();
        let (project, project_path) = if candidate.exists() {
            (Some(Self::read(&candidate)?), Some(candidate))
        } else {
            (None, None)
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        debug!(
            global = ?global_path,
            project = ?project_path,
            "loaded configuration"
        );

        Ok(Config {
            global,
            project,
            paths,
            global_path,
            project_path,
        })
    }

    fn global_candidates(
        env: &impl Fn(&str) -> Option<String>,
        home: Option<PathBuf>,
    ) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = env("GITVENDOR_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        if let Some(xdg) = env("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg).join("gitvendor/config.toml"));
        }
        if let Some(home) = home {
            candidates.push(home.join(".gitvendor/config.toml"));
        }
        candidates
    }

    fn read(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Defaults only, for the given project root.
    pub fn defaults(project_root: &Path) -> Self {
        Config {
            global: ConfigFile::default(),
            project: None,
            paths: ProjectPaths::new(project_root),
            global_path: None,
            project_path: None,
        }
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// The effective settings after overlaying the project file.
    pub fn effective(&self) -> ConfigFile {
        match &self.project {
            Some(project) => self.global.merged_with(project),
            None => self.global.clone(),
        }
    }

    /// Local-only mode. Defaults to `false`.
    pub fn local(&self) -> bool {
        self.effective().local.unwrap_or(false)
    }

    /// Vendor caching. Defaults to `false`.
    pub fn vendor(&self) -> bool {
        self.effective().vendor.unwrap_or(false)
    }

    /// Vendor cache root. Defaults to `<project>/vendor/source`.
    pub fn vendor_dir(&self) -> PathBuf {
        match self.effective().vendor_dir {
            Some(dir) => self.paths.resolve(&dir),
            None => self.paths.default_vendor_dir(),
        }
    }

    /// Checkout cache root. Defaults to `<project>/.tmp/gitvendor/cache`.
    pub fn cache_dir(&self) -> PathBuf {
        match self.effective().cache_dir {
            Some(dir) => self.paths.resolve(&dir),
            None => self.paths.default_cache_dir(),
        }
    }

    pub fn project_paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}
