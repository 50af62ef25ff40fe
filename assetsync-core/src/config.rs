//! Deploy configuration and its layering.
//!
//! # Precedence
//!
//! ```text
//! built-in defaults  <  YAML file  <  $BUILD_NUMBER (release only)  <  CLI flags
//! ```
//!
//! The YAML file is either passed explicitly or picked up as
//! `assetsync.yaml` in the working directory. Every field is optional there;
//! unknown fields are rejected so typos do not silently fall back to defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::Release;

/// File name probed in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "assetsync.yaml";

/// Environment variable CI systems use to publish the build number.
pub const RELEASE_ENV: &str = "BUILD_NUMBER";

pub const DEFAULT_PATTERN: &str = "**/*";
pub const DEFAULT_ACL: &str = "public-read";
pub const DEFAULT_CACHE_CONTROL: &str = "public,immutable,max-age=31536000";
pub const DEFAULT_KEEP: u64 = 10;

/// Fully resolved settings for one deploy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// Bucket locator. Opaque to the planner.
    pub bucket: String,
    pub source: PathBuf,
    pub pattern: String,
    pub acl: String,
    pub cache_control: String,
    pub release: Release,
    /// Number of trailing releases whose objects are preserved.
    pub keep: u64,
    pub clean: bool,
    pub deploy: bool,
    pub dry_run: bool,
    pub force: bool,
    pub yes: bool,
    pub quiet: bool,
    pub debug: bool,
    /// Config file the run was loaded from. Never published.
    pub config_file: Option<PathBuf>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            source: PathBuf::from("."),
            pattern: DEFAULT_PATTERN.to_string(),
            acl: DEFAULT_ACL.to_string(),
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
            release: Release(0),
            keep: DEFAULT_KEEP,
            clean: true,
            deploy: true,
            dry_run: false,
            force: false,
            yes: false,
            quiet: false,
            debug: false,
            config_file: None,
        }
    }
}

impl DeployConfig {
    /// Reject configurations the planner cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.release.0 < 1 {
            return Err(ConfigError::MissingRelease);
        }
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::MissingBucket);
        }
        Ok(())
    }

    /// Overlay every field set in `file`.
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.bucket {
            self.bucket = v;
        }
        if let Some(v) = file.source {
            self.source = v;
        }
        if let Some(v) = file.pattern {
            self.pattern = v;
        }
        if let Some(v) = file.acl {
            self.acl = v;
        }
        if let Some(v) = file.cache_control {
            self.cache_control = v;
        }
        if let Some(v) = file.release {
            self.release = Release(v);
        }
        if let Some(v) = file.keep {
            self.keep = v;
        }
        if let Some(v) = file.clean {
            self.clean = v;
        }
        if let Some(v) = file.deploy {
            self.deploy = v;
        }
    }

    /// Take `release` from the environment value when it parses.
    pub fn apply_release_env(&mut self, value: Option<&str>) {
        if let Some(n) = value.and_then(|v| v.trim().parse::<u64>().ok()) {
            self.release = Release(n);
        }
    }
}

/// On-disk config file shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct ConfigFile {
    pub bucket: Option<String>,
    pub source: Option<PathBuf>,
    pub pattern: Option<String>,
    pub acl: Option<String>,
    pub cache_control: Option<String>,
    pub release: Option<u64>,
    pub keep: Option<u64>,
    pub clean: Option<bool>,
    pub deploy: Option<bool>,
}

/// Load a config file.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_file_at(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `explicit` if given, else `<dir>/assetsync.yaml` when it exists.
pub fn config_path_at(dir: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    candidate.exists().then_some(candidate)
}

/// Load the file [`config_path_at`] picks, if any.
pub fn discover_at(dir: &Path, explicit: Option<&Path>) -> Result<Option<ConfigFile>, ConfigError> {
    match config_path_at(dir, explicit) {
        Some(path) => load_file_at(&path).map(Some),
        None => Ok(None),
    }
}

/// Expand a leading `~` against `home`. Other paths are returned unchanged.
pub fn expand_home_at(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// `expand_home_at` convenience wrapper using `dirs::home_dir()`.
pub fn expand_home(path: &Path) -> Result<PathBuf, ConfigError> {
    if !path.starts_with("~") {
        return Ok(path.to_path_buf());
    }
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    Ok(expand_home_at(path, &home))
}
