pub mod deploy;
pub mod plan;
pub mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use assetsync_core::config::{self, RELEASE_ENV};
use assetsync_core::{DeployConfig, Release};

/// Flags shared by `deploy` and `plan`. Unset flags fall through to the
/// config file, `$BUILD_NUMBER` and the built-in defaults.
#[derive(Args, Debug, Default)]
pub struct SelectionArgs {
    /// Bucket locator: a directory, `file://<dir>` or `mem://`.
    #[arg(long, short = 'b')]
    pub bucket: Option<String>,

    /// Local directory holding the assets.
    #[arg(long, short = 's')]
    pub source: Option<PathBuf>,

    /// Glob matched against each file's path relative to the source.
    #[arg(long, short = 'p')]
    pub pattern: Option<String>,

    /// Current release number [default: $BUILD_NUMBER].
    #[arg(long, short = 'r')]
    pub release: Option<u64>,

    /// Number of previous releases to keep in the bucket.
    #[arg(long, short = 'k')]
    pub keep: Option<u64>,

    /// Canned ACL applied to written objects.
    #[arg(long)]
    pub acl: Option<String>,

    /// Cache-Control value every object must carry.
    #[arg(long)]
    pub cache_control: Option<String>,

    /// YAML config file [default: ./assetsync.yaml when present].
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Leave expired objects in the bucket.
    #[arg(long)]
    pub no_clean: bool,

    /// Do not upload files missing from the bucket.
    #[arg(long)]
    pub no_deploy: bool,

    /// Upload every local file, even if it is up to date.
    #[arg(long)]
    pub force: bool,

    /// Only log warnings and errors.
    #[arg(long, short = 'q', conflicts_with = "debug")]
    pub quiet: bool,

    /// Log per-object detail.
    #[arg(long)]
    pub debug: bool,
}

impl SelectionArgs {
    /// Build the run configuration: defaults, then the config file, then
    /// `$BUILD_NUMBER`, then these flags.
    pub fn resolve(&self) -> Result<DeployConfig> {
        let cwd = std::env::current_dir().context("could not determine working directory")?;
        let mut cfg = DeployConfig::default();

        if let Some(path) = config::config_path_at(&cwd, self.config.as_deref()) {
            let file = config::load_file_at(&path)
                .with_context(|| format!("failed to load config file {}", path.display()))?;
            cfg.apply_file(file);
            cfg.config_file = Some(path);
        }
        cfg.apply_release_env(std::env::var(RELEASE_ENV).ok().as_deref());

        if let Some(v) = &self.bucket {
            cfg.bucket = v.clone();
        }
        if let Some(v) = &self.source {
            cfg.source = v.clone();
        }
        if let Some(v) = &self.pattern {
            cfg.pattern = v.clone();
        }
        if let Some(v) = self.release {
            cfg.release = Release(v);
        }
        if let Some(v) = self.keep {
            cfg.keep = v;
        }
        if let Some(v) = &self.acl {
            cfg.acl = v.clone();
        }
        if let Some(v) = &self.cache_control {
            cfg.cache_control = v.clone();
        }
        if self.no_clean {
            cfg.clean = false;
        }
        if self.no_deploy {
            cfg.deploy = false;
        }
        cfg.force = self.force;
        cfg.quiet = self.quiet;
        cfg.debug = self.debug;

        cfg.validate().context("invalid configuration")?;
        tracing::debug!(?cfg, "resolved configuration");
        Ok(cfg)
    }
}
