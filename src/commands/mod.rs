//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `multirepo` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `multirepo_docs` library.

pub mod clean;
pub mod completions;
pub mod import;
pub mod plan;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use multirepo_docs::config::{MultirepoConfig, SiteConfig};
use multirepo_docs::defaults;

/// Arguments shared by every command that reads a site config.
#[derive(Args, Debug, Clone)]
pub struct SiteArgs {
    /// Path to the site config
    #[arg(short, long, value_name = "PATH", env = "MULTIREPO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory receiving imported docs (defaults to the plugin's temp_dir,
    /// relative to the site config)
    #[arg(long, value_name = "DIR", env = "MULTIREPO_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,
}

/// A loaded site config and the settings derived from it.
#[derive(Debug)]
pub struct Site {
    pub path: PathBuf,
    pub config: SiteConfig,
    pub plugin: MultirepoConfig,
    pub temp_dir: PathBuf,
}

impl SiteArgs {
    /// Reads the site config and resolves the temp dir.
    pub fn load(&self) -> Result<Site> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(defaults::SITE_CONFIG));
        if !path.is_file() {
            anyhow::bail!("Site config not found: {}", path.display());
        }

        let config = SiteConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        let plugin = config.plugin_config()?.unwrap_or_default();
        let temp_dir = match &self.temp_dir {
            Some(dir) => dir.clone(),
            None => site_root(&path).join(&plugin.temp_dir),
        };

        Ok(Site {
            path,
            config,
            plugin,
            temp_dir,
        })
    }
}

fn site_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
