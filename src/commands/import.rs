//! Import command implementation
//!
//! Runs a complete import:
//! 1. Plan the imports of the site config
//! 2. Fetch and normalize every repository into the temp dir
//! 3. Splice imported navs into the site nav
//!
//! The resolved config and the edit-URL manifest are written out if asked for.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use log::debug;

use multirepo_docs::output::{emoji, OutputConfig};
use multirepo_docs::phases::orchestrator;
use multirepo_docs::script::BashRunner;

use super::SiteArgs;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Write the resolved site config here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write a JSON map of imported page -> edit URL
    #[arg(long, value_name = "PATH")]
    pub edit_urls: Option<PathBuf>,

    /// Branch used by imports that do not name one
    #[arg(long, value_name = "BRANCH")]
    pub default_branch: Option<String>,

    /// Remove the temp dir once done
    #[arg(long)]
    pub cleanup: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the import command
pub fn execute(args: ImportArgs, output: OutputConfig) -> Result<()> {
    let start_time = Instant::now();
    let mut site = args.site.load()?;
    if let Some(branch) = &args.default_branch {
        site.plugin.default_branch = branch.clone();
    }
    let cleanup = args.cleanup || site.plugin.cleanup;

    if !args.quiet {
        eprintln!(
            "{} Importing docs for {}",
            emoji(&output, "📚", "[IMPORT]"),
            site.path.display()
        );
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime.block_on(orchestrator::execute(
        site.config,
        &site.plugin,
        &site.temp_dir,
        &BashRunner::new(),
        output.progress_sink(args.quiet),
    ));

    let resolved = match result {
        Ok(resolved) => resolved,
        Err(e) => {
            if !args.quiet {
                eprintln!("{}", output.failure("Import failed"));
            }
            return Err(e.into());
        }
    };

    if let Some(path) = &args.edit_urls {
        let urls = orchestrator::edit_urls(&resolved)?;
        debug!("Computed {} edit URLs", urls.len());
        fs::write(path, serde_json::to_string_pretty(&urls)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let yaml = resolved.config.to_yaml_string()?;
    match &args.output {
        Some(path) => fs::write(path, yaml)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{}", yaml),
    }

    if cleanup {
        resolved.cleanup()?;
    }

    if !args.quiet {
        eprintln!(
            "{}",
            output.success(&format!(
                "Imported {} repositories in {:.2}s",
                resolved.repos.len(),
                start_time.elapsed().as_secs_f64()
            ))
        );
    }
    Ok(())
}
