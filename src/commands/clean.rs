//! Clean command implementation
//!
//! Removes the temp dir an earlier `import` left behind.

use std::fs;

use anyhow::{Context, Result};
use clap::Args;

use multirepo_docs::output::OutputConfig;

use super::SiteArgs;

/// Arguments for the clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    #[command(flatten)]
    pub site: SiteArgs,
}

/// Execute the clean command
pub fn execute(args: CleanArgs, output: OutputConfig) -> Result<()> {
    let site = args.site.load()?;
    if !site.temp_dir.exists() {
        println!("Nothing to clean at {}", site.temp_dir.display());
        return Ok(());
    }
    fs::remove_dir_all(&site.temp_dir)
        .with_context(|| format!("Failed to remove {}", site.temp_dir.display()))?;
    println!(
        "{}",
        output.success(&format!("Removed {}", site.temp_dir.display()))
    );
    Ok(())
}
