//! Phase 1: Planning
//!
//! Reads the site config and decides what to import. Imports embedded in the
//! nav take precedence over the plugin's `repos` list.

use std::path::Path;

use log::{debug, warn};

use super::ImportPlan;
use crate::config::{MultirepoConfig, SiteConfig};
use crate::error::Result;
use crate::nav::{self, RepoNames};
use crate::repository::{DocsRepo, RepoDefaults};

/// Repository defaults of a run: branch and docs handling from the plugin
/// section, edit URI from the site.
pub fn repo_defaults(site: &SiteConfig, plugin: &MultirepoConfig) -> RepoDefaults {
    RepoDefaults {
        branch: plugin.default_branch.clone(),
        edit_uri: site.edit_uri().map(str::to_string),
        keep_docs_dir: plugin.keep_docs_dir,
    }
}

/// Execute Phase 1: build the import plan for `site`.
pub fn execute(site: &SiteConfig, plugin: &MultirepoConfig, temp_dir: &Path) -> Result<ImportPlan> {
    let defaults = repo_defaults(site, plugin);

    if let Some(site_nav) = site.nav()? {
        if !plugin.repos.is_empty() {
            warn!("Multirepo plugin is ignoring plugins.multirepo.repos. Nav takes precedence");
        }
        let imports = nav::locate(&site_nav, temp_dir, &defaults)?;
        debug!("Found {} import(s) in nav", imports.len());
        return Ok(ImportPlan::Nav {
            nav: site_nav,
            imports,
        });
    }

    if plugin.repos.is_empty() {
        return Ok(ImportPlan::Empty);
    }

    let mut names = RepoNames::new();
    let repos = plugin
        .repos
        .iter()
        .map(|entry| {
            let name = names.allocate(&entry.name());
            let spec = entry.import_spec().map_err(|e| e.for_repo(&name))?;
            Ok(DocsRepo::from_spec(name, &spec, temp_dir, &defaults))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("Found {} repo(s) in plugins.multirepo.repos", repos.len());
    Ok(ImportPlan::Repos(repos))
}
