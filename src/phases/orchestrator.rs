//! Orchestrator for a complete import run
//!
//! This module coordinates all phases to provide a clean API for resolving a
//! site config, and computes the edit URL of every imported page once the run
//! is done.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use super::{phase1, phase2, phase3, ImportPlan};
use crate::config::{MultirepoConfig, SiteConfig};
use crate::error::Result;
use crate::progress::ProgressSink;
use crate::repository::{self, DocsRepo, Repo};
use crate::script::ScriptRunner;

/// The outcome of an import run.
#[derive(Debug, Clone)]
pub struct ResolvedSite {
    /// The site config with every nav import replaced.
    pub config: SiteConfig,
    /// Every imported repository, in declaration order.
    pub repos: Vec<DocsRepo>,
    pub temp_dir: PathBuf,
}

impl ResolvedSite {
    /// Removes the temp dir and everything imported into it.
    pub fn cleanup(&self) -> Result<()> {
        if self.temp_dir.exists() {
            info!("Cleaning up {}", self.temp_dir.display());
            fs::remove_dir_all(&self.temp_dir)?;
        }
        Ok(())
    }
}

/// Execute a complete import run (Phases 1-3).
///
/// 1. Plan the imports of `site` (no network access)
/// 2. Fetch and normalize every repository into `temp_dir`
/// 3. Splice imported navs into the site nav
///
/// On failure every working copy of the run is removed, and so is `temp_dir`
/// when this run created it.
pub async fn execute(
    mut site: SiteConfig,
    plugin: &MultirepoConfig,
    temp_dir: &Path,
    runner: &dyn ScriptRunner,
    sink: Box<dyn ProgressSink>,
) -> Result<ResolvedSite> {
    // Phase 1: Planning
    let mut plan = phase1::execute(&site, plugin, temp_dir)?;
    if plan.is_empty() {
        info!("Nothing to import");
    }

    let created = !temp_dir.exists();
    fs::create_dir_all(temp_dir)?;
    let batch: Vec<Repo> = plan.repos().iter().map(|r| r.repo.clone()).collect();

    match resolve(&mut site, &mut plan, runner, sink).await {
        Ok(()) => Ok(ResolvedSite {
            config: site,
            repos: into_repos(plan),
            temp_dir: temp_dir.to_path_buf(),
        }),
        Err(e) => {
            discard(&batch, temp_dir, created);
            Err(e)
        }
    }
}

async fn resolve(
    site: &mut SiteConfig,
    plan: &mut ImportPlan,
    runner: &dyn ScriptRunner,
    sink: Box<dyn ProgressSink>,
) -> Result<()> {
    // Phase 2: Fetching
    phase2::execute(plan.repos_mut(), runner, sink).await?;

    // Phase 3: Splicing
    if let ImportPlan::Nav { nav, imports } = plan {
        phase3::execute(nav, imports)?;
        site.set_nav(nav)?;
    }
    Ok(())
}

fn into_repos(plan: ImportPlan) -> Vec<DocsRepo> {
    match plan {
        ImportPlan::Nav { imports, .. } => imports.into_iter().map(|i| i.repo).collect(),
        ImportPlan::Repos(repos) => repos,
        ImportPlan::Empty => Vec::new(),
    }
}

fn discard(batch: &[Repo], temp_dir: &Path, created: bool) {
    let result = if created {
        fs::remove_dir_all(temp_dir).map_err(Into::into)
    } else {
        batch.iter().try_for_each(Repo::delete)
    };
    if let Err(e) = result {
        warn!("Could not clean up {}: {}", temp_dir.display(), e);
    }
}

/// Computes the edit URL of every imported markdown page.
///
/// Keys are paths relative to the temp dir. Pages are matched to the
/// repository with the longest name that prefixes their path.
pub fn edit_urls(site: &ResolvedSite) -> Result<BTreeMap<String, String>> {
    let mut urls = BTreeMap::new();
    if !site.temp_dir.is_dir() {
        return Ok(urls);
    }

    for entry in WalkDir::new(&site.temp_dir).sort_by_file_name() {
        let entry = entry?;
        let is_markdown = entry
            .path()
            .extension()
            .map_or(false, |ext| ext == "md" || ext == "markdown");
        if !entry.file_type().is_file() || !is_markdown {
            continue;
        }
        let src_path = repository::relative(&site.temp_dir, entry.path());
        let Some(repo) = owner(&site.repos, &src_path) else {
            debug!("{} does not belong to an imported repository", src_path);
            continue;
        };
        let url = repo.edit_url(&src_path, false, false)?;
        urls.insert(src_path, url);
    }
    Ok(urls)
}

fn owner<'a>(repos: &'a [DocsRepo], src_path: &str) -> Option<&'a DocsRepo> {
    repos
        .iter()
        .filter(|r| src_path.starts_with(&format!("{}/", r.name())))
        .max_by_key(|r| r.name().len())
}
