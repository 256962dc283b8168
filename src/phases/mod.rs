//! Implementation of the phases of an import run.
//!
//! ## Overview
//!
//! An import run follows 3 phases:
//! 1. Planning - Find every import in the site config and name its repository
//! 2. Fetching - Sparse-fetch and normalize all repositories concurrently
//! 3. Splicing - Load each repository's own nav and merge it into the site nav
//!
//! Planning never touches the network, so a malformed directive fails the run
//! before anything is fetched. Splicing only starts once the whole batch has
//! been fetched.
//!
//! The [`orchestrator`] ties the phases together and computes edit URLs for the
//! result.

use crate::nav::{Nav, NavImport};
use crate::repository::DocsRepo;

pub mod fetch;
pub mod orchestrator;
pub mod plan;
pub mod splice;

pub use fetch as phase2;
pub use plan as phase1;
pub use splice as phase3;

/// What an import run has to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportPlan {
    /// Imports embedded in the site nav.
    Nav { nav: Nav, imports: Vec<NavImport> },
    /// Repositories listed in the plugin section, imported without a nav.
    Repos(Vec<DocsRepo>),
    /// Nothing to import.
    Empty,
}

impl ImportPlan {
    /// Every repository of the plan, in declaration order.
    pub fn repos(&self) -> Vec<&DocsRepo> {
        match self {
            ImportPlan::Nav { imports, .. } => imports.iter().map(|i| &i.repo).collect(),
            ImportPlan::Repos(repos) => repos.iter().collect(),
            ImportPlan::Empty => Vec::new(),
        }
    }

    /// Mutable access to every repository of the plan.
    pub fn repos_mut(&mut self) -> Vec<&mut DocsRepo> {
        match self {
            ImportPlan::Nav { imports, .. } => imports.iter_mut().map(|i| &mut i.repo).collect(),
            ImportPlan::Repos(repos) => repos.iter_mut().collect(),
            ImportPlan::Empty => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.repos().is_empty()
    }
}
