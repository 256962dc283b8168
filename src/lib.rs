//! # Multirepo Docs Library
//!
//! This library aggregates documentation spread across many git repositories
//! into a single documentation site. It is designed to be used by the
//! `multirepo` command-line tool but can also be embedded in other site
//! generators.
//!
//! ## Quick Example
//!
//! ```
//! use multirepo_docs::config::SiteConfig;
//! use multirepo_docs::import::ImportSpec;
//! use multirepo_docs::nav;
//! use multirepo_docs::repository::RepoDefaults;
//! use std::path::Path;
//!
//! // Parse a single import directive
//! let spec = ImportSpec::parse("!import https://github.com/org/api?branch=main&multi_docs=true").unwrap();
//! assert_eq!(spec.url, "https://github.com/org/api");
//! assert_eq!(spec.branch.as_deref(), Some("main"));
//! assert!(spec.multi_docs);
//!
//! // Find the imports of a site nav
//! let site = SiteConfig::parse(r#"
//! nav:
//!   - Home: index.md
//!   - Backend:
//!       - API: "!import https://github.com/org/api"
//! "#).unwrap();
//! let site_nav = site.nav().unwrap().unwrap();
//! let imports = nav::locate(&site_nav, Path::new("temp_docs"), &RepoDefaults::default()).unwrap();
//! assert_eq!(imports.len(), 1);
//! assert_eq!(imports[0].repo.name(), "backend/api");
//! assert_eq!(imports[0].slot, vec![1, 0]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Import directives (`import`)**: `!import <url>?key=value&...` strings that
//!   name a repository and how to import it.
//! - **Navigation (`nav`)**: The site's nav tree. Imports are located by their
//!   index path and later replaced by the imported repository's own nav.
//! - **Repositories (`repository`, `script`)**: Sparse fetching through embedded
//!   bash scripts, and normalization of the fetched docs directories.
//! - **Edit URLs (`edit_url`)**: Links from every imported page back to its
//!   source file in the origin repository.
//! - **Phases (`phases`)**: The pipeline tying everything together.
//!
//! ## Execution Flow
//!
//! The main entry point is `phases::orchestrator::execute`:
//!
//! 1.  **Planning**: Parse every import of the site config. Nothing is fetched
//!     until all directives are valid.
//! 2.  **Fetching**: Fetch and normalize all repositories concurrently. The
//!     first failure aborts the batch and removes what was fetched.
//! 3.  **Splicing**: Replace each import in the site nav with the nav of its
//!     repository, prefixed with the repository's directory.
//!
//! `phases::orchestrator::edit_urls` then maps every imported page to its edit
//! URL.

pub mod config;
pub mod defaults;
pub mod edit_url;
pub mod error;
pub mod import;
pub mod nav;
pub mod output;
pub mod phases;
pub mod progress;
pub mod repository;
pub mod script;
