//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let remotes = Remotes::new().with_repo("https://x/api", &[("docs/index.md", "# API")]);
//! let runner = remotes.runner();
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use assert_fs::prelude::*;
use async_trait::async_trait;
use glob::Pattern;
use walkdir::WalkDir;

use multirepo_docs::error::Result;
use multirepo_docs::script::{BashRunner, Script, ScriptOutput, ScriptRunner};

/// Re-export commonly used test dependencies for convenience.
#[allow(unused_imports)]
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    pub use super::{Remotes, SiteFixture};
}

/// A set of fake remote repositories, each a directory of files keyed by URL.
pub struct Remotes {
    root: assert_fs::TempDir,
    repos: HashMap<String, PathBuf>,
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
}

#[allow(dead_code)]
impl Remotes {
    pub fn new() -> Self {
        Self {
            root: assert_fs::TempDir::new().expect("Failed to create temp directory"),
            repos: HashMap::new(),
            failures: HashMap::new(),
            delays: HashMap::new(),
        }
    }

    /// Adds a remote at `url` holding `files`.
    pub fn with_repo(mut self, url: &str, files: &[(&str, &str)]) -> Self {
        let dir = format!("remote-{}", self.repos.len());
        for (path, content) in files {
            self.root
                .child(&dir)
                .child(path)
                .write_str(content)
                .expect("Failed to write remote file");
        }
        self.repos.insert(url.to_string(), self.root.path().join(dir));
        self
    }

    /// Makes every fetch of `url` fail with `stderr`.
    pub fn failing(mut self, url: &str, stderr: &str) -> Self {
        self.failures.insert(url.to_string(), stderr.to_string());
        self
    }

    /// Delays every fetch of `url`.
    pub fn delayed(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn runner(&self) -> FixtureRunner<'_> {
        FixtureRunner {
            remotes: self,
            bash: BashRunner::new(),
            clones: Mutex::new(Vec::new()),
        }
    }
}

/// Serves sparse clones from [`Remotes`] and runs the real move-up script.
pub struct FixtureRunner<'a> {
    remotes: &'a Remotes,
    bash: BashRunner,
    clones: Mutex<Vec<Vec<String>>>,
}

#[allow(dead_code)]
impl FixtureRunner<'_> {
    /// Arguments of every sparse clone so far.
    pub fn clones(&self) -> Vec<Vec<String>> {
        self.clones.lock().unwrap().clone()
    }
}

#[async_trait]
impl<'a> ScriptRunner for FixtureRunner<'a> {
    async fn run(&self, script: Script, args: &[String], cwd: &Path) -> Result<ScriptOutput> {
        if script == Script::MoveDocsUp {
            return self.bash.run(script, args, cwd).await;
        }
        self.clones.lock().unwrap().push(args.to_vec());

        let (url, name, patterns) = (&args[0], &args[1], &args[3..]);
        if let Some(delay) = self.remotes.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(stderr) = self.remotes.failures.get(url) {
            return Ok(ScriptOutput::failure(128, stderr.clone()));
        }
        let Some(source) = self.remotes.repos.get(url) else {
            return Ok(ScriptOutput::failure(
                128,
                format!("fatal: repository '{}' not found", url),
            ));
        };

        let target = cwd.join(name);
        for entry in WalkDir::new(source).min_depth(1) {
            let entry = entry.unwrap();
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(source)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            if patterns.iter().any(|p| sparse_match(p, &rel)) {
                let dest = target.join(&rel);
                fs::create_dir_all(dest.parent().unwrap()).unwrap();
                fs::copy(entry.path(), dest).unwrap();
            }
        }
        fs::create_dir_all(&target).unwrap();
        Ok(ScriptOutput::success())
    }
}

/// Sparse-checkout matching: anchored when the pattern has a slash, any depth
/// otherwise, and a matched directory brings everything below it.
fn sparse_match(pattern: &str, rel: &str) -> bool {
    let pattern = pattern.trim_start_matches('/');
    let base = pattern.trim_end_matches("/*").trim_end_matches('/');
    if rel == base || rel.starts_with(&format!("{}/", base)) {
        return true;
    }
    if Pattern::new(pattern).map_or(false, |p| p.matches(rel)) {
        return true;
    }
    if !pattern.contains('/') {
        return rel.split('/').any(|part| part == base);
    }
    false
}

/// A site directory with a `mkdocs.yml`.
pub struct SiteFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl SiteFixture {
    pub fn new(config: &str) -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("mkdocs.yml")
            .write_str(config)
            .expect("Failed to write config file");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("mkdocs.yml")
    }

    pub fn temp_docs(&self) -> PathBuf {
        self.temp_dir.path().join("temp_docs")
    }
}
