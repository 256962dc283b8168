//! # Repositories
//!
//! [`Repo`] is a remote git repository together with its working copy under a
//! temporary directory. [`DocsRepo`] adds what is needed to treat that working
//! copy as documentation: which directory holds the docs, how to flatten it,
//! and where its pages can be edited.
//!
//! ## Normalization
//!
//! After a fetch the documentation may sit in a nested `docs/` folder, or, for
//! multi-docs repositories, in several `docs/` folders spread across the tree.
//! [`DocsRepo::import_docs`] reshapes the working copy so the pages sit at the
//! root of the repository's directory:
//!
//! - **Single docs**: the docs directory is lifted to the root with the
//!   `mv_docs_up.sh` script.
//! - **Multi docs**: every directory literally named `docs` is lifted into its
//!   parent, and each moved path is recorded in `path_remap` so edit links
//!   can still point at the original location.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::defaults;
use crate::edit_url;
use crate::error::{Error, Result};
use crate::import::ImportSpec;
use crate::script::{Script, ScriptRunner};

/// A remote repository and its local working copy.
///
/// Two values are the same repository when name, url, branch and temp dir all
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repo {
    /// Unique slug, possibly multi-segment (`guides/api`).
    pub name: String,
    pub url: String,
    pub branch: String,
    /// Directory that holds the working copies of every repository of a run.
    pub temp_dir: PathBuf,
}

impl Repo {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        branch: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            branch: branch.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Path of the working copy.
    pub fn location(&self) -> PathBuf {
        self.temp_dir.join(&self.name)
    }

    /// True once the working copy exists.
    pub fn is_cloned(&self) -> bool {
        self.location().is_dir()
    }

    /// Sparse-clones `paths` of the repository into [`location`](Self::location).
    ///
    /// Any existing working copy is removed first, so calling this twice
    /// leaves exactly the content of the second fetch.
    pub async fn fetch(&self, paths: &[String], runner: &dyn ScriptRunner) -> Result<()> {
        let location = self.location();
        if location.exists() {
            tokio::fs::remove_dir_all(&location).await?;
        }
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        let mut args = vec![self.url.clone(), self.name.clone(), self.branch.clone()];
        args.extend(paths.iter().cloned());

        let output = runner
            .run(Script::SparseClone, &args, &self.temp_dir)
            .await?
            .check(&self.name, &self.url)?;
        if !output.stdout.trim().is_empty() {
            debug!("{}: {}", self.name, output.stdout.trim());
        }

        if !self.is_cloned() {
            return Err(Error::Fetch {
                name: self.name.clone(),
                url: self.url.clone(),
                stderr: format!("nothing was checked out into {}", location.display()),
            });
        }
        Ok(())
    }

    /// Loads a YAML config from the working copy.
    pub fn load_config(&self, file: &str) -> Result<SiteConfig> {
        if !self.is_cloned() {
            return Err(Error::NotImported {
                name: self.name.clone(),
                file: file.to_string(),
            });
        }
        let path = self.location().join(file);
        if !path.is_file() {
            return Err(Error::MissingFile {
                name: self.name.clone(),
                path: file.to_string(),
            });
        }
        SiteConfig::from_file(&path)
    }

    /// Removes the working copy.
    pub fn delete(&self) -> Result<()> {
        let location = self.location();
        if location.exists() {
            fs::remove_dir_all(location)?;
        }
        Ok(())
    }
}

/// Settings shared by every repository of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoDefaults {
    /// Branch used when an import does not name one.
    pub branch: String,
    /// The host site's `edit_uri`, if it sets one.
    pub edit_uri: Option<String>,
    /// Keep the `docs` directory of every import.
    pub keep_docs_dir: bool,
}

impl RepoDefaults {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            edit_uri: None,
            keep_docs_dir: false,
        }
    }
}

impl Default for RepoDefaults {
    fn default() -> Self {
        Self::new(defaults::BRANCH)
    }
}

/// A repository imported as documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsRepo {
    pub repo: Repo,
    /// Glob of the docs directory, `docs/*` by default.
    pub docs_dir: String,
    /// Edit URI appended to `url` for edit links. Always normalized.
    pub edit_uri: String,
    pub multi_docs: bool,
    /// Name of the repository's own config file.
    pub config: String,
    pub extra_imports: Vec<String>,
    pub keep_docs_dir: bool,
    /// Lifted relative path -> path in the origin repository.
    pub path_remap: BTreeMap<String, String>,
    explicit_edit_uri: bool,
}

impl DocsRepo {
    /// Builds a repository from a parsed import.
    pub fn from_spec(
        name: impl Into<String>,
        spec: &ImportSpec,
        temp_dir: &Path,
        defaults: &RepoDefaults,
    ) -> Self {
        let branch = spec
            .branch
            .clone()
            .unwrap_or_else(|| defaults.branch.clone());
        let (edit_uri, explicit_edit_uri) = match &spec.edit_uri {
            Some(uri) => (uri.clone(), true),
            None => {
                let ambient = defaults
                    .edit_uri
                    .clone()
                    .unwrap_or_else(|| defaults::edit_uri(&branch));
                (edit_url::normalize_edit_uri(&ambient, &branch), false)
            }
        };

        Self {
            repo: Repo::new(name, spec.url.clone(), branch, temp_dir),
            docs_dir: spec.docs_dir.clone(),
            edit_uri,
            multi_docs: spec.multi_docs,
            config: spec.config.clone(),
            extra_imports: spec.extra_imports.clone(),
            keep_docs_dir: spec.keep_docs_dir || defaults.keep_docs_dir,
            path_remap: BTreeMap::new(),
            explicit_edit_uri,
        }
    }

    pub fn name(&self) -> &str {
        &self.repo.name
    }

    pub fn location(&self) -> PathBuf {
        self.repo.location()
    }

    /// The literal docs directory (`docs_dir` without its `/*` glob).
    pub fn docs_root(&self) -> &str {
        self.docs_dir
            .trim_end_matches("/*")
            .trim_end_matches('*')
            .trim_matches('/')
    }

    /// Directory of the pages relative to the site root, used to prefix the
    /// repository's own nav paths.
    pub fn nav_prefix(&self) -> String {
        if self.keep_docs_dir && !self.multi_docs && !self.docs_root().is_empty() {
            format!("{}/{}", self.name(), self.docs_root())
        } else {
            self.name().to_string()
        }
    }

    /// Adopts the `edit_uri` of the repository's own config, unless the
    /// import set one explicitly.
    ///
    /// A repository's config usually points its edit URI into its own docs
    /// directory (`edit/main/fldr/docs/`). That trailing docs root is dropped
    /// here because [`edit_url`](Self::edit_url) adds it back per file.
    pub fn set_edit_uri(&mut self, edit_uri: Option<&str>) {
        if self.explicit_edit_uri {
            return;
        }
        let Some(uri) = edit_uri else {
            return;
        };
        let mut normalized = edit_url::normalize_edit_uri(uri, &self.repo.branch);
        let root = self.docs_root();
        if !self.multi_docs && !root.is_empty() {
            let suffix = format!("/{}/", root);
            if normalized.len() > suffix.len() && normalized.ends_with(&suffix) {
                normalized.truncate(normalized.len() - suffix.len() + 1);
            }
        }
        self.edit_uri = normalized;
    }

    /// Fetches and normalizes the documentation of this repository.
    pub async fn import_docs(&mut self, runner: &dyn ScriptRunner) -> Result<()> {
        info!(
            "Importing docs for {} from {}@{}",
            self.name(),
            self.repo.url,
            self.repo.branch
        );

        if self.multi_docs {
            let mut paths = vec![defaults::MULTI_DOCS_DIR.to_string(), self.config.clone()];
            paths.extend(self.extra_imports.iter().cloned());
            self.repo.fetch(&paths, runner).await?;
            let location = self.location();
            self.path_remap =
                tokio::task::spawn_blocking(move || lift_docs_dirs(&location)).await??;
            debug!(
                "{}: lifted {} paths out of docs directories",
                self.name(),
                self.path_remap.len()
            );
            return Ok(());
        }

        let mut paths = vec![self.docs_dir.clone(), self.config.clone()];
        paths.extend(self.extra_imports.iter().cloned());
        self.repo.fetch(&paths, runner).await?;

        if !self.keep_docs_dir && !self.docs_root().is_empty() {
            let args = vec![self.docs_root().to_string(), ".".to_string()];
            runner
                .run(Script::MoveDocsUp, &args, &self.location())
                .await?
                .check(self.name(), &self.repo.url)?;
        }
        Ok(())
    }

    /// Loads the repository's own config after [`import_docs`](Self::import_docs).
    ///
    /// `config` names the file as it was in the origin repository, so it is
    /// also looked up where normalization moved it: out of the docs
    /// directory when that was lifted, inside it when it was kept.
    pub fn load_config(&self) -> Result<SiteConfig> {
        let location = self.repo.location();
        let root = self.docs_root();
        let candidates = [
            Some(self.config.clone()),
            self.config
                .strip_prefix(root)
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|_| !root.is_empty() && !self.keep_docs_dir)
                .map(str::to_string),
            Some(format!("{}/{}", root, self.config)).filter(|_| self.keep_docs_dir),
        ];
        match candidates
            .into_iter()
            .flatten()
            .find(|file| location.join(file).is_file())
        {
            Some(file) => self.repo.load_config(&file),
            None => self.repo.load_config(&self.config),
        }
    }
}

/// Lifts every `docs` directory under `root` into its parent, shallowest
/// first, and returns the lifted path -> original path mapping of every
/// moved entry.
///
/// When two lifted entries land on the same path the last one wins.
pub fn lift_docs_dirs(root: &Path) -> Result<BTreeMap<String, String>> {
    let mut remap = BTreeMap::new();

    while let Some(docs) = shallowest_docs_dir(root)? {
        let parent = docs
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        remap.remove(&relative(root, &docs));

        for entry in WalkDir::new(&docs).min_depth(1) {
            let entry = entry?;
            let old = relative(root, entry.path());
            let rest = entry.path().strip_prefix(&docs).unwrap_or(entry.path());
            let new = relative(root, &parent.join(rest));
            let original = remap.remove(&old).unwrap_or(old);
            remap.insert(new, original);
        }

        // Move the docs dir aside first, it may itself contain a `docs` child.
        let staging = parent.join(".multirepo-lift");
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::rename(&docs, &staging)?;
        for child in fs::read_dir(&staging)? {
            let child = child?;
            move_entry(&child.path(), &parent.join(child.file_name()))?;
        }
        fs::remove_dir_all(&staging)?;
    }

    Ok(remap)
}

fn shallowest_docs_dir(root: &Path) -> Result<Option<PathBuf>> {
    let mut best: Option<(usize, PathBuf)> = None;
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() || entry.file_name() != defaults::MULTI_DOCS_DIR {
            continue;
        }
        if best.as_ref().map_or(true, |(depth, _)| entry.depth() < *depth) {
            best = Some((entry.depth(), entry.into_path()));
        }
    }
    Ok(best.map(|(_, path)| path))
}

fn move_entry(from: &Path, to: &Path) -> Result<()> {
    if from.is_dir() && to.is_dir() {
        for child in fs::read_dir(from)? {
            let child = child?;
            move_entry(&child.path(), &to.join(child.file_name()))?;
        }
        fs::remove_dir(from)?;
        return Ok(());
    }
    if to.is_dir() {
        fs::remove_dir_all(to)?;
    } else if to.exists() {
        fs::remove_file(to)?;
    }
    fs::rename(from, to)?;
    Ok(())
}

/// `path` relative to `root`, with `/` separators.
pub(crate) fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptOutput;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes a fixed set of files for every sparse clone and records calls.
    struct FakeRunner {
        files: Vec<(&'static str, &'static str)>,
        calls: Mutex<Vec<(Script, Vec<String>)>>,
        clones: AtomicUsize,
    }

    impl FakeRunner {
        fn with_files(files: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                files,
                calls: Mutex::new(Vec::new()),
                clones: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ScriptRunner for FakeRunner {
        async fn run(&self, script: Script, args: &[String], cwd: &Path) -> Result<ScriptOutput> {
            self.calls.lock().unwrap().push((script, args.to_vec()));
            match script {
                Script::SparseClone => {
                    let run = self.clones.fetch_add(1, Ordering::SeqCst);
                    let location = cwd.join(&args[1]);
                    for (path, content) in &self.files {
                        let file = location.join(path);
                        fs::create_dir_all(file.parent().unwrap()).unwrap();
                        fs::write(file, content).unwrap();
                    }
                    if run == 0 {
                        fs::write(location.join("first-run-only.md"), "stale").unwrap();
                    }
                    Ok(ScriptOutput::success())
                }
                Script::MoveDocsUp => {
                    let docs = cwd.join(&args[0]);
                    for child in fs::read_dir(&docs).unwrap() {
                        let child = child.unwrap();
                        fs::rename(child.path(), cwd.join(child.file_name())).unwrap();
                    }
                    fs::remove_dir(docs).unwrap();
                    Ok(ScriptOutput::success())
                }
            }
        }
    }

    struct FailingRunner;

    #[async_trait]
    impl ScriptRunner for FailingRunner {
        async fn run(&self, _: Script, _: &[String], _: &Path) -> Result<ScriptOutput> {
            Ok(ScriptOutput::failure(128, "fatal: repository not found"))
        }
    }

    fn demo_files() -> Vec<(&'static str, &'static str)> {
        vec![
            ("docs/index.md", "# Home"),
            ("docs/page1.md", "page1"),
            ("docs/page2.md", "page2"),
            (
                "docs/mkdocs.yml",
                "edit_uri: /blob/master/\nnav:\n  - Home: index.md\n  - Page1: page1.md\n  - Page2: page2.md\n",
            ),
        ]
    }

    fn docs_repo(temp: &Path, spec: &str) -> DocsRepo {
        let spec = ImportSpec::parse(spec).unwrap();
        DocsRepo::from_spec("test-repo", &spec, temp, &RepoDefaults::new("main"))
    }

    #[test]
    fn test_location_and_cloned() {
        let temp = TempDir::new().unwrap();
        let repo = Repo::new("a/b", "https://x", "main", temp.path());
        assert_eq!(repo.location(), temp.path().join("a/b"));
        assert!(!repo.is_cloned());
        fs::create_dir_all(repo.location()).unwrap();
        assert!(repo.is_cloned());
    }

    #[test]
    fn test_repo_equality() {
        let a = Repo::new("n", "u", "main", "/tmp/x");
        assert_eq!(a, Repo::new("n", "u", "main", "/tmp/x"));
        assert_ne!(a, Repo::new("n", "u", "dev", "/tmp/x"));
        assert_ne!(a, Repo::new("n", "u", "main", "/tmp/y"));
    }

    #[tokio::test]
    async fn test_fetch_passes_contract_arguments() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::with_files(demo_files());
        let repo = Repo::new("test_docs", "https://example.com/r", "main", temp.path());
        repo.fetch(&["docs/*".to_string()], &runner).await.unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            (
                Script::SparseClone,
                vec![
                    "https://example.com/r".to_string(),
                    "test_docs".to_string(),
                    "main".to_string(),
                    "docs/*".to_string()
                ]
            )
        );
        assert!(repo.location().join("docs/index.md").is_file());
    }

    #[tokio::test]
    async fn test_fetch_twice_leaves_no_stale_files() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::with_files(demo_files());
        let repo = Repo::new("test_docs", "https://example.com/r", "main", temp.path());

        repo.fetch(&["docs/*".to_string()], &runner).await.unwrap();
        assert!(repo.location().join("first-run-only.md").exists());

        repo.fetch(&["docs/*".to_string()], &runner).await.unwrap();
        assert!(!repo.location().join("first-run-only.md").exists());
        assert!(repo.location().join("docs/page1.md").is_file());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fetch_error() {
        let temp = TempDir::new().unwrap();
        let repo = Repo::new("r", "https://example.com/r", "main", temp.path());
        let err = repo.fetch(&[], &FailingRunner).await.unwrap_err();
        assert!(matches!(err, Error::Fetch { stderr, .. } if stderr.contains("not found")));
    }

    #[tokio::test]
    async fn test_load_config() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::with_files(demo_files());
        let repo = Repo::new("test_repo", "https://example.com/r", "main", temp.path());

        assert!(matches!(
            repo.load_config("docs/mkdocs.yml"),
            Err(Error::NotImported { .. })
        ));

        repo.fetch(&["docs/*".to_string()], &runner).await.unwrap();
        let config = repo.load_config("docs/mkdocs.yml").unwrap();
        assert_eq!(config.edit_uri(), Some("/blob/master/"));
        assert_eq!(config.nav().unwrap().unwrap().len(), 3);

        assert!(matches!(
            repo.load_config(""),
            Err(Error::MissingFile { .. })
        ));
    }

    #[tokio::test]
    async fn test_import_docs_flattens_single_docs() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::with_files(demo_files());
        let mut repo = docs_repo(
            temp.path(),
            r#"https://example.com/r?extra_imports=["src/*"]"#,
        );
        repo.import_docs(&runner).await.unwrap();

        for file in ["index.md", "mkdocs.yml", "page1.md", "page2.md"] {
            assert!(repo.location().join(file).is_file(), "{} missing", file);
        }
        assert!(!repo.location().join("docs").exists());

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].1[3..], ["docs/*", "mkdocs.yml", "src/*"]);
        assert_eq!(calls[1], (Script::MoveDocsUp, vec!["docs".into(), ".".into()]));
    }

    #[tokio::test]
    async fn test_import_docs_keep_docs_dir() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::with_files(demo_files());
        let mut repo = docs_repo(temp.path(), "https://example.com/r?keep_docs_dir=true");
        repo.import_docs(&runner).await.unwrap();

        assert!(repo.location().join("docs/index.md").is_file());
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
        assert_eq!(repo.nav_prefix(), "test-repo/docs");
        assert!(repo.load_config().is_ok());
    }

    #[tokio::test]
    async fn test_import_docs_multi_docs_records_remap() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::with_files(vec![
            ("docs/index.md", "root"),
            ("docs/mkdocs.yml", "nav: []\n"),
            ("pkgA/docs/index.md", "a"),
            ("pkgA/docs/getting-started/page.md", "a page"),
            ("pkgB/docs/index.md", "b"),
        ]);
        let mut repo = docs_repo(temp.path(), "https://example.com/r?multi_docs=true");
        repo.import_docs(&runner).await.unwrap();

        let location = repo.location();
        for file in [
            "index.md",
            "mkdocs.yml",
            "pkgA/index.md",
            "pkgA/getting-started/page.md",
            "pkgB/index.md",
        ] {
            assert!(location.join(file).is_file(), "{} missing", file);
        }
        assert!(!location.join("pkgA/docs").exists());

        assert_eq!(repo.path_remap["pkgA/index.md"], "pkgA/docs/index.md");
        assert_eq!(repo.path_remap["index.md"], "docs/index.md");
        assert_eq!(
            repo.path_remap["pkgA/getting-started"],
            "pkgA/docs/getting-started"
        );
        assert_eq!(runner.calls.lock().unwrap()[0].1[3..], ["docs", "mkdocs.yml"]);
    }

    #[test]
    fn test_lift_nested_docs_composes_remap() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("docs/docs")).unwrap();
        fs::write(root.join("docs/docs/deep.md"), "deep").unwrap();
        fs::write(root.join("docs/top.md"), "top").unwrap();

        let remap = lift_docs_dirs(root).unwrap();
        assert!(root.join("deep.md").is_file());
        assert!(root.join("top.md").is_file());
        assert!(!root.join("docs").exists());
        assert_eq!(remap["deep.md"], "docs/docs/deep.md");
        assert_eq!(remap["top.md"], "docs/top.md");
    }

    #[test]
    fn test_lift_collision_last_write_wins() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("pkg/docs")).unwrap();
        fs::write(root.join("pkg/index.md"), "outer").unwrap();
        fs::write(root.join("pkg/docs/index.md"), "lifted").unwrap();

        lift_docs_dirs(root).unwrap();
        assert_eq!(fs::read_to_string(root.join("pkg/index.md")).unwrap(), "lifted");
    }

    #[test]
    fn test_edit_uri_defaults_follow_branch() {
        let temp = TempDir::new().unwrap();
        let spec = ImportSpec::parse("https://example.com/r?branch=main").unwrap();
        let mut defaults = RepoDefaults::new("master");
        defaults.edit_uri = Some("/edit/master/docs/".to_string());

        let mut repo = DocsRepo::from_spec("r", &spec, temp.path(), &defaults);
        assert_eq!(repo.edit_uri, "/edit/main/");

        repo.set_edit_uri(Some("/blob/master/"));
        assert_eq!(repo.edit_uri, "/blob/main/");
    }

    #[test]
    fn test_explicit_edit_uri_wins() {
        let temp = TempDir::new().unwrap();
        let spec = ImportSpec::parse("https://example.com/r?edit_uri=/tree/dev/").unwrap();
        let mut repo = DocsRepo::from_spec("r", &spec, temp.path(), &RepoDefaults::default());
        repo.set_edit_uri(Some("/blob/master/"));
        assert_eq!(repo.edit_uri, "/tree/dev/");
    }
}
