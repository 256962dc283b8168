//! Integration tests for a complete import run: planning, fetching with the
//! real move-up script, splicing, and edit-URL derivation.

mod common;

use std::fs;
use std::path::Path;

use common::Remotes;
use multirepo_docs::config::SiteConfig;
use multirepo_docs::phases::orchestrator::{self, ResolvedSite};
use multirepo_docs::progress::CollectingProgress;
use multirepo_docs::script::ScriptRunner;

const BACKSTAGE: &str = "https://github.com/backstage/backstage";
const MONO: &str = "https://github.com/org/mono";
const GUIDES: &str = "https://github.com/org/guides";

fn backstage_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("docs/index.md", "# Backstage"),
        ("docs/getting-started/install.md", "install"),
        ("README.md", "readme"),
        ("src/main.ts", "code"),
        (
            "mkdocs.yml",
            "edit_uri: /edit/master/docs/\nnav:\n  - Overview: index.md\n  - Getting Started:\n      - getting-started/install.md\n",
        ),
    ]
}

async fn import(
    yaml: &str,
    temp_dir: &Path,
    runner: &dyn ScriptRunner,
) -> multirepo_docs::error::Result<ResolvedSite> {
    let site = SiteConfig::parse(yaml)?;
    let plugin = site.plugin_config()?.unwrap_or_default();
    orchestrator::execute(site, &plugin, temp_dir, runner, Box::new(CollectingProgress::new()))
        .await
}

#[tokio::test]
async fn test_nav_imports_are_spliced() {
    let remotes = Remotes::new()
        .with_repo(BACKSTAGE, &backstage_files())
        .with_repo(
            GUIDES,
            &[
                ("site/docs/intro.md", "intro"),
                ("site/docs/mkdocs.yml", "nav:\n  - Intro: intro.md\n"),
            ],
        );
    let runner = remotes.runner();
    let temp = tempfile::TempDir::new().unwrap();
    let temp_dir = temp.path().join("temp_docs");

    let yaml = format!(
        r#"
site_name: Aggregate
nav:
  - Home: index.md
  - Platform:
      - Backstage: "!import {}?branch=main&extra_imports=[\"README.md\"]"
      - Guides: "!import {}?docs_dir=site/docs/*&config=site/docs/mkdocs.yml"
"#,
        BACKSTAGE, GUIDES
    );
    let resolved = import(&yaml, &temp_dir, &runner).await.unwrap();

    let nav = resolved.config.nav().unwrap().unwrap();
    insta::assert_snapshot!(serde_yaml::to_string(&nav).unwrap(), @r###"
    - Home: index.md
    - Platform:
      - Backstage:
        - Overview: platform/backstage/index.md
        - Getting Started:
          - platform/backstage/getting-started/install.md
      - Guides:
        - Intro: platform/guides/intro.md
    "###);

    assert!(temp_dir.join("platform/backstage/index.md").is_file());
    assert!(temp_dir.join("platform/backstage/README.md").is_file());
    assert!(!temp_dir.join("platform/backstage/src").exists());
    assert!(temp_dir.join("platform/guides/intro.md").is_file());
    assert!(!temp_dir.join("platform/guides/site").exists());

    let clones = runner.clones();
    let backstage = clones.iter().find(|args| args[0] == BACKSTAGE).unwrap();
    assert_eq!(
        *backstage,
        vec![BACKSTAGE, "platform/backstage", "main", "docs/*", "mkdocs.yml", "README.md"]
    );

    let urls = orchestrator::edit_urls(&resolved).unwrap();
    assert_eq!(
        urls["platform/backstage/index.md"],
        format!("{}/edit/main/docs/index.md", BACKSTAGE)
    );
    assert_eq!(
        urls["platform/backstage/README.md"],
        format!("{}/edit/main/README.md", BACKSTAGE)
    );
    assert_eq!(
        urls["platform/guides/intro.md"],
        format!("{}/blob/master/site/docs/intro.md", GUIDES)
    );
}

#[tokio::test]
async fn test_repos_mode_multi_docs_remap() {
    let remotes = Remotes::new().with_repo(
        MONO,
        &[
            ("docs/index.md", "root"),
            ("pkgA/docs/index.md", "a"),
            ("pkgA/docs/guides/setup.md", "setup"),
            ("pkgA/src/lib.rs", "code"),
            ("pkgB/docs/index.md", "b"),
            ("mkdocs.yml", "nav: []\n"),
        ],
    );
    let runner = remotes.runner();
    let temp = tempfile::TempDir::new().unwrap();

    let yaml = format!(
        r#"
plugins:
  - multirepo:
      default_branch: main
      repos:
        - section: Mono Repo
          section_path: Packages
          import_url: "{}?multi_docs=true"
"#,
        MONO
    );
    let resolved = import(&yaml, temp.path(), &runner).await.unwrap();

    let repo = &resolved.repos[0];
    assert_eq!(repo.name(), "packages/mono-repo");
    assert_eq!(repo.path_remap["pkgA/index.md"], "pkgA/docs/index.md");

    let location = temp.path().join("packages/mono-repo");
    assert!(location.join("pkgA/index.md").is_file());
    assert!(location.join("pkgA/guides/setup.md").is_file());
    assert!(location.join("pkgB/index.md").is_file());
    assert!(!location.join("pkgA/src").exists());
    assert!(!location.join("pkgA/docs").exists());

    let urls = orchestrator::edit_urls(&resolved).unwrap();
    assert_eq!(
        urls["packages/mono-repo/pkgA/index.md"],
        format!("{}/blob/main/pkgA/docs/index.md", MONO)
    );
    assert_eq!(
        urls["packages/mono-repo/pkgA/guides/setup.md"],
        format!("{}/blob/main/pkgA/docs/guides/setup.md", MONO)
    );
    assert_eq!(
        urls["packages/mono-repo/index.md"],
        format!("{}/blob/main/docs/index.md", MONO)
    );
    // repos mode leaves the site nav alone
    assert_eq!(resolved.config.nav().unwrap(), None);
}

#[tokio::test]
async fn test_keep_docs_dir_from_plugin_section() {
    let remotes = Remotes::new().with_repo(
        GUIDES,
        &[
            ("docs/intro.md", "intro"),
            ("docs/mkdocs.yml", "nav:\n  - Intro: intro.md\n"),
        ],
    );
    let runner = remotes.runner();
    let temp = tempfile::TempDir::new().unwrap();

    let yaml = format!(
        "nav:\n  - Guides: \"!import {}\"\nplugins:\n  - multirepo:\n      keep_docs_dir: true\n",
        GUIDES
    );
    let resolved = import(&yaml, temp.path(), &runner).await.unwrap();

    assert!(temp.path().join("guides/docs/intro.md").is_file());
    let out = resolved.config.to_yaml_string().unwrap();
    assert!(out.contains("guides/docs/intro.md"));

    let urls = orchestrator::edit_urls(&resolved).unwrap();
    assert_eq!(
        urls["guides/docs/intro.md"],
        format!("{}/blob/master/docs/intro.md", GUIDES)
    );
}

#[tokio::test]
async fn test_missing_sub_nav_fails_and_cleans_up() {
    let remotes = Remotes::new().with_repo(
        GUIDES,
        &[("docs/intro.md", "intro"), ("mkdocs.yml", "site_name: guides\n")],
    );
    let runner = remotes.runner();
    let temp = tempfile::TempDir::new().unwrap();
    let temp_dir = temp.path().join("temp_docs");

    let yaml = format!("nav:\n  - Guides: \"!import {}\"\n", GUIDES);
    let err = import(&yaml, &temp_dir, &runner).await.unwrap_err();

    assert!(err.to_string().contains("for guides"));
    assert!(!temp_dir.exists());
}

#[tokio::test]
async fn test_unknown_option_fails_before_fetching() {
    let remotes = Remotes::new().with_repo(GUIDES, &[("docs/intro.md", "intro")]);
    let runner = remotes.runner();
    let temp = tempfile::TempDir::new().unwrap();

    let yaml = format!("nav:\n  - Guides: \"!import {}?brnch=main\"\n", GUIDES);
    let err = import(&yaml, temp.path(), &runner).await.unwrap_err();

    assert!(err.to_string().contains("brnch"));
    assert!(runner.clones().is_empty());
    assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
}
