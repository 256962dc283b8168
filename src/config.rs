//! # Configuration Schema and Parsing
//!
//! Two kinds of YAML files are read:
//!
//! - **The host site config** (`mkdocs.yml`), wrapped by [`SiteConfig`]. Only a
//!   few keys are interpreted: `nav`, `edit_uri` and the `multirepo` entry of
//!   `plugins`. Everything else is carried through untouched so the resolved
//!   config can be written back out.
//!
//! - **The plugin section** ([`MultirepoConfig`]), which is strictly typed:
//!   unknown keys are rejected.
//!
//! ```yaml
//! plugins:
//!   - search
//!   - multirepo:
//!       temp_dir: imported
//!       default_branch: main
//!       repos:
//!         - section: Backstage
//!           section_path: platform
//!           import_url: https://github.com/backstage/backstage?branch=master
//! ```
//!
//! Imported repositories ship their own config with the same format; only its
//! `nav` and `edit_uri` are used.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::defaults;
use crate::error::{Error, Result};
use crate::import::{self, ImportSpec};
use crate::nav::{self, Nav};

/// A site config, kept as a raw YAML mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteConfig {
    raw: Mapping,
}

impl SiteConfig {
    /// Parses a site config from YAML text.
    pub fn parse(yaml_content: &str) -> Result<Self> {
        match serde_yaml::from_str::<Value>(yaml_content)? {
            Value::Mapping(raw) => Ok(Self { raw }),
            Value::Null => Ok(Self::default()),
            other => Err(Error::config(format!(
                "site config must be a mapping, found {:?}",
                other
            ))),
        }
    }

    /// Reads and parses a site config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// The `nav` section, if present and not null.
    pub fn nav(&self) -> Result<Option<Nav>> {
        match self.raw.get("nav") {
            None | Some(Value::Null) => Ok(None),
            Some(value) => nav::from_value(value).map(Some),
        }
    }

    /// Replaces the `nav` section.
    pub fn set_nav(&mut self, nav: &Nav) -> Result<()> {
        let value = serde_yaml::to_value(nav)?;
        self.raw.insert(Value::from("nav"), value);
        Ok(())
    }

    pub fn edit_uri(&self) -> Option<&str> {
        self.raw.get("edit_uri").and_then(Value::as_str)
    }

    /// The `multirepo` plugin section.
    ///
    /// `plugins` may be a list (`- multirepo` or `- multirepo: {...}`) or a
    /// mapping. Returns `None` when the plugin is not listed.
    pub fn plugin_config(&self) -> Result<Option<MultirepoConfig>> {
        let section = match self.raw.get("plugins") {
            Some(Value::Sequence(plugins)) => plugins.iter().find_map(|plugin| match plugin {
                Value::String(name) if name == defaults::PLUGIN_NAME => Some(Value::Null),
                Value::Mapping(map) => map.get(defaults::PLUGIN_NAME).cloned(),
                _ => None,
            }),
            Some(Value::Mapping(plugins)) => plugins.get(defaults::PLUGIN_NAME).cloned(),
            _ => None,
        };

        match section {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(MultirepoConfig::default())),
            Some(value) => serde_yaml::from_value(value)
                .map(Some)
                .map_err(|e| Error::config(format!("invalid plugins.multirepo section: {}", e))),
        }
    }

    /// Serializes the config back to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.raw)?)
    }
}

/// The `multirepo` plugin section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MultirepoConfig {
    /// Directory receiving imported docs, relative to the site config.
    pub temp_dir: String,
    /// Repositories imported without a nav.
    pub repos: Vec<RepoEntry>,
    /// Keep the `docs` directory of every import.
    pub keep_docs_dir: bool,
    /// Branch used when an import does not name one.
    pub default_branch: String,
    /// Remove `temp_dir` once the run is over.
    pub cleanup: bool,
}

impl Default for MultirepoConfig {
    fn default() -> Self {
        Self {
            temp_dir: defaults::TEMP_DIR.to_string(),
            repos: Vec::new(),
            keep_docs_dir: false,
            default_branch: defaults::BRANCH.to_string(),
            cleanup: false,
        }
    }
}

/// One record of `plugins.multirepo.repos`.
///
/// Fields set here win over the same options in the query of `import_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoEntry {
    pub section: String,
    pub import_url: String,
    /// Parent sections, `/`-separated (`platform/backend`).
    #[serde(default)]
    pub section_path: Option<String>,
    #[serde(default)]
    pub edit_uri: Option<String>,
    #[serde(default)]
    pub docs_dir: Option<String>,
    #[serde(default)]
    pub multi_docs: Option<bool>,
    #[serde(default)]
    pub keep_docs_dir: Option<bool>,
    #[serde(default)]
    pub extra_imports: Option<Vec<String>>,
    #[serde(default)]
    pub config: Option<String>,
}

impl RepoEntry {
    /// Slugified `section_path/section`. The plan makes it unique before it
    /// becomes a directory name.
    pub fn name(&self) -> String {
        self.section_path
            .iter()
            .flat_map(|path| path.split('/'))
            .filter(|segment| !segment.trim().is_empty())
            .map(nav::slugify)
            .chain(std::iter::once(nav::slugify(&self.section)))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Parses `import_url` and applies the record's own fields on top.
    pub fn import_spec(&self) -> Result<ImportSpec> {
        let mut spec = ImportSpec::parse(&self.import_url)?;
        if let Some(edit_uri) = &self.edit_uri {
            spec.edit_uri = Some(edit_uri.clone());
        }
        if let Some(docs_dir) = &self.docs_dir {
            spec.docs_dir = docs_dir.clone();
        }
        if let Some(multi_docs) = self.multi_docs {
            spec.multi_docs = multi_docs;
        }
        if let Some(keep_docs_dir) = self.keep_docs_dir {
            spec.keep_docs_dir = keep_docs_dir;
        }
        if let Some(extra_imports) = &self.extra_imports {
            spec.extra_imports = extra_imports.clone();
        }
        if let Some(config) = &self.config {
            spec.config = config.clone();
        }
        import::check_patterns(&spec.extra_imports)?;
        Ok(spec)
    }
}
