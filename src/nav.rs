//! # Navigation Tree
//!
//! A site navigation is an ordered list of nodes. Each node is either a bare
//! page path, or a section with exactly one `{label: value}` pair whose value
//! is a page path, an import directive, or a nested navigation:
//!
//! ```yaml
//! nav:
//!   - index.md
//!   - Home: home.md
//!   - Backend:
//!       - API: "!import https://github.com/org/api?branch=main"
//! ```
//!
//! This module reads that structure out of YAML, finds import directives
//! ([`locate`]) and rewrites them once their repositories are fetched
//! ([`splice`], [`prefix_paths`]).
//!
//! Imports are addressed by the list of indices from the root of the tree to
//! the section holding the directive, so a [`NavImport`] never borrows the
//! tree it came from.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::Value;

use crate::defaults;
use crate::error::{Error, Result};
use crate::import::{self, ImportSpec};
use crate::repository::{DocsRepo, RepoDefaults};

/// An ordered navigation tree.
pub type Nav = Vec<NavNode>;

/// One entry of a navigation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavNode {
    /// A bare page path (`- index.md`).
    Page(String),
    /// A labelled section (`- Title: value`).
    Section { title: String, entry: NavEntry },
}

/// The value of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEntry {
    /// A page path, an external link or an import directive.
    Page(String),
    /// A nested navigation.
    Nested(Nav),
}

impl NavNode {
    /// Shorthand for a section node.
    pub fn section(title: impl Into<String>, entry: NavEntry) -> Self {
        NavNode::Section {
            title: title.into(),
            entry,
        }
    }

    /// Reads a node from a YAML value.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(path) => Ok(NavNode::Page(path.clone())),
            Value::Mapping(mapping) => {
                if mapping.len() != 1 {
                    return Err(Error::config(format!(
                        "nav sections must have exactly one {{label: value}} pair, found {}",
                        mapping.len()
                    )));
                }
                let (key, value) = mapping
                    .iter()
                    .next()
                    .ok_or_else(|| Error::config("empty nav section"))?;
                let title = match key {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(Error::config(format!(
                            "nav labels must be strings, found {:?}",
                            other
                        )))
                    }
                };
                let entry = NavEntry::from_value(&title, value)?;
                Ok(NavNode::Section { title, entry })
            }
            other => Err(Error::config(format!(
                "nav entries must be paths or sections, found {:?}",
                other
            ))),
        }
    }
}

impl NavEntry {
    fn from_value(title: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(path) => Ok(NavEntry::Page(path.clone())),
            Value::Sequence(items) => Ok(NavEntry::Nested(from_values(items)?)),
            // An unquoted `!import url` is a YAML tag rather than a string.
            Value::Tagged(tagged) if tagged.tag == "import" => match &tagged.value {
                Value::String(url) => Ok(NavEntry::Page(format!(
                    "{} {}",
                    defaults::IMPORT_STATEMENT,
                    url
                ))),
                _ => Err(Error::config(format!(
                    "the !import tag of section '{}' must be followed by a url",
                    title
                ))),
            },
            other => Err(Error::config(format!(
                "section '{}' must map to a path or a list, found {:?}",
                title, other
            ))),
        }
    }
}

/// Reads a navigation tree from a YAML sequence.
pub fn from_values(items: &[Value]) -> Result<Nav> {
    items.iter().map(NavNode::from_value).collect()
}

/// Reads a navigation tree from a YAML value, which must be a sequence.
pub fn from_value(value: &Value) -> Result<Nav> {
    match value {
        Value::Sequence(items) => from_values(items),
        other => Err(Error::config(format!("nav must be a list, found {:?}", other))),
    }
}

impl Serialize for NavNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NavNode::Page(path) => serializer.serialize_str(path),
            NavNode::Section { title, entry } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(title, entry)?;
                map.end()
            }
        }
    }
}

impl Serialize for NavEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NavEntry::Page(path) => serializer.serialize_str(path),
            NavEntry::Nested(nav) => nav.serialize(serializer),
        }
    }
}

/// An import directive found in a navigation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavImport {
    /// Label of the section holding the directive.
    pub section: String,
    /// Indices from the root of the tree to that section.
    pub slot: Vec<usize>,
    /// The repository the directive resolves to.
    pub repo: DocsRepo,
}

/// Finds every import directive in `nav`, in declaration order.
///
/// Each repository is named after the slugified labels leading to its
/// section, joined with `/`, and made unique with [`RepoNames`] so that every
/// repository owns its own directory under `temp_dir`.
pub fn locate(nav: &Nav, temp_dir: &Path, defaults: &RepoDefaults) -> Result<Vec<NavImport>> {
    let mut walker = Locator {
        temp_dir,
        defaults,
        slot: Vec::new(),
        labels: Vec::new(),
        names: RepoNames::new(),
        found: Vec::new(),
    };
    walker.walk(nav)?;
    Ok(walker.found)
}

struct Locator<'a> {
    temp_dir: &'a Path,
    defaults: &'a RepoDefaults,
    slot: Vec<usize>,
    labels: Vec<String>,
    names: RepoNames,
    found: Vec<NavImport>,
}

impl Locator<'_> {
    fn walk(&mut self, nodes: &[NavNode]) -> Result<()> {
        for (index, node) in nodes.iter().enumerate() {
            let NavNode::Section { title, entry } = node else {
                continue;
            };
            self.slot.push(index);
            self.labels.push(slugify(title));
            match entry {
                NavEntry::Nested(children) => self.walk(children)?,
                NavEntry::Page(value) if import::is_import(value) => {
                    let name = self.names.allocate(&self.labels.join("/"));
                    let spec = ImportSpec::parse(value).map_err(|e| e.for_repo(&name))?;
                    self.found.push(NavImport {
                        section: title.clone(),
                        slot: self.slot.clone(),
                        repo: DocsRepo::from_spec(name, &spec, self.temp_dir, self.defaults),
                    });
                }
                NavEntry::Page(_) => {}
            }
            self.labels.pop();
            self.slot.pop();
        }
        Ok(())
    }
}

/// Hands out repository names that never collide on disk.
///
/// A name is rejected when it was already handed out, and also when it is a
/// path prefix of a name handed out (or the other way round), since one
/// working copy would then sit inside another. The clashing segment gets a
/// numeric suffix (`-2`, `-3`, ...) until it fits.
#[derive(Debug, Clone, Default)]
pub struct RepoNames {
    taken: BTreeSet<String>,
}

impl RepoNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a unique name derived from the `/`-separated `base`.
    pub fn allocate(&mut self, base: &str) -> String {
        let segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
        let mut name = String::new();
        for (index, segment) in segments.iter().enumerate() {
            let last = index + 1 == segments.len();
            let mut n = 1;
            loop {
                let candidate = match (name.is_empty(), n) {
                    (true, 1) => segment.to_string(),
                    (true, _) => format!("{}-{}", segment, n),
                    (false, 1) => format!("{}/{}", name, segment),
                    (false, _) => format!("{}/{}-{}", name, segment, n),
                };
                // Parents may be shared, but never with a working copy.
                let free = !self.taken.contains(&candidate)
                    && (!last || !self.has_descendant(&candidate));
                if free {
                    name = candidate;
                    break;
                }
                n += 1;
            }
        }
        self.taken.insert(name.clone());
        name
    }

    fn has_descendant(&self, name: &str) -> bool {
        let prefix = format!("{}/", name);
        self.taken
            .range(prefix.clone()..)
            .next()
            .map_or(false, |taken| taken.starts_with(&prefix))
    }
}

/// Overwrites the value of the section at `slot`.
pub fn splice(nav: &mut Nav, slot: &[usize], entry: NavEntry) -> Result<()> {
    let stale = || Error::config(format!("no nav section at position {:?}", slot));
    let (last, parents) = slot.split_last().ok_or_else(stale)?;

    let mut nodes = nav;
    for &index in parents {
        nodes = match nodes.get_mut(index) {
            Some(NavNode::Section {
                entry: NavEntry::Nested(children),
                ..
            }) => children,
            _ => return Err(stale()),
        };
    }

    match nodes.get_mut(*last) {
        Some(NavNode::Section { entry: target, .. }) => {
            *target = entry;
            Ok(())
        }
        _ => Err(stale()),
    }
}

/// Prepends `prefix/` to every page path in `nav`.
pub fn prefix_paths(nav: &mut Nav, prefix: &str) {
    for node in nav.iter_mut() {
        match node {
            NavNode::Page(path)
            | NavNode::Section {
                entry: NavEntry::Page(path),
                ..
            } => *path = join_prefix(prefix, path),
            NavNode::Section {
                entry: NavEntry::Nested(children),
                ..
            } => prefix_paths(children, prefix),
        }
    }
}

fn join_prefix(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", prefix, path.trim_start_matches('/'))
}

/// Returns true if any section of `nav` still holds an import directive.
pub fn has_imports(nav: &[NavNode]) -> bool {
    nav.iter().any(|node| match node {
        NavNode::Page(_) => false,
        NavNode::Section { entry, .. } => match entry {
            NavEntry::Page(value) => import::is_import(value),
            NavEntry::Nested(children) => has_imports(children),
        },
    })
}

/// Turns a section label into a directory-safe name.
pub fn slugify(label: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    let separators =
        SEPARATORS.get_or_init(|| Regex::new(r"[^\w]+").expect("slug pattern is valid"));
    let lowered = label.trim().to_lowercase();
    let slug = separators.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}
