//! # Import Statement Parsing
//!
//! An import directive tells the resolver to replace a navigation node with
//! documentation fetched from another repository:
//!
//! ```text
//! !import https://github.com/org/repo?branch=main&docs_dir=guide/*&extra_imports=["README.md", "src/*"]
//! ```
//!
//! Parsing happens in two steps:
//!
//! 1.  [`parse`] is a pure, syntax-only pass. It strips the keyword, splits the
//!     URL from its query string and the query into key/value pairs. Bracketed
//!     values become lists, everything else stays a raw string.
//! 2.  [`ImportSpec::from_statement`] coerces the raw options into a typed
//!     [`ImportSpec`], applying defaults and rejecting unknown keys.

use glob::Pattern;

use crate::defaults;
use crate::error::{Error, Result};

/// A raw option value from the query string of a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportValue {
    /// A plain `key=value` value, kept verbatim.
    Str(String),
    /// A bracketed `[a, b, c]` list of trimmed elements.
    List(Vec<String>),
}

/// The syntactic form of an import directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Repository URL (everything before the `?`).
    pub url: String,
    /// Options in the order they were written.
    pub options: Vec<(String, ImportValue)>,
}

impl ImportStatement {
    /// Returns the last value written for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&ImportValue> {
        self.options
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Returns true when `value` is an import directive.
pub fn is_import(value: &str) -> bool {
    value.trim_start().starts_with(defaults::IMPORT_STATEMENT)
}

/// Parses a directive (`!import <url>?...`) or a bare import URL.
pub fn parse(statement: &str) -> Result<ImportStatement> {
    let trimmed = statement.trim();
    let rest = match trimmed.split_once(' ') {
        Some((keyword, rest)) if keyword == defaults::IMPORT_STATEMENT => rest.trim(),
        _ if trimmed == defaults::IMPORT_STATEMENT => "",
        _ => trimmed,
    };

    if rest.contains(defaults::IMPORT_STATEMENT) {
        return Err(Error::syntax(
            statement,
            format!("'{}' may only appear once, at the start", defaults::IMPORT_STATEMENT),
        ));
    }

    let mut parts = rest.split('?');
    let url = parts.next().unwrap_or_default().trim();
    let query = parts.next();
    if parts.next().is_some() {
        return Err(Error::syntax(statement, "only one '?' is allowed"));
    }
    if url.is_empty() {
        return Err(Error::syntax(statement, "missing repository url"));
    }

    let mut options = Vec::new();
    for pair in query.unwrap_or_default().split('&') {
        if pair.trim().is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            Error::syntax(statement, format!("expected key=value, found '{}'", pair))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::syntax(statement, format!("empty key in '{}'", pair)));
        }
        options.push((key.to_string(), parse_value(value.trim(), statement)?));
    }

    Ok(ImportStatement {
        url: url.to_string(),
        options,
    })
}

fn parse_value(value: &str, statement: &str) -> Result<ImportValue> {
    let opens = value.starts_with('[');
    let closes = value.ends_with(']');
    if !opens && !closes {
        return Ok(ImportValue::Str(value.to_string()));
    }
    if !(opens && closes) || value.len() < 2 {
        return Err(Error::syntax(
            statement,
            format!("malformed list literal '{}'", value),
        ));
    }

    let inner = value[1..value.len() - 1].trim();
    if inner.is_empty() {
        return Ok(ImportValue::List(Vec::new()));
    }

    let mut items = Vec::new();
    for raw in inner.split(',') {
        let item = unquote(raw.trim());
        if item.is_empty() || item.contains(['[', ']']) {
            return Err(Error::syntax(
                statement,
                format!("malformed list literal '{}'", value),
            ));
        }
        items.push(item.to_string());
    }
    Ok(ImportValue::List(items))
}

fn unquote(item: &str) -> &str {
    for quote in ['"', '\''] {
        if item.len() >= 2 && item.starts_with(quote) && item.ends_with(quote) {
            return &item[1..item.len() - 1];
        }
    }
    item
}

/// The typed options of one import directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub url: String,
    /// Branch to fetch. `None` falls back to the configured default branch.
    pub branch: Option<String>,
    pub docs_dir: String,
    pub config: String,
    pub multi_docs: bool,
    /// Keep the fetched `docs` directory instead of flattening it.
    pub keep_docs_dir: bool,
    pub extra_imports: Vec<String>,
    pub edit_uri: Option<String>,
}

impl ImportSpec {
    /// A spec for `url` with every option at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: None,
            docs_dir: defaults::DOCS_DIR.to_string(),
            config: defaults::CONFIG_FILE.to_string(),
            multi_docs: false,
            keep_docs_dir: false,
            extra_imports: Vec::new(),
            edit_uri: None,
        }
    }

    /// Parses and types a directive in one step.
    pub fn parse(statement: &str) -> Result<Self> {
        Self::from_statement(&parse(statement)?)
    }

    /// Coerces raw options into a typed spec. Unknown keys are rejected.
    pub fn from_statement(statement: &ImportStatement) -> Result<Self> {
        let mut spec = Self::new(statement.url.clone());
        for (key, value) in &statement.options {
            match key.as_str() {
                "branch" => spec.branch = Some(expect_str(statement, key, value)?),
                "docs_dir" => spec.docs_dir = expect_str(statement, key, value)?,
                "config" => spec.config = expect_str(statement, key, value)?,
                "edit_uri" => spec.edit_uri = Some(expect_str(statement, key, value)?),
                "multi_docs" => spec.multi_docs = expect_bool(statement, key, value)?,
                "keep_docs_dir" => spec.keep_docs_dir = expect_bool(statement, key, value)?,
                "extra_imports" => match value {
                    ImportValue::List(items) => spec.extra_imports = items.clone(),
                    ImportValue::Str(_) => {
                        return Err(Error::config(format!(
                            "extra_imports for {} must be a list like [\"README.md\"]",
                            statement.url
                        )))
                    }
                },
                other => {
                    return Err(Error::config(format!(
                        "unknown import option '{}' for {}",
                        other, statement.url
                    )))
                }
            }
        }
        check_patterns(&spec.extra_imports)?;
        Ok(spec)
    }
}

/// Fails with [`Error::Glob`] on the first pattern that is not a valid glob.
pub(crate) fn check_patterns(patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        Pattern::new(pattern)?;
    }
    Ok(())
}

fn expect_str(statement: &ImportStatement, key: &str, value: &ImportValue) -> Result<String> {
    match value {
        ImportValue::Str(s) if !s.is_empty() => Ok(s.clone()),
        ImportValue::Str(_) => Err(Error::config(format!(
            "{} for {} must not be empty",
            key, statement.url
        ))),
        ImportValue::List(_) => Err(Error::config(format!(
            "{} for {} must be a string, not a list",
            key, statement.url
        ))),
    }
}

fn expect_bool(statement: &ImportStatement, key: &str, value: &ImportValue) -> Result<bool> {
    match value {
        ImportValue::Str(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        ImportValue::Str(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(Error::config(format!(
            "{} for {} must be true or false",
            key, statement.url
        ))),
    }
}
