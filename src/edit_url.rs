//! Edit-URL derivation for imported pages.
//!
//! An imported page lives at `<temp_dir>/<repo name>/<relative path>` after
//! normalization. Its edit link points back at the file in the origin
//! repository: `<url><edit_uri><path in origin>`.

use glob::Pattern;

use crate::error::{Error, Result};
use crate::repository::DocsRepo;

/// Drops the first `count` segments of `path`.
///
/// Fails when nothing would remain.
pub fn remove_parents(path: &str, count: usize) -> Result<String> {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if count >= parts.len() {
        return Err(Error::config(format!(
            "cannot remove {} parent(s) from '{}', it only has {} part(s)",
            count,
            path,
            parts.len()
        )));
    }
    Ok(parts[count..].join("/"))
}

/// Rewrites an edit URI for `branch`.
///
/// `/edit/master/docs/` becomes `/edit/<branch>/`: the second segment is the
/// branch, and a third segment named `docs` is dropped because the docs
/// directory is added back per file.
pub fn normalize_edit_uri(raw: &str, branch: &str) -> String {
    let mut parts: Vec<&str> = raw.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() > 1 && parts[1] != branch {
        parts[1] = branch;
    }
    if parts.len() > 2 && parts[2] == "docs" {
        parts.remove(2);
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("/{}/", parts.join("/"))
    }
}

/// Joins URL pieces, collapsing the slashes at every boundary.
pub fn join_url(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts.iter().filter(|p| !p.is_empty()) {
        if out.is_empty() {
            out.push_str(part.trim_end_matches('/'));
            continue;
        }
        let part = part.trim_matches('/');
        if part.is_empty() {
            continue;
        }
        out.push('/');
        out.push_str(part);
    }
    out
}

impl DocsRepo {
    /// Edit URL of an imported file.
    ///
    /// `src_path` is relative to the temp dir and starts with the repository
    /// name. Pages of a nav import keep their path as is, since the nav
    /// already points at them relative to the repository.
    pub fn edit_url(&self, src_path: &str, keep_docs_dir: bool, is_nav_repo: bool) -> Result<String> {
        let depth = self.name().split('/').filter(|p| !p.is_empty()).count();
        let relative = remove_parents(src_path, depth)?;

        let origin = if keep_docs_dir
            || self.keep_docs_dir
            || is_nav_repo
            || self.is_extra_import(&relative)
        {
            relative
        } else if self.multi_docs {
            self.original_path(&relative)
        } else {
            join_url(&[self.docs_root(), &relative])
        };

        Ok(join_url(&[&self.repo.url, &self.edit_uri, &origin]))
    }

    fn is_extra_import(&self, relative: &str) -> bool {
        self.extra_imports.iter().any(|pattern| {
            let dir = pattern.trim_end_matches("/*").trim_end_matches('/');
            relative == pattern
                || relative.starts_with(&format!("{}/", dir))
                || Pattern::new(pattern).map_or(false, |p| p.matches(relative))
        })
    }

    /// Walks up from `relative` to the nearest remapped entry.
    fn original_path(&self, relative: &str) -> String {
        if let Some(original) = self.path_remap.get(relative) {
            return original.clone();
        }
        let mut ancestor = relative;
        while let Some((parent, _)) = ancestor.rsplit_once('/') {
            if let Some(original) = self.path_remap.get(parent) {
                return format!("{}{}", original, &relative[parent.len()..]);
            }
            ancestor = parent;
        }
        relative.to_string()
    }
}
