//! Phase 3: Splicing
//!
//! Loads the nav of every fetched repository and merges it into the site nav
//! at the section that imported it. All configs are loaded before the tree is
//! touched, so a repository without a nav leaves the site nav unchanged.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::nav::{self, Nav, NavEntry, NavImport};

/// Execute Phase 3: replace every import in `site_nav` with the nav of its
/// repository.
pub fn execute(site_nav: &mut Nav, imports: &mut [NavImport]) -> Result<()> {
    let mut loaded = Vec::with_capacity(imports.len());
    for import in imports.iter() {
        let config = import.repo.load_config()?;
        let sub_nav = config.nav()?.ok_or_else(|| {
            Error::repo_config(
                import.repo.name(),
                format!("{} has no nav section", import.repo.config),
            )
        })?;
        loaded.push((sub_nav, config.edit_uri().map(str::to_string)));
    }

    for (import, (mut sub_nav, edit_uri)) in imports.iter_mut().zip(loaded) {
        import.repo.set_edit_uri(edit_uri.as_deref());
        if nav::has_imports(&sub_nav) {
            warn!(
                "{}: imports inside an imported nav are not resolved",
                import.repo.name()
            );
        }
        nav::prefix_paths(&mut sub_nav, &import.repo.nav_prefix());
        nav::splice(site_nav, &import.slot, NavEntry::Nested(sub_nav))?;
        debug!("Spliced {} into section '{}'", import.repo.name(), import.section);
    }
    Ok(())
}
