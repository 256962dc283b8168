//! Default values for multirepo configuration.
//!
//! This module provides centralized default values used across the library and
//! the CLI, ensuring consistency and avoiding duplication.

/// The keyword that marks a navigation value as an import directive.
pub const IMPORT_STATEMENT: &str = "!import";

/// Name of the plugin section inside a site config's `plugins` list.
pub const PLUGIN_NAME: &str = "multirepo";

/// Directory (relative to the site config) that receives imported docs.
pub const TEMP_DIR: &str = "temp_docs";

/// Branch used when neither the directive nor the config names one.
pub const BRANCH: &str = "master";

/// Glob selecting the documentation directory of an imported repository.
pub const DOCS_DIR: &str = "docs/*";

/// Literal documentation root fetched for multi-docs repositories.
pub const MULTI_DOCS_DIR: &str = "docs";

/// Name of an imported repository's own config file.
pub const CONFIG_FILE: &str = "mkdocs.yml";

/// Site config read by the CLI when `--config` is not given.
pub const SITE_CONFIG: &str = "mkdocs.yml";

/// Returns the edit URI assumed when the host config does not set one.
pub fn edit_uri(branch: &str) -> String {
    format!("/blob/{}/", branch)
}
