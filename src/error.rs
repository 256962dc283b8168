//! # Error Handling
//!
//! This module defines the centralized error type for `multirepo-docs`. It uses
//! `thiserror` to describe every failure mode of an import run with enough
//! context to act on it.
//!
//! ## Taxonomy
//!
//! - **`ImportSyntax`**: a malformed import directive. Raised while planning,
//!   before any repository is fetched.
//! - **`Config`**: an unknown option key, an invalid value, or a fetched
//!   repository whose config lacks a `nav` section.
//! - **`Fetch`**: the sparse-clone (or move-up) script exited non-zero. Carries
//!   the repository name, URL and captured stderr.
//! - **`NotImported`** / **`MissingFile`**: usage errors when loading a config
//!   from a repository that was never fetched, or a file that is not there.
//! - **`ToolMissing`**: a required executable (`bash`, `git`) is not on the
//!   host.
//! - **`BatchAborted`**: wraps the first failure of a concurrent batch.
//!
//! None of these are retried. A failure anywhere aborts the run.

use thiserror::Error;

/// Main error type for multirepo operations
#[derive(Error, Debug)]
pub enum Error {
    /// A malformed import directive.
    #[error("Import syntax error in '{statement}': {message}")]
    ImportSyntax { statement: String, message: String },

    /// An invalid or unknown configuration entry.
    ///
    /// `repo` names the repository the entry belongs to, when there is one.
    #[error("Configuration error{}: {message}", repo.as_ref().map(|r| format!(" for {}", r)).unwrap_or_default())]
    Config {
        message: String,
        repo: Option<String>,
    },

    /// A subprocess exited with a non-zero status while fetching or
    /// normalizing a repository.
    #[error("Failed to import {name} from {url}: {stderr}")]
    Fetch {
        name: String,
        url: String,
        stderr: String,
    },

    /// A config was requested from a repository that has not been fetched.
    #[error("{name} must be imported before loading {file}")]
    NotImported { name: String, file: String },

    /// A file expected in a fetched repository does not exist.
    #[error("{path} doesn't exist in {name}")]
    MissingFile { name: String, path: String },

    /// A required executable could not be found on the host.
    #[error("Required tool '{tool}' was not found: {message}\n  hint: install {tool} and make sure it is on PATH")]
    ToolMissing { tool: String, message: String },

    /// A batch of concurrent fetches was aborted by the failure of one
    /// repository.
    #[error("Import aborted after {completed}/{total} repositories: {repo} failed: {source}")]
    BatchAborted {
        repo: String,
        completed: usize,
        total: usize,
        #[source]
        source: Box<Error>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A directory walk error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A background task panicked or was cancelled.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Builds an `ImportSyntax` error for `statement`.
    pub fn syntax(statement: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ImportSyntax {
            statement: statement.into(),
            message: message.into(),
        }
    }

    /// Builds a `Config` error that is not tied to a repository.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            repo: None,
        }
    }

    /// Builds a `Config` error for the repository `repo`.
    pub fn repo_config(repo: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            repo: Some(repo.into()),
        }
    }

    /// Attaches `repo` to a `Config` error that does not name a repository
    /// yet. Other errors are returned as they are.
    pub fn for_repo(self, repo: &str) -> Self {
        match self {
            Error::Config {
                message,
                repo: None,
            } => Error::repo_config(repo, message),
            other => other,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
