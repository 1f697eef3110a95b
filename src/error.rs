//! Provisioning error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while provisioning a dependency.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("no {dependency} variant for {os}/{arch}")]
    UnsupportedPlatform {
        dependency: &'static str,
        os: String,
        arch: String,
    },

    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error(
        "{} is not a valid payload; content starts with: {}",
        path.display(),
        head.escape_ascii()
    )]
    Validation { path: PathBuf, head: Vec<u8> },

    #[error("build command failed: {reason}\n  command: {command}")]
    Build {
        command: String,
        code: Option<i32>,
        reason: String,
    },

    #[error("expected artifact is missing: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("cannot extract {}: {reason}", path.display())]
    Extract { path: PathBuf, reason: String },

    #[error("URL template error: {0}")]
    Template(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    /// Wrap an I/O error with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ProvisionError>;
