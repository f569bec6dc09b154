//! CLI errors.

use odsgen_model::ModelError;
use odsgen_relational::OdsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the `odsgen` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read or written.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The graph document is malformed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Compilation failed; holds the already formatted error report.
    #[error("{0}")]
    Compile(String),

    /// A snapshot could not be produced.
    #[error(transparent)]
    Snapshot(#[from] OdsError),

    /// Output could not be serialized.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Wrap an I/O error with the path involved.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}
