//! Error taxonomy shared by every stage of the pipeline.
//!
//! Variants carry only strings and paths so an error produced inside a
//! process-pool worker can be serialized back to the parent unchanged.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while generating assets.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum Error {
    /// Invalid or missing preset, no outputs, bad color, bad output spec.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The source could not be read or parsed.
    #[error("failed to load source {}: {reason}", .path.display())]
    SourceLoad { path: PathBuf, reason: String },

    /// The backend failed to rasterize the source.
    #[error("render error: {0}")]
    Render(String),

    /// Encoding failed for the target format.
    #[error("export error: {0}")]
    Export(String),

    /// A worker thread panicked or a worker process crashed.
    #[error("executor error: {0}")]
    Executor(String),

    /// Writing an output failed.
    #[error("I/O error on {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn source_load(path: impl AsRef<Path>, reason: impl Display) -> Self {
        Self::SourceLoad {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            reason: err.to_string(),
        }
    }

    /// Short machine-friendly name of the variant, used in CLI summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::SourceLoad { .. } => "source-load",
            Self::Render(_) => "render",
            Self::Export(_) => "export",
            Self::Executor(_) => "executor",
            Self::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_survive_json() {
        let err = Error::source_load("logo.svg", "no such file");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"source-load\""));

        let restored: Error = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, err);
    }

    #[test]
    fn display_includes_path() {
        let err = Error::io("out/favicon.ico", std::io::Error::other("disk full"));
        let text = err.to_string();
        assert!(text.contains("out/favicon.ico"));
        assert!(text.contains("disk full"));
        assert_eq!(err.kind(), "io");
    }
}
