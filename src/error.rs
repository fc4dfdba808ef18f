//! Error types for the map pipeline.
//!
//! Per-file failures (unsupported language, unreadable file, parse/query
//! errors) are recoverable: the orchestrator warns once per path and skips
//! the file. `Cancelled` propagates immediately and is the only way a
//! partially-built outline escapes the pipeline — as no outline at all.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Error, Debug)]
pub enum MapError {
    /// No grammar is registered for the file name.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("failed to parse {0}")]
    Parse(PathBuf),

    /// The bundled tag query failed to compile against the grammar.
    #[error("query error for language {language}: {message}")]
    Query { language: String, message: String },

    /// The context renderer rejected a file; its block is omitted.
    #[error("failed to render {0}")]
    Render(PathBuf),

    #[error("cancelled")]
    Cancelled,
}

impl MapError {
    /// Recoverable errors are skipped per-file; anything else aborts the
    /// current invocation.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, MapError::Cancelled)
    }

    /// Unsupported files are expected in any repository and only worth a
    /// trace log, not a warning.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, MapError::UnsupportedLanguage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_fatal() {
        assert!(!MapError::Cancelled.is_recoverable());
        assert!(MapError::Parse(PathBuf::from("x.py")).is_recoverable());
        assert!(MapError::UnsupportedLanguage(PathBuf::from("x.bin")).is_unsupported());
    }
}
