use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Source text (original or patched) that the Java grammar rejects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// The generative fallback could not produce a usable candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackError {
    #[error("fallback is not configured")]
    Unavailable,

    #[error("fallback budget exhausted ({limit} invocations per run)")]
    BudgetExhausted { limit: usize },

    #[error("fallback timed out after {0:?}")]
    TimedOut(Duration),

    #[error("fallback returned unusable content: {0}")]
    Malformed(String),

    #[error("fallback provider failed: {0}")]
    Provider(String),
}

/// A symbol resolution contradiction. Fatal for the affected file only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexInconsistency {
    #[error("index snapshot of {path} is stale: indexed text differs from the stored file")]
    StaleEntry { path: PathBuf },

    #[error("type {name} is declared by both {path} and {other}")]
    DuplicateDeclaration {
        name: String,
        path: PathBuf,
        other: PathBuf,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("path {0} escapes the project root")]
    OutsideRoot(PathBuf),

    #[error("file {0} not found")]
    NotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = ParseError {
            line: 3,
            column: 7,
            message: "missing ;".to_string(),
        };
        assert_eq!(err.to_string(), "parse error at line 3, column 7: missing ;");

        let err = FallbackError::BudgetExhausted { limit: 2 };
        assert!(err.to_string().contains("2 invocations"));

        let err = IndexInconsistency::DuplicateDeclaration {
            name: "demo.Util".to_string(),
            path: PathBuf::from("a/Util.java"),
            other: PathBuf::from("b/Util.java"),
        };
        assert!(err.to_string().contains("demo.Util"));
    }
}
