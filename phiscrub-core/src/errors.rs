//! errors.rs - Custom error types for the phiscrub-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR Apache-2.0

use thiserror::Error;

/// This enum represents all possible error types in the `phiscrub-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions. This prevents them from
/// matching all variants exhaustively, thus avoiding breaking changes.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScrubError {
    #[error("Failed to compile detection pattern for category '{0}': {1}")]
    PatternCompilation(String, regex::Error),

    #[error("Category '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Invalid scrub configuration: {0}")]
    InvalidConfig(String),

    /// The validation pass found residual PII signatures in the rewritten
    /// output. The document must not be treated as redacted; no partial
    /// result accompanies this error.
    #[error("Residual PII detected in redacted output: {occurrences} match(es) in categories {categories:?}")]
    LeakDetected {
        categories: Vec<String>,
        occurrences: usize,
    },

    #[error("Failed to serialize audit report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("A critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),
}
