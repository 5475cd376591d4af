// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared across the fetch/cache/report pipeline.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad, missing, or expired cookies. Surfaced to the user with a
    /// remediation hint to log back into the rides site.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Transport-level failure (DNS, TLS, timeout). Transient but never
    /// retried automatically by the core.
    #[error("Network error: {0}")]
    Network(String),

    /// Response arrived but did not have the expected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Cache read failure other than a plain miss. Misses are `Ok(None)`,
    /// never errors; write failures are logged by callers and do not abort
    /// the in-progress operation.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Nothing to report, or the report configuration is incomplete.
    /// Raised before any PDF work begins.
    #[error("Report input error: {0}")]
    ReportInput(String),

    /// An input document to a merge could not be read. The message names the
    /// failing input; the merge writes no partial output.
    #[error("Merge input error: {0}")]
    MergeInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Remediation hint shown alongside authentication failures.
    pub const AUTH_HINT: &'static str =
        "Please log into the rides site in your browser and try again";

    /// Whether this error means the cookie set was rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, AppError::Authentication(_))
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
