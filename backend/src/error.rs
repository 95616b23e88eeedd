//! Error types for the lead pipeline.
//!
//! The pure stages (email analysis, scoring, dedup, CSV conversion) never
//! fail on well-typed input. Errors only appear at the edges:
//!
//! - [`ConfigError`] - Rules file loading
//! - [`CodecError`] - CSV file I/O and encoding
//! - [`ScrapeError`] - Mock scrape requests
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading a rules file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Rules file could not be read.
    #[error("Failed to read rules file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rules file is not valid JSON.
    #[error("Invalid rules file: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// CSV Codec Errors
// =============================================================================

/// Errors around the CSV codec (never raised for malformed rows).
#[derive(Debug, Error)]
pub enum CodecError {
    /// Failed to read or write a file.
    #[error("CSV file error: {0}")]
    Io(#[from] std::io::Error),

    /// Writer failure.
    #[error("CSV write error: {0}")]
    Write(#[from] csv::Error),

    /// Bytes could not be decoded as text.
    #[error("Failed to decode CSV content: {0}")]
    Encoding(String),
}

// =============================================================================
// Scrape Errors
// =============================================================================

/// Errors from the mock scraper.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScrapeError {
    /// Neither a keyword nor a URL was supplied.
    #[error("Either keyword or urls must be provided")]
    NothingToScrape,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No leads to process.
    #[error("No leads found. Try different keywords or URLs.")]
    EmptyInput,

    /// Uploaded CSV failed structural validation.
    #[error("Invalid CSV format: {}", .0.join(", "))]
    InvalidCsv(Vec<String>),

    /// Codec error.
    #[error("CSV error: {0}")]
    Codec(#[from] CodecError),

    /// Scrape error.
    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    /// Rules file error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON input/output error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("{0}")]
    BadRequest(String),

    /// Export format not available.
    #[error("{0}")]
    UnsupportedFormat(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ScrapeError> for ServerError {
    fn from(err: ScrapeError) -> Self {
        ServerError::BadRequest(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
