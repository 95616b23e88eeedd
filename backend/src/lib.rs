//! # Leadgen - Lead validation, scoring and deduplication
//!
//! Leadgen takes raw contact lists (scraped, imported from CSV or posted as
//! JSON), flags undeliverable emails, scores every lead and removes
//! duplicates before exporting the result back to CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV / JSON │────▶│  Validate   │────▶│    Score    │────▶│    Dedup    │────▶│  CSV export │
//! │  or scrape  │     │ (email, MX) │     │   (rules)   │     │ (key/merge) │     │   + stats   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use leadgen::{Pipeline, PipelineOptions, RulesConfig, StaticMxChecker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = Pipeline::new(RulesConfig::default(), Arc::new(StaticMxChecker::AcceptAll), PipelineOptions::default());
//!     let leads = leadgen::load_leads("leads.csv").unwrap();
//!     let result = pipeline.process(&leads).await.unwrap();
//!     println!("{}", leadgen::to_csv(&result.leads));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Lead, dedup and dashboard types
//! - [`config`] - Scoring rules and generic provider list
//! - [`email`] - Email format and provider checks
//! - [`scoring`] - Rule-based scoring and tiers
//! - [`dedup`] - Key-based dedup and email merge
//! - [`codec`] - CSV reading, writing and validation
//! - [`stats`] - Dashboard counters and filters
//! - [`scrape`] - Mock lead source
//! - [`pipeline`] - Validate → score → dedup orchestration
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Stages
pub mod codec;
pub mod dedup;
pub mod email;
pub mod scoring;
pub mod stats;

// Sources
pub mod scrape;

// Orchestration
pub mod pipeline;

// HTTP API
pub mod api;

// Binary support
pub mod logging;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CodecError, ConfigError, PipelineError, ScrapeError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{flag, DedupKey, DedupOutcome, ExportFormat, FilterOptions, Lead, LeadStats, Tier, Tiers};

pub use config::{GenericProviders, RulesConfig, ScoringRules};

// =============================================================================
// Re-exports - Stages
// =============================================================================

pub use codec::{parse_csv, to_csv, validate_csv_format, CsvValidation};
pub use dedup::{dedup, dedup_advanced, mark_duplicates, merge_leads};
pub use email::{EmailAnalyzer, EmailCheck};
pub use scoring::{categorize, filter_by_min_score, sort_by_score, ScoringEngine};
pub use stats::{calculate_lead_stats, filter_leads, normalize_leads};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::mx::{DnsMxChecker, MxChecker, StaticMxChecker};
pub use pipeline::{import_csv, load_leads, validate_leads, Pipeline, PipelineOptions, ProcessedLeads};
pub use scrape::{MockScraper, ScrapeRequest};

/// Server module re-export for main.rs
pub mod server {
    pub use crate::api::server::*;
}
