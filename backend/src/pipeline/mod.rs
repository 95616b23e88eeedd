//! High-level pipeline: validate → score → dedup.
//!
//! The pure stages live in their own modules; this one sequences them and
//! owns the only asynchronous part, MX checking, which runs in bounded
//! batches with a pause between them.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use leadgen::pipeline::{Pipeline, PipelineOptions, mx::DnsMxChecker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::new(Default::default(), Arc::new(DnsMxChecker::default()), PipelineOptions::default());
//!     let leads = leadgen::codec::read_csv_file("leads.csv")?;
//!     let result = pipeline.process(&leads).await?;
//!     println!("{} leads kept, {} duplicates removed", result.leads.len(), result.removed_count);
//!     Ok(())
//! }
//! ```

pub mod mx;

use futures::future::join_all;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::codec::{parse_csv, read_csv_file, validate_csv_format};
use crate::config::RulesConfig;
use crate::dedup::dedup;
use crate::email::{extract_domain, EmailAnalyzer};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{flag, DedupKey, DedupOutcome, Lead, LeadStats};
use crate::scoring::ScoringEngine;
use crate::stats::calculate_lead_stats;

use mx::MxChecker;

/// Options for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Leads checked concurrently per batch.
    pub batch_size: usize,

    /// Pause between two batches.
    pub batch_delay: Duration,

    /// Strategy for the dedup stage.
    pub dedup_key: DedupKey,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay: Duration::from_millis(100),
            dedup_key: DedupKey::Email,
        }
    }
}

/// Output of [`Pipeline::process`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedLeads {
    /// Validated, scored and deduplicated leads.
    pub leads: Vec<Lead>,
    /// Duplicates dropped by the dedup stage.
    pub removed_count: usize,
    /// Counters over `leads`.
    pub stats: LeadStats,
}

/// The configured stages plus an MX capability.
pub struct Pipeline {
    analyzer: EmailAnalyzer,
    scorer: ScoringEngine,
    checker: Arc<dyn MxChecker>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(rules: RulesConfig, checker: Arc<dyn MxChecker>, options: PipelineOptions) -> Self {
        let analyzer = EmailAnalyzer::new(rules.generic_providers);
        let scorer = ScoringEngine::new(rules.scoring, analyzer.clone());
        Self {
            analyzer,
            scorer,
            checker,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn scorer(&self) -> &ScoringEngine {
        &self.scorer
    }

    pub fn analyzer(&self) -> &EmailAnalyzer {
        &self.analyzer
    }

    /// Attach email flags (`no_email`, `invalid_format`, `generic`, `no_mx`).
    pub async fn validate(&self, leads: &[Lead]) -> Vec<Lead> {
        validate_leads(leads, &self.analyzer, self.checker.as_ref(), &self.options).await
    }

    /// Copies with their score filled in.
    pub fn score(&self, leads: &[Lead]) -> Vec<Lead> {
        self.scorer.score_all(leads)
    }

    /// Dedup with the configured strategy.
    pub fn dedup(&self, leads: &[Lead]) -> DedupOutcome {
        dedup(leads, self.options.dedup_key)
    }

    /// Run validate → score → dedup over `leads`.
    pub async fn process(&self, leads: &[Lead]) -> PipelineResult<ProcessedLeads> {
        if leads.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        log_info(format!("✉️  Validating {} leads...", leads.len()));
        let validated = self.validate(leads).await;
        let flagged = validated.iter().filter(|l| !l.flags.is_empty()).count();
        if flagged > 0 {
            log_warning(format!("{} leads carry validation flags", flagged));
        } else {
            log_success("All emails look deliverable");
        }

        log_info("🎯 Scoring leads...");
        let scored = self.score(&validated);

        log_info(format!("🧹 Removing duplicates (key: {:?})...", self.options.dedup_key));
        let DedupOutcome {
            leads,
            removed_count,
        } = self.dedup(&scored);
        log_success(format!("{} leads kept, {} duplicates removed", leads.len(), removed_count));

        let stats = calculate_lead_stats(&leads);
        Ok(ProcessedLeads {
            leads,
            removed_count,
            stats,
        })
    }
}

/// Validate leads in batches of `options.batch_size`.
///
/// Leads of one batch are checked concurrently; `options.batch_delay` is
/// awaited between batches but not after the last one. A failed MX lookup
/// only flags the lead, it never aborts the batch. Output order matches
/// input order.
pub async fn validate_leads(
    leads: &[Lead],
    analyzer: &EmailAnalyzer,
    checker: &dyn MxChecker,
    options: &PipelineOptions,
) -> Vec<Lead> {
    let batch_size = options.batch_size.max(1);
    let batches = leads.len().div_ceil(batch_size);
    let mut validated = Vec::with_capacity(leads.len());

    for (i, batch) in leads.chunks(batch_size).enumerate() {
        let results = join_all(batch.iter().map(|lead| validate_one(lead, analyzer, checker))).await;
        validated.extend(results);
        tracing::debug!(batch = i + 1, of = batches, "validated batch");

        if i + 1 < batches && !options.batch_delay.is_zero() {
            tokio::time::sleep(options.batch_delay).await;
        }
    }

    validated
}

async fn validate_one(lead: &Lead, analyzer: &EmailAnalyzer, checker: &dyn MxChecker) -> Lead {
    let Some(email) = lead.email() else {
        return lead.with_flags([flag::NO_EMAIL]);
    };

    let mut flags = analyzer.validate(email).flags;

    let domain = extract_domain(email);
    if !domain.is_empty() && !checker.has_mx_record(&domain).await {
        flags.push(flag::NO_MX.to_string());
    }

    lead.with_flags(flags)
}

/// Structural check, then parse. Unlike [`parse_csv`] alone, a single
/// malformed row rejects the whole upload.
pub fn import_csv(content: &str) -> PipelineResult<Vec<Lead>> {
    let validation = validate_csv_format(content);
    if !validation.is_valid {
        log_warning(format!("CSV rejected: {} error(s)", validation.errors.len()));
        return Err(PipelineError::InvalidCsv(validation.errors));
    }

    let leads = parse_csv(content);
    log_success(format!("Read {} leads from CSV", leads.len()));
    Ok(leads)
}

/// Load leads from a `.json` array or, for any other extension, a CSV file.
pub fn load_leads(path: impl AsRef<Path>) -> PipelineResult<Vec<Lead>> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(read_csv_file(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mx::StaticMxChecker;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pipeline(checker: StaticMxChecker) -> Pipeline {
        let options = PipelineOptions {
            batch_delay: Duration::ZERO,
            ..PipelineOptions::default()
        };
        Pipeline::new(RulesConfig::default(), Arc::new(checker), options)
    }

    #[test]
    fn test_default_options() {
        let opts = PipelineOptions::default();
        assert_eq!(opts.batch_size, 10);
        assert_eq!(opts.batch_delay, Duration::from_millis(100));
        assert_eq!(opts.dedup_key, DedupKey::Email);
    }

    #[tokio::test]
    async fn test_validate_flags() {
        let leads = vec![
            Lead::default(),
            Lead::with_email("jane@acme.io"),
            Lead::with_email("bob@gmail.com"),
            Lead::with_email("broken").with_flags(["mock_data"]),
            Lead::with_email("amy@nomx.io"),
        ];
        let checker = StaticMxChecker::only(["acme.io", "gmail.com"]);
        let validated = pipeline(checker).validate(&leads).await;

        assert_eq!(validated[0].flags, vec!["no_email"]);
        assert!(validated[1].flags.is_empty());
        assert_eq!(validated[2].flags, vec!["generic"]);
        // No '@': empty domain, so no MX lookup either.
        assert_eq!(validated[3].flags, vec!["mock_data", "invalid_format"]);
        assert_eq!(validated[4].flags, vec!["no_mx"]);
    }

    struct CountingChecker(AtomicUsize);

    #[async_trait]
    impl MxChecker for CountingChecker {
        async fn has_mx_record(&self, _domain: &str) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    #[tokio::test]
    async fn test_batches_cover_every_lead_in_order() {
        let leads: Vec<Lead> = (0..23).map(|i| Lead::with_email(format!("u{i}@acme.io"))).collect();
        let checker = CountingChecker(AtomicUsize::new(0));
        let options = PipelineOptions {
            batch_size: 5,
            batch_delay: Duration::from_millis(1),
            ..PipelineOptions::default()
        };

        let validated = validate_leads(&leads, &EmailAnalyzer::default(), &checker, &options).await;

        assert_eq!(checker.0.load(Ordering::SeqCst), 23);
        assert_eq!(validated.len(), 23);
        assert_eq!(validated[22].email.as_deref(), Some("u22@acme.io"));
        assert!(validated.iter().all(|l| l.flags == vec!["no_mx"]));
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_clamped() {
        let options = PipelineOptions {
            batch_size: 0,
            batch_delay: Duration::ZERO,
            ..PipelineOptions::default()
        };
        let leads = vec![Lead::with_email("a@acme.io"), Lead::with_email("b@acme.io")];
        let validated =
            validate_leads(&leads, &EmailAnalyzer::default(), &StaticMxChecker::AcceptAll, &options).await;
        assert_eq!(validated.len(), 2);
    }

    #[tokio::test]
    async fn test_process_end_to_end() {
        let founder = Lead {
            name: Some("Jane".into()),
            role: Some("Founder".into()),
            company: Some("Acme".into()),
            domain: Some("acme.io".into()),
            email: Some("jane@acme.io".into()),
            ..Lead::default()
        };
        let leads = vec![founder.clone(), Lead { email: Some("JANE@acme.io".into()), ..founder }];

        let result = pipeline(StaticMxChecker::AcceptAll).process(&leads).await.unwrap();

        assert_eq!(result.removed_count, 1);
        assert_eq!(result.leads.len(), 1);
        // 40 role + 20 tld + 20 email + 5 completeness
        assert_eq!(result.leads[0].score, Some(85.0));
        assert_eq!(result.stats.total, 1);
        assert_eq!(result.stats.avg_score, 85);
    }

    #[tokio::test]
    async fn test_process_empty_input() {
        let err = pipeline(StaticMxChecker::AcceptAll).process(&[]).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput));
    }

    #[test]
    fn test_load_leads_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let csv = dir.path().join("leads.csv");
        std::fs::write(&csv, "name,email\nJane,jane@acme.io\n").unwrap();
        let leads = load_leads(&csv).unwrap();
        assert_eq!(leads[0].email.as_deref(), Some("jane@acme.io"));

        let json = dir.path().join("leads.JSON");
        std::fs::write(&json, r#"[{"email":"bob@beta.ai","flags":["no_mx"]}]"#).unwrap();
        let leads = load_leads(&json).unwrap();
        assert_eq!(leads[0].flags, vec!["no_mx"]);

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();
        assert!(matches!(load_leads(&broken), Err(PipelineError::Json(_))));
    }

    #[test]
    fn test_import_csv() {
        let leads = import_csv("name,email\nJane,j@x.com").unwrap();
        assert_eq!(leads.len(), 1);

        let err = import_csv("name,role\na,b,c").unwrap_err();
        assert_eq!(err.to_string(), "Invalid CSV format: Line 2: Expected 2 columns, got 3");
    }
}
