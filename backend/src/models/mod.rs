//! Domain models for the lead pipeline.
//!
//! This module contains the data structures passed between every stage:
//!
//! - [`Lead`] - A prospective contact with optional enrichment fields
//! - [`DedupKey`] - Identity strategy requested by the caller
//! - [`DedupOutcome`] - Survivors of a dedup pass plus the removed count
//! - [`Tier`] / [`Tiers`] - Hot, warm and cold score buckets
//! - [`LeadStats`] - Dashboard counters
//! - [`FilterOptions`] - Dashboard filter criteria
//! - [`ExportFormat`] - Requested export format

use serde::{Deserialize, Serialize};

// =============================================================================
// Flags
// =============================================================================

/// Well-known flag values attached to leads by the validation stage.
pub mod flag {
    /// Email does not look like `local@domain.tld`.
    pub const INVALID_FORMAT: &str = "invalid_format";
    /// Email domain has no MX record.
    pub const NO_MX: &str = "no_mx";
    /// Email belongs to a consumer mail provider.
    pub const GENERIC: &str = "generic";
    /// Lead carries no email at all.
    pub const NO_EMAIL: &str = "no_email";
    /// Lead was recognised as a duplicate of an earlier one.
    pub const DUPLICATE: &str = "duplicate";
}

// =============================================================================
// Lead
// =============================================================================

/// A prospective contact record.
///
/// Every field is optional: `None` means "unknown", which is not the same
/// thing as an empty string. Leads have no identity of their own; dedup keys
/// are derived on the fly and never stored back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Where the lead came from (keyword, URL, `mock_data`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Rule-based score in `0..=100`, `None` until scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Validation and provenance tags, in the order they were attached.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

impl Lead {
    /// Lead with only an email, handy for dedup-by-email inputs.
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    /// Email if present and non-empty.
    pub fn email(&self) -> Option<&str> {
        non_empty(&self.email)
    }

    /// Domain if present and non-empty.
    pub fn domain(&self) -> Option<&str> {
        non_empty(&self.domain)
    }

    /// Name if present and non-empty.
    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    /// Company if present and non-empty.
    pub fn company(&self) -> Option<&str> {
        non_empty(&self.company)
    }

    /// Role if present and non-empty.
    pub fn role(&self) -> Option<&str> {
        non_empty(&self.role)
    }

    /// Score, treating "not scored yet" as zero.
    pub fn score_or_zero(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// Copy of this lead with `extra` appended to its flags.
    pub fn with_flags<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lead = self.clone();
        lead.flags.extend(extra.into_iter().map(Into::into));
        lead
    }
}

/// `Some(s)` only when the string is present and not empty.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// =============================================================================
// Dedup
// =============================================================================

/// Identity strategy for a dedup pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DedupKey {
    /// Email, falling back to `domain|name`.
    #[default]
    Email,
    /// Domain, falling back to `company|name`.
    Domain,
    /// Any of email, `domain|name` or `company|email`.
    Advanced,
}

impl std::str::FromStr for DedupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "domain" => Ok(Self::Domain),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown dedup key '{}'", other)),
        }
    }
}

/// Result of a dedup pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupOutcome {
    /// Retained leads, in input order.
    pub leads: Vec<Lead>,
    /// Number of leads dropped as duplicates.
    pub removed_count: usize,
}

// =============================================================================
// Tiers
// =============================================================================

/// Score bucket used by the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Score >= 70.
    Hot,
    /// Score in 40..70.
    Warm,
    /// Score < 40.
    Cold,
}

impl Tier {
    pub fn of(score: f64) -> Self {
        if score >= 70.0 {
            Tier::Hot
        } else if score >= 40.0 {
            Tier::Warm
        } else {
            Tier::Cold
        }
    }
}

/// Leads partitioned by [`Tier`], each bucket in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tiers {
    pub hot: Vec<Lead>,
    pub warm: Vec<Lead>,
    pub cold: Vec<Lead>,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total: usize,
    pub valid_format: usize,
    pub invalid_format: usize,
    pub no_mx: usize,
    pub duplicates: usize,
    /// Mean score rounded to the nearest integer.
    pub avg_score: i64,
}

/// Filter criteria; every unset criterion matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub senior_roles_only: bool,
    #[serde(default)]
    pub good_tlds_only: bool,
    #[serde(default)]
    pub min_score: Option<f64>,
}

/// Export format requested by a client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    /// Accepted on the wire, rejected by the exporter.
    Xlsx,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_json_omits_unknown_fields() {
        let lead = Lead::with_email("jane@acme.io");
        let json = serde_json::to_value(&lead).unwrap();

        assert_eq!(json, serde_json::json!({ "email": "jane@acme.io" }));
    }

    #[test]
    fn test_lead_json_missing_flags_default_empty() {
        let lead: Lead = serde_json::from_str(r#"{"name":"Jane","score":42}"#).unwrap();

        assert_eq!(lead.name.as_deref(), Some("Jane"));
        assert_eq!(lead.score, Some(42.0));
        assert!(lead.flags.is_empty());
    }

    #[test]
    fn test_empty_strings_are_not_present() {
        let lead = Lead {
            email: Some(String::new()),
            ..Lead::default()
        };
        assert!(lead.email().is_none());
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::of(100.0), Tier::Hot);
        assert_eq!(Tier::of(70.0), Tier::Hot);
        assert_eq!(Tier::of(69.0), Tier::Warm);
        assert_eq!(Tier::of(40.0), Tier::Warm);
        assert_eq!(Tier::of(39.0), Tier::Cold);
        assert_eq!(Tier::of(0.0), Tier::Cold);
    }

    #[test]
    fn test_dedup_key_parsing() {
        assert_eq!("email".parse::<DedupKey>(), Ok(DedupKey::Email));
        assert_eq!("Domain".parse::<DedupKey>(), Ok(DedupKey::Domain));
        assert_eq!("advanced".parse::<DedupKey>(), Ok(DedupKey::Advanced));
        assert!("phone".parse::<DedupKey>().is_err());
    }

    #[test]
    fn test_dedup_outcome_wire_name() {
        let outcome = DedupOutcome { leads: vec![], removed_count: 3 };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["removedCount"], 3);
    }
}
