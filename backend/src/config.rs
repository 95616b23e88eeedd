//! Keyword, TLD and provider lists used by scoring and email analysis.
//!
//! The defaults reproduce the built-in lists. A JSON file can override any
//! subset of them:
//!
//! ```json
//! {
//!   "seniorRoles": ["founder", "ceo"],
//!   "goodTlds": [".com", ".de"],
//!   "genericProviders": ["gmail.com", "web.de"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Consumer mail providers treated as low-signal addresses.
pub const DEFAULT_GENERIC_PROVIDERS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "mail.com",
    "protonmail.com",
    "yandex.com",
    "zoho.com",
];

pub const DEFAULT_SENIOR_ROLES: &[&str] = &[
    "founder",
    "co-founder",
    "ceo",
    "owner",
    "principal",
    "partner",
    "head of growth",
    "vp sales",
    "chief",
    "director",
    "president",
    "managing director",
    "general manager",
    "head of",
    "vp of",
];

pub const DEFAULT_MID_ROLES: &[&str] = &["manager", "lead"];

pub const DEFAULT_TECHNICAL_ROLES: &[&str] = &["developer", "engineer"];

pub const DEFAULT_GOOD_TLDS: &[&str] = &[".com", ".io", ".ai", ".org", ".net"];

pub const DEFAULT_TECH_KEYWORDS: &[&str] = &[
    "software",
    "saas",
    "technology",
    "it",
    "tech",
    "digital",
    "startup",
    "fintech",
    "edtech",
    "healthtech",
    "ai",
    "ml",
];

/// Keywords for the dashboard's "senior roles only" filter. Broader than
/// [`DEFAULT_SENIOR_ROLES`] on purpose: it also catches `cto`, `vp`, `head`.
pub const DEFAULT_SENIOR_FILTER_KEYWORDS: &[&str] = &[
    "ceo", "founder", "cto", "head", "director", "vp", "chief", "president",
];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Domains of consumer mail providers, compared exactly against the
/// lower-cased email domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenericProviders(Vec<String>);

impl GenericProviders {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(domains.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.0.iter().any(|d| d == domain)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for GenericProviders {
    fn default() -> Self {
        Self(owned(DEFAULT_GENERIC_PROVIDERS))
    }
}

/// Lists driving the scoring rules. All entries are expected lower-case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringRules {
    pub senior_roles: Vec<String>,
    pub mid_roles: Vec<String>,
    pub technical_roles: Vec<String>,
    pub good_tlds: Vec<String>,
    pub tech_keywords: Vec<String>,
    pub senior_filter_keywords: Vec<String>,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            senior_roles: owned(DEFAULT_SENIOR_ROLES),
            mid_roles: owned(DEFAULT_MID_ROLES),
            technical_roles: owned(DEFAULT_TECHNICAL_ROLES),
            good_tlds: owned(DEFAULT_GOOD_TLDS),
            tech_keywords: owned(DEFAULT_TECH_KEYWORDS),
            senior_filter_keywords: owned(DEFAULT_SENIOR_FILTER_KEYWORDS),
        }
    }
}

impl ScoringRules {
    /// True if `domain` (any case) ends with one of the good TLDs.
    pub fn has_good_tld(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.good_tlds.iter().any(|tld| domain.ends_with(tld.as_str()))
    }
}

/// Everything that can be tuned from a rules file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesConfig {
    #[serde(flatten)]
    pub scoring: ScoringRules,
    pub generic_providers: GenericProviders,
}

impl RulesConfig {
    /// Parse a rules document. Missing keys keep their defaults.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let mut config: RulesConfig = serde_json::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    /// Load a rules file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        tracing::debug!(path = %path.display(), "loaded rules file");
        Ok(config)
    }

    // Matching is done on lower-cased input, so keep the lists lower-case too.
    fn normalize(&mut self) {
        let s = &mut self.scoring;
        for list in [
            &mut s.senior_roles,
            &mut s.mid_roles,
            &mut s.technical_roles,
            &mut s.good_tlds,
            &mut s.tech_keywords,
            &mut s.senior_filter_keywords,
            &mut self.generic_providers.0,
        ] {
            for item in list.iter_mut() {
                *item = item.trim().to_lowercase();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lists() {
        let rules = ScoringRules::default();
        assert!(rules.senior_roles.contains(&"founder".to_string()));
        assert_eq!(rules.good_tlds.len(), 5);
        assert_eq!(GenericProviders::default().as_slice().len(), 10);
    }

    #[test]
    fn test_good_tld_is_case_insensitive() {
        let rules = ScoringRules::default();
        assert!(rules.has_good_tld("Acme.IO"));
        assert!(!rules.has_good_tld("acme.de"));
    }

    #[test]
    fn test_partial_rules_file_keeps_defaults() {
        let config = RulesConfig::from_json(r#"{ "goodTlds": [".DE"] }"#).unwrap();

        assert_eq!(config.scoring.good_tlds, vec![".de".to_string()]);
        assert_eq!(config.scoring.senior_roles, ScoringRules::default().senior_roles);
        assert_eq!(config.generic_providers, GenericProviders::default());
    }

    #[test]
    fn test_generic_providers_override() {
        let config = RulesConfig::from_json(r#"{ "genericProviders": ["Web.de"] }"#).unwrap();
        assert!(config.generic_providers.contains("web.de"));
        assert!(!config.generic_providers.contains("gmail.com"));
    }

    #[test]
    fn test_invalid_rules_file() {
        assert!(RulesConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"{ "techKeywords": ["robotics"] }"#).unwrap();

        let config = RulesConfig::load(&path).unwrap();
        assert_eq!(config.scoring.tech_keywords, vec!["robotics".to_string()]);

        assert!(RulesConfig::load(dir.path().join("missing.json")).is_err());
    }
}
