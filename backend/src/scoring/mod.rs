//! Rule-based lead scoring.
//!
//! A score is the sum of independent components, clamped to `0..=100`:
//!
//! | Component | Points |
//! |-----------|--------|
//! | Role (first matching tier) | +40 senior / +25 mid / +15 technical |
//! | Domain with a good TLD | +20 |
//! | Email quality | +20 business / -10 generic |
//! | Tech keyword in industry or company | +10 |
//! | Flags | -10 each |
//! | At least 4 of name, role, company, domain, email | +5 |
//!
//! Keyword and TLD lists come from [`ScoringRules`], the generic provider list
//! from the injected [`EmailAnalyzer`].

use crate::config::ScoringRules;
use crate::email::EmailAnalyzer;
use crate::models::{Lead, Tier, Tiers};

/// Threshold used by `filter_by_min_score` callers that do not pick one.
pub const DEFAULT_MIN_SCORE: f64 = 50.0;

/// Deterministic scorer over lead fields.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    rules: ScoringRules,
    analyzer: EmailAnalyzer,
}

impl ScoringEngine {
    pub fn new(rules: ScoringRules, analyzer: EmailAnalyzer) -> Self {
        Self { rules, analyzer }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Score a single lead.
    pub fn score(&self, lead: &Lead) -> u8 {
        let role = lead.role.as_deref().unwrap_or("").to_lowercase();
        let domain = lead.domain.as_deref().unwrap_or("").to_lowercase();
        let industry = lead.industry.as_deref().unwrap_or("").to_lowercase();
        let company = lead.company.as_deref().unwrap_or("").to_lowercase();

        let mut score = self.role_points(&role);

        if self.rules.has_good_tld(&domain) {
            score += 20;
        }

        if let Some(email) = lead.email() {
            if self.analyzer.is_generic_provider(&email.to_lowercase()) {
                score -= 10;
            } else {
                score += 20;
            }
        }

        let tech = self
            .rules
            .tech_keywords
            .iter()
            .any(|k| industry.contains(k.as_str()) || company.contains(k.as_str()));
        if tech {
            score += 10;
        }

        score -= 10 * lead.flags.len() as i64;

        let completeness = [lead.name(), lead.role(), lead.company(), lead.domain(), lead.email()]
            .iter()
            .filter(|f| f.is_some())
            .count();
        if completeness >= 4 {
            score += 5;
        }

        score.clamp(0, 100) as u8
    }

    fn role_points(&self, role: &str) -> i64 {
        let matches = |list: &[String]| list.iter().any(|k| role.contains(k.as_str()));

        if matches(&self.rules.senior_roles) {
            40
        } else if matches(&self.rules.mid_roles) {
            25
        } else if matches(&self.rules.technical_roles) {
            15
        } else {
            0
        }
    }

    /// Copies of `leads` with their score filled in.
    pub fn score_all(&self, leads: &[Lead]) -> Vec<Lead> {
        leads
            .iter()
            .map(|lead| Lead {
                score: Some(f64::from(self.score(lead))),
                ..lead.clone()
            })
            .collect()
    }
}

/// Leads whose score (missing = 0) is at least `min_score`.
pub fn filter_by_min_score(leads: &[Lead], min_score: f64) -> Vec<Lead> {
    leads
        .iter()
        .filter(|lead| lead.score_or_zero() >= min_score)
        .cloned()
        .collect()
}

/// Highest score first. Stable: ties keep their input order.
pub fn sort_by_score(leads: &[Lead]) -> Vec<Lead> {
    let mut sorted = leads.to_vec();
    sorted.sort_by(|a, b| b.score_or_zero().total_cmp(&a.score_or_zero()));
    sorted
}

/// Partition into hot (>= 70), warm (40..70) and cold (< 40).
pub fn categorize(leads: &[Lead]) -> Tiers {
    let mut tiers = Tiers::default();
    for lead in leads {
        match Tier::of(lead.score_or_zero()) {
            Tier::Hot => tiers.hot.push(lead.clone()),
            Tier::Warm => tiers.warm.push(lead.clone()),
            Tier::Cold => tiers.cold.push(lead.clone()),
        }
    }
    tiers
}
