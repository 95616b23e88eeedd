//! Dashboard helpers: counters, filtering and field normalization.

use crate::config::ScoringRules;
use crate::models::{flag, FilterOptions, Lead, LeadStats};

/// Count flags and average the scores of a lead list.
pub fn calculate_lead_stats(leads: &[Lead]) -> LeadStats {
    let total = leads.len();
    let count = |f: &str| leads.iter().filter(|l| l.has_flag(f)).count();

    let invalid_format = count(flag::INVALID_FORMAT);
    let total_score: f64 = leads.iter().map(Lead::score_or_zero).sum();
    let avg_score = if total > 0 {
        (total_score / total as f64).round() as i64
    } else {
        0
    };

    LeadStats {
        total,
        valid_format: total - invalid_format,
        invalid_format,
        no_mx: count(flag::NO_MX),
        duplicates: count(flag::DUPLICATE),
        avg_score,
    }
}

/// Apply every set criterion of `options`, keeping input order.
pub fn filter_leads(leads: &[Lead], options: &FilterOptions, rules: &ScoringRules) -> Vec<Lead> {
    let term = options
        .search_term
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);

    leads
        .iter()
        .filter(|lead| match &term {
            Some(term) => [&lead.name, &lead.company, &lead.email, &lead.domain, &lead.role]
                .iter()
                .any(|field| contains_lower(field, term)),
            None => true,
        })
        .filter(|lead| {
            !options.senior_roles_only || {
                let role = lead.role.as_deref().unwrap_or("").to_lowercase();
                rules
                    .senior_filter_keywords
                    .iter()
                    .any(|k| role.contains(k.as_str()))
            }
        })
        .filter(|lead| {
            !options.good_tlds_only || rules.has_good_tld(lead.domain.as_deref().unwrap_or(""))
        })
        .filter(|lead| match options.min_score {
            Some(min) => lead.score_or_zero() >= min,
            None => true,
        })
        .cloned()
        .collect()
}

fn contains_lower(field: &Option<String>, term: &str) -> bool {
    field
        .as_deref()
        .is_some_and(|v| v.to_lowercase().contains(term))
}

/// Trim text fields, lower-case domain and email, drop fields left empty.
pub fn normalize_lead(lead: &Lead) -> Lead {
    let trimmed = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };
    let lowered = |v: &Option<String>| trimmed(v).map(|s| s.to_lowercase());

    Lead {
        name: trimmed(&lead.name),
        role: trimmed(&lead.role),
        company: trimmed(&lead.company),
        domain: lowered(&lead.domain),
        email: lowered(&lead.email),
        source: trimmed(&lead.source),
        country: trimmed(&lead.country),
        industry: trimmed(&lead.industry),
        score: lead.score,
        flags: lead.flags.clone(),
    }
}

pub fn normalize_leads(leads: &[Lead]) -> Vec<Lead> {
    leads.iter().map(normalize_lead).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(name: &str, role: &str, domain: &str, score: f64) -> Lead {
        Lead {
            name: Some(name.into()),
            role: Some(role.into()),
            domain: Some(domain.into()),
            score: Some(score),
            ..Lead::default()
        }
    }

    #[test]
    fn test_stats() {
        let leads = vec![
            lead("a", "CEO", "a.com", 80.0).with_flags(["invalid_format", "no_mx"]),
            lead("b", "CTO", "b.de", 41.0).with_flags(["duplicate"]),
            Lead::default().with_flags(["no_mx"]),
        ];
        let stats = calculate_lead_stats(&leads);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.invalid_format, 1);
        assert_eq!(stats.valid_format, 2);
        assert_eq!(stats.no_mx, 2);
        assert_eq!(stats.duplicates, 1);
        // (80 + 41 + 0) / 3 = 40.33
        assert_eq!(stats.avg_score, 40);
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(calculate_lead_stats(&[]), LeadStats::default());
    }

    #[test]
    fn test_filter_search_term() {
        let leads = vec![lead("Jane", "CEO", "acme.io", 10.0), lead("Bob", "Dev", "beta.ai", 10.0)];
        let options = FilterOptions {
            search_term: Some("ACME".into()),
            ..FilterOptions::default()
        };
        let out = filter_leads(&leads, &options, &ScoringRules::default());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_filter_senior_tld_and_score() {
        let leads = vec![
            lead("a", "CTO", "a.com", 90.0),
            lead("b", "Developer", "b.com", 90.0),
            lead("c", "VP Marketing", "c.de", 90.0),
            lead("d", "Head of Sales", "d.io", 20.0),
        ];
        let options = FilterOptions {
            senior_roles_only: true,
            good_tlds_only: true,
            min_score: Some(50.0),
            ..FilterOptions::default()
        };
        let out = filter_leads(&leads, &options, &ScoringRules::default());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name.as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_options_keep_everything() {
        let leads = vec![Lead::default(), lead("a", "x", "y", 1.0)];
        assert_eq!(filter_leads(&leads, &FilterOptions::default(), &ScoringRules::default()), leads);
    }

    #[test]
    fn test_normalize_lead() {
        let lead = Lead {
            name: Some("  Jane ".into()),
            email: Some(" Jane@ACME.io ".into()),
            domain: Some("ACME.io".into()),
            company: Some("   ".into()),
            flags: vec!["no_mx".into()],
            ..Lead::default()
        };
        let normalized = normalize_lead(&lead);

        assert_eq!(normalized.name.as_deref(), Some("Jane"));
        assert_eq!(normalized.email.as_deref(), Some("jane@acme.io"));
        assert_eq!(normalized.domain.as_deref(), Some("acme.io"));
        assert_eq!(normalized.company, None);
        assert_eq!(normalized.flags, vec!["no_mx"]);
    }
}
