//! Identity resolution over noisy lead lists.
//!
//! Two strategies decide which leads are "the same person":
//!
//! ```text
//! simple (email)     email            else  domain|name
//! simple (domain)    domain           else  company|name
//! advanced           email  OR  domain|name  OR  company|email
//! ```
//!
//! Both run a single left-to-right pass with a flat set of seen keys, keep
//! the first occurrence and preserve input order. The advanced strategy marks
//! a lead as duplicate when *any* of its keys was seen before; it does not
//! merge equivalence classes, so chains of three or more leads linked through
//! different keys may not all collapse.
//!
//! [`merge`] folds leads sharing an email into one record instead of
//! dropping them.

pub mod merge;

use std::collections::HashSet;

use crate::models::{flag, DedupKey, DedupOutcome, Lead};

pub use merge::merge_leads;

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Single identity key for the simple strategies, `None` when the lead has
/// nothing to discriminate on.
fn simple_key(lead: &Lead, key_by: DedupKey) -> Option<String> {
    let (primary, fallback) = match key_by {
        DedupKey::Domain => (lead.domain(), lead.company()),
        _ => (lead.email(), lead.domain()),
    };

    let key = match (primary, fallback) {
        (Some(primary), _) => primary.to_string(),
        (None, Some(fallback)) => format!("{}|{}", fallback, lead.name().unwrap_or("")),
        (None, None) => return None,
    };

    let key = normalize(&key);
    (!key.is_empty()).then_some(key)
}

/// Every composite key of a lead used by the advanced strategy.
fn candidate_keys(lead: &Lead) -> Vec<String> {
    let mut keys = Vec::with_capacity(3);

    if let Some(email) = lead.email() {
        keys.push(normalize(email));
    }
    if let (Some(domain), Some(name)) = (lead.domain(), lead.name()) {
        keys.push(format!("{}|{}", normalize(domain), normalize(name)));
    }
    if let (Some(company), Some(email)) = (lead.company(), lead.email()) {
        keys.push(format!("{}|{}", normalize(company), normalize(email)));
    }

    keys.retain(|k| !k.is_empty());
    keys
}

/// Which leads of `leads` are duplicates under `key_by`, by position.
fn duplicate_mask(leads: &[Lead], key_by: DedupKey) -> Vec<bool> {
    let mut seen: HashSet<String> = HashSet::new();

    leads
        .iter()
        .map(|lead| match key_by {
            DedupKey::Advanced => {
                let keys = candidate_keys(lead);
                if keys.iter().any(|k| seen.contains(k)) {
                    true
                } else {
                    seen.extend(keys);
                    false
                }
            }
            simple => match simple_key(lead, simple) {
                // No discriminator: cannot be a duplicate of anything.
                None => false,
                Some(key) => !seen.insert(key),
            },
        })
        .collect()
}

fn drop_duplicates(leads: &[Lead], key_by: DedupKey) -> DedupOutcome {
    let mask = duplicate_mask(leads, key_by);
    let removed_count = mask.iter().filter(|dup| **dup).count();
    let leads = leads
        .iter()
        .zip(mask)
        .filter(|(_, dup)| !dup)
        .map(|(lead, _)| lead.clone())
        .collect();

    DedupOutcome { leads, removed_count }
}

/// Simple dedup by email or domain.
///
/// `DedupKey::Advanced` is accepted and forwarded to [`dedup_advanced`].
pub fn dedup(leads: &[Lead], key_by: DedupKey) -> DedupOutcome {
    let outcome = drop_duplicates(leads, key_by);
    tracing::debug!(
        strategy = ?key_by,
        input = leads.len(),
        removed = outcome.removed_count,
        "dedup pass finished"
    );
    outcome
}

/// Multi-key dedup: duplicate if any of email, `domain|name` or
/// `company|email` was already seen.
pub fn dedup_advanced(leads: &[Lead]) -> DedupOutcome {
    dedup(leads, DedupKey::Advanced)
}

/// Keep every lead, appending the `duplicate` flag to those `dedup` would
/// drop.
pub fn mark_duplicates(leads: &[Lead], key_by: DedupKey) -> Vec<Lead> {
    leads
        .iter()
        .zip(duplicate_mask(leads, key_by))
        .map(|(lead, dup)| {
            if dup && !lead.has_flag(flag::DUPLICATE) {
                lead.with_flags([flag::DUPLICATE])
            } else {
                lead.clone()
            }
        })
        .collect()
}
