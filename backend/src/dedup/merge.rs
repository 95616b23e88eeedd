//! Fold leads that share an email into a single, richer record.
//!
//! ```text
//! Input (noisy rows)                         Merged
//! ┌───────────────────────────────────┐     ┌──────────────────────────────┐
//! │ jane@acme.io  role: -    score 10 │     │ jane@acme.io                 │
//! │ JANE@acme.io  role: CEO  score 90 │  →  │ role: CEO  score 90          │
//! │ bob@beta.ai   role: CTO           │     ├──────────────────────────────┤
//! └───────────────────────────────────┘     │ bob@beta.ai  role: CTO       │
//!                                           └──────────────────────────────┘
//! ```
//!
//! Leads without an email take no part in the merge and are dropped from its
//! output.

use std::collections::HashMap;

use crate::models::Lead;

/// Merge leads sharing a (case/whitespace-insensitive) email.
///
/// Within a group the first non-empty value wins for every text field,
/// the score becomes the maximum seen (missing counts as 0) and flags become
/// the union in order of first appearance. Groups are returned in the order
/// their email first appeared.
pub fn merge_leads(leads: &[Lead]) -> Vec<Lead> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, LeadBuilder> = HashMap::new();

    for lead in leads {
        let Some(email) = lead.email() else {
            continue;
        };
        let key = email.trim().to_lowercase();

        match groups.get_mut(&key) {
            Some(builder) => builder.absorb(lead),
            None => {
                order.push(key.clone());
                groups.insert(key, LeadBuilder::new(lead));
            }
        }
    }

    let merged: Vec<Lead> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .map(LeadBuilder::build)
        .collect();

    tracing::debug!(input = leads.len(), merged = merged.len(), "merge finished");
    merged
}

/// Accumulates one email group.
struct LeadBuilder {
    lead: Lead,
    /// Only set once a second lead joined the group.
    merged: bool,
}

impl LeadBuilder {
    fn new(first: &Lead) -> Self {
        Self {
            lead: first.clone(),
            merged: false,
        }
    }

    fn absorb(&mut self, other: &Lead) {
        let lead = &mut self.lead;

        fill(&mut lead.name, &other.name);
        fill(&mut lead.role, &other.role);
        fill(&mut lead.company, &other.company);
        fill(&mut lead.domain, &other.domain);
        fill(&mut lead.source, &other.source);
        fill(&mut lead.country, &other.country);
        fill(&mut lead.industry, &other.industry);

        lead.score = Some(lead.score_or_zero().max(other.score_or_zero()));

        for flag in &other.flags {
            if !lead.flags.contains(flag) {
                lead.flags.push(flag.clone());
            }
        }
        self.merged = true;
    }

    fn build(mut self) -> Lead {
        if self.merged {
            // A group of one is returned untouched; merged groups get their
            // own flag list deduplicated as well.
            let mut unique: Vec<String> = Vec::with_capacity(self.lead.flags.len());
            for flag in self.lead.flags.drain(..) {
                if !unique.contains(&flag) {
                    unique.push(flag);
                }
            }
            self.lead.flags = unique;
        }
        self.lead
    }
}

/// Keep `slot` unless it is empty, in which case take `candidate`.
fn fill(slot: &mut Option<String>, candidate: &Option<String>) {
    let empty = slot.as_deref().map_or(true, str::is_empty);
    if empty {
        if let Some(value) = candidate.as_deref().filter(|v| !v.is_empty()) {
            *slot = Some(value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(email: &str, f: impl FnOnce(&mut Lead)) -> Lead {
        let mut lead = Lead::with_email(email);
        f(&mut lead);
        lead
    }

    #[test]
    fn test_first_non_empty_wins() {
        let leads = vec![
            with("jane@acme.io", |l| l.name = Some("Jane".into())),
            with("JANE@acme.io ", |l| {
                l.name = Some("Janet".into());
                l.role = Some("CEO".into());
            }),
            with("jane@acme.io", |l| l.role = Some("CTO".into())),
        ];
        let merged = merge_leads(&leads);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name.as_deref(), Some("Jane"));
        assert_eq!(merged[0].role.as_deref(), Some("CEO"));
        assert_eq!(merged[0].email.as_deref(), Some("jane@acme.io"));
    }

    #[test]
    fn test_empty_string_is_replaced() {
        let leads = vec![
            with("a@x.com", |l| l.company = Some(String::new())),
            with("a@x.com", |l| l.company = Some("Acme".into())),
        ];
        assert_eq!(merge_leads(&leads)[0].company.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_score_max_is_order_independent() {
        let low = with("a@x.com", |l| l.score = Some(10.0));
        let high = with("a@x.com", |l| l.score = Some(90.0));

        let forward = merge_leads(&[low.clone(), high.clone()]);
        let backward = merge_leads(&[high, low]);

        assert_eq!(forward[0].score, Some(90.0));
        assert_eq!(backward[0].score, Some(90.0));
    }

    #[test]
    fn test_flag_union_keeps_first_appearance() {
        let leads = vec![
            with("a@x.com", |l| l.flags = vec!["a".into()]),
            with("a@x.com", |l| l.flags = vec!["a".into(), "b".into()]),
        ];
        assert_eq!(merge_leads(&leads)[0].flags, vec!["a", "b"]);
    }

    #[test]
    fn test_flag_union_is_associative() {
        let a = with("a@x.com", |l| l.flags = vec!["x".into()]);
        let b = with("a@x.com", |l| l.flags = vec!["y".into(), "x".into()]);
        let c = with("a@x.com", |l| l.flags = vec!["z".into()]);

        let all_at_once = merge_leads(&[a.clone(), b.clone(), c.clone()]);
        let left_first = merge_leads(&[merge_leads(&[a, b]).remove(0), c]);

        assert_eq!(all_at_once[0].flags, left_first[0].flags);
        assert_eq!(all_at_once[0].flags, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_leads_without_email_dropped_and_order_kept() {
        let leads = vec![
            Lead::with_email("b@x.com"),
            Lead { name: Some("no email".into()), ..Lead::default() },
            Lead::with_email("a@x.com"),
            Lead::with_email("B@x.com"),
        ];
        let merged = merge_leads(&leads);
        let emails: Vec<_> = merged.iter().map(|l| l.email.as_deref().unwrap()).collect();

        assert_eq!(emails, vec!["b@x.com", "a@x.com"]);
    }

    #[test]
    fn test_single_lead_untouched() {
        let lead = with("a@x.com", |l| l.flags = vec!["x".into(), "x".into()]);
        let merged = merge_leads(std::slice::from_ref(&lead));

        assert_eq!(merged, vec![lead]);
    }
}
