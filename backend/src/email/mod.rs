//! Email format checks, domain extraction and generic-provider detection.
//!
//! Everything here is synchronous and offline. MX lookups live in
//! [`crate::pipeline::mx`] and are combined with these results by the
//! validation stage.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::GenericProviders;
use crate::models::flag;

static EMAIL_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Outcome of [`EmailAnalyzer::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailCheck {
    /// True iff no flag was raised.
    pub is_valid: bool,
    pub flags: Vec<String>,
}

/// True iff `email` has the shape `local@domain.tld`.
///
/// `local` is one or more of `[A-Za-z0-9._%+-]`, `domain` one or more of
/// `[A-Za-z0-9.-]` and the final label at least two letters.
pub fn is_format_valid(email: Option<&str>) -> bool {
    match email {
        Some(email) if !email.is_empty() => EMAIL_FORMAT.is_match(email),
        _ => false,
    }
}

/// Lower-cased part after `@`, or `""` unless there is exactly one `@`.
pub fn extract_domain(email: &str) -> String {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(domain), None) => domain.to_lowercase(),
        _ => String::new(),
    }
}

/// Offline email analysis against an injected provider list.
#[derive(Debug, Clone, Default)]
pub struct EmailAnalyzer {
    providers: GenericProviders,
}

impl EmailAnalyzer {
    pub fn new(providers: GenericProviders) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &GenericProviders {
        &self.providers
    }

    pub fn is_format_valid(&self, email: Option<&str>) -> bool {
        is_format_valid(email)
    }

    pub fn extract_domain(&self, email: &str) -> String {
        extract_domain(email)
    }

    /// True iff the email's domain is exactly one of the generic providers.
    pub fn is_generic_provider(&self, email: &str) -> bool {
        self.providers.contains(&extract_domain(email))
    }

    /// Format and provider checks, flags in that order.
    pub fn validate(&self, email: &str) -> EmailCheck {
        let mut flags = Vec::new();

        if !is_format_valid(Some(email)) {
            flags.push(flag::INVALID_FORMAT.to_string());
        }
        if self.is_generic_provider(email) {
            flags.push(flag::GENERIC.to_string());
        }

        EmailCheck {
            is_valid: flags.is_empty(),
            flags,
        }
    }
}
