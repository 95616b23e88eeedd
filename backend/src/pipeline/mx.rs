//! MX record checks.
//!
//! Implementations must fail closed: any lookup error answers `false`.

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// "Does this domain accept mail?"
#[async_trait]
pub trait MxChecker: Send + Sync {
    async fn has_mx_record(&self, domain: &str) -> bool;
}

/// Real DNS lookups.
pub struct DnsMxChecker {
    resolver: TokioAsyncResolver,
}

impl DnsMxChecker {
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

impl Default for DnsMxChecker {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl MxChecker for DnsMxChecker {
    async fn has_mx_record(&self, domain: &str) -> bool {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => lookup.iter().next().is_some(),
            Err(e) => {
                tracing::debug!(%domain, error = %e, "MX lookup failed");
                false
            }
        }
    }
}

/// Answers from a fixed list, for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub enum StaticMxChecker {
    /// Every domain has an MX record.
    #[default]
    AcceptAll,
    /// Only these (lower-case) domains have one.
    Only(HashSet<String>),
}

impl StaticMxChecker {
    pub fn only<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(domains.into_iter().map(|d| d.into().to_lowercase()).collect())
    }
}

#[async_trait]
impl MxChecker for StaticMxChecker {
    async fn has_mx_record(&self, domain: &str) -> bool {
        match self {
            Self::AcceptAll => true,
            Self::Only(domains) => domains.contains(&domain.to_lowercase()),
        }
    }
}
