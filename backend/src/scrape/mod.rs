//! Mock lead source.
//!
//! Produces plausible leads for a keyword or a list of URLs without touching
//! the network. The random source is injected so tests can seed it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::models::Lead;

const NAMES: [&str; 10] = [
    "John Doe", "Jane Smith", "Mike Johnson", "Sarah Wilson", "David Brown",
    "Lisa Davis", "Tom Miller", "Anna Garcia", "Chris Lee", "Emma Taylor",
];
const ROLES: [&str; 10] = [
    "CEO", "Founder", "CTO", "Head of Growth", "VP Sales",
    "Marketing Director", "Product Manager", "Developer", "Designer", "Sales Manager",
];
const COMPANIES: [&str; 10] = [
    "TechCorp", "InnovateLab", "DataFlow", "CloudSync", "AI Solutions",
    "WebMaster", "DevTools", "StartupX", "GrowthHack", "ScaleUp",
];
const DOMAINS: [&str; 10] = [
    "techcorp.com", "innovatelab.io", "dataflow.ai", "cloudsync.com", "aisolutions.io",
    "webmaster.com", "devtools.ai", "startupx.io", "growthhack.com", "scaleup.ai",
];
const INDUSTRIES: [&str; 10] = [
    "Software", "SaaS", "Technology", "AI/ML", "Fintech",
    "E-commerce", "Healthcare", "Education", "Marketing", "Consulting",
];
const COUNTRIES: [&str; 10] = [
    "United States", "Canada", "United Kingdom", "Germany", "France",
    "Australia", "Singapore", "Netherlands", "Sweden", "Switzerland",
];

/// Source tag and flag value of generated leads.
pub const MOCK_SOURCE: &str = "mock_data";

/// Body of a scrape request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub urls: Option<Vec<String>>,
}

/// `count` leads cycling through the fixture lists.
pub fn generate_mock_leads<R: Rng>(count: usize, rng: &mut R) -> Vec<Lead> {
    (0..count)
        .map(|i| {
            let name = NAMES[i % NAMES.len()];
            let domain = DOMAINS[i % DOMAINS.len()];
            let email = format!("{}@{}", name.to_lowercase().replacen(' ', ".", 1), domain);
            let flags = if rng.gen_bool(0.2) {
                vec![MOCK_SOURCE.to_string()]
            } else {
                Vec::new()
            };

            Lead {
                name: Some(name.to_string()),
                role: Some(ROLES[i % ROLES.len()].to_string()),
                company: Some(COMPANIES[i % COMPANIES.len()].to_string()),
                domain: Some(domain.to_string()),
                email: Some(email),
                source: Some(MOCK_SOURCE.to_string()),
                country: Some(COUNTRIES[i % COUNTRIES.len()].to_string()),
                industry: Some(INDUSTRIES[i % INDUSTRIES.len()].to_string()),
                score: Some(f64::from(rng.gen_range(0u8..100))),
                flags,
            }
        })
        .collect()
}

/// Host of `url` without a leading `www.`, or the raw input if it is not a URL.
pub fn host_of(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(|h| h.replacen("www.", "", 1))
            .unwrap_or_else(|| url.to_string()),
        Err(_) => url.to_string(),
    }
}

/// Generates fake leads for keywords and URLs.
pub struct MockScraper<R: Rng = StdRng> {
    rng: R,
}

impl MockScraper<StdRng> {
    /// Scraper seeded from system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible scraper.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MockScraper<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// 10 to 29 leads tagged with the keyword.
    pub fn scrape_keyword(&mut self, keyword: &str) -> Vec<Lead> {
        let count = self.rng.gen_range(10..30);
        let leads = generate_mock_leads(count, &mut self.rng);

        leads
            .into_iter()
            .map(|mut lead| {
                lead.source = Some(format!("keyword: {}", keyword));
                if self.rng.gen_bool(0.3) {
                    lead.company = lead.company.map(|c| format!("{} {}", keyword, c));
                }
                lead
            })
            .collect()
    }

    /// 5 to 19 leads attributed to `url`, some moved onto its domain.
    pub fn scrape_url(&mut self, url: &str) -> Vec<Lead> {
        let host = host_of(url);
        let count = self.rng.gen_range(5..20);
        let leads = generate_mock_leads(count, &mut self.rng);

        leads
            .into_iter()
            .map(|mut lead| {
                lead.source = Some(url.to_string());
                if self.rng.gen_bool(0.5) {
                    lead.domain = Some(host.clone());
                }
                if self.rng.gen_bool(0.4) {
                    lead.company = host.split('.').next().map(String::from);
                }
                lead
            })
            .collect()
    }

    /// Keyword leads first, then each non-blank URL in order.
    pub fn scrape(&mut self, request: &ScrapeRequest) -> Result<Vec<Lead>, ScrapeError> {
        let keyword = request.keyword.as_deref().filter(|k| !k.is_empty());
        let urls = request.urls.as_deref().unwrap_or_default();

        if keyword.is_none() && urls.is_empty() {
            return Err(ScrapeError::NothingToScrape);
        }

        let mut leads = Vec::new();
        if let Some(keyword) = keyword {
            leads.extend(self.scrape_keyword(keyword));
        }
        for url in urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
            leads.extend(self.scrape_url(url));
        }

        tracing::info!(
            keyword = keyword.unwrap_or(""),
            urls = urls.len(),
            leads = leads.len(),
            "mock scrape finished"
        );
        Ok(leads)
    }
}
