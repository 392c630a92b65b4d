use crate::error::{ArchiveError, Result};
use regex::Regex;

/// Strips the `scheme://[subdomains.]domain[:port]` prefix from archived URLs
/// belonging to one domain. Built once per domain and reused for every record.
#[derive(Debug, Clone)]
pub struct DomainNormalizer {
    domain: String,
    prefix: Regex,
}

impl DomainNormalizer {
    pub fn new(domain: &str) -> Result<Self> {
        let pattern = format!(
            r"(?i)^https?://([a-zA-Z0-9_-]+\.)*{}(:\d+)?",
            regex::escape(&domain.to_lowercase())
        );
        let prefix = Regex::new(&pattern).map_err(|e| {
            ArchiveError::Config(format!("cannot build matcher for domain '{}': {}", domain, e))
        })?;

        Ok(Self {
            domain: domain.to_string(),
            prefix,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the remainder after the domain prefix, or the input unchanged
    /// when the URL's host is not `domain` or one of its subdomains.
    pub fn normalize(&self, url: &str) -> String {
        self.prefix.replace(url, "").into_owned()
    }
}

/// One-shot convenience over [`DomainNormalizer`].
pub fn normalize(url: &str, domain: &str) -> Result<String> {
    Ok(DomainNormalizer::new(domain)?.normalize(url))
}
