// Filter chain applied to every archive record a worker fetches

use regex::Regex;
use wayfuzz_scanner::error::{ArchiveError, Result};
use wayfuzz_scanner::{ArchiveRecord, DomainNormalizer, StatusCodes};

/// Read-only filter settings shared by every worker.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub exclude: Option<Regex>,
    pub status_codes: Option<StatusCodes>,
    pub separate_slash: bool,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclude_pattern(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            ArchiveError::Config(format!("invalid exclude pattern '{}': {}", pattern, e))
        })?;
        self.exclude = Some(regex);
        Ok(self)
    }

    pub fn with_status_codes(mut self, codes: StatusCodes) -> Self {
        self.status_codes = Some(codes);
        self
    }

    pub fn with_separate_slash(mut self, separate_slash: bool) -> Self {
        self.separate_slash = separate_slash;
        self
    }

    /// Run one raw URL through the chain, appending surviving items to `out`.
    pub fn apply(
        &self,
        normalizer: &DomainNormalizer,
        url: &str,
        status_code: u16,
        out: &mut Vec<String>,
    ) {
        let normalized = normalizer.normalize(url);
        if normalized.is_empty() {
            return;
        }

        if let Some(ref exclude) = self.exclude
            && exclude.is_match(&normalized)
        {
            return;
        }

        if let Some(ref codes) = self.status_codes
            && !codes.contains(status_code)
        {
            return;
        }

        if self.separate_slash {
            out.extend(
                normalized
                    .split('/')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(String::from),
            );
        } else {
            out.push(normalized.trim().to_string());
        }
    }

    pub fn apply_record(
        &self,
        normalizer: &DomainNormalizer,
        record: &ArchiveRecord,
        out: &mut Vec<String>,
    ) {
        self.apply(normalizer, &record.url, record.status_code, out);
    }

    /// Filter a whole fetch result into one batch.
    pub fn filter_records(
        &self,
        normalizer: &DomainNormalizer,
        records: &[ArchiveRecord],
    ) -> Vec<String> {
        let mut batch = Vec::with_capacity(records.len());
        for record in records {
            self.apply_record(normalizer, record, &mut batch);
        }
        batch
    }
}
