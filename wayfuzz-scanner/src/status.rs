use crate::error::{ArchiveError, Result};
use std::collections::BTreeSet;
use std::fmt;

/// Allow-set of HTTP status codes. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCodes(BTreeSet<u16>);

impl StatusCodes {
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Result<Self> {
        let set: BTreeSet<u16> = codes.into_iter().collect();
        if set.is_empty() {
            return Err(ArchiveError::Config(
                "status code list is empty".to_string(),
            ));
        }
        Ok(Self(set))
    }

    /// Parse a comma separated list such as `200,301, 302`.
    pub fn parse(list: &str) -> Result<Self> {
        let mut codes = Vec::new();
        for part in list.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let code = part.parse::<u16>().map_err(|_| {
                ArchiveError::Config(format!("invalid status code '{}'", part))
            })?;
            codes.push(code);
        }
        Self::new(codes)
    }

    pub fn contains(&self, code: u16) -> bool {
        self.0.contains(&code)
    }

    /// CDX `filter` parameter value, e.g. `statuscode:200` or `statuscode:(200|301)`.
    pub fn to_cdx_filter(&self) -> String {
        let codes: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        if codes.len() == 1 {
            format!("statuscode:{}", codes[0])
        } else {
            format!("statuscode:({})", codes.join("|"))
        }
    }
}

impl fmt::Display for StatusCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        f.write_str(&codes.join(","))
    }
}
