use serde::{Deserialize, Serialize};

/// Token index of the original URL in a CDX line.
const URL_FIELD: usize = 2;
/// Token index of the HTTP status code in a CDX line.
const STATUS_FIELD: usize = 4;

/// One line of the archive index response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub url: String,
    /// `0` when the line carries no status field or it is not a number (e.g. `-`).
    pub status_code: u16,
}

impl ArchiveRecord {
    pub fn new(url: impl Into<String>, status_code: u16) -> Self {
        Self {
            url: url.into(),
            status_code,
        }
    }

    /// Parse a whitespace separated CDX line. Lines with fewer than three
    /// fields are not records and yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= URL_FIELD {
            return None;
        }

        let status_code = fields
            .get(STATUS_FIELD)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(0);

        Some(Self::new(fields[URL_FIELD], status_code))
    }
}
