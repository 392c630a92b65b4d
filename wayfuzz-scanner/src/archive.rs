use crate::error::{ArchiveError, Result};
use crate::record::ArchiveRecord;
use crate::status::StatusCodes;
use futures::StreamExt;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://web.archive.org/cdx/search/cdx";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 15;
/// A single CDX line longer than this is treated as a broken response.
const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Client for the archive CDX index. Cheap to clone; clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: Client,
    endpoint: Url,
}

impl ArchiveClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
    }

    /// `None` disables the per-fetch deadline.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let connect_timeout = timeout
            .map(|t| t.min(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
            .unwrap_or(Duration::from_secs(CONNECT_TIMEOUT_SECS));

        let mut builder = Client::builder()
            .user_agent(concat!("wayfuzz/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ArchiveError::Config(format!("failed to create HTTP client: {}", e)))?;
        let endpoint = Url::parse(DEFAULT_ENDPOINT)
            .map_err(|e| ArchiveError::Config(format!("invalid archive endpoint: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint).map_err(|e| {
            ArchiveError::Config(format!("invalid archive endpoint '{}': {}", endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ArchiveError::Config(format!(
                "archive endpoint must be http(s): {}",
                endpoint
            )));
        }
        self.endpoint = url;
        Ok(self)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Index query covering every subdomain of `domain`, collapsed by URL key.
    pub fn query_url(&self, domain: &str, status: Option<&StatusCodes>) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("url", &format!("*.{}", domain));
            pairs.append_pair("collapse", "urlkey");
            if let Some(codes) = status {
                pairs.append_pair("filter", &codes.to_cdx_filter());
            }
        }
        url
    }

    /// Fetch every record the index holds for `domain`.
    ///
    /// The whole body is read before returning. Any transport or read error
    /// discards what was read so far.
    pub async fn fetch(
        &self,
        domain: &str,
        status: Option<&StatusCodes>,
    ) -> Result<Vec<ArchiveRecord>> {
        let url = self.query_url(domain, status);
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url).send().await?;

        let http_status = response.status();
        if !http_status.is_success() {
            return Err(ArchiveError::Protocol(format!(
                "archive index returned HTTP {}",
                http_status
            )));
        }

        let mut lines = LineBuffer::default();
        let mut records = Vec::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            lines.feed(&chunk, &mut records)?;
        }
        lines.finish(&mut records);

        debug!(
            "Fetched {} records for {} in {:?}",
            records.len(),
            domain,
            start.elapsed()
        );
        Ok(records)
    }
}

/// Reassembles newline-terminated CDX lines from arbitrary body chunks.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn feed(&mut self, chunk: &[u8], records: &mut Vec<ArchiveRecord>) -> Result<()> {
        self.pending.extend_from_slice(chunk);

        let mut consumed = 0;
        while let Some(pos) = self.pending[consumed..].iter().position(|&b| b == b'\n') {
            Self::push_line(&self.pending[consumed..consumed + pos], records);
            consumed += pos + 1;
        }
        self.pending.drain(..consumed);

        if self.pending.len() > MAX_LINE_BYTES {
            return Err(ArchiveError::Protocol(format!(
                "response line exceeds {} bytes",
                MAX_LINE_BYTES
            )));
        }
        Ok(())
    }

    fn finish(mut self, records: &mut Vec<ArchiveRecord>) {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            Self::push_line(&rest, records);
        }
    }

    fn push_line(line: &[u8], records: &mut Vec<ArchiveRecord>) {
        let line = String::from_utf8_lossy(line);
        if let Some(record) = ArchiveRecord::parse_line(&line) {
            records.push(record);
        }
    }
}
