use crate::collect::Collector;
use crate::filter::FilterConfig;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use wayfuzz_scanner::error::{ArchiveError, Result};
use wayfuzz_scanner::{ArchiveClient, DomainNormalizer};

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Options for configuring a harvest run
pub struct HarvestOptions {
    pub concurrency: usize,
    pub filter: FilterConfig,
    pub client: ArchiveClient,
    pub show_progress_bars: bool,
}

impl HarvestOptions {
    pub fn new(client: ArchiveClient) -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            filter: FilterConfig::default(),
            client,
            show_progress_bars: false,
        }
    }
}

/// Called with `(worker_id, domain)` whenever a worker picks up a domain
pub type HarvestProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Called once for every domain whose fetch failed
pub type DomainErrorCallback = Arc<dyn Fn(&str, &ArchiveError) + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    /// Distinct surviving entries, byte-wise sorted
    pub entries: Vec<String>,
    pub domains_total: usize,
    pub domains_failed: usize,
}

/// The stderr line printed for a failed domain when no error callback is set
pub fn domain_error_line(domain: &str, error: &ArchiveError) -> String {
    format!("Error fetching URLs for domain {}: {}", domain, error)
}

/// Fetch, normalize and filter a single domain into one batch.
pub async fn harvest_domain(
    client: &ArchiveClient,
    filter: &FilterConfig,
    domain: &str,
) -> Result<Vec<String>> {
    let normalizer = DomainNormalizer::new(domain)?;
    let records = client.fetch(domain, filter.status_codes.as_ref()).await?;
    Ok(filter.filter_records(&normalizer, &records))
}

/// Run the whole pipeline: a producer reads domains line by line from `input`,
/// `concurrency` workers fetch and filter them, and this task collects the
/// batches into the result set.
pub async fn execute_harvest<R>(
    input: R,
    options: HarvestOptions,
    progress_callback: Option<HarvestProgressCallback>,
    error_callback: Option<DomainErrorCallback>,
) -> Result<HarvestReport>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let HarvestOptions {
        concurrency,
        filter,
        client,
        show_progress_bars,
    } = options;

    if concurrency == 0 {
        return Err(ArchiveError::Config(
            "concurrency must be at least 1".to_string(),
        ));
    }

    info!("Starting harvest with {} workers", concurrency);

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .map_err(|e| ArchiveError::Config(format!("progress template: {}", e)))?,
        );
        pb.set_message("Starting harvest...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let filter = Arc::new(filter);
    let processed_count = Arc::new(AtomicUsize::new(0));
    let failed_count = Arc::new(AtomicUsize::new(0));

    let (domain_tx, domain_rx) = mpsc::channel::<String>(1);
    let domain_rx = Arc::new(Mutex::new(domain_rx));
    let (result_tx, mut result_rx) = mpsc::channel::<Vec<String>>(concurrency);

    let producer = tokio::spawn(enqueue_domains(input, domain_tx));

    let mut worker_handles = Vec::with_capacity(concurrency);
    for worker_id in 0..concurrency {
        let client = client.clone();
        let filter = filter.clone();
        let domain_rx = domain_rx.clone();
        let result_tx = result_tx.clone();
        let progress_cb = progress_callback.clone();
        let error_cb = error_callback.clone();
        let pb = progress_bar.clone();
        let processed = processed_count.clone();
        let failed = failed_count.clone();

        let handle = tokio::spawn(async move {
            debug!("Worker {} started", worker_id);

            loop {
                let next = { domain_rx.lock().await.recv().await };
                let Some(domain) = next else {
                    break;
                };

                if let Some(ref callback) = progress_cb {
                    callback(worker_id, domain.clone());
                }

                match harvest_domain(&client, &filter, &domain).await {
                    Ok(batch) => {
                        debug!(
                            "[Worker {}] {} items survived for {}",
                            worker_id,
                            batch.len(),
                            domain
                        );
                        if result_tx.send(batch).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        debug!("[Worker {}] fetch failed for {}: {}", worker_id, domain, e);
                        match error_cb {
                            Some(ref callback) => callback(&domain, &e),
                            None => {
                                let line = domain_error_line(&domain, &e);
                                match pb {
                                    Some(ref pb) => pb.suspend(|| eprintln!("{}", line)),
                                    None => eprintln!("{}", line),
                                }
                            }
                        }
                    }
                }

                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref pb) = pb {
                    pb.set_message(format!(
                        "Harvesting... {} domains processed, {} failed",
                        done,
                        failed.load(Ordering::Relaxed)
                    ));
                    pb.tick();
                }
            }

            debug!("Worker {} finished", worker_id);
        });

        worker_handles.push(handle);
    }

    // Workers hold the remaining senders; the channel closes once all of them exit.
    drop(result_tx);

    let mut collector = Collector::new();
    while let Some(batch) = result_rx.recv().await {
        collector.absorb(batch);
    }

    for handle in worker_handles {
        handle.await?;
    }
    let domains_total = producer.await?;

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    let domains_failed = failed_count.load(Ordering::Relaxed);
    info!(
        "Harvest complete. {} unique entries from {} domains ({} failed)",
        collector.len(),
        domains_total,
        domains_failed
    );

    Ok(HarvestReport {
        entries: collector.into_sorted(),
        domains_total,
        domains_failed,
    })
}

/// Feed the domain queue from line-oriented input, then close it.
/// Surrounding whitespace is trimmed and blank lines are skipped. Invalid
/// UTF-8 is replaced lossily; a read error stops input but keeps whatever
/// was already queued.
async fn enqueue_domains<R>(mut input: R, domain_tx: mpsc::Sender<String>) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut enqueued = 0;

    loop {
        line.clear();
        match input.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Stopped reading domains after {} lines: {}", enqueued, e);
                break;
            }
        }

        let text = String::from_utf8_lossy(&line);
        let domain = text.trim();
        if domain.is_empty() {
            debug!("Skipping blank input line");
            continue;
        }
        if domain_tx.send(domain.to_string()).await.is_err() {
            break;
        }
        enqueued += 1;
    }

    enqueued
}
