use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;
use wayfuzz_core::report::summary_line;
use wayfuzz_core::{FilterConfig, HarvestOptions, OutputFormat, execute_harvest, write_entries};
use wayfuzz_scanner::{ArchiveClient, StatusCodes};

/// Route all tracing output to stderr; stdout carries results only.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,wayfuzz=debug,wayfuzz_core=debug,wayfuzz_scanner=debug"
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Build the read-only filter configuration. Any invalid input is fatal.
pub fn build_filter(
    exclude: Option<&str>,
    status: Option<&str>,
    separate_slash: bool,
) -> Result<FilterConfig> {
    let mut filter = FilterConfig::new().with_separate_slash(separate_slash);

    if let Some(pattern) = exclude.filter(|p| !p.is_empty()) {
        filter = filter.with_exclude_pattern(pattern)?;
    }
    if let Some(list) = status {
        filter = filter.with_status_codes(StatusCodes::parse(list)?);
    }

    Ok(filter)
}

pub fn build_client(endpoint: &Url, timeout_secs: u64) -> Result<ArchiveClient> {
    let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
    let client = ArchiveClient::with_timeout(timeout)?.with_endpoint(endpoint.as_str())?;
    Ok(client)
}

pub fn build_options(args: &ArgMatches) -> Result<HarvestOptions> {
    let concurrency = *args.get_one::<usize>("concurrency").unwrap_or(&10);
    if concurrency == 0 {
        bail!("--concurrency must be at least 1");
    }

    let filter = build_filter(
        args.get_one::<String>("exclude").map(String::as_str),
        args.get_one::<String>("status").map(String::as_str),
        args.get_flag("separate-slash"),
    )?;

    let endpoint = args
        .get_one::<Url>("endpoint")
        .context("missing archive endpoint")?;
    let timeout_secs = *args.get_one::<u64>("timeout").unwrap_or(&120);
    let client = build_client(endpoint, timeout_secs)?;

    Ok(HarvestOptions {
        concurrency,
        filter,
        client,
        show_progress_bars: args.get_flag("progress"),
    })
}

pub fn output_format(args: &ArgMatches) -> OutputFormat {
    args.get_one::<String>("format")
        .and_then(|f| OutputFormat::from_str(f))
        .unwrap_or(OutputFormat::Text)
}

/// Domain source: the given file, or stdin.
pub async fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to read input file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Result sink: the given file (created or truncated), or stdout.
pub fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

pub async fn handle_run(args: &ArgMatches) -> Result<()> {
    let options = build_options(args)?;
    let format = output_format(args);
    let quiet = args.get_flag("quiet");

    let input = open_input(args.get_one::<PathBuf>("input")).await?;
    let output = open_output(args.get_one::<PathBuf>("output"))?;

    info!(
        "Harvesting with {} workers from {}",
        options.concurrency,
        options.client.endpoint()
    );

    let report = execute_harvest(input, options, None, None).await?;

    write_entries(output, &report.entries, format)?;

    if !quiet {
        eprintln!("{} {}", "✓".green().bold(), summary_line(&report));
    }

    Ok(())
}
