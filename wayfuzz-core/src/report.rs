// Rendering the final result sequence

use crate::harvest::HarvestReport;
use std::io::{self, Write};
use wayfuzz_scanner::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Write the sorted entries, one per line for text or as a JSON array.
pub fn write_entries<W: Write>(mut out: W, entries: &[String], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for entry in entries {
                writeln!(out, "{}", entry)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, entries).map_err(io::Error::from)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// One-line summary of a harvest, without styling.
pub fn summary_line(report: &HarvestReport) -> String {
    let succeeded = report.domains_total - report.domains_failed;
    let mut line = format!(
        "{} unique entries from {}/{} domains",
        report.entries.len(),
        succeeded,
        report.domains_total
    );
    if report.domains_failed > 0 {
        line.push_str(&format!(" ({} failed)", report.domains_failed));
    }
    line
}
