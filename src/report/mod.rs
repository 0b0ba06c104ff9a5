use crate::batch::AuditOutcome;
use crate::error::{Error, Result};
use crate::ledger::RunSummary;
use std::path::Path;
use tokio::fs;

pub mod csv;
pub mod html;
pub mod index;

/// Base name shared by the whole-batch summary artifacts.
pub const SUMMARY_BASENAME: &str = "audit-results";

pub fn summary_html_name(id: &str) -> String {
    format!("{SUMMARY_BASENAME}-{id}.html")
}

pub fn summary_csv_name(id: &str) -> String {
    format!("{SUMMARY_BASENAME}-{id}.csv")
}

/// Writes the whole-batch CSV and HTML summary files into the batch
/// artifact directory.
pub async fn write_batch_reports(dir: &Path, id: &str, results: &[AuditOutcome]) -> Result<()> {
    fs::write(dir.join(summary_csv_name(id)), csv::render(results)?).await?;
    fs::write(dir.join(summary_html_name(id)), html::render(results)).await?;
    Ok(())
}

/// Secondary artifact attempted when the summary rendering itself fails,
/// so the batch directory still records what went wrong.
pub async fn write_failed_marker(dir: &Path, id: &str, error: &Error) -> Result<()> {
    let marker = dir.join(format!("{SUMMARY_BASENAME}-{id}-failed.txt"));
    fs::write(marker, format!("Report generation failed: {error}\n")).await?;
    Ok(())
}

/// Renders the run listing into a static index page next to the ledger.
pub async fn write_index(path: &Path, runs: &[RunSummary]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, index::render(runs)).await?;
    Ok(())
}
