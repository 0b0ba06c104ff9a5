use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Durable, compact projection of one completed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Timestamp-derived batch identifier, e.g. `2026-08-06T09-14-02-531Z`.
    pub timestamp: String,
    pub report_dir: String,
    pub tests_count: usize,
    #[serde(default)]
    pub error_count: usize,
    pub unique_domains: Vec<String>,
}

/// Newest-first history of batch summaries, persisted as a single JSON
/// document. A missing file is an empty history; a torn file is never
/// observable because every write goes to a temp file first and is
/// renamed into place.
pub struct RunLedger {
    path: PathBuf,
}

impl RunLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Vec<RunSummary>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::Ledger(format!("{}: {e}", self.path.display()))),
        }
    }

    /// Prepends `summary` and rewrites the whole document, so the ledger
    /// stays newest-first. Returns the updated history.
    pub async fn append(&self, summary: RunSummary) -> Result<Vec<RunSummary>> {
        let mut runs = self.load().await?;
        runs.insert(0, summary);
        self.write(&runs).await?;
        Ok(runs)
    }

    /// Truncates the history to the empty sequence.
    pub async fn clear(&self) -> Result<()> {
        self.write(&[]).await
    }

    async fn write(&self, runs: &[RunSummary]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(runs)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Ledger(format!("{}: {e}", self.path.display())))
    }
}
