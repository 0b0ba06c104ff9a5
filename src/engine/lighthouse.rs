use super::{AuditEngine, EngineReport, MetricsBundle};
use crate::error::{Error, Result};
use crate::normalize;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use url::Url;

/// Drives the Lighthouse CLI, one headless-browser audit per call.
///
/// Each call writes the JSON and HTML reports into a per-call scratch
/// directory, reads them back, and cleans up. The orchestrator owns
/// placing the reports into the batch artifact directory.
pub struct LighthouseEngine {
    binary: String,
    chrome_flags: Vec<String>,
}

impl LighthouseEngine {
    pub fn new(binary: impl Into<String>, chrome_flags: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            chrome_flags,
        }
    }

    fn scratch_dir(&self, url: &Url) -> PathBuf {
        std::env::temp_dir().join(format!(
            "beacon-audit-{}-{}",
            std::process::id(),
            normalize::url_hash(url.as_str())
        ))
    }
}

#[async_trait]
impl AuditEngine for LighthouseEngine {
    async fn audit(&self, url: &Url) -> Result<EngineReport> {
        let scratch = self.scratch_dir(url);
        fs::create_dir_all(&scratch).await?;

        let result = self.run(url, &scratch).await;

        if let Err(e) = fs::remove_dir_all(&scratch).await {
            log::warn!("Failed to clean scratch dir {}: {e}", scratch.display());
        }

        result
    }
}

impl LighthouseEngine {
    async fn run(&self, url: &Url, scratch: &Path) -> Result<EngineReport> {
        let base = scratch.join("page");
        let output = Command::new(&self.binary)
            .arg(url.as_str())
            .arg("--output=json")
            .arg("--output=html")
            .arg(format!("--output-path={}", base.display()))
            .arg("--only-categories=performance")
            .arg(format!("--chrome-flags={}", self.chrome_flags.join(" ")))
            .arg("--quiet")
            .output()
            .await
            .map_err(|e| Error::Engine(format!("failed to launch {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Engine(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        // Lighthouse appends `.report.<format>` to the output path base.
        let raw_report = fs::read_to_string(base.with_extension("report.json")).await?;
        let rendered_report = fs::read_to_string(base.with_extension("report.html")).await?;

        let lhr: Value = serde_json::from_str(&raw_report)?;
        let metrics = extract_metrics(&lhr)?;

        Ok(EngineReport {
            metrics,
            raw_report,
            rendered_report,
        })
    }
}

fn extract_metrics(lhr: &Value) -> Result<MetricsBundle> {
    let performance = lhr["categories"]["performance"]["score"]
        .as_f64()
        .ok_or_else(|| Error::Engine("missing performance score".to_string()))?;

    let empty = Vec::new();
    let requests = lhr["audits"]["network-requests"]["details"]["items"]
        .as_array()
        .unwrap_or(&empty);
    let protocol = requests
        .first()
        .and_then(|item| item["protocol"].as_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(MetricsBundle {
        performance,
        first_contentful_paint: numeric_audit(lhr, "first-contentful-paint")?,
        speed_index: numeric_audit(lhr, "speed-index")?,
        largest_contentful_paint: numeric_audit(lhr, "largest-contentful-paint")?,
        interactive: numeric_audit(lhr, "interactive")?,
        total_blocking_time: numeric_audit(lhr, "total-blocking-time")?,
        cumulative_layout_shift: numeric_audit(lhr, "cumulative-layout-shift")?,
        server_response_time: numeric_audit(lhr, "server-response-time")?,
        total_byte_weight: numeric_audit(lhr, "total-byte-weight")?,
        main_thread_time: numeric_audit(lhr, "mainthread-work-breakdown")?,
        network_requests: requests.len() as u64,
        protocol,
    })
}

fn numeric_audit(lhr: &Value, name: &str) -> Result<f64> {
    lhr["audits"][name]["numericValue"]
        .as_f64()
        .ok_or_else(|| Error::Engine(format!("missing numeric audit '{name}'")))
}
