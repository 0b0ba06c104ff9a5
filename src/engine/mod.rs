use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

pub mod lighthouse;

pub use lighthouse::LighthouseEngine;

/// Performance metrics extracted from one audit of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsBundle {
    /// Category score in 0..=1.
    pub performance: f64,
    pub first_contentful_paint: f64,
    pub speed_index: f64,
    pub largest_contentful_paint: f64,
    pub interactive: f64,
    pub total_blocking_time: f64,
    pub cumulative_layout_shift: f64,
    pub server_response_time: f64,
    pub total_byte_weight: f64,
    pub main_thread_time: f64,
    pub network_requests: u64,
    /// Protocol of the root document response, e.g. `h2`.
    pub protocol: String,
}

/// Everything one engine call produces: the metric bundle plus the raw
/// (machine-readable) and rendered (human-readable) report documents.
#[derive(Debug, Clone)]
pub struct EngineReport {
    pub metrics: MetricsBundle,
    pub raw_report: String,
    pub rendered_report: String,
}

/// The external page-audit engine. One call audits one URL; calls are
/// heavyweight (a browser process each) and are never issued
/// concurrently by the orchestrator.
#[async_trait]
pub trait AuditEngine: Send + Sync {
    async fn audit(&self, url: &Url) -> Result<EngineReport>;
}
