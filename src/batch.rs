use crate::engine::MetricsBundle;
use crate::ledger::RunSummary;
use crate::normalize::TargetUrl;
use chrono::Utc;
use std::collections::HashSet;
use std::path::PathBuf;

/// Outcome of auditing one target within one batch. A failure carries the
/// error text and nothing else; it never aborts the batch.
#[derive(Debug, Clone)]
pub enum AuditOutcome {
    Success(AuditSuccess),
    Failure { target: TargetUrl, error: String },
}

#[derive(Debug, Clone)]
pub struct AuditSuccess {
    pub target: TargetUrl,
    pub metrics: MetricsBundle,
    /// Rendered (human-readable) report artifact.
    pub report_path: PathBuf,
    /// Raw (machine-readable) report artifact.
    pub raw_path: PathBuf,
}

impl AuditOutcome {
    pub fn target(&self) -> &TargetUrl {
        match self {
            AuditOutcome::Success(success) => &success.target,
            AuditOutcome::Failure { target, .. } => target,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AuditOutcome::Failure { .. })
    }
}

/// One orchestration pass, finalized once every target has been
/// attempted. Results keep the input target order.
#[derive(Debug)]
pub struct BatchRun {
    pub id: String,
    pub report_dir: PathBuf,
    pub results: Vec<AuditOutcome>,
}

impl BatchRun {
    pub fn tests_count(&self) -> usize {
        self.results.len()
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// Distinct registrable domains among successfully audited targets,
    /// first-occurrence order.
    pub fn unique_domains(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.results
            .iter()
            .filter(|r| !r.is_failure())
            .filter_map(|r| r.target().registrable_domain())
            .filter(|domain| seen.insert(domain.clone()))
            .collect()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            timestamp: self.id.clone(),
            report_dir: self.report_dir.display().to_string(),
            tests_count: self.tests_count(),
            error_count: self.error_count(),
            unique_domains: self.unique_domains(),
        }
    }
}

/// Timestamp-derived batch identifier, filesystem-safe (colons and dots
/// replaced by dashes), captured once at batch start.
pub fn new_batch_id() -> String {
    Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// The `YYYY-MM` prefix of a batch identifier, used to group artifact
/// directories by month.
pub fn month_of(id: &str) -> &str {
    if id.len() >= 7 { &id[..7] } else { id }
}
