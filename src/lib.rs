pub mod batch;
pub mod config;
pub mod crawler;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod normalize;
pub mod orchestrator;
pub mod report;
pub mod seeds;
pub mod status;

pub use batch::{AuditOutcome, AuditSuccess, BatchRun};
pub use config::{AppConfig, ConfigLoader};
pub use crawler::Crawler;
pub use engine::{AuditEngine, EngineReport, LighthouseEngine, MetricsBundle};
pub use error::{Error, Result};
pub use ledger::{RunLedger, RunSummary};
pub use normalize::TargetUrl;
pub use orchestrator::{BatchOptions, Orchestrator};
pub use status::{RunState, StatusChannel, StatusEvent};
