use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Whether a batch is currently running. Owned by the orchestrator, which
/// is the only writer; everything else (the status channel, the web layer)
/// holds a read-only `Arc` of it.
#[derive(Debug, Default)]
pub struct RunState {
    running: AtomicBool,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
        log::info!("Running tests status set to: {running}");
    }
}

/// Lifecycle events published while a batch runs. Serialized as tagged
/// JSON for the status transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum StatusEvent {
    #[serde(rename_all = "camelCase")]
    TestStart { url: String, index: usize, total: usize },
    #[serde(rename_all = "camelCase")]
    TestEnd { url: String },
    #[serde(rename_all = "camelCase")]
    TestError { url: String, error: String },
    #[serde(rename_all = "camelCase")]
    TestDuration { url: String, seconds: f64 },
    #[serde(rename_all = "camelCase")]
    BatchFinished { timestamp: String },
    #[serde(rename_all = "camelCase")]
    StatusChanged { running_tests: bool },
}

/// Reply to an explicit `getStatus` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReply {
    pub running_tests: bool,
}

/// In-process fan-out of batch lifecycle events to any number of
/// observers. Publishing is fire-and-forget: a slow or disconnected
/// subscriber lags or drops events but never blocks the publisher, and
/// subscribers joining mid-batch receive no replay.
#[derive(Clone)]
pub struct StatusChannel {
    sender: broadcast::Sender<StatusEvent>,
    state: Arc<RunState>,
}

impl StatusChannel {
    pub fn new(capacity: usize, state: Arc<RunState>) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, state }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: StatusEvent) {
        log::debug!("Broadcasting status event: {event:?}");
        let _ = self.sender.send(event);
    }

    pub fn query_status(&self) -> StatusReply {
        StatusReply {
            running_tests: self.state.is_running(),
        }
    }

    /// Maps an inbound transport message to its JSON reply. Only
    /// `getStatus` is understood here; anything else belongs to the web
    /// layer and yields `None`.
    pub fn handle_request(&self, message: &str) -> Option<String> {
        match message.trim() {
            "getStatus" => serde_json::to_string(&self.query_status()).ok(),
            _ => None,
        }
    }
}
