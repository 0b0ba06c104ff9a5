use crate::batch::{self, AuditOutcome, AuditSuccess, BatchRun};
use crate::engine::AuditEngine;
use crate::error::{Error, Result};
use crate::ledger::RunLedger;
use crate::normalize::{self, TargetUrl};
use crate::report;
use crate::status::{RunState, StatusChannel, StatusEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::time::timeout;

pub struct BatchOptions {
    pub results_dir: PathBuf,
    /// Upper bound on a single engine call. A timeout is an ordinary
    /// per-target failure.
    pub audit_timeout: Duration,
}

/// Drives the audit engine over an ordered target list, one audit in
/// flight at a time. The engine launches a browser process per call, so
/// targets are processed strictly sequentially rather than fanned out.
///
/// A target's failure is isolated into its `AuditOutcome`; the batch
/// always runs to the end of the list. The run state flag is set before
/// the first target and cleared only after the batch artifacts and the
/// ledger append are done.
pub struct Orchestrator {
    engine: Arc<dyn AuditEngine>,
    channel: StatusChannel,
    ledger: RunLedger,
    state: Arc<RunState>,
    options: BatchOptions,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn AuditEngine>,
        channel: StatusChannel,
        ledger: RunLedger,
        state: Arc<RunState>,
        options: BatchOptions,
    ) -> Self {
        Self {
            engine,
            channel,
            ledger,
            state,
            options,
        }
    }

    pub fn state(&self) -> Arc<RunState> {
        self.state.clone()
    }

    pub async fn run_batch(&self, targets: Vec<TargetUrl>) -> Result<BatchRun> {
        let id = batch::new_batch_id();
        let report_dir = self
            .options
            .results_dir
            .join(batch::month_of(&id))
            .join(&id);
        fs::create_dir_all(&report_dir).await?;

        self.state.set_running(true);
        self.channel
            .publish(StatusEvent::StatusChanged { running_tests: true });

        let total = targets.len();
        let mut results = Vec::with_capacity(total);

        for (index, target) in targets.into_iter().enumerate() {
            log::info!("Running audit for {target} ({}/{total})", index + 1);
            self.channel.publish(StatusEvent::TestStart {
                url: target.as_str().to_string(),
                index,
                total,
            });

            let started = Instant::now();
            let outcome = self.audit_target(&id, &report_dir, target).await;
            let seconds = started.elapsed().as_secs_f64();

            match &outcome {
                AuditOutcome::Success(success) => {
                    self.channel.publish(StatusEvent::TestEnd {
                        url: success.target.as_str().to_string(),
                    });
                }
                AuditOutcome::Failure { target, error } => {
                    self.channel.publish(StatusEvent::TestError {
                        url: target.as_str().to_string(),
                        error: error.clone(),
                    });
                }
            }

            log::info!(
                "Audit finished for {} in {seconds:.2} seconds",
                outcome.target()
            );
            self.channel.publish(StatusEvent::TestDuration {
                url: outcome.target().as_str().to_string(),
                seconds,
            });

            results.push(outcome);
        }

        // Summary rendering is best-effort: the batch still finalizes and
        // gets recorded when it fails.
        if let Err(e) = report::write_batch_reports(&report_dir, &id, &results).await {
            log::error!("Error writing batch reports: {e}");
            if let Err(e) = report::write_failed_marker(&report_dir, &id, &e).await {
                log::error!("Error writing failed-run marker: {e}");
            }
        }

        let run = BatchRun {
            id,
            report_dir,
            results,
        };
        let appended = self.ledger.append(run.summary()).await;

        self.state.set_running(false);
        self.channel
            .publish(StatusEvent::StatusChanged { running_tests: false });
        self.channel.publish(StatusEvent::BatchFinished {
            timestamp: run.id.clone(),
        });

        // A ledger failure surfaces to the caller, but only after the flag
        // is cleared; the batch artifacts stay on disk.
        appended?;
        Ok(run)
    }

    async fn audit_target(&self, id: &str, dir: &Path, target: TargetUrl) -> AuditOutcome {
        match self.try_audit(id, dir, &target).await {
            Ok(success) => AuditOutcome::Success(success),
            Err(e) => {
                log::error!("Audit failed for {target}: {e}");
                AuditOutcome::Failure {
                    target,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn try_audit(&self, id: &str, dir: &Path, target: &TargetUrl) -> Result<AuditSuccess> {
        let report = timeout(self.options.audit_timeout, self.engine.audit(target.as_url()))
            .await
            .map_err(|_| {
                Error::Engine(format!(
                    "audit timed out after {}s",
                    self.options.audit_timeout.as_secs()
                ))
            })??;

        let hash = normalize::url_hash(target.as_str());
        let report_path = dir.join(format!("report-{hash}-{id}.html"));
        let raw_path = dir.join(format!("report-{hash}-{id}.json"));
        fs::write(&report_path, &report.rendered_report).await?;
        fs::write(&raw_path, &report.raw_report).await?;

        Ok(AuditSuccess {
            target: target.clone(),
            metrics: report.metrics,
            report_path,
            raw_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineReport, MetricsBundle};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use tempfile::tempdir;
    use url::Url;

    fn sample_metrics() -> MetricsBundle {
        MetricsBundle {
            performance: 0.9,
            first_contentful_paint: 800.0,
            speed_index: 1200.0,
            largest_contentful_paint: 1500.0,
            interactive: 1800.0,
            total_blocking_time: 40.0,
            cumulative_layout_shift: 0.01,
            server_response_time: 100.0,
            total_byte_weight: 250000.0,
            main_thread_time: 900.0,
            network_requests: 12,
            protocol: "h2".to_string(),
        }
    }

    /// Fails for configured URLs, optionally sleeps, and can assert the
    /// run state is up while an audit is in flight.
    struct FakeEngine {
        fail: HashSet<String>,
        delay: Duration,
        expect_running: Option<Arc<RunState>>,
    }

    impl FakeEngine {
        fn ok() -> Self {
            Self {
                fail: HashSet::new(),
                delay: Duration::ZERO,
                expect_running: None,
            }
        }

        fn failing(urls: &[&str]) -> Self {
            Self {
                fail: urls.iter().map(|u| u.to_string()).collect(),
                ..Self::ok()
            }
        }
    }

    #[async_trait]
    impl AuditEngine for FakeEngine {
        async fn audit(&self, url: &Url) -> Result<EngineReport> {
            if let Some(state) = &self.expect_running {
                assert!(state.is_running(), "audit dispatched while not running");
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.contains(url.as_str()) {
                return Err(Error::Engine("timeout".to_string()));
            }
            Ok(EngineReport {
                metrics: sample_metrics(),
                raw_report: "{}".to_string(),
                rendered_report: "<html></html>".to_string(),
            })
        }
    }

    struct Fixture {
        orchestrator: Orchestrator,
        channel: StatusChannel,
        state: Arc<RunState>,
        ledger_path: PathBuf,
        _dir: tempfile::TempDir,
    }

    fn fixture(mut engine: FakeEngine, assert_running: bool) -> Fixture {
        let dir = tempdir().unwrap();
        let state = Arc::new(RunState::default());
        if assert_running {
            engine.expect_running = Some(state.clone());
        }
        let channel = StatusChannel::new(64, state.clone());
        let ledger_path = dir.path().join("pastRuns.json");
        let orchestrator = Orchestrator::new(
            Arc::new(engine),
            channel.clone(),
            RunLedger::new(&ledger_path),
            state.clone(),
            BatchOptions {
                results_dir: dir.path().join("results"),
                audit_timeout: Duration::from_secs(5),
            },
        );
        Fixture {
            orchestrator,
            channel,
            state,
            ledger_path,
            _dir: dir,
        }
    }

    fn targets(urls: &[&str]) -> Vec<TargetUrl> {
        urls.iter().map(|u| TargetUrl::parse(u).unwrap()).collect()
    }

    #[tokio::test]
    async fn results_preserve_input_order() {
        let f = fixture(FakeEngine::ok(), false);
        let run = f
            .orchestrator
            .run_batch(targets(&[
                "https://a.example/",
                "https://a.example/about",
                "https://b.example/",
            ]))
            .await
            .unwrap();

        let urls: Vec<&str> = run.results.iter().map(|r| r.target().as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://a.example/",
                "https://a.example/about",
                "https://b.example/",
            ]
        );
        assert_eq!(run.error_count(), 0);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let f = fixture(FakeEngine::failing(&["https://b.example/"]), false);
        let run = f
            .orchestrator
            .run_batch(targets(&["https://a.example/", "https://b.example/"]))
            .await
            .unwrap();

        assert_eq!(run.tests_count(), 2);
        assert!(!run.results[0].is_failure());
        match &run.results[1] {
            AuditOutcome::Failure { error, .. } => assert!(error.contains("timeout")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(run.unique_domains(), vec!["a.example"]);

        let ledger = RunLedger::new(&f.ledger_path);
        let runs = ledger.load().await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].tests_count, 2);
        assert_eq!(runs[0].error_count, 1);
        assert_eq!(runs[0].unique_domains, vec!["a.example"]);
    }

    #[tokio::test]
    async fn writes_per_target_and_batch_artifacts() {
        let f = fixture(FakeEngine::ok(), false);
        let run = f
            .orchestrator
            .run_batch(targets(&["https://a.example/"]))
            .await
            .unwrap();

        match &run.results[0] {
            AuditOutcome::Success(s) => {
                assert!(s.report_path.exists());
                assert!(s.raw_path.exists());
                let hash = normalize::url_hash("https://a.example/");
                let name = s.report_path.file_name().unwrap().to_str().unwrap();
                assert_eq!(name, format!("report-{hash}-{}.html", run.id));
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert!(run.report_dir.join(report::summary_csv_name(&run.id)).exists());
        assert!(run.report_dir.join(report::summary_html_name(&run.id)).exists());
    }

    #[tokio::test]
    async fn run_state_spans_the_whole_batch() {
        let f = fixture(FakeEngine::ok(), true);
        assert!(!f.state.is_running());

        f.orchestrator
            .run_batch(targets(&["https://a.example/"]))
            .await
            .unwrap();

        assert!(!f.state.is_running());
        assert_eq!(
            f.channel.handle_request("getStatus").unwrap(),
            r#"{"runningTests":false}"#
        );
    }

    #[tokio::test]
    async fn publishes_lifecycle_events_in_order() {
        let f = fixture(FakeEngine::failing(&["https://b.example/"]), false);
        let mut rx = f.channel.subscribe();

        f.orchestrator
            .run_batch(targets(&["https://a.example/", "https://b.example/"]))
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert!(matches!(
            events[0],
            StatusEvent::StatusChanged { running_tests: true }
        ));
        assert!(
            matches!(&events[1], StatusEvent::TestStart { url, index: 0, total: 2 } if url == "https://a.example/")
        );
        assert!(matches!(&events[2], StatusEvent::TestEnd { .. }));
        assert!(matches!(&events[3], StatusEvent::TestDuration { .. }));
        assert!(
            matches!(&events[4], StatusEvent::TestStart { index: 1, .. })
        );
        assert!(
            matches!(&events[5], StatusEvent::TestError { url, error } if url == "https://b.example/" && error.contains("timeout"))
        );
        assert!(matches!(&events[6], StatusEvent::TestDuration { .. }));
        assert!(matches!(
            events[7],
            StatusEvent::StatusChanged {
                running_tests: false
            }
        ));
        assert!(matches!(&events[8], StatusEvent::BatchFinished { .. }));
        assert_eq!(events.len(), 9);
    }

    #[tokio::test]
    async fn slow_audit_times_out_into_a_failure() {
        let f = fixture(FakeEngine::ok(), false);

        // Timeout shorter than the engine delay.
        let orchestrator = Orchestrator::new(
            Arc::new(FakeEngine {
                fail: HashSet::new(),
                delay: Duration::from_millis(200),
                expect_running: None,
            }),
            f.channel.clone(),
            RunLedger::new(&f.ledger_path),
            f.state.clone(),
            BatchOptions {
                results_dir: f._dir.path().join("results"),
                audit_timeout: Duration::from_millis(20),
            },
        );

        let run = orchestrator
            .run_batch(targets(&["https://a.example/"]))
            .await
            .unwrap();

        assert_eq!(run.error_count(), 1);
        match &run.results[0] {
            AuditOutcome::Failure { error, .. } => assert!(error.contains("timed out")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn appends_to_existing_ledger_newest_first() {
        let f = fixture(FakeEngine::ok(), false);

        f.orchestrator
            .run_batch(targets(&["https://a.example/"]))
            .await
            .unwrap();
        let second = f
            .orchestrator
            .run_batch(targets(&["https://b.example/"]))
            .await
            .unwrap();

        let runs = RunLedger::new(&f.ledger_path).load().await.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].timestamp, second.id);
    }
}
