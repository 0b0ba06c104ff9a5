use crate::batch::AuditOutcome;
use crate::error::{Error, Result};

const HEADERS: [&str; 14] = [
    "URL",
    "Performance",
    "First Contentful Paint",
    "Speed Index",
    "Largest Contentful Paint",
    "Time to Interactive",
    "Total Blocking Time",
    "Cumulative Layout Shift",
    "Server Response Time",
    "Total Byte Weight",
    "Main Thread Time",
    "Network Requests",
    "Protocol",
    "Error",
];

/// One row per outcome, audit order preserved. Failed targets keep their
/// URL and error text with empty metric columns.
pub fn render(results: &[AuditOutcome]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADERS)
        .map_err(|e| Error::Internal(e.to_string()))?;

    for outcome in results {
        let record = match outcome {
            AuditOutcome::Success(s) => vec![
                s.target.as_str().to_string(),
                s.metrics.performance.to_string(),
                s.metrics.first_contentful_paint.to_string(),
                s.metrics.speed_index.to_string(),
                s.metrics.largest_contentful_paint.to_string(),
                s.metrics.interactive.to_string(),
                s.metrics.total_blocking_time.to_string(),
                s.metrics.cumulative_layout_shift.to_string(),
                s.metrics.server_response_time.to_string(),
                s.metrics.total_byte_weight.to_string(),
                s.metrics.main_thread_time.to_string(),
                s.metrics.network_requests.to_string(),
                s.metrics.protocol.clone(),
                String::new(),
            ],
            AuditOutcome::Failure { target, error } => {
                let mut record = vec![target.as_str().to_string()];
                record.extend(std::iter::repeat_n(String::new(), HEADERS.len() - 2));
                record.push(error.clone());
                record
            }
        };
        writer
            .write_record(&record)
            .map_err(|e| Error::Internal(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::AuditSuccess;
    use crate::engine::MetricsBundle;
    use crate::normalize::TargetUrl;
    use std::path::PathBuf;

    #[test]
    fn renders_one_row_per_outcome() {
        let results = vec![
            AuditOutcome::Success(AuditSuccess {
                target: TargetUrl::parse("https://a.example/").unwrap(),
                metrics: MetricsBundle {
                    performance: 0.91,
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
                },
                report_path: PathBuf::from("r.html"),
                raw_path: PathBuf::from("r.json"),
            }),
            AuditOutcome::Failure {
                target: TargetUrl::parse("https://b.example/").unwrap(),
                error: "timeout".to_string(),
            },
        ];

        let csv = render(&results).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("URL,Performance"));
        assert!(lines[1].starts_with("https://a.example/,0.91,800"));
        assert!(lines[2].starts_with("https://b.example/,"));
        assert!(lines[2].ends_with("timeout"));
    }
}
