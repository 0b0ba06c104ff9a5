use crate::batch::AuditOutcome;
use std::fmt::Write;

const COLUMNS: [&str; 13] = [
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
];

/// Static results table, one row per outcome in audit order.
pub fn render(results: &[AuditOutcome]) -> String {
    let mut page = String::from(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Audit Results</title>
  <style>
    table { border-collapse: collapse; width: 100%; }
    th, td { border: 1px solid #ccc; padding: 8px; text-align: left; }
    th { background-color: #f2f2f2; }
    td.error { color: #b00020; }
  </style>
</head>
<body>
  <table>
    <tr>
"#,
    );

    for column in COLUMNS {
        let _ = writeln!(page, "      <th>{column}</th>");
    }
    page.push_str("    </tr>\n");

    for outcome in results {
        page.push_str("    <tr>\n");
        match outcome {
            AuditOutcome::Success(s) => {
                let m = &s.metrics;
                let cells = [
                    escape(s.target.as_str()),
                    m.performance.to_string(),
                    m.first_contentful_paint.to_string(),
                    m.speed_index.to_string(),
                    m.largest_contentful_paint.to_string(),
                    m.interactive.to_string(),
                    m.total_blocking_time.to_string(),
                    m.cumulative_layout_shift.to_string(),
                    m.server_response_time.to_string(),
                    m.total_byte_weight.to_string(),
                    m.main_thread_time.to_string(),
                    m.network_requests.to_string(),
                    escape(&m.protocol),
                ];
                for cell in cells {
                    let _ = writeln!(page, "      <td>{cell}</td>");
                }
            }
            AuditOutcome::Failure { target, error } => {
                let _ = writeln!(page, "      <td>{}</td>", escape(target.as_str()));
                let _ = writeln!(
                    page,
                    "      <td class=\"error\" colspan=\"{}\">{}</td>",
                    COLUMNS.len() - 1,
                    escape(error)
                );
            }
        }
        page.push_str("    </tr>\n");
    }

    page.push_str("  </table>\n</body>\n</html>\n");
    page
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
