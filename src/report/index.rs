use crate::batch;
use crate::ledger::RunSummary;
use std::fmt::Write;

/// Listing page over the run ledger, newest first. Each entry links the
/// batch's HTML summary inside its month/timestamp directory.
pub fn render(runs: &[RunSummary]) -> String {
    let mut items = String::new();
    for run in runs {
        let month = batch::month_of(&run.timestamp);
        let file = super::summary_html_name(&run.timestamp);
        let _ = writeln!(
            items,
            r#"      <li><a href="./{month}/{ts}/{file}">{ts}</a> &mdash; {pages} pages, {errors} failed</li>"#,
            ts = run.timestamp,
            pages = run.tests_count,
            errors = run.error_count,
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Past Audit Runs</title>
</head>
<body>
  <h1>Past Audit Runs</h1>
  <ul>
{items}  </ul>
</body>
</html>
"#
    )
}
