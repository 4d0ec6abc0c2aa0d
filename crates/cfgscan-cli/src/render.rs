//! Standalone HTML page for browsing a report.

use chrono::NaiveDate;

/// Build the page. The report is exposed to `script` through a
/// `readJson()` function; the script fills the `assay` and `version`
/// selectors and writes the enabled workflows into `output`.
pub fn render_page(report_json: &str, script: &str, instance: &str, today: NaiveDate) -> String {
    let instance = escape_html(instance);
    let updated = today.format("%A %d. %B %Y");
    // A literal `</script>` inside the data would close the tag early.
    let report_json = report_json.trim_end().replace("</", "<\\/");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Config Scanner</title>
<style>
body {{ font-family: sans-serif; padding: 20px; }}
select {{ margin-bottom: 20px; }}
pre {{ background: #f4f4f4; padding: 10px; border-radius: 8px; }}
</style>
<script type="text/javascript">
readJson = function() {{ return {report_json}; }}
</script>
</head>
<body>
<h2>Select an Assay and version to list the enabled workflows for [ {instance} ] shesmu</h2>
<label for="assay">Assay:</label><select id="assay"></select>
<label for="version">Version:</label><select id="version"></select><br>
<pre id="output"></pre>
<script>
{script}
</script>
<div>Updated on: {updated}</div>
</body>
</html>
"#
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
