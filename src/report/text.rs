use crate::pipeline::RunReport;

pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Input: {}\n", report.input.display()));
    match &report.output {
        Some(path) => out.push_str(&format!("Output: {}\n", path.display())),
        None => out.push_str("Output: (dry run)\n"),
    }
    out.push_str(&format!("State: {}\n", report.state.as_str()));
    out.push_str(&format!(
        "Lines: {} in {} batches\n",
        report.lines_read, report.batches
    ));
    out.push_str(&format!(
        "Rows: {} parsed, {} skipped, {} written\n",
        report.rows_parsed, report.rows_skipped, report.rows_written
    ));
    out.push_str(&format!(
        "Progress: {}/{} bytes ({:.2}%)\n",
        report.progress.bytes_read,
        report.progress.max_bytes,
        percent(report.progress.bytes_read, report.progress.max_bytes)
    ));

    if !report.failures.is_empty() || report.write_failures > 0 {
        out.push_str("\nFailures:\n");
        for failure in &report.failures {
            out.push_str(&format!(
                "- batch {} (line {}, {}): {}\n",
                failure.batch, failure.first_line, failure.stage, failure.message
            ));
        }
        if report.write_failures > 0 {
            out.push_str(&format!(
                "- {} batch writes failed\n",
                report.write_failures
            ));
        }
    }
    out
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/text.rs"]
mod tests;
