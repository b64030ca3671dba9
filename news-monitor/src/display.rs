use crate::types::{ExportStatus, RunReport, TIMESTAMP_FORMAT};
use std::fmt::Write;

/// Plain-text storyboard of a run, one block per record, followed by
/// warnings and the export outcome.
pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();

    if report.records.is_empty() {
        out.push_str("No matching results found.\n");
    }

    for record in &report.records {
        let _ = writeln!(out, "## {}", record.title);
        if !record.url.is_empty() {
            let _ = writeln!(out, "   {}", record.url);
        }
        if record.has_thumbnail() {
            let _ = writeln!(out, "   [image] {}", record.thumbnail_url);
        }
        let _ = writeln!(
            out,
            "   {} | {}",
            record.source_name,
            record.timestamp.format(TIMESTAMP_FORMAT)
        );
        if !record.summary.is_empty() {
            let _ = writeln!(out, "   {}", record.summary);
        }
        out.push('\n');
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "Warnings:");
        for warning in &report.warnings {
            let _ = writeln!(out, " - {}", warning);
        }
    }

    match &report.export {
        ExportStatus::NotAttempted => {}
        ExportStatus::Written { rows_sent, rows_written } => {
            let _ = writeln!(out, "{} of {} results pushed to the sink.", rows_written, rows_sent);
        }
        ExportStatus::Failed { message } => {
            let _ = writeln!(out, "Sink update failed: {}", message);
        }
    }

    if report.cancelled {
        out.push_str("Run was cancelled; results are partial.\n");
    }
    out
}
