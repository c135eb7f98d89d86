//! User-facing output for the command-line front end.
//!
//! This module handles:
//! - Formatted status messages
//! - The progress bar fed by the engine
//! - Load, validation and result summaries

pub mod formatter;
pub mod progress;

pub use formatter::{MessageLevel, OutputFormatter};
pub use progress::ConsoleProgress;

use crate::engine::TransformSummary;
use crate::io::{LoadStatistics, WriteStatistics};
use crate::validation::ValidationSummary;

/// Display load statistics.
pub fn display_load_statistics(formatter: &OutputFormatter, stats: &LoadStatistics) {
    if stats.failure_count > 0 {
        formatter.warning(&format!(
            "Warning: {} file(s) failed to load",
            stats.failure_count
        ));
    }

    formatter.info(&format!(
        "Loaded {} file(s) in {:.2}s: {} pages, {}",
        stats.success_count,
        stats.total_time.as_secs_f64(),
        stats.total_pages,
        stats.format_total_size()
    ));
}

/// Display the per-document lines of the `info` command.
pub fn display_validation_summary(formatter: &OutputFormatter, summary: &ValidationSummary) {
    for (i, result) in summary.results.iter().enumerate() {
        formatter.list_item(
            i + 1,
            &format!(
                "{}: {} page(s), {}",
                result.name,
                result.page_count,
                result.format_size()
            ),
        );
        if let Some((major, minor)) = result.version {
            formatter.detail("PDF version", &format!("{major}.{minor}"));
        }
        if let Some((width, height)) = result.first_page {
            formatter.detail("First page", &format!("{width:.2} × {height:.2} pt"));
        }
    }

    formatter.info(&format!(
        "{} file(s): {} pages, {}",
        summary.results.len(),
        summary.total_pages,
        summary.format_total_size()
    ));
}

/// Display a finished transform.
pub fn display_result(
    formatter: &OutputFormatter,
    summary: &TransformSummary,
    write: &WriteStatistics,
) {
    formatter.success(&format!(
        "Created {} ({})",
        write.output_path.display(),
        write.format_file_size()
    ));
    formatter.info(&format!("  {}", summary.label));

    if summary.rtf_fallback {
        formatter.warning("Word output unavailable, saved as RTF (opens in Word)");
    }
    formatter.detail(
        "Write time",
        &format!("{:.2}s", write.write_time.as_secs_f64()),
    );
}
