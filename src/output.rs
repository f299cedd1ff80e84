//! Run reporting.
//!
//! Pure `format_*` functions paired with `print_*` wrappers, so tests can
//! assert on lines without capturing stdout. Warnings (missing decoder,
//! skipped video groups) are emitted at their call sites on stderr.

use crate::walk::RunStats;
use std::path::Path;

/// Header printed before a folder is processed.
pub fn format_run_header(root: &Path) -> String {
    format!("Processing folder {} ...", root.display())
}

/// Summary lines printed after a folder completes.
pub fn format_run_summary(stats: &RunStats) -> Vec<String> {
    vec![
        format!("Total items: {}", stats.items),
        format!("Thumbnails generated: {}", stats.thumbnails),
    ]
}

pub fn print_run_header(root: &Path) {
    println!("{}", format_run_header(root));
}

pub fn print_run_summary(stats: &RunStats) {
    for line in format_run_summary(stats) {
        println!("{}", line);
    }
}
