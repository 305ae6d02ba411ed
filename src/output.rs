//! CLI output formatting for a batch run.
//!
//! The report is **object-centric**: each processed object gets a header
//! line with its bucket/key, followed by indented lines for the artifacts
//! written. Failures follow in the same shape, then a one-line tally.
//!
//! # Output Format
//!
//! ```text
//! Processed
//! 001 photos/images/cat.jpg
//!     processed/resized/cat.jpg (image/jpeg, 48213 bytes)
//!     processed/grayscale/cat.jpg (image/jpeg, 90122 bytes)
//!
//! Failed
//! 001 photos/images/missing.jpg
//!     fetch failed: object not found: photos/images/missing.jpg
//! 002 record #1
//!     notification message is not a storage event batch: ...
//!
//! resize-pipeline: 1 processed, 2 failed (207)
//! ```
//!
//! # Architecture
//!
//! [`format_report`] returns `Vec<String>` for testability; [`print_report`]
//! writes it to stderr so stdout stays reserved for the JSON summary. Format
//! functions are pure: no I/O, no side effects.

use crate::processor::{BatchReport, Failure};
use crate::summary::ResultSummary;
use crate::transform::Job;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn failure_lines(pos: usize, failure: &Failure) -> [String; 2] {
    match failure {
        Failure::Record { index, error } => [
            format!("{} record #{}", format_index(pos), index),
            format!("{}{}", indent(1), error),
        ],
        Failure::Item { bucket, key, error } => [
            format!(
                "{} {}/{}",
                format_index(pos),
                bucket.as_deref().unwrap_or("?"),
                key.as_deref().unwrap_or("?")
            ),
            format!("{}{}", indent(1), error),
        ],
    }
}

pub fn format_report(job: Job, report: &BatchReport, summary: &ResultSummary) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.items.is_empty() {
        lines.push("Processed".to_string());
        for (i, item) in report.items.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), item.reference));
            for stored in &item.stored {
                lines.push(format!(
                    "{}{} ({}, {} bytes)",
                    indent(1),
                    stored.key,
                    stored.content_type,
                    stored.size
                ));
            }
        }
    }

    if !report.failures.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Failed".to_string());
        for (i, failure) in report.failures.iter().enumerate() {
            lines.extend(failure_lines(i + 1, failure));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "{}: {} processed, {} failed ({})",
        job, summary.processed, summary.failed, summary.status_code
    ));
    lines
}

pub fn print_report(job: Job, report: &BatchReport, summary: &ResultSummary) {
    for line in format_report(job, report, summary) {
        eprintln!("{}", line);
    }
}
