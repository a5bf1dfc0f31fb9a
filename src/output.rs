//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! Image 400x320
//!     Original: 1000x800 (ratio 1.250)
//!     Aspect lock: on
//!     High quality: on
//!
//! Restore points
//! 001 load 1000x800
//!     Digest: 5d41402abc4b
//!     Size: 183204 bytes
//! 002 scale 400x320
//!     Digest: 7215ee9c7d9d
//!     Size: 30551 bytes
//! ```
//!
//! # Architecture
//!
//! A [`SessionReport`] is a plain snapshot of what a session exposes; it is
//! what `--json` serializes. Each section has a `format_*` function (returns
//! `Vec<String>`) for testability and a `print_*` wrapper that writes to
//! stdout. Format functions are pure and do no I/O.

use crate::history::RestoreKind;
use crate::host::HostView;
use crate::session::EditorSession;
use serde::Serialize;

/// Digest characters shown in text output.
const DIGEST_PREFIX: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
    pub ratio: f64,
    pub aspect_lock: bool,
    pub high_quality: bool,
    pub restore_points: Vec<RestorePointReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestorePointReport {
    pub kind: RestoreKind,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub digest: String,
}

impl SessionReport {
    pub fn from_session<V: HostView>(session: &EditorSession<V>) -> Self {
        let (width, height) = session.dimensions();
        let (original_width, original_height) = session.original_dimensions();
        Self {
            width,
            height,
            original_width,
            original_height,
            ratio: session.ratio(),
            aspect_lock: session.aspect_lock(),
            high_quality: session.high_quality(),
            restore_points: session
                .history()
                .iter()
                .map(|point| {
                    let (width, height) = point.dimensions();
                    RestorePointReport {
                        kind: point.kind(),
                        width,
                        height,
                        bytes: point.encoded().len(),
                        digest: point.digest().to_string(),
                    }
                })
                .collect(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

// ============================================================================
// Summary
// ============================================================================

/// Format the dimension summary.
pub fn format_summary(report: &SessionReport) -> Vec<String> {
    vec![
        format!("Image {}x{}", report.width, report.height),
        format!(
            "{}Original: {}x{} (ratio {:.3})",
            indent(1),
            report.original_width,
            report.original_height,
            report.ratio
        ),
        format!("{}Aspect lock: {}", indent(1), on_off(report.aspect_lock)),
        format!("{}High quality: {}", indent(1), on_off(report.high_quality)),
    ]
}

/// Format the restore-point listing, oldest first.
pub fn format_history(report: &SessionReport) -> Vec<String> {
    let mut lines = vec!["Restore points".to_string()];
    for (i, point) in report.restore_points.iter().enumerate() {
        lines.push(format!(
            "{} {} {}x{}",
            format_index(i + 1),
            point.kind.label(),
            point.width,
            point.height
        ));
        let short: String = point.digest.chars().take(DIGEST_PREFIX).collect();
        lines.push(format!("{}Digest: {}", indent(1), short));
        lines.push(format!("{}Size: {} bytes", indent(1), point.bytes));
    }
    lines
}

/// Summary, a blank line, then the restore points.
pub fn format_report(report: &SessionReport) -> Vec<String> {
    let mut lines = format_summary(report);
    lines.push(String::new());
    lines.extend(format_history(report));
    lines
}

/// One line confirming a written file.
pub fn format_saved(path: &std::path::Path, width: u32, height: u32) -> String {
    format!("Wrote {}x{} → {}", width, height, path.display())
}

/// Print the full report to stdout.
pub fn print_report(report: &SessionReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}

/// Print the report as pretty JSON to stdout.
pub fn print_report_json(report: &SessionReport) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
