//! CLI output formatting for scans, selections and exports.
//!
//! # Record Display Contract
//!
//! Every record is shown the same way wherever it appears: a header line with
//! its 1-based position and name, then indented context lines for size,
//! dimensions and thumbnail status. [`record_header`] and [`record_details`]
//! enforce this so scan and export output look consistent.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Found 3 images / 4 files, 75%
//!     001 sunset.jpg
//!         1920x1080 · 1.2 MB · image/jpeg
//!         thumbnail: 320x180 image/jpeg
//!     002 broken.png
//!         unknown size · 12 B · image/png
//!         thumbnail: unavailable (Unknown image format)
//!     [2/3]
//!     003 dawn.webp
//!         ...
//!     [3/3]
//! Scanned 3 images
//! ```
//!
//! ## Export
//!
//! ```text
//! Exporting 2 images
//!     [1/2] 50%
//!     [2/2] 100%
//!     Compressing...
//! Exported 2 images to exported_images_20260309T070501.zip (1.1 MB)
//!     Saved: out/exported_images_20260309T070501.zip
//! ```
//!
//! # Architecture
//!
//! Each event has a `format_*` function (returns `Vec<String>`) for
//! testability. Format functions are pure: no I/O, no side effects. The
//! binary prints their lines from a dedicated printer thread.

use crate::export::{ExportEvent, ExportReport};
use crate::notify::Notice;
use crate::scan::{MemoryEstimate, ScanEvent, ScanReport};
use crate::selection::SelectionEvent;
use crate::types::{DimensionProbe, ImageRecord, ThumbnailState};

// ============================================================================
// Shared record display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header line: position + name, with a marker for selected records.
///
/// ```text
/// 001 sunset.jpg
/// 002 dawn.png *
/// ```
fn record_header(position: usize, record: &ImageRecord) -> String {
    let marker = if record.selected { " *" } else { "" };
    format!("{} {}{}", format_index(position), record.name, marker)
}

fn dimensions_text(probe: &DimensionProbe) -> String {
    match probe {
        DimensionProbe::Known(d) => format!("{}x{}", d.width, d.height),
        DimensionProbe::Unknown => "unknown size".to_string(),
    }
}

fn thumbnail_text(state: &ThumbnailState) -> String {
    match state {
        ThumbnailState::Ready(t) => format!("{}x{} {}", t.width, t.height, t.mime),
        ThumbnailState::Unavailable { reason } => format!("unavailable ({})", reason),
    }
}

/// Context lines under a record header.
fn record_details(record: &ImageRecord) -> Vec<String> {
    let mut lines = vec![format!(
        "{} \u{b7} {} \u{b7} {}",
        dimensions_text(&record.dimensions),
        record.size_formatted,
        record.mime
    )];
    if record.path != record.name {
        lines.push(format!("Source: {}", record.path));
    }
    lines.push(format!("thumbnail: {}", thumbnail_text(&record.thumbnail)));
    lines
}

/// A record block at the given depth.
fn record_block(depth: usize, position: usize, record: &ImageRecord) -> Vec<String> {
    let mut lines = vec![format!("{}{}", indent(depth), record_header(position, record))];
    for detail in record_details(record) {
        lines.push(format!("{}{}", indent(depth + 1), detail));
    }
    lines
}

// ============================================================================
// Scan output
// ============================================================================

/// Format a single scan event as display lines.
pub fn format_scan_event(event: &ScanEvent) -> Vec<String> {
    match event {
        ScanEvent::Statistics(stats) => vec![format!("Found {}", stats)],
        ScanEvent::Batch(batch) => {
            let mut lines = Vec::new();
            for record in &batch.records {
                let position = record.id.index + 1;
                lines.extend(record_block(1, position, record));
            }
            lines.push(format!("    [{}/{}]", batch.processed, batch.total));
            lines
        }
        ScanEvent::Complete(records) => vec![format!("Scanned {} images", records.len())],
    }
}

/// Summary lines after a scan: skips, cache use and memory estimate.
pub fn format_scan_summary(report: &ScanReport, memory: &MemoryEstimate) -> Vec<String> {
    let mut lines = Vec::new();
    if report.skipped > 0 {
        lines.push(format!("Skipped {} unreadable files", report.skipped));
    }
    lines.push(format!("Cache: {}", report.cache));
    lines.push(format!("Memory: {}", memory));
    lines
}

/// The visible view, one block per record in display order.
pub fn format_view(records: &[&ImageRecord]) -> Vec<String> {
    records
        .iter()
        .enumerate()
        .flat_map(|(i, record)| record_block(0, i + 1, record))
        .collect()
}

// ============================================================================
// Selection and export output
// ============================================================================

pub fn format_selection_event(event: &SelectionEvent) -> Vec<String> {
    match event {
        SelectionEvent::SizeChanged { size, .. } => vec![format!("Selected: {}", size)],
        SelectionEvent::RecordChanged { id, selected } => {
            let verb = if *selected { "selected" } else { "deselected" };
            vec![format!("    {} {}", id, verb)]
        }
    }
}

pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::Shown { total } => vec![format!("Exporting {} images", total)],
        ExportEvent::Progress {
            percent,
            current,
            total,
        } => vec![format!("    [{}/{}] {}%", current, total, percent)],
        ExportEvent::Compressing => vec!["    Compressing...".to_string()],
        ExportEvent::Hidden => Vec::new(),
    }
}

pub fn format_export_report(report: &ExportReport) -> Vec<String> {
    let mut lines = vec![report.summary()];
    lines.push(format!("    Saved: {}", report.location.display()));
    for name in &report.skipped {
        lines.push(format!("    Skipped: {}", name));
    }
    lines
}

pub fn format_notice(notice: &Notice) -> String {
    format!("[{}] {}", notice.severity, notice.message)
}
