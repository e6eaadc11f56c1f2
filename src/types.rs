//! Shared types used across the scan, selection and export stages.
//!
//! A [`SourceFile`] is what the folder picker hands over: metadata plus a
//! way to read the bytes. The scanner turns each accepted one into an
//! [`ImageRecord`], which is what every other component works with.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Lower-case extensions accepted as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Declared content types accepted as images.
pub const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Access to the full bytes of a picked file.
///
/// Reads may fail at any time (file removed, permissions changed), so every
/// caller treats an error as a per-item failure.
pub trait ContentSource: Send + Sync + fmt::Debug {
    fn read(&self) -> io::Result<Vec<u8>>;
}

/// File content on disk, read lazily.
#[derive(Debug, Clone)]
pub struct DiskContent(pub PathBuf);

impl ContentSource for DiskContent {
    fn read(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.0)
    }
}

/// File content already held in memory.
#[derive(Debug, Clone)]
pub struct MemoryContent(pub Vec<u8>);

impl ContentSource for MemoryContent {
    fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

/// One raw file offered by the picker.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
    /// Content type as declared by the picker. Empty or `None` when unknown.
    pub mime: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
    /// Path relative to the picked folder; falls back to `name`.
    pub relative_path: String,
    pub content: Arc<dyn ContentSource>,
}

impl SourceFile {
    /// Convenience constructor for in-memory files.
    pub fn in_memory(name: &str, bytes: Vec<u8>, last_modified: i64) -> Self {
        Self {
            name: name.to_string(),
            size: bytes.len() as u64,
            mime: None,
            last_modified,
            relative_path: name.to_string(),
            content: Arc::new(MemoryContent(bytes)),
        }
    }

    pub fn with_mime(mut self, mime: &str) -> Self {
        self.mime = Some(mime.to_string());
        self
    }

    /// Declared type if present, otherwise inferred from the extension.
    pub fn effective_mime(&self) -> String {
        match self.mime.as_deref() {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => mime_for_name(&self.name).to_string(),
        }
    }
}

/// Lower-cased text after the last dot, or the whole name if there is none.
pub fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_lowercase()
}

/// Content type for an image file name, `image/unknown` otherwise.
pub fn mime_for_name(name: &str) -> &'static str {
    match extension_of(name).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/unknown",
    }
}

/// Human-readable size: 1024-based, at most two decimals, trailing zeros trimmed.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Identifier of a record, unique within one scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId {
    pub session: u32,
    pub index: usize,
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img_{}_{}", self.session, self.index)
    }
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Outcome of probing an image's pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DimensionProbe {
    Known(Dimensions),
    Unknown,
}

impl DimensionProbe {
    /// `(width, height)`, or `(0, 0)` when unknown.
    pub fn size(&self) -> (u32, u32) {
        match self {
            DimensionProbe::Known(d) => (d.width, d.height),
            DimensionProbe::Unknown => (0, 0),
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, DimensionProbe::Known(_))
    }
}

/// An encoded thumbnail raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnail {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Outcome of thumbnail generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThumbnailState {
    Ready(Arc<Thumbnail>),
    Unavailable { reason: String },
}

impl ThumbnailState {
    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        match self {
            ThumbnailState::Ready(t) => Some(t),
            ThumbnailState::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ThumbnailState::Ready(_))
    }
}

/// Token standing in for a full-resolution view of a record's file.
///
/// Resolved through [`Scanner::open_display`](crate::scan::Scanner::open_display)
/// and revoked by [`Scanner::cleanup`](crate::scan::Scanner::cleanup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DisplayHandle(pub u64);

/// One accepted image file.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRecord {
    pub id: RecordId,
    #[serde(skip)]
    pub content: Arc<dyn ContentSource>,
    pub name: String,
    pub size: u64,
    pub size_formatted: String,
    pub mime: String,
    pub last_modified: i64,
    pub path: String,
    pub dimensions: DimensionProbe,
    pub thumbnail: ThumbnailState,
    /// Mirror of selection membership. Only the selection store writes it.
    pub selected: bool,
    pub display: DisplayHandle,
}

impl ImageRecord {
    /// Subtype part of the MIME string (`png` for `image/png`).
    pub fn subtype(&self) -> &str {
        self.mime.split('/').nth(1).unwrap_or("")
    }
}

/// Composition of one scan's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FileStatistics {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Accepted share of the input, rounded to a whole percent.
    pub percentage: u32,
}

impl FileStatistics {
    pub fn new(total: usize, accepted: usize) -> Self {
        let percentage = if total > 0 {
            (accepted as f64 / total as f64 * 100.0).round() as u32
        } else {
            0
        };
        Self {
            total,
            accepted,
            rejected: total - accepted,
            percentage,
        }
    }
}

impl fmt::Display for FileStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} images / {} files, {}%",
            self.accepted, self.total, self.percentage
        )
    }
}
