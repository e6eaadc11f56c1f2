//! Shared test utilities for the gallery-pick test suite.
//!
//! Provides in-memory images, file and record builders, content sources that
//! fail or block on demand, and archive sinks that capture or reject output.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let files = vec![
//!     memory_file("a.png", &png_bytes(64, 48)),
//!     unreadable_file("gone.jpg"),
//! ];
//! let sink = MemorySink::default();
//! let mut gallery = Gallery::new(&test_config(5), Box::new(sink.clone()));
//! gallery.load(&files);
//! ```

use std::io::{self, Cursor};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use image::{ImageFormat, RgbImage};

use crate::config::GalleryConfig;
use crate::export::ArchiveSink;
use crate::types::{
    ContentSource, DimensionProbe, DisplayHandle, ImageRecord, MemoryContent, RecordId,
    SourceFile, ThumbnailState, format_file_size,
};

/// Fixed mtime for generated files, so cache keys are predictable.
pub const TEST_MTIME: i64 = 1_700_000_000_000;

// =========================================================================
// Images
// =========================================================================

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Gif)
}

// =========================================================================
// Config
// =========================================================================

/// Stock config with the given batch size and no inter-batch pause.
pub fn test_config(batch_size: usize) -> GalleryConfig {
    let mut config = GalleryConfig::default();
    config.scan.batch_size = batch_size;
    config.scan.batch_pause_ms = 0;
    config
}

// =========================================================================
// Content sources
// =========================================================================

/// Content whose every read fails.
#[derive(Debug)]
pub struct FailingContent;

impl ContentSource for FailingContent {
    fn read(&self) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::NotFound, "file vanished"))
    }
}

/// Content that announces a read on `started`, then waits for `release`.
#[derive(Debug)]
pub struct BlockingContent {
    bytes: Vec<u8>,
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl BlockingContent {
    pub fn new(bytes: Vec<u8>, started: Sender<()>, release: Receiver<()>) -> Self {
        Self {
            bytes,
            started: Mutex::new(started),
            release: Mutex::new(release),
        }
    }
}

impl ContentSource for BlockingContent {
    fn read(&self) -> io::Result<Vec<u8>> {
        let _ = self.started.lock().unwrap().send(());
        self.release
            .lock()
            .unwrap()
            .recv()
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(self.bytes.clone())
    }
}

// =========================================================================
// Files
// =========================================================================

pub fn memory_file(name: &str, bytes: &[u8]) -> SourceFile {
    SourceFile::in_memory(name, bytes.to_vec(), TEST_MTIME)
}

pub fn unreadable_file(name: &str) -> SourceFile {
    SourceFile {
        content: Arc::new(FailingContent),
        ..memory_file(name, &[0u8; 16])
    }
}

// =========================================================================
// Records
// =========================================================================

static NEXT_INDEX: AtomicUsize = AtomicUsize::new(0);

/// A scanned-looking record with a unique id and the given content.
pub fn record_with_content(name: &str, content: impl ContentSource + 'static) -> ImageRecord {
    let index = NEXT_INDEX.fetch_add(1, Ordering::Relaxed);
    ImageRecord {
        id: RecordId { session: 0, index },
        content: Arc::new(content),
        name: name.to_string(),
        size: 0,
        size_formatted: format_file_size(0),
        mime: crate::types::mime_for_name(name).to_string(),
        last_modified: TEST_MTIME,
        path: name.to_string(),
        dimensions: DimensionProbe::Unknown,
        thumbnail: ThumbnailState::Unavailable {
            reason: "not rendered".into(),
        },
        selected: false,
        display: DisplayHandle(index as u64),
    }
}

/// Record with explicit MIME type and byte size, for sort/filter tests.
pub fn record(name: &str, mime: &str, size: u64) -> ImageRecord {
    ImageRecord {
        mime: mime.to_string(),
        size,
        size_formatted: format_file_size(size),
        ..record_with_content(name, MemoryContent(Vec::new()))
    }
}

pub fn memory_record(name: &str, bytes: &[u8]) -> ImageRecord {
    ImageRecord {
        size: bytes.len() as u64,
        size_formatted: format_file_size(bytes.len() as u64),
        ..record_with_content(name, MemoryContent(bytes.to_vec()))
    }
}

pub fn unreadable_record(name: &str) -> ImageRecord {
    record_with_content(name, FailingContent)
}

// =========================================================================
// Sinks
// =========================================================================

/// Captures every saved archive. Clones share the same storage.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    saved: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemorySink {
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

impl ArchiveSink for MemorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}

/// Rejects every save.
#[derive(Debug)]
pub struct FailingSink;

impl ArchiveSink for FailingSink {
    fn save(&self, _file_name: &str, _bytes: &[u8]) -> io::Result<PathBuf> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only destination"))
    }
}
