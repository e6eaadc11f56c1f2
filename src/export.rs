//! Archive export of selected records.
//!
//! ```text
//! selection ──read each──▶ (entry name, bytes) ──deflate──▶ zip ──▶ ArchiveSink
//!     │                          │
//!     └─ unreadable: skipped ────┘ (sequence number still consumed)
//! ```
//!
//! Only one export runs at a time. A second request while one is active is
//! refused with [`ExportError::AlreadyExporting`]; it is not queued and it does
//! not disturb the running export. The in-flight flag is held by a guard, so it
//! is released (and [`ExportEvent::Hidden`] sent) on every exit path.

use crate::naming::{archive_file_name, safe_entry_name};
use crate::notify::Severity;
use crate::types::{ImageRecord, format_file_size};
use chrono::Utc;
use serde::Serialize;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No images selected")]
    EmptySelection,
    #[error("An export is already in progress")]
    AlreadyExporting,
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ExportError {
    /// How the failure should be presented to the user.
    pub fn severity(&self) -> Severity {
        match self {
            ExportError::EmptySelection => Severity::Warning,
            ExportError::AlreadyExporting => Severity::Info,
            ExportError::Archive(_) | ExportError::Io(_) => Severity::Error,
        }
    }
}

/// Progress indicator updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExportEvent {
    Shown { total: usize },
    Progress { percent: u32, current: usize, total: usize },
    Compressing,
    Hidden,
}

/// Destination for a finished archive.
pub trait ArchiveSink: Send + Sync {
    /// Store `bytes` under `file_name` and return where it went.
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Writes archives into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArchiveSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub file_name: String,
    pub location: PathBuf,
    /// Entries written to the archive.
    pub exported: usize,
    /// Names of selected files that could not be read.
    pub skipped: Vec<String>,
    pub archive_bytes: u64,
}

impl ExportReport {
    pub fn summary(&self) -> String {
        let mut s = format!(
            "Exported {} images to {} ({})",
            self.exported,
            self.file_name,
            format_file_size(self.archive_bytes)
        );
        if !self.skipped.is_empty() {
            s.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        s
    }
}

/// Builds one compressed archive from a selection. Single-flight.
#[derive(Debug)]
pub struct ArchiveExporter {
    in_flight: AtomicBool,
    compression_level: i64,
    events: Option<Sender<ExportEvent>>,
}

/// Releases the in-flight flag when dropped.
struct FlightGuard<'a> {
    exporter: &'a ArchiveExporter,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.exporter.in_flight.store(false, Ordering::Release);
        self.exporter.send(ExportEvent::Hidden);
    }
}

impl ArchiveExporter {
    pub fn new(compression_level: i64) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            compression_level,
            events: None,
        }
    }

    pub fn subscribe(&mut self, tx: Sender<ExportEvent>) {
        self.events = Some(tx);
    }

    pub fn is_exporting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn send(&self, event: ExportEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn claim(&self) -> Result<FlightGuard<'_>, ExportError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::AlreadyExporting)?;
        Ok(FlightGuard { exporter: self })
    }

    /// Export `selection` (already in collection order) into one archive.
    pub fn export(
        &self,
        selection: &[&ImageRecord],
        sink: &dyn ArchiveSink,
    ) -> Result<ExportReport, ExportError> {
        if selection.is_empty() {
            return Err(ExportError::EmptySelection);
        }
        let _guard = self.claim()?;

        let total = selection.len();
        tracing::info!(total, "export started");
        self.send(ExportEvent::Shown { total });

        let mut entries = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        for (index, record) in selection.iter().enumerate() {
            match record.content.read() {
                Ok(bytes) => entries.push((safe_entry_name(&record.name, index), bytes)),
                Err(e) => {
                    tracing::warn!(file = %record.path, error = %e, "skipping unreadable file");
                    skipped.push(record.name.clone());
                }
            }
            let current = index + 1;
            self.send(ExportEvent::Progress {
                percent: (current as f64 / total as f64 * 100.0).round() as u32,
                current,
                total,
            });
        }

        self.send(ExportEvent::Compressing);
        let bytes = self.build_archive(&entries)?;

        let file_name = archive_file_name(Utc::now());
        let location = sink.save(&file_name, &bytes)?;
        tracing::info!(
            file = %location.display(),
            exported = entries.len(),
            skipped = skipped.len(),
            "export complete"
        );

        Ok(ExportReport {
            file_name,
            location,
            exported: entries.len(),
            skipped,
            archive_bytes: bytes.len() as u64,
        })
    }

    fn build_archive(&self, entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ExportError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.compression_level));

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(bytes)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}
