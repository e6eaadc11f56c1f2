//! Incremental scanning of picked files into image records.
//!
//! The scanner classifies the picker's file list, then turns every accepted
//! file into an [`ImageRecord`]: probe the pixel size, produce a thumbnail
//! (cache first), register a display handle. Records are delivered to a
//! [`ScanObserver`] in batches so a display can start showing results long
//! before a large folder is finished.
//!
//! ## Delivery contract
//!
//! ```text
//! on_statistics(stats)                      exactly once, before any work
//! on_batch(records, processed, total)       every `batch_size` records
//! on_complete(all records)                  exactly once, at the end
//! ```
//!
//! Concatenating the batches gives exactly the completed collection, in the
//! order the accepted files were offered. After each batch the scanner yields
//! its thread (and optionally sleeps for `batch_pause`) so a consumer on
//! another thread, for example behind a bounded [`SyncSender`], keeps up.
//!
//! ## Parallelism
//!
//! Accepted files are processed in chunks of `batch_size`. Inside a chunk,
//! cache lookups and inserts run sequentially in input order; content reads,
//! probes and thumbnail renders run on the rayon pool. Output order never
//! depends on which render finishes first.
//!
//! ## Failures
//!
//! Probe and render failures are not errors: the record carries
//! [`DimensionProbe::Unknown`] or [`ThumbnailState::Unavailable`]. A file whose
//! content cannot be read at all is skipped and counted; it never aborts the
//! scan.

use crate::cache::{CacheKey, CacheStats, ThumbnailCache};
use crate::config::GalleryConfig;
use crate::imaging::{
    ImageBackend, RustBackend, ThumbnailConfig, probe_dimensions, render_thumbnail,
};
use crate::types::{
    ContentSource, DimensionProbe, DisplayHandle, FileStatistics, IMAGE_EXTENSIONS,
    IMAGE_MIME_TYPES, ImageRecord, RecordId, SourceFile, Thumbnail, ThumbnailState,
    extension_of, format_file_size,
};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::mpsc::{Sender, SyncSender};
use std::time::Duration;

/// Estimated bookkeeping cost of one record, excluding its thumbnail.
pub const RECORD_OVERHEAD_BYTES: u64 = 2048;

/// Whether a file is treated as an image: declared type or extension.
pub fn is_acceptable(file: &SourceFile) -> bool {
    let declared = file
        .mime
        .as_deref()
        .is_some_and(|m| IMAGE_MIME_TYPES.contains(&m.to_lowercase().as_str()));
    declared || IMAGE_EXTENSIONS.contains(&extension_of(&file.name).as_str())
}

/// A group of consecutively processed records.
#[derive(Debug, Clone)]
pub struct ScanBatch {
    pub records: Vec<ImageRecord>,
    /// Accepted files handled so far, including skipped ones.
    pub processed: usize,
    /// Accepted files in this scan.
    pub total: usize,
}

/// Scan notifications as owned values, for channel-based consumers.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Statistics(FileStatistics),
    Batch(ScanBatch),
    Complete(Vec<ImageRecord>),
}

/// Receives scan progress. Every method defaults to ignoring the event.
pub trait ScanObserver {
    fn on_statistics(&mut self, _stats: &FileStatistics) {}
    fn on_batch(&mut self, _batch: ScanBatch) {}
    fn on_complete(&mut self, _records: &[ImageRecord]) {}
}

impl ScanObserver for () {}

// A receiver that hung up just stops getting events; the scan carries on.
impl ScanObserver for Sender<ScanEvent> {
    fn on_statistics(&mut self, stats: &FileStatistics) {
        let _ = self.send(ScanEvent::Statistics(*stats));
    }

    fn on_batch(&mut self, batch: ScanBatch) {
        let _ = self.send(ScanEvent::Batch(batch));
    }

    fn on_complete(&mut self, records: &[ImageRecord]) {
        let _ = self.send(ScanEvent::Complete(records.to_vec()));
    }
}

impl ScanObserver for SyncSender<ScanEvent> {
    fn on_statistics(&mut self, stats: &FileStatistics) {
        let _ = self.send(ScanEvent::Statistics(*stats));
    }

    fn on_batch(&mut self, batch: ScanBatch) {
        let _ = self.send(ScanEvent::Batch(batch));
    }

    fn on_complete(&mut self, records: &[ImageRecord]) {
        let _ = self.send(ScanEvent::Complete(records.to_vec()));
    }
}

/// Counts for one finished scan. `recorded + skipped == statistics.accepted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub statistics: FileStatistics,
    pub recorded: usize,
    pub skipped: usize,
    pub cache: CacheStats,
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub records: Vec<ImageRecord>,
    pub report: ScanReport,
}

/// Advisory memory estimate. Never gates behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryEstimate {
    pub thumbnail_count: usize,
    pub record_count: usize,
    pub thumbnail_bytes: u64,
    pub record_bytes: u64,
}

impl MemoryEstimate {
    pub fn total_bytes(&self) -> u64 {
        self.thumbnail_bytes + self.record_bytes
    }
}

impl fmt::Display for MemoryEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (thumbnails {}, records {})",
            format_file_size(self.total_bytes()),
            format_file_size(self.thumbnail_bytes),
            format_file_size(self.record_bytes)
        )
    }
}

/// What the parallel stage produces for one file.
struct Decoded {
    dimensions: DimensionProbe,
    thumbnail: ThumbnailState,
    from_cache: bool,
}

fn decode_file(
    backend: &impl ImageBackend,
    thumbnails: &ThumbnailConfig,
    file: &SourceFile,
    cached: Option<Arc<Thumbnail>>,
) -> std::io::Result<Decoded> {
    let bytes = file.content.read()?;
    let dimensions = probe_dimensions(backend, &file.name, &bytes);
    let (thumbnail, from_cache) = match cached {
        Some(t) => (ThumbnailState::Ready(t), true),
        None => (render_thumbnail(backend, &file.name, &bytes, thumbnails), false),
    };
    Ok(Decoded {
        dimensions,
        thumbnail,
        from_cache,
    })
}

/// Turns picked files into image records.
///
/// Owns the thumbnail cache and the display-handle registry; the records
/// themselves are handed to the caller.
pub struct Scanner<B = RustBackend> {
    backend: B,
    thumbnails: ThumbnailConfig,
    batch_size: usize,
    batch_pause: Duration,
    cache: ThumbnailCache,
    handles: HashMap<DisplayHandle, Arc<dyn ContentSource>>,
    next_handle: u64,
    session: u32,
    record_count: usize,
    statistics: Option<FileStatistics>,
}

impl Scanner<RustBackend> {
    pub fn new(config: &GalleryConfig) -> Self {
        Self::with_backend(RustBackend::new(), config)
    }
}

impl<B: ImageBackend> Scanner<B> {
    /// Create a scanner with a specific backend (allows testing with mock).
    pub fn with_backend(backend: B, config: &GalleryConfig) -> Self {
        Self {
            backend,
            thumbnails: ThumbnailConfig {
                profile: config.thumbnails.profile,
                density: config.thumbnails.device_pixel_ratio,
            },
            batch_size: config.scan.batch_size.max(1),
            batch_pause: config.scan.batch_pause(),
            cache: ThumbnailCache::new(config.cache.capacity),
            handles: HashMap::new(),
            next_handle: 0,
            session: 0,
            record_count: 0,
            statistics: None,
        }
    }

    /// Statistics of the most recent scan, if any.
    pub fn statistics(&self) -> Option<FileStatistics> {
        self.statistics
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    /// Scan `files`, reporting progress to `observer`.
    pub fn scan(&mut self, files: &[SourceFile], observer: &mut impl ScanObserver) -> ScanOutcome {
        self.session += 1;
        // Records from the previous scan are gone; so are their handles
        let released = self.handles.len();
        self.handles.clear();
        if released > 0 {
            tracing::debug!(released, "released previous display handles");
        }

        let accepted: Vec<(usize, &SourceFile)> =
            files.iter().filter(|f| is_acceptable(f)).enumerate().collect();
        let total = accepted.len();
        let statistics = FileStatistics::new(files.len(), total);
        self.statistics = Some(statistics);
        tracing::info!(session = self.session, %statistics, "scan started");
        observer.on_statistics(&statistics);

        let mut records = Vec::with_capacity(total);
        let mut current = Vec::with_capacity(self.batch_size);
        let mut processed = 0;
        let mut skipped = 0;
        let mut cache_stats = CacheStats::default();

        for chunk in accepted.chunks(self.batch_size) {
            let keys: Vec<CacheKey> = chunk
                .iter()
                .map(|(_, f)| CacheKey::for_file(&f.name, f.size, f.last_modified))
                .collect();
            let jobs: Vec<(&SourceFile, Option<Arc<Thumbnail>>)> = chunk
                .iter()
                .zip(&keys)
                .map(|((_, f), key)| (*f, self.cache.get(key)))
                .collect();

            let backend = &self.backend;
            let thumbnails = &self.thumbnails;
            let decoded: Vec<std::io::Result<Decoded>> = jobs
                .into_par_iter()
                .map(|(file, cached)| decode_file(backend, thumbnails, file, cached))
                .collect();

            for (((index, file), key), result) in chunk.iter().zip(keys).zip(decoded) {
                processed += 1;
                match result {
                    Ok(d) => {
                        if d.from_cache {
                            cache_stats.hit();
                        } else {
                            cache_stats.miss();
                            if let ThumbnailState::Ready(thumb) = &d.thumbnail {
                                self.cache.put(key, Arc::clone(thumb));
                            }
                        }
                        let record = self.assemble(*index, file, d);
                        records.push(record.clone());
                        current.push(record);
                    }
                    Err(e) => {
                        skipped += 1;
                        tracing::warn!(file = %file.relative_path, error = %e, "skipping unreadable file");
                    }
                }

                if current.len() >= self.batch_size {
                    self.emit(&mut current, processed, total, observer);
                }
            }
        }
        if !current.is_empty() {
            self.emit(&mut current, processed, total, observer);
        }

        self.record_count = records.len();
        let report = ScanReport {
            statistics,
            recorded: records.len(),
            skipped,
            cache: cache_stats,
        };
        tracing::info!(
            session = self.session,
            recorded = report.recorded,
            skipped = report.skipped,
            cache = %report.cache,
            "scan complete"
        );
        observer.on_complete(&records);

        ScanOutcome { records, report }
    }

    fn emit(
        &self,
        current: &mut Vec<ImageRecord>,
        processed: usize,
        total: usize,
        observer: &mut impl ScanObserver,
    ) {
        let records = std::mem::take(current);
        tracing::debug!(size = records.len(), processed, total, "batch ready");
        observer.on_batch(ScanBatch {
            records,
            processed,
            total,
        });
        std::thread::yield_now();
        if !self.batch_pause.is_zero() {
            std::thread::sleep(self.batch_pause);
        }
    }

    fn assemble(&mut self, index: usize, file: &SourceFile, decoded: Decoded) -> ImageRecord {
        self.next_handle += 1;
        let display = DisplayHandle(self.next_handle);
        self.handles.insert(display, Arc::clone(&file.content));

        ImageRecord {
            id: RecordId {
                session: self.session,
                index,
            },
            content: Arc::clone(&file.content),
            name: file.name.clone(),
            size: file.size,
            size_formatted: format_file_size(file.size),
            mime: file.effective_mime(),
            last_modified: file.last_modified,
            path: if file.relative_path.is_empty() {
                file.name.clone()
            } else {
                file.relative_path.clone()
            },
            dimensions: decoded.dimensions,
            thumbnail: decoded.thumbnail,
            selected: false,
            display,
        }
    }

    /// Resolve a live display handle to the file it shows.
    pub fn open_display(&self, handle: &DisplayHandle) -> Option<Arc<dyn ContentSource>> {
        self.handles.get(handle).cloned()
    }

    /// Number of display handles not yet released.
    pub fn live_handles(&self) -> usize {
        self.handles.len()
    }

    /// Release every display handle, clear the cache and reset counters.
    ///
    /// Safe to call repeatedly and before any scan.
    pub fn cleanup(&mut self) {
        let released = self.handles.len();
        self.handles.clear();
        self.cache.clear();
        self.record_count = 0;
        self.statistics = None;
        tracing::debug!(released, "scanner cleaned up");
    }

    pub fn estimate_memory_usage(&self) -> MemoryEstimate {
        let thumbnail_count = self.cache.len();
        MemoryEstimate {
            thumbnail_count,
            record_count: self.record_count,
            thumbnail_bytes: thumbnail_count as u64
                * self.thumbnails.profile.average_encoded_bytes(),
            record_bytes: self.record_count as u64 * RECORD_OVERHEAD_BYTES,
        }
    }
}

// =============================================================================
// Sorting and filtering
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Date,
    Type,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "size" => Ok(SortKey::Size),
            "date" => Ok(SortKey::Date),
            "type" => Ok(SortKey::Type),
            other => Err(format!("unknown sort key '{other}' (name, size, date, type)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{other}' (asc, desc)")),
        }
    }
}

/// Compare two records by `key`; names compare case-insensitively.
pub fn compare_records(a: &ImageRecord, b: &ImageRecord, key: SortKey, order: SortOrder) -> Ordering {
    let ord = match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Size => a.size.cmp(&b.size),
        SortKey::Date => a.last_modified.cmp(&b.last_modified),
        SortKey::Type => a.mime.cmp(&b.mime),
    };
    order.apply(ord)
}

/// Stable in-place sort.
pub fn sort_records(records: &mut [ImageRecord], key: SortKey, order: SortOrder) {
    records.sort_by(|a, b| compare_records(a, b, key, order));
}

/// Filter on the MIME subtype; `"all"` or empty means no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFilter(Option<String>);

impl TypeFilter {
    pub fn all() -> Self {
        Self(None)
    }

    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Self(None)
        } else {
            Self(Some(s.to_lowercase()))
        }
    }

    pub fn is_all(&self) -> bool {
        self.0.is_none()
    }

    /// Substring match on the record's MIME subtype, case-insensitive.
    pub fn matches(&self, record: &ImageRecord) -> bool {
        match &self.0 {
            None => true,
            Some(needle) => record.subtype().to_lowercase().contains(needle.as_str()),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Whether a record passes a search term (case-insensitive name substring) and type filter.
pub fn matches_filter(record: &ImageRecord, term: &str, types: &TypeFilter) -> bool {
    let name_match = term.is_empty() || record.name.to_lowercase().contains(&term.to_lowercase());
    name_match && types.matches(record)
}

/// Records passing [`matches_filter`], in input order.
pub fn filter_records<'a>(
    records: &'a [ImageRecord],
    term: &str,
    types: &TypeFilter,
) -> Vec<&'a ImageRecord> {
    records
        .iter()
        .filter(|r| matches_filter(r, term, types))
        .collect()
}
