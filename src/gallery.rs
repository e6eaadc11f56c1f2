//! Gallery controller: scan → view → select → export.
//!
//! [`Gallery`] holds the canonical record collection (scan order) and the
//! visible view over it (filtered, then sorted). The view is a list of
//! positions into the collection, so sorting or filtering never reorders the
//! records themselves. Export always follows collection order.
//!
//! A display layer attaches through channels:
//!
//! | Subscription | Carries |
//! |--------------|---------|
//! | [`Gallery::subscribe_scan`] | statistics, batches, completion |
//! | [`Gallery::subscribe_selection`] | selection size and per-record changes |
//! | [`Gallery::subscribe_export`] | progress indicator updates |
//! | [`Gallery::subscribe_notices`] | user-visible notices |

use crate::config::{GalleryConfig, MemoryConfig};
use crate::export::{ArchiveExporter, ArchiveSink, ExportError, ExportEvent, ExportReport};
use crate::imaging::{ImageBackend, RustBackend};
use crate::notify::{Notice, Notifier, Severity};
use crate::scan::{
    MemoryEstimate, ScanBatch, ScanEvent, ScanObserver, ScanReport, Scanner, SortKey, SortOrder,
    TypeFilter, compare_records, matches_filter,
};
use crate::selection::{SelectionEvent, SelectionStore};
use crate::types::{
    ContentSource, FileStatistics, ImageRecord, RecordId, SourceFile, format_file_size,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::Sender;

/// Routes scan progress into the gallery while a load is running.
struct LoadObserver<'a> {
    records: &'a mut Vec<ImageRecord>,
    visible: &'a mut Vec<usize>,
    search: &'a str,
    types: &'a TypeFilter,
    notifier: &'a mut Notifier,
    view: Option<&'a mut Sender<ScanEvent>>,
}

impl ScanObserver for LoadObserver<'_> {
    fn on_statistics(&mut self, stats: &FileStatistics) {
        if let Some(view) = self.view.as_deref_mut() {
            view.on_statistics(stats);
        }
    }

    fn on_batch(&mut self, batch: ScanBatch) {
        let first = self.records.is_empty() && !batch.records.is_empty();
        for record in &batch.records {
            if matches_filter(record, self.search, self.types) {
                self.visible.push(self.records.len());
            }
            self.records.push(record.clone());
        }
        if let Some(view) = self.view.as_deref_mut() {
            view.on_batch(batch);
        }
        if first {
            self.notifier
                .notify(Severity::Info, "Loading images, the first ones are ready to browse");
        }
    }

    fn on_complete(&mut self, records: &[ImageRecord]) {
        if let Some(view) = self.view.as_deref_mut() {
            view.on_complete(records);
        }
    }
}

pub struct Gallery<B = RustBackend> {
    scanner: Scanner<B>,
    selection: SelectionStore,
    exporter: ArchiveExporter,
    sink: Box<dyn ArchiveSink>,
    notifier: Notifier,
    memory: MemoryConfig,
    records: Vec<ImageRecord>,
    visible: Vec<usize>,
    search: String,
    types: TypeFilter,
    sort: (SortKey, SortOrder),
    scan_events: Option<Sender<ScanEvent>>,
}

impl Gallery<RustBackend> {
    pub fn new(config: &GalleryConfig, sink: Box<dyn ArchiveSink>) -> Self {
        Self::with_backend(RustBackend::new(), config, sink)
    }
}

impl<B: ImageBackend> Gallery<B> {
    pub fn with_backend(backend: B, config: &GalleryConfig, sink: Box<dyn ArchiveSink>) -> Self {
        Self {
            scanner: Scanner::with_backend(backend, config),
            selection: SelectionStore::new(),
            exporter: ArchiveExporter::new(config.export.compression_level),
            sink,
            notifier: Notifier::default(),
            memory: config.memory.clone(),
            records: Vec::new(),
            visible: Vec::new(),
            search: String::new(),
            types: TypeFilter::all(),
            sort: (SortKey::default(), SortOrder::default()),
            scan_events: None,
        }
    }

    pub fn subscribe_scan(&mut self, tx: Sender<ScanEvent>) {
        self.scan_events = Some(tx);
    }

    pub fn subscribe_selection(&mut self, tx: Sender<SelectionEvent>) {
        self.selection.subscribe(tx);
    }

    pub fn subscribe_export(&mut self, tx: Sender<ExportEvent>) {
        self.exporter.subscribe(tx);
    }

    pub fn subscribe_notices(&mut self, tx: Sender<Notice>) {
        self.notifier.subscribe(tx);
    }

    /// Replace the current collection with a scan of `files`.
    ///
    /// Previous records, selection, display handles, search term and type
    /// filter are discarded first. The sort order is kept.
    pub fn load(&mut self, files: &[SourceFile]) -> ScanReport {
        self.discard();

        let mut observer = LoadObserver {
            records: &mut self.records,
            visible: &mut self.visible,
            search: &self.search,
            types: &self.types,
            notifier: &mut self.notifier,
            view: self.scan_events.as_mut(),
        };
        let outcome = self.scanner.scan(files, &mut observer);

        if self.records.is_empty() {
            let accepted = outcome.report.statistics.accepted;
            if accepted > 0 {
                self.notifier.notify(
                    Severity::Error,
                    format!("Could not read any of the {accepted} images"),
                );
            } else {
                self.notifier
                    .notify(Severity::Info, "No images found in the selected folder");
            }
            return outcome.report;
        }

        let memory = self.scanner.estimate_memory_usage();
        let total = format_file_size(memory.total_bytes());
        self.notifier.notify(
            Severity::Success,
            format!("Loaded {} images | memory ≈ {total}", self.records.len()),
        );
        if memory.total_bytes() > self.memory.notice_bytes() {
            self.notifier.notify(
                Severity::Info,
                format!("High memory use ({total}), consider loading smaller folders"),
            );
        }
        if memory.total_bytes() > self.memory.warn_bytes() {
            tracing::warn!(estimate = %memory, "memory estimate above warning threshold");
        }

        self.refresh_view();
        outcome.report
    }

    fn discard(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear(self.records.iter_mut());
        }
        self.scanner.cleanup();
        self.records.clear();
        self.visible.clear();
        self.search.clear();
        self.types = TypeFilter::all();
    }

    fn refresh_view(&mut self) {
        let records = &self.records;
        self.visible = (0..records.len())
            .filter(|&i| matches_filter(&records[i], &self.search, &self.types))
            .collect();
        let (key, order) = self.sort;
        self.visible
            .sort_by(|&a, &b| compare_records(&records[a], &records[b], key, order));
    }

    pub fn sort(&mut self, key: SortKey, order: SortOrder) {
        self.sort = (key, order);
        self.refresh_view();
    }

    pub fn filter(&mut self, term: &str, types: TypeFilter) {
        self.search = term.to_string();
        self.types = types;
        self.refresh_view();
    }

    /// All records in scan order.
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Records passing the current filter, in the current sort order.
    pub fn visible(&self) -> Vec<&ImageRecord> {
        self.visible.iter().map(|&i| &self.records[i]).collect()
    }

    pub fn record(&self, id: RecordId) -> Option<&ImageRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn toggle_selection(&mut self, id: RecordId) -> Option<bool> {
        self.selection.toggle(id, &mut self.records)
    }

    /// Select every visible record.
    pub fn select_all(&mut self) {
        let visible: HashSet<usize> = self.visible.iter().copied().collect();
        self.selection.select_all(
            self.records
                .iter_mut()
                .enumerate()
                .filter(|(i, _)| visible.contains(i))
                .map(|(_, r)| r),
        );
    }

    /// Deselect every visible record; hidden selections are kept.
    pub fn deselect_all(&mut self) {
        let visible: HashSet<usize> = self.visible.iter().copied().collect();
        self.selection.deselect_all(
            self.records
                .iter_mut()
                .enumerate()
                .filter(|(i, _)| visible.contains(i))
                .map(|(_, r)| r),
        );
    }

    /// Export the selection in collection order.
    ///
    /// Refusals and failures are reported as notices and yield `None`.
    pub fn export_selected(&mut self) -> Option<ExportReport> {
        let selected = self.selection.selected_of(&self.records);
        match self.exporter.export(&selected, self.sink.as_ref()) {
            Ok(report) => {
                self.notifier.notify(Severity::Success, report.summary());
                Some(report)
            }
            Err(e) => {
                let message = match &e {
                    ExportError::EmptySelection => "Select images to export first".to_string(),
                    ExportError::AlreadyExporting => "Export in progress, please wait".to_string(),
                    other => format!("Export failed: {other}"),
                };
                self.notifier.notify(e.severity(), message);
                None
            }
        }
    }

    pub fn memory_usage(&self) -> MemoryEstimate {
        self.scanner.estimate_memory_usage()
    }

    /// Post the current memory estimate as a notice.
    pub fn report_memory(&mut self) -> MemoryEstimate {
        let memory = self.scanner.estimate_memory_usage();
        tracing::info!(
            thumbnails = memory.thumbnail_count,
            records = memory.record_count,
            estimate = %memory,
            "memory usage"
        );
        self.notifier.notify(
            Severity::Info,
            format!(
                "Memory: {} | cached: {} thumbnails",
                format_file_size(memory.total_bytes()),
                memory.thumbnail_count
            ),
        );
        memory
    }

    /// Content behind a record's display handle, while it is live.
    pub fn open_full_resolution(&self, id: RecordId) -> Option<Arc<dyn ContentSource>> {
        let record = self.record(id)?;
        self.scanner.open_display(&record.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    fn gallery(sink: &MemorySink) -> Gallery<MockBackend> {
        Gallery::with_backend(MockBackend::new(), &test_config(2), Box::new(sink.clone()))
    }

    fn files(names: &[&str]) -> Vec<SourceFile> {
        names.iter().map(|n| memory_file(n, n.as_bytes())).collect()
    }

    fn visible_names<B: ImageBackend>(g: &Gallery<B>) -> Vec<String> {
        g.visible().iter().map(|r| r.name.clone()).collect()
    }

    fn archive_entries(bytes: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    fn id_of<B: ImageBackend>(g: &Gallery<B>, name: &str) -> RecordId {
        g.records().iter().find(|r| r.name == name).unwrap().id
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn load_builds_collection_and_sorted_view() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        let report = g.load(&files(&["b.png", "notes.txt", "A.jpg", "c.gif"]));

        assert_eq!(report.recorded, 3);
        assert_eq!(report.statistics, FileStatistics::new(4, 3));
        // Collection keeps scan order, view is sorted by name
        let scan_order: Vec<&str> = g.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(scan_order, vec!["b.png", "A.jpg", "c.gif"]);
        assert_eq!(visible_names(&g), vec!["A.jpg", "b.png", "c.gif"]);
    }

    #[test]
    fn load_posts_progress_and_success_notices() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        let (tx, rx) = mpsc::channel();
        g.subscribe_notices(tx);

        g.load(&files(&["a.png", "b.png", "c.png"]));
        let notices: Vec<Notice> = rx.try_iter().collect();

        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].severity, Severity::Info);
        assert_eq!(notices[1].severity, Severity::Success);
        assert!(notices[1].message.starts_with("Loaded 3 images | memory ≈ "));
    }

    #[test]
    fn load_without_images_reports_empty() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        let (tx, rx) = mpsc::channel();
        g.subscribe_notices(tx);

        g.load(&files(&["readme.txt"]));
        assert!(g.records().is_empty());
        assert!(g.visible().is_empty());
        let notices: Vec<Notice> = rx.try_iter().collect();
        assert_eq!(
            notices,
            vec![Notice {
                severity: Severity::Info,
                message: "No images found in the selected folder".into()
            }]
        );
    }

    #[test]
    fn load_with_only_unreadable_images_reports_error() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        let (tx, rx) = mpsc::channel();
        g.subscribe_notices(tx);

        let report = g.load(&[unreadable_file("a.png"), unreadable_file("b.jpg")]);
        assert_eq!(report.statistics.accepted, 2);
        assert_eq!(report.recorded, 0);
        assert_eq!(report.skipped, 2);
        assert!(g.records().is_empty());

        let notices: Vec<Notice> = rx.try_iter().collect();
        assert_eq!(
            notices,
            vec![Notice {
                severity: Severity::Error,
                message: "Could not read any of the 2 images".into()
            }]
        );
    }

    #[test]
    fn memory_notice_above_threshold() {
        let sink = MemorySink::default();
        let mut config = test_config(2);
        config.memory.notice_mb = 0;
        let mut g = Gallery::with_backend(MockBackend::new(), &config, Box::new(sink));
        let (tx, rx) = mpsc::channel();
        g.subscribe_notices(tx);

        g.load(&files(&["a.png"]));
        let last = rx.try_iter().last().unwrap();
        assert_eq!(last.severity, Severity::Info);
        assert!(last.message.starts_with("High memory use"));
    }

    #[test]
    fn scan_events_forwarded_to_view() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        let (tx, rx) = mpsc::channel();
        g.subscribe_scan(tx);

        g.load(&files(&["a.png", "b.png", "c.png"]));
        let events: Vec<ScanEvent> = rx.try_iter().collect();
        assert!(matches!(events[0], ScanEvent::Statistics(_)));
        assert!(matches!(&events[1], ScanEvent::Batch(b) if b.records.len() == 2));
        assert!(matches!(&events[2], ScanEvent::Batch(b) if b.records.len() == 1));
        assert!(matches!(&events[3], ScanEvent::Complete(r) if r.len() == 3));
    }

    #[test]
    fn reload_discards_previous_state() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        g.load(&files(&["a.png", "b.png"]));
        let old = id_of(&g, "a.png");
        g.toggle_selection(old);
        g.filter("b", TypeFilter::all());
        assert_eq!(g.selected_count(), 1);

        g.load(&files(&["c.png", "d.png"]));
        assert_eq!(g.selected_count(), 0);
        assert!(g.open_full_resolution(old).is_none());
        assert!(g.records().iter().all(|r| !r.selected));
        // Search was reset, so everything is visible again
        assert_eq!(visible_names(&g), vec!["c.png", "d.png"]);
    }

    // =========================================================================
    // View
    // =========================================================================

    #[test]
    fn filter_and_sort_view() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        let mut input = files(&["beach.png", "Beach.jpg", "city.png"]);
        input[0].size = 30;
        input[1].size = 10;
        input[2].size = 20;
        g.load(&input);

        g.filter("", TypeFilter::parse("png"));
        assert_eq!(visible_names(&g), vec!["beach.png", "city.png"]);

        g.filter("BEACH", TypeFilter::all());
        g.sort(SortKey::Size, SortOrder::Asc);
        assert_eq!(visible_names(&g), vec!["Beach.jpg", "beach.png"]);

        g.filter("", TypeFilter::all());
        g.sort(SortKey::Size, SortOrder::Desc);
        assert_eq!(visible_names(&g), vec!["beach.png", "city.png", "Beach.jpg"]);
        // Collection order untouched
        assert_eq!(g.records()[0].name, "beach.png");
        assert_eq!(g.records()[2].name, "city.png");
    }

    // =========================================================================
    // Selection
    // =========================================================================

    #[test]
    fn select_all_covers_visible_records_only() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        g.load(&files(&["a.png", "b.jpg", "c.png"]));

        g.filter("", TypeFilter::parse("png"));
        g.select_all();
        assert_eq!(g.selected_count(), 2);
        assert!(!g.record(id_of(&g, "b.jpg")).unwrap().selected);

        g.filter("", TypeFilter::all());
        g.toggle_selection(id_of(&g, "b.jpg"));
        g.filter("a", TypeFilter::all());
        g.deselect_all();
        // Hidden selections survive
        assert_eq!(g.selected_count(), 2);
        assert!(!g.record(id_of(&g, "a.png")).unwrap().selected);
        assert!(g.record(id_of(&g, "c.png")).unwrap().selected);
    }

    #[test]
    fn selection_events_reach_subscriber() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        g.load(&files(&["a.png", "b.png"]));
        let (tx, rx) = mpsc::channel();
        g.subscribe_selection(tx);

        g.select_all();
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![SelectionEvent::SizeChanged {
                previous: 0,
                size: 2
            }]
        );
    }

    // =========================================================================
    // Export
    // =========================================================================

    #[test]
    fn export_follows_collection_order() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        g.load(&files(&["c.png", "a.png", "b.png"]));
        g.sort(SortKey::Name, SortOrder::Desc);

        // Click order differs from both view and collection order
        g.toggle_selection(id_of(&g, "b.png"));
        g.toggle_selection(id_of(&g, "c.png"));

        let report = g.export_selected().unwrap();
        assert_eq!(report.exported, 2);
        let saved = sink.saved();
        assert_eq!(
            archive_entries(&saved[0].1),
            vec!["001_c.png", "002_b.png"]
        );
    }

    #[test]
    fn export_without_selection_warns() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        g.load(&files(&["a.png"]));
        let (tx, rx) = mpsc::channel();
        g.subscribe_notices(tx);

        assert!(g.export_selected().is_none());
        assert!(sink.saved().is_empty());
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.severity, Severity::Warning);
        assert_eq!(notice.message, "Select images to export first");
    }

    #[test]
    fn export_failure_reported_as_error() {
        let mut g = Gallery::with_backend(MockBackend::new(), &test_config(2), Box::new(FailingSink));
        g.load(&files(&["a.png"]));
        g.select_all();
        let (tx, rx) = mpsc::channel();
        g.subscribe_notices(tx);

        assert!(g.export_selected().is_none());
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.starts_with("Export failed: "));
    }

    // =========================================================================
    // Display and memory
    // =========================================================================

    #[test]
    fn full_resolution_content_available_while_loaded() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        g.load(&files(&["a.png"]));
        let id = id_of(&g, "a.png");

        let content = g.open_full_resolution(id).unwrap();
        assert_eq!(content.read().unwrap(), b"a.png");
    }

    #[test]
    fn report_memory_posts_notice() {
        let sink = MemorySink::default();
        let mut g = gallery(&sink);
        g.load(&files(&["a.png", "b.png"]));
        let (tx, rx) = mpsc::channel();
        g.subscribe_notices(tx);

        let memory = g.report_memory();
        assert_eq!(memory, g.memory_usage());
        assert_eq!(memory.record_count, 2);
        let notice = rx.try_recv().unwrap();
        assert!(notice.message.ends_with("cached: 2 thumbnails"));
    }
}
