//! # Gallery Pick
//!
//! Browse a local folder of images, narrow it down, pick some, and export the
//! pick as one zip archive. Everything runs in-process against files the user
//! points at; nothing is persisted between runs.
//!
//! # Architecture: Scan → View → Select → Export
//!
//! ```text
//! 1. Pick     folder/      →  Vec<SourceFile>    (walk, metadata only)
//! 2. Scan     SourceFile   →  ImageRecord        (probe + thumbnail, batched)
//! 3. View     records      →  visible            (filter, then sort)
//! 4. Select   visible      →  SelectionStore     (single writer of selection)
//! 5. Export   selection    →  exported_images_<timestamp>.zip
//! ```
//!
//! [`gallery::Gallery`] drives these stages and is what a display layer talks
//! to. Each stage is also usable on its own: the scanner reports to any
//! [`scan::ScanObserver`], the selection store works over any record slice,
//! and the exporter writes to any [`export::ArchiveSink`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`picker`] | Walks a folder into the ordered file list the scanner consumes |
//! | [`scan`] | Classifies files, builds records in batches, sort and filter helpers |
//! | [`cache`] | Bounded LRU of encoded thumbnails keyed by name, size and mtime |
//! | [`imaging`] | Pure-Rust decode, fit-to-box resize and thumbnail encode |
//! | [`selection`] | Set of selected records, mirrored onto each record's flag |
//! | [`export`] | Single-flight zip export with per-file failure tolerance |
//! | [`naming`] | Collision-free archive entry names and archive file name |
//! | [`gallery`] | Controller tying scan, view, selection and export together |
//! | [`notify`] | Transient user-visible notices with a severity |
//! | [`config`] | `gallery.toml` loading, validation and merging |
//! | [`types`] | Shared data model (`SourceFile`, `ImageRecord`, statistics) |
//! | [`output`] | CLI output formatting for scan, selection and export events |
//!
//! # Design Decisions
//!
//! ## Batches Over Streams
//!
//! A scan hands records over in fixed-size batches rather than one at a time
//! or all at once. The first batch arrives after a handful of decodes, and a
//! consumer behind a bounded channel naturally slows the scan down instead of
//! buffering the whole folder. Batch order always matches file order.
//!
//! ## Best-Effort Records
//!
//! A file that is accepted as an image always becomes a record unless its
//! bytes cannot be read at all. Unknown dimensions and missing thumbnails are
//! explicit states ([`types::DimensionProbe`], [`types::ThumbnailState`]),
//! never a reason to drop the record or stop the scan.
//!
//! ## One Writer For Selection
//!
//! Only [`selection::SelectionStore`] changes selection. The `selected` flag on
//! each record is a mirror that the store updates before it notifies anyone,
//! so the flag and the set cannot drift apart.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling, JPEG and
//! PNG encoders) and archives are written with `zip`'s deflate backend. No
//! system libraries are needed.

pub mod cache;
pub mod config;
pub mod export;
pub mod gallery;
pub mod imaging;
pub mod naming;
pub mod notify;
pub mod output;
pub mod picker;
pub mod scan;
pub mod selection;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
