//! Folder enumeration.
//!
//! Walks a picked folder and produces the ordered [`SourceFile`] list the
//! scanner consumes. Nothing is read here beyond filesystem metadata; file
//! contents are accessed lazily through [`DiskContent`].
//!
//! Every regular file is returned, images or not, so the scanner's
//! statistics can report how much of the folder it accepted. Hidden entries
//! (leading `.`) and their subtrees are skipped.

use crate::types::{DiskContent, IMAGE_EXTENSIONS, SourceFile, extension_of, mime_for_name};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum PickError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|s| s.starts_with('.'))
}

/// Last-modified time in milliseconds since the epoch, 0 if unavailable.
fn modified_millis(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Enumerate every regular file under `root`, ordered by relative path.
pub fn pick_folder(root: &Path) -> Result<Vec<SourceFile>, PickError> {
    if !root.is_dir() {
        return Err(PickError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let meta = entry.metadata()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        // Only declare types for formats we recognize; anything else stays
        // undeclared so acceptance falls to the extension check.
        let mime = IMAGE_EXTENSIONS
            .contains(&extension_of(&name).as_str())
            .then(|| mime_for_name(&name).to_string());

        files.push(SourceFile {
            name,
            size: meta.len(),
            mime,
            last_modified: modified_millis(&meta),
            relative_path,
            content: Arc::new(DiskContent(entry.path().to_path_buf())),
        });
    }

    tracing::debug!(root = %root.display(), count = files.len(), "picked folder");
    Ok(files)
}
