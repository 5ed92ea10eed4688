/// Queue assembly
///
/// Turns an image folder (and optionally a prediction table) into the
/// ordered list of entries a review session works through.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::discovery::{discover_images, index_file_names};
use super::predictions::PredictionTable;
use crate::state::data::ImageEntry;

/// Reasons a load attempt is abandoned
///
/// Reasons are kept as strings so the error can travel through UI messages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("No images found in {}", .root.display())]
    NoImagesFound { root: PathBuf },

    #[error("No images from the CSV file could be found in {}", .root.display())]
    NoImagesResolved { root: PathBuf },

    #[error("CSV file is missing required column(s): {}", .missing.join(", "))]
    InvalidSchema { missing: Vec<&'static str> },

    #[error("CSV line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("Could not read CSV file: {reason}")]
    Csv { reason: String },

    #[error("Select an image folder before loading a CSV file")]
    NoImageFolder,

    #[error("Background load failed: {0}")]
    Task(String),
}

/// Where the entries of a queue came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSource {
    Directory,
    Predictions,
}

/// Output of a successful load, ready to become a session
#[derive(Debug, Clone)]
pub struct AssembledQueue {
    pub root: PathBuf,
    pub entries: Vec<ImageEntry>,
    pub source: QueueSource,
    /// CSV image names with no matching file under the root
    pub unresolved: Vec<String>,
    /// CSV image names listed more than once. Each row stays in the queue and
    /// all of them point at the same file, so once one is rated into another
    /// folder, rating a later copy reports a failed move.
    pub duplicates: Vec<String>,
}

/// Queue every image under `root` with the unscored default rating
pub fn assemble_from_directory(root: &Path) -> Result<AssembledQueue, LoadError> {
    let entries: Vec<ImageEntry> = discover_images(root)
        .into_iter()
        .map(ImageEntry::unscored)
        .collect();

    if entries.is_empty() {
        return Err(LoadError::NoImagesFound { root: root.to_path_buf() });
    }

    tracing::info!(root = %root.display(), count = entries.len(), "assembled queue from folder");
    Ok(AssembledQueue {
        root: root.to_path_buf(),
        entries,
        source: QueueSource::Directory,
        unresolved: Vec::new(),
        duplicates: Vec::new(),
    })
}

/// Queue the table's rows, in order, whose image exists somewhere under `root`
///
/// Each name resolves to the first file of that name found by the walk.
/// Rows with no matching file are skipped and listed in `unresolved`;
/// repeated names are kept and listed once in `duplicates`.
pub fn assemble_from_csv(root: &Path, table: &PredictionTable) -> Result<AssembledQueue, LoadError> {
    let index = index_file_names(root);

    let mut entries = Vec::with_capacity(table.len());
    let mut unresolved = Vec::new();
    let mut duplicates = Vec::new();
    let mut queued = HashSet::new();

    for row in table.rows() {
        match index.get(&OsString::from(&row.image_name)) {
            Some(path) => {
                if !queued.insert(path) && !duplicates.contains(&row.image_name) {
                    tracing::warn!(image = %row.image_name, "CSV lists image more than once");
                    duplicates.push(row.image_name.clone());
                }
                entries.push(ImageEntry::predicted(path.clone(), row.rating, row.confidence));
            }
            None => {
                tracing::warn!(image = %row.image_name, "CSV image not found under root, skipping");
                unresolved.push(row.image_name.clone());
            }
        }
    }

    if entries.is_empty() {
        return Err(LoadError::NoImagesResolved { root: root.to_path_buf() });
    }

    tracing::info!(
        root = %root.display(),
        resolved = entries.len(),
        unresolved = unresolved.len(),
        duplicates = duplicates.len(),
        "assembled queue from predictions"
    );
    Ok(AssembledQueue {
        root: root.to_path_buf(),
        entries,
        source: QueueSource::Predictions,
        unresolved,
        duplicates,
    })
}

/// Scan a folder on the blocking pool
pub async fn load_directory(root: PathBuf) -> Result<AssembledQueue, LoadError> {
    tokio::task::spawn_blocking(move || assemble_from_directory(&root))
        .await
        .map_err(|e| LoadError::Task(e.to_string()))?
}

/// Parse a prediction CSV and resolve it against a folder on the blocking pool
pub async fn load_csv(root: PathBuf, csv_path: PathBuf) -> Result<AssembledQueue, LoadError> {
    tokio::task::spawn_blocking(move || {
        let table = PredictionTable::from_path(&csv_path)?;
        assemble_from_csv(&root, &table)
    })
    .await
    .map_err(|e| LoadError::Task(e.to_string()))?
}
