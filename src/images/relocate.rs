/// Image relocation into rating buckets
///
/// A rated image lives at `root/<rating>/<filename>`. Moves are single
/// attempt renames; a failure is reported and never retried.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::state::data::Rating;

/// A move that could not be completed
#[derive(Debug, Clone, PartialEq, Error)]
#[error("could not move {} to {}: {reason}", .source_path.display(), .destination.display())]
pub struct RelocateError {
    pub source_path: PathBuf,
    pub destination: PathBuf,
    pub reason: String,
}

impl RelocateError {
    fn new(source_path: &Path, destination: &Path, reason: impl ToString) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            destination: destination.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Storage side of a rating decision
pub trait Relocator {
    /// Move `path` into the bucket for `rating` under `root`, returning the new path
    fn relocate(&self, path: &Path, rating: Rating, root: &Path) -> Result<PathBuf, RelocateError>;

    /// Move a previously relocated file from `current` back to `original`
    fn restore(&self, current: &Path, original: &Path) -> Result<(), RelocateError>;
}

/// Relocator backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRelocator;

/// Where an image rated `rating` belongs
pub fn bucket_path(path: &Path, rating: Rating, root: &Path) -> Option<PathBuf> {
    let filename = path.file_name()?;
    Some(root.join(rating.folder_name()).join(filename))
}

impl Relocator for FsRelocator {
    fn relocate(&self, path: &Path, rating: Rating, root: &Path) -> Result<PathBuf, RelocateError> {
        let destination = bucket_path(path, rating, root)
            .ok_or_else(|| RelocateError::new(path, root, "path has no file name"))?;

        // Already bucketed
        if destination == path {
            return Ok(path.to_path_buf());
        }

        move_file(path, &destination)?;
        tracing::info!(
            from = %path.display(),
            to = %destination.display(),
            "moved image to rating folder {}",
            rating
        );
        Ok(destination)
    }

    fn restore(&self, current: &Path, original: &Path) -> Result<(), RelocateError> {
        if current == original {
            return Ok(());
        }

        move_file(current, original)?;
        tracing::info!(
            from = %current.display(),
            to = %original.display(),
            "restored image to previous location"
        );
        Ok(())
    }
}

/// Rename `from` to `to`, creating the parent directory and refusing to overwrite
fn move_file(from: &Path, to: &Path) -> Result<(), RelocateError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| RelocateError::new(from, to, e))?;
    }

    if to.exists() {
        return Err(RelocateError::new(from, to, "destination already exists"));
    }

    fs::rename(from, to).map_err(|e| RelocateError::new(from, to, e))
}
