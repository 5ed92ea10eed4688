use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Image extensions accepted for review (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Check a path's extension against the accepted image types
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Every regular file under `root`, in directory traversal order
fn walk_files(root: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
}

/// Recursively collect the images under `root`
///
/// Order is the traversal order of the walk, not sorted. Paths are joined
/// onto `root` as given so they compare equal to bucket paths built from it.
pub fn discover_images(root: &Path) -> Vec<PathBuf> {
    tracing::debug!(root = %root.display(), "scanning for images");

    let images: Vec<PathBuf> = walk_files(root)
        .map(walkdir::DirEntry::into_path)
        .filter(|path| is_image(path))
        .collect();

    tracing::debug!(count = images.len(), "scan finished");
    images
}

/// Map every file name under `root` to the first path it was found at
///
/// Duplicate names in different folders resolve to whichever the walk
/// reaches first.
pub fn index_file_names(root: &Path) -> HashMap<OsString, PathBuf> {
    let mut index = HashMap::new();

    for entry in walk_files(root) {
        let name = entry.file_name().to_os_string();
        if index.contains_key(&name) {
            tracing::debug!(path = %entry.path().display(), "duplicate file name ignored");
            continue;
        }
        index.insert(name, entry.into_path());
    }

    index
}
