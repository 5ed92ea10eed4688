/// Text shown to the reviewer
///
/// Everything here is plain data so the view code stays a thin layout
/// over it.

use std::path::PathBuf;

use crate::images::queue::{AssembledQueue, QueueSource};
use crate::state::data::{ImageEntry, Rating};
use crate::state::session::{RateOutcome, RelocationStatus, ReviewSummary, UndoOutcome};

/// What the preview pane shows for the current image
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntry {
    pub path: PathBuf,
    pub rating: Rating,
    pub confidence_percent: String,
}

impl From<&ImageEntry> for DisplayEntry {
    fn from(entry: &ImageEntry) -> Self {
        Self {
            path: entry.path.clone(),
            rating: entry.rating,
            confidence_percent: confidence_percent(entry.confidence()),
        }
    }
}

impl DisplayEntry {
    /// Label under the image, e.g. "Rating: 7, Confidence: 83.4%"
    pub fn label(&self) -> String {
        format!("Rating: {}, Confidence: {}", self.rating, self.confidence_percent)
    }
}

/// Format a 0-1 probability as a percentage with one decimal
pub fn confidence_percent(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Status line after a successful load
pub fn loaded_message(queue: &AssembledQueue) -> String {
    let count = queue.entries.len();
    match queue.source {
        QueueSource::Directory => {
            format!("Loaded {} images from {}", count, queue.root.display())
        }
        QueueSource::Predictions => {
            let mut message = format!("Loaded {} predicted images", count);
            if !queue.unresolved.is_empty() {
                message.push_str(&format!(
                    ", {} not found under {}",
                    queue.unresolved.len(),
                    queue.root.display()
                ));
            }
            if !queue.duplicates.is_empty() {
                message.push_str(&format!(
                    ", listed more than once: {}",
                    queue.duplicates.join(", ")
                ));
            }
            message
        }
    }
}

/// Status line after a rating decision
pub fn rate_message(outcome: &RateOutcome) -> Option<String> {
    match &outcome.relocation {
        RelocationStatus::Unchanged => None,
        RelocationStatus::Moved(path) => Some(format!(
            "Image moved to folder: {}",
            path.parent().unwrap_or(path.as_path()).display()
        )),
        RelocationStatus::Failed(e) => Some(format!("Warning: {}", e)),
    }
}

pub fn undo_message(outcome: &UndoOutcome) -> String {
    match &outcome.warning {
        None => format!(
            "Undid rating of image {} (back to {})",
            outcome.index + 1,
            outcome.restored_rating
        ),
        Some(e) => format!(
            "Rating of image {} restored to {}, but {}",
            outcome.index + 1,
            outcome.restored_rating,
            e
        ),
    }
}

/// Notice shown once the reviewer moves past the last image
pub fn completion_message(summary: &ReviewSummary) -> String {
    format!(
        "Task Completed. All {} images have been analyzed ({} reclassified).",
        summary.total, summary.reclassified
    )
}
