use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::data::{ImageEntry, InvalidRating, Navigation, Rating};
use crate::images::queue::AssembledQueue;
use crate::images::relocate::{FsRelocator, RelocateError, Relocator};

/// Precondition failures of session operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No images loaded")]
    EmptyQueue,
    #[error(transparent)]
    InvalidRating(#[from] InvalidRating),
}

/// What happened on disk as a result of a rating decision
#[derive(Debug, Clone, PartialEq)]
pub enum RelocationStatus {
    /// The rating did not change; nothing was moved
    Unchanged,
    /// The image now lives at this path
    Moved(PathBuf),
    /// The move failed; the rating is still committed in memory
    Failed(RelocateError),
}

/// Result of [`RatingSession::rate`]
#[derive(Debug, Clone, PartialEq)]
pub struct RateOutcome {
    pub navigation: Navigation,
    pub relocation: RelocationStatus,
}

impl RateOutcome {
    /// The non-fatal relocation failure, if any
    pub fn warning(&self) -> Option<&RelocateError> {
        match &self.relocation {
            RelocationStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of [`RatingSession::undo`]
#[derive(Debug, Clone, PartialEq)]
pub struct UndoOutcome {
    pub index: usize,
    pub restored_rating: Rating,
    /// Set when the file could not be moved back
    pub warning: Option<RelocateError>,
}

/// The last rating change, kept for a single undo step
#[derive(Debug, Clone)]
struct Decision {
    index: usize,
    previous_rating: Rating,
    previous_path: PathBuf,
}

/// Counts for the completion notice
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewSummary {
    pub total: usize,
    pub reclassified: usize,
    pub per_rating: BTreeMap<Rating, usize>,
}

/// State of one review pass over a queue of images
///
/// The session exclusively owns the queue and the cursor. Rating decisions
/// that change an entry's classification are mirrored on disk through the
/// relocator; queue positions never change, only paths.
pub struct RatingSession<R = FsRelocator> {
    root: PathBuf,
    queue: Vec<ImageEntry>,
    cursor: Option<usize>,
    last_decision: Option<Decision>,
    relocator: R,
}

impl RatingSession<FsRelocator> {
    /// Session over an assembled queue, moving files on the local filesystem
    pub fn new(root: PathBuf, queue: Vec<ImageEntry>) -> Self {
        Self::with_relocator(root, queue, FsRelocator)
    }

    /// Session with nothing loaded
    pub fn empty() -> Self {
        Self::new(PathBuf::new(), Vec::new())
    }
}

impl From<AssembledQueue> for RatingSession<FsRelocator> {
    fn from(assembled: AssembledQueue) -> Self {
        Self::new(assembled.root, assembled.entries)
    }
}

impl<R: Relocator> RatingSession<R> {
    pub fn with_relocator(root: PathBuf, queue: Vec<ImageEntry>, relocator: R) -> Self {
        let cursor = if queue.is_empty() { None } else { Some(0) };
        Self {
            root,
            queue,
            cursor,
            last_decision: None,
            relocator,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.queue
    }

    /// 1-based position of the cursor and the queue length
    pub fn position(&self) -> Option<(usize, usize)> {
        self.cursor.map(|i| (i + 1, self.queue.len()))
    }

    fn index(&self) -> Result<usize, SessionError> {
        self.cursor.ok_or(SessionError::EmptyQueue)
    }

    /// The entry under the cursor
    pub fn current(&self) -> Result<&ImageEntry, SessionError> {
        let index = self.index()?;
        Ok(&self.queue[index])
    }

    /// Move forward; `Completed` on the last entry, cursor unchanged
    pub fn next(&mut self) -> Result<Navigation, SessionError> {
        let index = self.index()?;
        if index + 1 < self.queue.len() {
            self.cursor = Some(index + 1);
            tracing::debug!(cursor = index + 1, "advanced");
            Ok(Navigation::Advanced)
        } else {
            tracing::debug!("end of queue reached");
            Ok(Navigation::Completed)
        }
    }

    /// Move backward; `AtStart` on the first entry, cursor unchanged
    pub fn previous(&mut self) -> Result<Navigation, SessionError> {
        let index = self.index()?;
        if index > 0 {
            self.cursor = Some(index - 1);
            tracing::debug!(cursor = index - 1, "moved back");
            Ok(Navigation::Advanced)
        } else {
            Ok(Navigation::AtStart)
        }
    }

    /// Record a rating for the current image and advance
    ///
    /// A changed rating is committed in memory first, then the file is
    /// moved into its rating folder. A failed move leaves the path alone and
    /// is returned as a warning. Rating always advances the cursor.
    pub fn rate(&mut self, value: i64) -> Result<RateOutcome, SessionError> {
        let rating = Rating::new(value)?;
        let index = self.index()?;

        let relocation = if self.queue[index].rating == rating {
            RelocationStatus::Unchanged
        } else {
            self.apply_rating(index, rating)
        };

        let navigation = self.next()?;
        Ok(RateOutcome { navigation, relocation })
    }

    fn apply_rating(&mut self, index: usize, rating: Rating) -> RelocationStatus {
        let entry = &mut self.queue[index];
        self.last_decision = Some(Decision {
            index,
            previous_rating: entry.rating,
            previous_path: entry.path.clone(),
        });

        tracing::info!(
            image = %entry.path.display(),
            from = %entry.rating,
            to = %rating,
            "rating changed"
        );
        entry.rating = rating;

        match self.relocator.relocate(&entry.path, rating, &self.root) {
            Ok(new_path) => {
                entry.path = new_path.clone();
                RelocationStatus::Moved(new_path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "relocation failed, rating kept in memory");
                RelocationStatus::Failed(e)
            }
        }
    }

    /// Revert the last rating change and return to that image
    ///
    /// Only one decision is remembered; it is consumed by the undo.
    pub fn undo(&mut self) -> Result<Option<UndoOutcome>, SessionError> {
        self.index()?;
        let Some(decision) = self.last_decision.take() else {
            return Ok(None);
        };

        let entry = &mut self.queue[decision.index];
        entry.rating = decision.previous_rating;

        let warning = match self.relocator.restore(&entry.path, &decision.previous_path) {
            Ok(()) => {
                entry.path = decision.previous_path;
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not restore image location");
                Some(e)
            }
        };

        self.cursor = Some(decision.index);
        tracing::info!(index = decision.index, rating = %entry.rating, "decision undone");

        Ok(Some(UndoOutcome {
            index: decision.index,
            restored_rating: entry.rating,
            warning,
        }))
    }

    /// True if there is a decision that [`undo`](Self::undo) would revert
    pub fn can_undo(&self) -> bool {
        self.last_decision.is_some()
    }

    pub fn summary(&self) -> ReviewSummary {
        let mut summary = ReviewSummary {
            total: self.queue.len(),
            ..ReviewSummary::default()
        };
        for entry in &self.queue {
            *summary.per_rating.entry(entry.rating).or_insert(0) += 1;
            if entry.is_reclassified() {
                summary.reclassified += 1;
            }
        }
        summary
    }
}

impl<R> std::fmt::Debug for RatingSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingSession")
            .field("root", &self.root)
            .field("len", &self.queue.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    /// Records calls instead of touching the disk
    #[derive(Default)]
    struct RecordingRelocator {
        calls: RefCell<Vec<(PathBuf, Rating)>>,
        fail: bool,
        fail_restore: bool,
    }

    impl Relocator for RecordingRelocator {
        fn relocate(&self, path: &Path, rating: Rating, root: &Path) -> Result<PathBuf, RelocateError> {
            self.calls.borrow_mut().push((path.to_path_buf(), rating));
            let destination = root.join(rating.folder_name()).join(path.file_name().unwrap());
            if self.fail {
                Err(RelocateError {
                    source_path: path.to_path_buf(),
                    destination,
                    reason: "permission denied".into(),
                })
            } else {
                Ok(destination)
            }
        }

        fn restore(&self, current: &Path, original: &Path) -> Result<(), RelocateError> {
            if self.fail_restore {
                Err(RelocateError {
                    source_path: current.to_path_buf(),
                    destination: original.to_path_buf(),
                    reason: "destination already exists".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn entries(names: &[&str]) -> Vec<ImageEntry> {
        names
            .iter()
            .map(|n| ImageEntry::unscored(PathBuf::from("/survey").join(n)))
            .collect()
    }

    fn recording(names: &[&str]) -> RatingSession<RecordingRelocator> {
        RatingSession::with_relocator(
            PathBuf::from("/survey"),
            entries(names),
            RecordingRelocator::default(),
        )
    }

    #[test]
    fn test_empty_session_rejects_everything() {
        let mut session = RatingSession::empty();
        assert!(session.is_empty());
        assert_eq!(session.cursor(), None);
        assert_eq!(session.position(), None);
        assert_eq!(session.current().unwrap_err(), SessionError::EmptyQueue);
        assert_eq!(session.next().unwrap_err(), SessionError::EmptyQueue);
        assert_eq!(session.previous().unwrap_err(), SessionError::EmptyQueue);
        assert_eq!(session.rate(3).unwrap_err(), SessionError::EmptyQueue);
        assert_eq!(session.undo().unwrap_err(), SessionError::EmptyQueue);
    }

    #[test]
    fn test_next_stops_at_last_entry() {
        let mut session = recording(&["a.jpg", "b.jpg"]);
        assert_eq!(session.next().unwrap(), Navigation::Advanced);
        assert_eq!(session.cursor(), Some(1));

        assert_eq!(session.next().unwrap(), Navigation::Completed);
        assert_eq!(session.next().unwrap(), Navigation::Completed);
        assert_eq!(session.cursor(), Some(1));

        // Still usable after completion
        assert_eq!(session.previous().unwrap(), Navigation::Advanced);
        assert_eq!(session.cursor(), Some(0));
    }

    #[test]
    fn test_previous_stops_at_start() {
        let mut session = recording(&["a.jpg", "b.jpg"]);
        assert_eq!(session.previous().unwrap(), Navigation::AtStart);
        assert_eq!(session.previous().unwrap(), Navigation::AtStart);
        assert_eq!(session.cursor(), Some(0));
    }

    #[test]
    fn test_position_is_one_based() {
        let mut session = recording(&["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(session.position(), Some((1, 3)));
        session.next().unwrap();
        assert_eq!(session.position(), Some((2, 3)));
    }

    #[test]
    fn test_rate_same_value_never_relocates() {
        let mut session = recording(&["a.jpg", "b.jpg"]);
        let outcome = session.rate(5).unwrap();

        assert_eq!(outcome.relocation, RelocationStatus::Unchanged);
        assert_eq!(outcome.navigation, Navigation::Advanced);
        assert!(session.relocator.calls.borrow().is_empty());
        assert_eq!(session.cursor(), Some(1));
        assert!(!session.can_undo());
    }

    #[test]
    fn test_rate_change_updates_rating_and_keeps_confidence() {
        let queue = vec![
            ImageEntry::predicted(PathBuf::from("/survey/a.jpg"), Rating::new(9).unwrap(), 0.8),
            ImageEntry::unscored(PathBuf::from("/survey/b.jpg")),
        ];
        let mut session =
            RatingSession::with_relocator(PathBuf::from("/survey"), queue, RecordingRelocator::default());

        let outcome = session.rate(3).unwrap();

        let entry = &session.entries()[0];
        assert_eq!(entry.rating.value(), 3);
        assert_eq!(entry.confidence(), 0.8);
        assert_eq!(entry.path, PathBuf::from("/survey/3/a.jpg"));
        assert_eq!(outcome.relocation, RelocationStatus::Moved(PathBuf::from("/survey/3/a.jpg")));
        assert_eq!(outcome.navigation, Navigation::Advanced);
        assert_eq!(
            *session.relocator.calls.borrow(),
            vec![(PathBuf::from("/survey/a.jpg"), Rating::new(3).unwrap())]
        );
    }

    #[test]
    fn test_rate_rejects_out_of_scale_values() {
        let mut session = recording(&["a.jpg"]);
        assert_eq!(
            session.rate(0).unwrap_err(),
            SessionError::InvalidRating(InvalidRating(0))
        );
        assert_eq!(
            session.rate(11).unwrap_err(),
            SessionError::InvalidRating(InvalidRating(11))
        );
        assert_eq!(session.current().unwrap().rating.value(), 5);
        assert!(session.relocator.calls.borrow().is_empty());
    }

    #[test]
    fn test_failed_relocation_keeps_rating_and_advances() {
        let mut session = RatingSession::with_relocator(
            PathBuf::from("/survey"),
            entries(&["a.jpg", "b.jpg"]),
            RecordingRelocator { fail: true, ..Default::default() },
        );

        let outcome = session.rate(2).unwrap();

        assert!(outcome.warning().is_some());
        assert_eq!(outcome.navigation, Navigation::Advanced);
        let entry = &session.entries()[0];
        assert_eq!(entry.rating.value(), 2);
        assert_eq!(entry.path, PathBuf::from("/survey/a.jpg"));
    }

    #[test]
    fn test_rate_last_entry_completes() {
        let mut session = recording(&["a.jpg"]);
        let outcome = session.rate(5).unwrap();

        assert_eq!(outcome.navigation, Navigation::Completed);
        assert_eq!(outcome.relocation, RelocationStatus::Unchanged);
        assert_eq!(session.current().unwrap().path, PathBuf::from("/survey/a.jpg"));
    }

    #[test]
    fn test_undo_reverts_last_decision() {
        let mut session = recording(&["a.jpg", "b.jpg", "c.jpg"]);
        session.rate(8).unwrap();
        assert_eq!(session.cursor(), Some(1));

        let undone = session.undo().unwrap().unwrap();

        assert_eq!(undone.index, 0);
        assert_eq!(undone.restored_rating.value(), 5);
        assert!(undone.warning.is_none());
        assert_eq!(session.cursor(), Some(0));
        let entry = session.current().unwrap();
        assert_eq!(entry.rating.value(), 5);
        assert_eq!(entry.path, PathBuf::from("/survey/a.jpg"));

        // Only one step is remembered
        assert_eq!(session.undo().unwrap(), None);
    }

    #[test]
    fn test_undo_with_failed_restore_keeps_moved_path() {
        let mut session = RatingSession::with_relocator(
            PathBuf::from("/survey"),
            entries(&["a.jpg", "b.jpg"]),
            RecordingRelocator { fail_restore: true, ..Default::default() },
        );
        session.rate(8).unwrap();

        let undone = session.undo().unwrap().unwrap();

        assert_eq!(undone.index, 0);
        assert_eq!(undone.restored_rating.value(), 5);
        let warning = undone.warning.unwrap();
        assert_eq!(warning.source_path, PathBuf::from("/survey/8/a.jpg"));
        assert_eq!(warning.destination, PathBuf::from("/survey/a.jpg"));

        assert_eq!(session.cursor(), Some(0));
        let entry = session.current().unwrap();
        assert_eq!(entry.rating.value(), 5);
        assert_eq!(entry.path, PathBuf::from("/survey/8/a.jpg"));
        assert!(!session.can_undo());
    }

    #[test]
    fn test_undo_without_decision_is_none() {
        let mut session = recording(&["a.jpg"]);
        assert_eq!(session.undo().unwrap(), None);
    }

    #[test]
    fn test_summary_counts_reclassified() {
        let mut session = recording(&["a.jpg", "b.jpg", "c.jpg"]);
        session.rate(8).unwrap();
        session.rate(5).unwrap();
        session.rate(2).unwrap();

        let summary = session.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.reclassified, 2);
        assert_eq!(summary.per_rating.get(&Rating::new(8).unwrap()), Some(&1));
        assert_eq!(summary.per_rating.get(&Rating::new(5).unwrap()), Some(&1));
        assert_eq!(summary.per_rating.get(&Rating::new(2).unwrap()), Some(&1));
    }

    #[test]
    fn test_rating_moves_file_and_previous_shows_new_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            fs::write(root.join(name), b"img").unwrap();
        }
        let assembled = crate::images::queue::assemble_from_directory(root).unwrap();
        let mut session = RatingSession::from(assembled);
        let first = session.current().unwrap().path.clone();

        let outcome = session.rate(8).unwrap();

        assert_eq!(outcome.navigation, Navigation::Advanced);
        assert_eq!(session.cursor(), Some(1));
        assert_eq!(session.previous().unwrap(), Navigation::Advanced);
        let entry = session.current().unwrap();
        let expected = root.join("8").join(first.file_name().unwrap());
        assert_eq!(entry.path, expected);
        assert!(expected.exists());
        assert!(!first.exists());
    }

    #[test]
    fn test_single_entry_same_rating_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("only.jpg");
        fs::write(&image, b"img").unwrap();
        let mut session = RatingSession::new(dir.path().to_path_buf(), vec![ImageEntry::unscored(image.clone())]);

        let outcome = session.rate(5).unwrap();

        assert_eq!(outcome.navigation, Navigation::Completed);
        assert_eq!(session.current().unwrap().path, image);
        assert!(image.exists());
        assert!(!dir.path().join("5").exists());
    }

    #[test]
    fn test_rerating_moves_between_buckets_and_undo_restores() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.jpg"), b"img").unwrap();
        fs::write(root.join("b.jpg"), b"img").unwrap();
        let mut session = RatingSession::new(root.to_path_buf(), entries_in(root, &["a.jpg", "b.jpg"]));

        session.rate(8).unwrap();
        session.previous().unwrap();
        session.rate(2).unwrap();
        assert!(root.join("2").join("a.jpg").exists());
        assert!(!root.join("8").join("a.jpg").exists());

        session.undo().unwrap().unwrap();
        assert_eq!(session.current().unwrap().rating.value(), 8);
        assert_eq!(session.current().unwrap().path, root.join("8").join("a.jpg"));
        assert!(root.join("8").join("a.jpg").exists());
    }

    fn entries_in(root: &Path, names: &[&str]) -> Vec<ImageEntry> {
        names.iter().map(|n| ImageEntry::unscored(root.join(n))).collect()
    }
}
