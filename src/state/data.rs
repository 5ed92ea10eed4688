/// Shared data structures for the review session
///
/// These structs represent the data model that flows between
/// the queue assembler, the session controller and the UI layer.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Raised when a value falls outside the 1..=10 rating scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rating {0} is outside the 1-10 scale")]
pub struct InvalidRating(pub i64);

/// A pavement condition rating on the fixed ordinal scale 1..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Rating given to images that have no classifier prediction
    pub const UNSCORED: Rating = Rating(5);

    /// Validate a raw value against the rating scale
    pub fn new(value: i64) -> Result<Self, InvalidRating> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(InvalidRating(value))
        }
    }

    /// Every rating on the scale, lowest first
    pub fn all() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).map(Rating)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Name of the bucket folder this rating maps to (e.g. "7")
    pub fn folder_name(self) -> String {
        self.0.to_string()
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::UNSCORED
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a single image under review
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    /// Current location on disk (changes when the image is relocated)
    pub path: PathBuf,
    /// Current authoritative rating (classifier prediction or human override)
    pub rating: Rating,
    /// Rating the entry was loaded with
    predicted: Rating,
    /// Classifier probability for the predicted rating, 0.0 when unscored
    confidence: f64,
}

impl ImageEntry {
    /// Entry backed by a classifier prediction
    pub fn predicted(path: PathBuf, rating: Rating, confidence: f64) -> Self {
        Self {
            path,
            rating,
            predicted: rating,
            confidence,
        }
    }

    /// Entry with no prediction: rating 5, confidence 0.0
    pub fn unscored(path: PathBuf) -> Self {
        Self::predicted(path, Rating::UNSCORED, 0.0)
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// The rating the entry carried when the queue was assembled
    pub fn initial_rating(&self) -> Rating {
        self.predicted
    }

    /// True once a reviewer decision moved the rating away from the prediction
    pub fn is_reclassified(&self) -> bool {
        self.rating != self.predicted
    }
}

/// Outcome of a cursor movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The cursor moved
    Advanced,
    /// Already on the last entry: every image has been reviewed
    Completed,
    /// Already on the first entry
    AtStart,
}
