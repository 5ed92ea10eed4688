/// Classifier prediction table
///
/// Reads the CSV exported by the pavement classifier. Only three columns
/// matter; anything else in the file is ignored:
/// - `Image Name`: file name of the image (no directory)
/// - `Prediction 1`: predicted rating, 1-10
/// - `Probability 1`: classifier confidence for that rating, 0-1

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::queue::LoadError;
use crate::state::data::Rating;

pub const IMAGE_NAME_COLUMN: &str = "Image Name";
pub const PREDICTION_COLUMN: &str = "Prediction 1";
pub const PROBABILITY_COLUMN: &str = "Probability 1";

const REQUIRED_COLUMNS: [&str; 3] = [IMAGE_NAME_COLUMN, PREDICTION_COLUMN, PROBABILITY_COLUMN];

/// Columns as they appear in the file, before coercion
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Image Name")]
    image_name: String,
    #[serde(rename = "Prediction 1")]
    prediction: String,
    #[serde(rename = "Probability 1")]
    probability: String,
}

/// One classifier prediction
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub image_name: String,
    pub rating: Rating,
    pub confidence: f64,
}

/// All predictions from one CSV, in file order
#[derive(Debug, Clone, Default)]
pub struct PredictionTable {
    rows: Vec<Prediction>,
    by_name: HashMap<String, usize>,
}

impl PredictionTable {
    /// Load a prediction table from a CSV file on disk
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path).map_err(|e| LoadError::Csv {
            reason: format!("{}: {}", path.display(), e),
        })?;
        let table = Self::from_reader(file)?;

        tracing::info!(path = %path.display(), rows = table.len(), "loaded prediction table");
        Ok(table)
    }

    /// Parse a prediction table, validating the header before any row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().map_err(csv_error)?.clone();
        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::InvalidSchema { missing });
        }

        let mut table = PredictionTable::default();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let raw: RawRow = record
                .deserialize(Some(&headers))
                .map_err(|e| LoadError::InvalidRow { line, reason: e.to_string() })?;

            let rating = parse_rating(&raw.prediction)
                .map_err(|reason| LoadError::InvalidRow { line, reason })?;
            let confidence = parse_confidence(&raw.probability)
                .map_err(|reason| LoadError::InvalidRow { line, reason })?;

            table.push(Prediction {
                image_name: raw.image_name,
                rating,
                confidence,
            });
        }

        Ok(table)
    }

    fn push(&mut self, prediction: Prediction) {
        self.by_name
            .entry(prediction.image_name.clone())
            .or_insert(self.rows.len());
        self.rows.push(prediction);
    }

    /// Rows in file order
    pub fn rows(&self) -> &[Prediction] {
        &self.rows
    }

    /// First row recorded for a file name
    pub fn lookup(&self, image_name: &str) -> Option<&Prediction> {
        self.by_name.get(image_name).map(|&i| &self.rows[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn csv_error(e: csv::Error) -> LoadError {
    LoadError::Csv { reason: e.to_string() }
}

/// Coerce numeric-like text ("7", "7.0") to a rating; fractions truncate
fn parse_rating(text: &str) -> Result<Rating, String> {
    let value = match text.parse::<i64>() {
        Ok(v) => v,
        Err(_) => match text.parse::<f64>() {
            Ok(v) if v.is_finite() => v.trunc() as i64,
            _ => return Err(format!("'{}' in {} is not a number", text, PREDICTION_COLUMN)),
        },
    };

    Rating::new(value).map_err(|e| format!("{} in {}", e, PREDICTION_COLUMN))
}

fn parse_confidence(text: &str) -> Result<f64, String> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && (0.0..=1.0).contains(&v) => Ok(v),
        Ok(v) => Err(format!("{} in {} is outside 0-1", v, PROBABILITY_COLUMN)),
        Err(_) => Err(format!("'{}' in {} is not a number", text, PROBABILITY_COLUMN)),
    }
}
