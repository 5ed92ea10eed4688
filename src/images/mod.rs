/// Image file handling module
///
/// This module handles:
/// - Finding images under a folder (discovery.rs)
/// - Reading classifier predictions from CSV (predictions.rs)
/// - Building the review queue (queue.rs)
/// - Moving rated images into rating folders (relocate.rs)

pub mod discovery;
pub mod predictions;
pub mod queue;
pub mod relocate;
