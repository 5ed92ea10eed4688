/// Presentation helpers
///
/// - Reviewer-facing text (display.rs)
/// - Rating button colors (style.rs)

pub mod display;
pub mod style;
