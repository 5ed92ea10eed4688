/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - The review session controller (session.rs)
/// - Persisted reviewer preferences (settings.rs)

pub mod data;
pub mod session;
pub mod settings;
