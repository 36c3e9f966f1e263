//! Process-level setup for the command-line tool.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
