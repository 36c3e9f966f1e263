//! Command-line application helpers.

pub mod shutdown;

// Re-export public API
pub use shutdown::shutdown_gracefully;
