//! Shared module - Common types used by every stage
//!
//! The program tree, source locations and diagnostics live here. Nothing in
//! this module knows about configuration or pipelines.

pub mod constants;
pub mod models;

// Re-exports for convenience
pub use models::*;
