//! Core functionality.

/// Configuration support
pub mod config;
