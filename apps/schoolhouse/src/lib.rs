//! # Schoolhouse Library
//!
//! This library exposes the Schoolhouse modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;

// Re-export schoolhouse_core for convenience
pub use schoolhouse_core;

use schoolhouse_core::SchoolError;
use thiserror::Error;

/// Errors raised by the binary outside of request handling.
#[derive(Debug, Error)]
pub enum AppError {
    /// A domain operation failed.
    #[error(transparent)]
    School(#[from] SchoolError),

    /// The configuration file or environment is invalid.
    #[error("{0}")]
    Config(String),

    /// Binding or serving the HTTP listener failed.
    #[error("IO error: {0}")]
    Io(String),

    /// A command was called with unusable arguments.
    #[error("{0}")]
    Usage(String),
}
