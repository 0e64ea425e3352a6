//! PDF Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A PDF error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for PDF operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("pdfcpu not detected on your system")]
    ToolNotFound,
    /// The configured pdfcpu path is not an executable file.
    #[display("pdfcpu not found at {}", _0.display())]
    ToolMissing(#[error(not(source))] PathBuf),
    /// pdfcpu exited unsuccessfully; carries its exit code (`-1` when killed
    /// by a signal) and the last line it printed.
    #[display("pdfcpu {command} failed with code {code}: {message}")]
    ToolFailed { command: &'static str, code: i32, message: String },
    /// pdfcpu reported something that could not be understood.
    #[display("unexpected pdfcpu output: {_0}")]
    Unexpected(#[error(not(source))] String),
    /// Nothing to merge.
    #[display("no documents to merge")]
    NoInputs,
    #[display("I/O error")]
    Io,
}
