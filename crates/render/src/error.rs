//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("chrome/chromium not detected on your system")]
    ChromeNotFound,
    /// The configured browser path is not an executable file.
    #[display("chrome/chromium not found at {}", _0.display())]
    ChromeMissing(#[error(not(source))] PathBuf),
    /// Chrome exited with a non-zero exit code.
    /// An exit code of `-1` means Chrome was killed by a signal or claimed
    /// success without writing the output.
    #[display("Chrome exited with code: {_0}")]
    ChromeFailed(#[error(not(source))] i32),
    /// Asset was not loadable (either file or builtin).
    #[display("stylesheet not found: {_0}")]
    AssetNotFound(#[error(not(source))] String),
    #[display("I/O error")]
    Io,
}
