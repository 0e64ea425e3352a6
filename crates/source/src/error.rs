//! Source Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A source error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The HTTP client could not be constructed.
    #[display("HTTP client could not be initialised")]
    Client,
    /// The request failed or the server answered with an error status.
    #[display("request to {_0} failed")]
    Request(#[error(not(source))] String),
    /// The directory page no longer embeds the file listing.
    #[display("directory listing not found in page")]
    MissingListing,
    /// The embedded file listing could not be parsed.
    #[display("directory listing could not be parsed")]
    InvalidListing,
}
