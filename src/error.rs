//! Binary Error Types
//!
//! Every failure that ends a run is raised into one of these kinds; the
//! underlying crate errors stay attached as children of the error tree.

use derive_more::{Display, Error};

/// A run error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for the binary.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Configuration could not be loaded or is invalid.
    #[display("configuration error")]
    Config,
    /// A collaborator (cache directory, browser, pdfcpu, HTTP client) could
    /// not be set up.
    #[display("could not set up {_0}")]
    Setup(#[error(not(source))] &'static str),
    /// The book could not be bound.
    #[display("could not bind the book")]
    Bind,
}
