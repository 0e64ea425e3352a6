//! Book Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Collaborator failures (fetching,
//! rendering, merging, outlining) are raised into one of the variants below so
//! that the pipeline can decide whether a failure costs one item or the run.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A book error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for book operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// ### Per-item (recoverable)
/// - [`ErrorKind::Network`]
/// - [`ErrorKind::Render`]
///
/// ### Run-level
/// - [`ErrorKind::Merge`] is fatal.
/// - [`ErrorKind::Outline`] degrades to an unlabelled book.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The source could not list or deliver a document.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// A document could not be rendered or measured.
    #[display("render error: {_0}")]
    Render(#[error(not(source))] String),
    /// Rendered units could not be concatenated.
    #[display("merge error")]
    Merge,
    /// The outline could not be written into the merged artifact.
    #[display("outline error")]
    Outline,
    /// A rendered unit reported zero pages.
    #[display("'{_0}' rendered to zero pages")]
    EmptyRender(#[error(not(source))] String),
    /// The front matter could not be produced.
    #[display("front matter could not be rendered")]
    FrontMatter,
    /// The front matter template is invalid or failed to render.
    #[display("front matter template error")]
    Template,
    /// Every item was skipped; there is nothing to bind.
    #[display("no items survived fetching and rendering")]
    NothingToBind,
    /// File does not exist in the artifact store.
    #[display("artifact not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied while touching the artifact store.
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Path contains invalid characters or escapes the store root.
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if the failure only costs a single item (or a cosmetic
    /// feature) rather than the whole run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Render(_) | Self::EmptyRender(_) | Self::Outline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Network("timeout".into()), true)]
    #[case(ErrorKind::Render("chrome crashed".into()), true)]
    #[case(ErrorKind::EmptyRender("Arrays".into()), true)]
    #[case(ErrorKind::Outline, true)]
    #[case(ErrorKind::PermissionDenied("/cache/arrays.html".into()), false)]
    #[case(ErrorKind::Merge, false)]
    #[case(ErrorKind::FrontMatter, false)]
    #[case(ErrorKind::NothingToBind, false)]
    fn test_recoverable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_recoverable(), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::EmptyRender("Arrays".into()).to_string(), "'Arrays' rendered to zero pages");
        assert_eq!(ErrorKind::Merge.to_string(), "merge error");
    }
}
