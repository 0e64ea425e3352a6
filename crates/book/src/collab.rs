//! Collaborator seams.
//!
//! The pipeline never fetches, renders or writes PDF structures itself; it
//! drives these traits. The binary wires them to HTTP, headless Chrome and
//! `pdfcpu`, tests wire them to in-memory fakes.

use crate::error::{ErrorKind, Result};
use crate::models::{Bookmark, Listing};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A supporting file (stylesheet, script, image) referenced by documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub data: Vec<u8>,
}

/// Where documents come from.
#[async_trait]
pub trait Source: Send + Sync {
    /// Every document the book should contain. Failure aborts the run.
    async fn list(&self) -> Result<Vec<Listing>>;

    /// Raw content of one document. Failure skips that document only.
    async fn fetch(&self, listing: &Listing) -> Result<Vec<u8>>;

    /// Supporting files to place next to the documents. Best effort: sources
    /// log their own failures and return whatever they could retrieve.
    async fn assets(&self) -> Vec<Asset> {
        Vec::new()
    }

    /// Display title embedded in a document, if the source knows how to find it.
    fn title(&self, _document: &[u8]) -> Option<String> {
        None
    }
}

/// Turns documents into paginated artifacts.
#[async_trait]
pub trait Render: Send + Sync {
    /// Renders `document` into an artifact at `save_to`. Relative references
    /// inside the document resolve against the `base` directory.
    async fn render(&self, document: &[u8], base: &Path, save_to: &Path) -> Result<()>;

    /// Number of pages in a rendered artifact.
    async fn measure(&self, artifact: &Path) -> Result<u32>;

    /// [`measure`](Self::measure), rejecting artifacts that report no pages.
    async fn measure_pages(&self, artifact: &Path, label: &str) -> Result<u32> {
        match self.measure(artifact).await? {
            0 => exn::bail!(ErrorKind::EmptyRender(label.to_string())),
            pages => Ok(pages),
        }
    }
}

/// Combines artifacts into the finished book.
#[async_trait]
pub trait Bind: Send + Sync {
    /// Concatenates `artifacts`, in order, into `save_to`.
    async fn merge(&self, artifacts: &[PathBuf], save_to: &Path) -> Result<()>;

    /// Writes `outline` into a copy of `artifact` saved at `save_to`.
    async fn apply_outline(&self, artifact: &Path, outline: &[Bookmark], save_to: &Path) -> Result<()>;
}
