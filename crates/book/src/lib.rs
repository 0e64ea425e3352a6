//! Binding independently rendered documents into one navigable book.
//!
//! The crate owns the bookkeeping: which cached artifacts can be reused, which
//! absolute pages every item lands on once concatenated, how long the front
//! matter is, and the bookmark outline. Fetching, rendering and PDF surgery are
//! delegated to the [`Source`], [`Render`] and [`Bind`] collaborators.

mod collab;
pub mod error;
pub mod frontmatter;
pub mod models;
pub mod naming;
pub mod outline;
pub mod paginate;
mod pipeline;
pub mod reconcile;
mod store;

pub use crate::collab::{Asset, Bind, Render, Source};
pub use crate::frontmatter::FrontMatter;
pub use crate::naming::Matcher;
pub use crate::pipeline::{
    Binder, Book, Chapter, DEFAULT_CONCURRENCY, DEFAULT_FRONT_MATTER_BOOKMARK, DEFAULT_POLITENESS, Skipped,
};
pub use crate::reconcile::Reconciler;
pub use crate::store::ArtifactStore;
