//! Where the documents of a book come from.

mod consts;
pub mod error;
mod github;

pub use crate::consts::{DEFAULT_ASSETS, DEFAULT_LISTING_URL, DEFAULT_RAW_BASE_URL, DEFAULT_TITLE_PREFIX};
pub use crate::github::{GithubSource, document_title};
