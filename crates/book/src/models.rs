//! Book models.
//!
//! Identifiers, identities and the page arithmetic types shared by every stage
//! of the pipeline. Everything here is immutable once built: each recomputation
//! produces a fresh set of ranges and bookmarks.

use crate::naming;
use derive_more::Display;
use std::path::PathBuf;

/// A sanitized, storage-safe item identifier (e.g. `hello_world`).
#[derive(Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(String);
impl ItemId {
    /// Derives the canonical identifier from a source name.
    pub fn from_name(name: impl AsRef<str>) -> Self {
        Self(naming::sanitize(name.as_ref()))
    }

    /// Wraps an identifier discovered on disk verbatim (file stem of a cached
    /// artifact). No sanitization is applied; the artifact already exists
    /// under this name.
    pub fn from_stem(stem: impl Into<String>) -> Self {
        Self(stem.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the intermediate (HTML) artifact.
    pub fn document(&self) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.0, DOCUMENT_EXTENSION))
    }

    /// File name of the final (PDF) artifact.
    pub fn artifact(&self) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.0, ARTIFACT_EXTENSION))
    }
}
impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub const DOCUMENT_EXTENSION: &str = "html";
pub const ARTIFACT_EXTENSION: &str = "pdf";

/// One entry of the source's item list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    /// Name as known to the source (used when fetching).
    pub name: String,
    /// Human title reported by the source listing.
    pub title: String,
}
impl Listing {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { title: name.clone(), name }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn id(&self) -> ItemId {
        ItemId::from_name(&self.name)
    }
}

/// Which identity an item was materialised under.
///
/// Downstream consumers always know whether on-disk artifacts belong to the
/// canonical id or to a previously cached, fuzzily matched one.
#[derive(Clone, Debug, PartialEq)]
pub enum Identity {
    /// Artifacts live under the source-derived id.
    Canonical(ItemId),
    /// Artifacts of an earlier run were adopted under their own id.
    Matched { canonical: ItemId, legacy: ItemId, similarity: f64 },
}
impl Identity {
    /// The id derived from the source listing.
    pub fn canonical(&self) -> &ItemId {
        match self {
            Self::Canonical(id) => id,
            Self::Matched { canonical, .. } => canonical,
        }
    }

    /// The id whose artifacts are read and written on disk.
    pub fn storage_id(&self) -> &ItemId {
        match self {
            Self::Canonical(id) => id,
            Self::Matched { legacy, .. } => legacy,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Page count of a rendered unit.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum PageCount {
    /// Reported by the measuring collaborator.
    #[display("{_0}")]
    Measured(u32),
    /// Substituted because the real count could not be discovered.
    #[display("{_0} (assumed)")]
    Assumed(u32),
}
impl PageCount {
    pub fn get(self) -> u32 {
        match self {
            Self::Measured(n) | Self::Assumed(n) => n,
        }
    }

    pub fn is_assumed(self) -> bool {
        matches!(self, Self::Assumed(_))
    }
}

/// Absolute, 1-based inclusive page span of one unit in the bound book.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRange {
    pub title: String,
    pub from: u32,
    pub thru: u32,
}
impl PageRange {
    pub fn pages(&self) -> u32 {
        self.thru - self.from + 1
    }
}

/// A named page range exposed for reader navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bookmark {
    pub title: String,
    pub from: u32,
    pub thru: u32,
}
impl Bookmark {
    pub fn new(title: impl Into<String>, from: u32, thru: u32) -> Self {
        Self { title: title.into(), from, thru }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ids() {
        let canonical = ItemId::from_name("hello_world_example");
        let legacy = ItemId::from_stem("hello-world");
        let identity = Identity::Matched { canonical: canonical.clone(), legacy: legacy.clone(), similarity: 1.0 };
        assert_eq!(identity.canonical(), &canonical);
        assert_eq!(identity.storage_id(), &legacy);
        assert!(identity.is_matched());
        let identity = Identity::Canonical(canonical.clone());
        assert_eq!(identity.storage_id(), &canonical);
        assert!(!identity.is_matched());
    }

    #[test]
    fn test_artifact_names() {
        let id = ItemId::from_name("Hello World");
        assert_eq!(id.document(), PathBuf::from("hello_world.html"));
        assert_eq!(id.artifact(), PathBuf::from("hello_world.pdf"));
    }

    #[test]
    fn test_page_count() {
        assert_eq!(PageCount::Measured(3).get(), 3);
        assert!(PageCount::Assumed(1).is_assumed());
        assert_eq!(PageCount::Assumed(1).to_string(), "1 (assumed)");
        let range = PageRange { title: "Channels".into(), from: 4, thru: 5 };
        assert_eq!(range.pages(), 2);
    }
}
