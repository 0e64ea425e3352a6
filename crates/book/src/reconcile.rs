//! Per-item cache reconciliation.
//!
//! Decides, without touching the disk, how much work an item needs given a
//! snapshot ([`Inventory`]) of the artifacts produced by earlier runs:
//!
//! 1. **Exact hit**: both `<id>.html` and `<id>.pdf` exist: reuse both.
//! 2. **Partial hit**: only `<id>.html` exists: render, skip the fetch.
//! 3. **Fuzzy hit**: another cached document's name is similar enough (see
//!    [`Matcher`]): adopt it under its own id, and reuse or render its PDF.
//! 4. **Miss**: fetch the document, then render it.
//!
//! Candidates are scanned in sorted order and the first acceptable one wins.

use crate::models::{ARTIFACT_EXTENSION, DOCUMENT_EXTENSION, Identity, ItemId};
use crate::naming::Matcher;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// What has to happen to an item before it can be paginated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Document and rendered unit are both cached.
    Reuse,
    /// Document is cached; the rendered unit must be produced.
    Render,
    /// Nothing usable is cached; fetch the document, then render it.
    Fetch,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub identity: Identity,
    pub action: Action,
}

/// Artifact ids present on disk, split by kind and kept sorted.
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    documents: BTreeSet<ItemId>,
    artifacts: BTreeSet<ItemId>,
}
impl Inventory {
    /// Classifies file names by extension; anything that is neither a
    /// document nor a rendered unit (stylesheets, images…) is ignored.
    pub fn from_names(names: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let mut inventory = Self::default();
        for name in names {
            let name = name.into();
            let (Some(stem), Some(extension)) = (name.file_stem(), name.extension()) else {
                continue;
            };
            let id = ItemId::from_stem(stem.to_string_lossy());
            match extension.to_string_lossy().to_ascii_lowercase().as_str() {
                DOCUMENT_EXTENSION => inventory.documents.insert(id),
                ARTIFACT_EXTENSION => inventory.artifacts.insert(id),
                _ => continue,
            };
        }
        inventory
    }

    pub fn has_document(&self, id: &ItemId) -> bool {
        self.documents.contains(id)
    }

    pub fn has_artifact(&self, id: &ItemId) -> bool {
        self.artifacts.contains(id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &ItemId> {
        self.documents.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.artifacts.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    matcher: Matcher,
}
impl Reconciler {
    pub fn new(matcher: Matcher) -> Self {
        Self { matcher }
    }

    pub fn plan(&self, canonical: &ItemId, inventory: &Inventory) -> Plan {
        if inventory.has_document(canonical) {
            let action = match inventory.has_artifact(canonical) {
                true => Action::Reuse,
                false => Action::Render,
            };
            return Plan { identity: Identity::Canonical(canonical.clone()), action };
        }
        let candidate = inventory.documents().find_map(|legacy| {
            self.matcher.matches(canonical.as_str(), legacy.as_str()).map(|similarity| (legacy, similarity))
        });
        match candidate {
            Some((legacy, similarity)) => {
                let action = match inventory.has_artifact(legacy) {
                    true => Action::Reuse,
                    false => Action::Render,
                };
                let identity = Identity::Matched { canonical: canonical.clone(), legacy: legacy.clone(), similarity };
                Plan { identity, action }
            },
            None => Plan { identity: Identity::Canonical(canonical.clone()), action: Action::Fetch },
        }
    }
}
