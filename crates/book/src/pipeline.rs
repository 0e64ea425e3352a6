//! Run orchestration.
//!
//! A run goes list → reconcile → materialise → sort → render/measure →
//! front matter → merge → outline. Failures that only cost one item (fetching
//! or rendering it) are logged and the item is skipped; everything from the
//! front matter onwards concerns the whole book and aborts the run, except
//! the outline, whose failure leaves an unlabelled but complete book.

use crate::collab::{Bind, Render, Source};
use crate::error::{ErrorKind, Result};
use crate::frontmatter::FrontMatter;
use crate::models::{Bookmark, Identity, ItemId, Listing, PageCount, PageRange};
use crate::outline;
use crate::paginate::FALLBACK_ITEM_PAGES;
use crate::reconcile::{Action, Inventory, Reconciler};
use crate::store::ArtifactStore;
use exn::ResultExt;
use futures::{StreamExt, stream};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Title of the bookmark covering the introduction and table of contents.
pub const DEFAULT_FRONT_MATTER_BOOKMARK: &str = "Introduction & Table of Contents";
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_POLITENESS: Duration = Duration::from_millis(100);

/// One item of the finished book.
#[derive(Clone, Debug)]
pub struct Chapter {
    pub identity: Identity,
    /// Display title, used for ordering, the table of contents and bookmarks.
    pub title: String,
    /// Rendered unit, retained in the store for the next run.
    pub artifact: PathBuf,
    pub pages: PageCount,
}

/// An item left out of the book, and why.
#[derive(Clone, Debug)]
pub struct Skipped {
    pub id: ItemId,
    pub reason: String,
}

/// Report of a completed run.
#[derive(Debug)]
pub struct Book {
    pub output: PathBuf,
    pub front_matter_pages: PageCount,
    /// Chapters in book order.
    pub chapters: Vec<Chapter>,
    pub ranges: Vec<PageRange>,
    pub bookmarks: Vec<Bookmark>,
    /// `false` when the outline could not be applied and the book was written
    /// without bookmarks.
    pub outlined: bool,
    pub skipped: Vec<Skipped>,
}
impl Book {
    /// Total number of pages, front matter included.
    pub fn pages(&self) -> u32 {
        self.ranges.last().map_or(self.front_matter_pages.get(), |range| range.thru)
    }
}

/// A document available on disk, about to be paginated.
struct Materialized {
    identity: Identity,
    title: String,
    document: Vec<u8>,
    render: bool,
}

pub struct Binder {
    store: ArtifactStore,
    reconciler: Reconciler,
    source: Arc<dyn Source>,
    render: Arc<dyn Render>,
    bind: Arc<dyn Bind>,
    front_matter: FrontMatter,
    front_matter_bookmark: String,
    concurrency: usize,
    politeness: Duration,
    assets: bool,
}
impl Binder {
    pub fn new(
        store: ArtifactStore,
        source: Arc<dyn Source>,
        render: Arc<dyn Render>,
        bind: Arc<dyn Bind>,
        front_matter: FrontMatter,
    ) -> Self {
        Self {
            store,
            reconciler: Reconciler::default(),
            source,
            render,
            bind,
            front_matter,
            front_matter_bookmark: DEFAULT_FRONT_MATTER_BOOKMARK.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            politeness: DEFAULT_POLITENESS,
            assets: true,
        }
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn with_front_matter_bookmark(mut self, title: impl Into<String>) -> Self {
        self.front_matter_bookmark = title.into();
        self
    }

    /// Maximum number of items rendered at once (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Pause after every document fetched from the source.
    pub fn with_politeness(mut self, politeness: Duration) -> Self {
        self.politeness = politeness;
        self
    }

    /// Whether to download the source's supporting assets into the store.
    pub fn with_assets(mut self, assets: bool) -> Self {
        self.assets = assets;
        self
    }

    /// Builds the book and writes it to `output`.
    #[instrument(skip_all, fields(output = %output.as_ref().display()))]
    pub async fn run(&self, output: impl AsRef<Path>) -> Result<Book> {
        let output = output.as_ref();
        let listings = self.source.list().await?;
        tracing::info!(items = listings.len(), "Source listed");
        if self.assets {
            self.download_assets().await;
        }

        let mut skipped = Vec::new();
        let mut items = self.materialize(&listings, &mut skipped).await?;
        // Stable: equal titles keep listing order.
        items.sort_by(|a, b| a.title.cmp(&b.title));

        let chapters = self.paginate(items, &mut skipped).await?;
        if chapters.is_empty() {
            exn::bail!(ErrorKind::NothingToBind);
        }

        // Dropped (and removed from disk) on every return path below.
        let scratch = tempfile::tempdir().map_err(ErrorKind::Io)?;
        let units: Vec<(String, u32)> = chapters.iter().map(|c| (c.title.clone(), c.pages.get())).collect();
        let resolved = self.front_matter.resolve(self.render.as_ref(), &units, self.store.root(), scratch.path()).await?;
        tracing::info!(pages = %resolved.pages, "Front matter resolved");

        let merged = scratch.path().join("merged.pdf");
        let artifacts: Vec<PathBuf> =
            std::iter::once(resolved.artifact.clone()).chain(chapters.iter().map(|c| c.artifact.clone())).collect();
        self.bind.merge(&artifacts, &merged).await.or_raise(|| ErrorKind::Merge)?;

        let bookmarks = outline::assemble(&self.front_matter_bookmark, resolved.pages, &resolved.ranges);
        let outlined = match self.bind.apply_outline(&merged, &bookmarks, output).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = ?e, "Could not apply the outline; writing the book without bookmarks");
                tokio::fs::copy(&merged, output).await.map_err(ErrorKind::Io)?;
                false
            },
        };

        let book = Book {
            output: output.to_path_buf(),
            front_matter_pages: resolved.pages,
            chapters,
            ranges: resolved.ranges,
            bookmarks,
            outlined,
            skipped,
        };
        tracing::info!(
            chapters = book.chapters.len(),
            skipped = book.skipped.len(),
            pages = book.pages(),
            outlined,
            "Book written"
        );
        Ok(book)
    }

    async fn download_assets(&self) {
        for asset in self.source.assets().await {
            if let Err(e) = self.store.write(&asset.name, &asset.data).await {
                tracing::warn!(asset = %asset.name, error = %e, "Could not store asset");
            }
        }
    }

    /// Makes every listed document available on disk, fetching only what the
    /// cache cannot provide. Failures confined to one item skip it; anything
    /// else (the store itself failing) ends the run.
    #[instrument(skip_all, fields(items = listings.len()))]
    async fn materialize(&self, listings: &[Listing], skipped: &mut Vec<Skipped>) -> Result<Vec<Materialized>> {
        let inventory = self.store.inventory().await;
        let mut items = Vec::with_capacity(listings.len());
        for listing in listings {
            let id = listing.id();
            match self.materialize_one(listing, &id, &inventory).await {
                Ok(item) => items.push(item),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(%id, error = %e, "Skipping item that could not be fetched");
                    skipped.push(Skipped { id, reason: e.to_string() });
                },
                Err(e) => return Err(e),
            }
        }
        Ok(items)
    }

    async fn materialize_one(&self, listing: &Listing, id: &ItemId, inventory: &Inventory) -> Result<Materialized> {
        let plan = self.reconciler.plan(id, inventory);
        if let Identity::Matched { legacy, similarity, .. } = &plan.identity {
            tracing::info!(%id, %legacy, similarity, "Adopting cached document with a similar name");
        }
        let cached = match plan.action {
            Action::Fetch => None,
            Action::Reuse | Action::Render => match self.store.read(plan.identity.storage_id().document()).await {
                Ok(document) => Some((plan.identity, document, plan.action == Action::Render)),
                Err(e) => {
                    tracing::warn!(%id, error = %e, "Cached document unreadable; fetching again");
                    None
                },
            },
        };
        let (identity, document, render) = match cached {
            Some(cached) => cached,
            None => (Identity::Canonical(id.clone()), self.fetch(listing, id).await?, true),
        };
        let title = match self.source.title(&document) {
            Some(title) => title,
            None if identity.is_matched() => identity.storage_id().to_string(),
            None => listing.title.clone(),
        };
        Ok(Materialized { identity, title, document, render })
    }

    async fn fetch(&self, listing: &Listing, id: &ItemId) -> Result<Vec<u8>> {
        let document = self.source.fetch(listing).await?;
        self.store.write(id.document(), &document).await?;
        tracing::debug!(%id, bytes = document.len(), "Fetched document");
        if !self.politeness.is_zero() {
            tokio::time::sleep(self.politeness).await;
        }
        Ok(document)
    }

    /// Renders (where needed) and measures every item, in order, with at most
    /// `concurrency` items in flight.
    #[instrument(skip_all, fields(items = items.len(), concurrency = self.concurrency))]
    async fn paginate(&self, items: Vec<Materialized>, skipped: &mut Vec<Skipped>) -> Result<Vec<Chapter>> {
        let results: Vec<_> = stream::iter(items)
            .map(|item| async move {
                let id = item.identity.canonical().clone();
                (id, self.paginate_one(item).await)
            })
            .buffered(self.concurrency)
            .collect()
            .await;
        let mut chapters = Vec::with_capacity(results.len());
        for (id, result) in results {
            match result {
                Ok(chapter) => chapters.push(chapter),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(%id, error = %e, "Skipping item that could not be rendered");
                    skipped.push(Skipped { id, reason: e.to_string() });
                },
                Err(e) => return Err(e),
            }
        }
        Ok(chapters)
    }

    async fn paginate_one(&self, item: Materialized) -> Result<Chapter> {
        let storage_id = item.identity.storage_id();
        let artifact = self.store.path_of(storage_id.artifact())?;
        if item.render {
            self.render.render(&item.document, self.store.root(), &artifact).await?;
            tracing::debug!(id = %storage_id, path = %artifact.display(), "Rendered");
        }
        let pages = match self.render.measure_pages(&artifact, storage_id.as_str()).await {
            Err(e) if matches!(e.deref(), ErrorKind::EmptyRender(_)) => return Err(e),
            measured => PageCount::or_assume(measured, FALLBACK_ITEM_PAGES, storage_id.as_str()),
        };
        Ok(Chapter { identity: item.identity, title: item.title, artifact, pages })
    }
}
