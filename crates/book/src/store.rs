//! Directory-backed artifact store.
//!
//! Intermediate documents (`<id>.html`), rendered units (`<id>.pdf`) and the
//! site assets they reference all live side by side in one flat directory, so
//! relative links inside cached documents keep resolving between runs.

use crate::error::{ErrorKind, Result};
use crate::reconcile::Inventory;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::instrument;

#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}
impl ArtifactStore {
    /// Opens (and creates, if missing) the store rooted at an absolute path.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Happens once per run; not worth an async constructor.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a store-relative path, refusing anything that would
    /// escape the root.
    pub fn path_of(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        Ok(self.root.join(validate(relative.as_ref())?))
    }

    pub async fn read(&self, relative: impl AsRef<Path>) -> Result<Vec<u8>> {
        let relative = relative.as_ref();
        let path = self.path_of(relative)?;
        Ok(fs::read(&path).await.map_err(|e| Self::map_io_error(e, relative))?)
    }

    pub async fn write(&self, relative: impl AsRef<Path>, data: &[u8]) -> Result<()> {
        let relative = relative.as_ref();
        let path = self.path_of(relative)?;
        Ok(fs::write(&path, data).await.map_err(|e| Self::map_io_error(e, relative))?)
    }

    /// File names directly inside the root, sorted so that every scan over
    /// them is reproducible.
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(&self.root).await.map_err(|e| Self::map_io_error(e, &self.root))?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Self::map_io_error(e, &self.root))? {
            let is_file = entry.file_type().await.map_err(ErrorKind::Io)?.is_file();
            if is_file {
                names.push(PathBuf::from(entry.file_name()));
            }
        }
        names.sort();
        Ok(names)
    }

    /// Snapshot of the artifacts already materialised on disk.
    ///
    /// Reuse is an optimisation: a listing failure is logged and treated as an
    /// empty cache rather than an error.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn inventory(&self) -> Inventory {
        match self.list().await {
            Ok(names) => Inventory::from_names(names),
            Err(e) => {
                tracing::warn!(error = %e, "Could not list cached artifacts; treating cache as empty");
                Inventory::default()
            },
        }
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }
}

/// Normalizes a store-relative path. Parent references may not climb above the
/// root, null bytes and platform prefixes are rejected, and an empty result is
/// invalid.
fn validate(path: &Path) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // in the underlying syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}
