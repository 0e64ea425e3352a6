//! Collaborators backed by external tools: headless Chrome renders, pdfcpu
//! measures, merges and outlines. Both block, so every call runs on the
//! blocking thread pool.

use async_trait::async_trait;
use bindery_book::error::{ErrorKind, Result};
use bindery_book::models::Bookmark;
use bindery_book::{Bind, Render};
use bindery_pdf::Pdfcpu;
use bindery_render::Renderer;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

async fn blocking<T, E, F>(task: F, raise: impl FnOnce() -> ErrorKind) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, exn::Exn<E>> + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.or_raise(raise),
        Err(e) => Err(e).or_raise(raise),
    }
}

pub struct ChromeRender {
    renderer: Arc<Renderer>,
    pdfcpu: Pdfcpu,
}
impl ChromeRender {
    pub fn new(renderer: Renderer, pdfcpu: Pdfcpu) -> Self {
        Self { renderer: Arc::new(renderer), pdfcpu }
    }
}
#[async_trait]
impl Render for ChromeRender {
    async fn render(&self, document: &[u8], base: &Path, save_to: &Path) -> Result<()> {
        let renderer = Arc::clone(&self.renderer);
        let document = document.to_vec();
        let (base, target) = (base.to_path_buf(), save_to.to_path_buf());
        blocking(move || renderer.render_slice_to(&document, &base, &target), || {
            ErrorKind::Render(save_to.display().to_string())
        })
        .await
    }

    async fn measure(&self, artifact: &Path) -> Result<u32> {
        let pdfcpu = self.pdfcpu.clone();
        let path = artifact.to_path_buf();
        blocking(move || pdfcpu.page_count(&path), || ErrorKind::Render(artifact.display().to_string())).await
    }
}

pub struct PdfcpuBind {
    pdfcpu: Pdfcpu,
}
impl PdfcpuBind {
    pub fn new(pdfcpu: Pdfcpu) -> Self {
        Self { pdfcpu }
    }
}
#[async_trait]
impl Bind for PdfcpuBind {
    async fn merge(&self, artifacts: &[PathBuf], save_to: &Path) -> Result<()> {
        let pdfcpu = self.pdfcpu.clone();
        let (inputs, output) = (artifacts.to_vec(), save_to.to_path_buf());
        blocking(move || pdfcpu.merge(&inputs, &output), || ErrorKind::Merge).await
    }

    async fn apply_outline(&self, artifact: &Path, outline: &[Bookmark], save_to: &Path) -> Result<()> {
        let pdfcpu = self.pdfcpu.clone();
        let bookmarks: Vec<_> = outline.iter().map(|b| bindery_pdf::Bookmark::new(&b.title, b.from)).collect();
        let (input, output) = (artifact.to_path_buf(), save_to.to_path_buf());
        blocking(move || pdfcpu.import_bookmarks(&input, &bookmarks, &output), || ErrorKind::Outline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_pdf::error::ErrorKind as PdfErrorKind;
    use std::ops::Deref;

    #[tokio::test]
    async fn test_blocking_raises_into_book_error() {
        let err = blocking(|| -> bindery_pdf::error::Result<()> { exn::bail!(PdfErrorKind::NoInputs) }, || {
            ErrorKind::Merge
        })
        .await
        .unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Merge));
    }

    #[tokio::test]
    async fn test_blocking_passes_values_through() {
        let pages = blocking(|| bindery_pdf::error::Result::Ok(4_u32), || ErrorKind::Outline).await.unwrap();
        assert_eq!(pages, 4);
    }
}
