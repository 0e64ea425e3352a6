//! HTML to PDF rendering through a headless Chrome/Chromium.

mod chrome;
pub mod error;
mod render;
mod style;

pub use crate::chrome::Chrome;
pub use crate::style::StyleConfig;

pub(crate) type TempFile = tempfile::NamedTempFile;

pub struct Renderer {
    chrome: Chrome,
    styles: StyleConfig,
}
impl Renderer {
    pub fn with_chrome(chrome: Chrome, styles: StyleConfig) -> Self {
        Self { chrome, styles }
    }
}
