use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

// GitHub renders directory pages client-side from this JSON blob.
selector!(EMBEDDED_DATA_SELECTOR, r#"script[type="application/json"][data-target="react-app.embeddedData"]"#);
selector!(TITLE_SELECTOR, "title");

pub const DEFAULT_LISTING_URL: &str = "https://github.com/mmcgrana/gobyexample/tree/master/public";
pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com/mmcgrana/gobyexample/master/public";
pub const DEFAULT_TITLE_PREFIX: &str = "Go by Example: ";
pub const DEFAULT_ASSETS: [&str; 4] = ["site.css", "site.js", "play.png", "clipboard.png"];
/// Listing entries with these suffixes are site assets, not documents.
pub(crate) const EXCLUDED_SUFFIXES: [&str; 5] = [".html", ".js", ".css", ".png", ".ico"];
