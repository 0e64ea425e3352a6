//! Layered configuration.
//!
//! Values are resolved from, lowest to highest precedence:
//!
//! 1. built-in defaults ([`Config::default`]);
//! 2. a TOML file: the path given explicitly, otherwise `bindery.toml` in the
//!    platform configuration directory when it exists;
//! 3. environment variables prefixed with `BINDERY_`, where `__` separates
//!    nested keys (`BINDERY_MATCHING__THRESHOLD=0.8`).
//!
//! Command line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use bindery_book::naming::{DEFAULT_STOPWORDS, DEFAULT_THRESHOLD};
use bindery_book::{DEFAULT_CONCURRENCY, DEFAULT_FRONT_MATTER_BOOKMARK, DEFAULT_POLITENESS};
use bindery_source::{DEFAULT_ASSETS, DEFAULT_LISTING_URL, DEFAULT_RAW_BASE_URL, DEFAULT_TITLE_PREFIX};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const FILE_NAME: &str = "bindery.toml";
pub const ENV_PREFIX: &str = "BINDERY_";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding fetched documents, rendered units and site assets
    /// between runs.
    pub cache_dir: PathBuf,
    /// Where the finished book is written.
    pub output: PathBuf,
    /// Maximum number of documents rendered at once.
    pub concurrency: usize,
    /// Pause after each document downloaded, in milliseconds.
    pub politeness_ms: u64,
    /// Download the source's stylesheets, scripts and images.
    pub assets: bool,
    pub matching: Matching,
    pub book: Book,
    pub source: Source,
    pub tools: Tools,
    pub render: Render,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("files"),
            output: PathBuf::from("go_by_example_complete.pdf"),
            concurrency: DEFAULT_CONCURRENCY,
            politeness_ms: u64::try_from(DEFAULT_POLITENESS.as_millis()).unwrap_or(u64::MAX),
            assets: true,
            matching: Matching::default(),
            book: Book::default(),
            source: Source::default(),
            tools: Tools::default(),
            render: Render::default(),
        }
    }
}

/// Fuzzy matching of cached documents against listed names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Matching {
    /// Minimum Jaccard similarity, in `(0, 1]`.
    pub threshold: f64,
    /// Tokens ignored when comparing names.
    pub stopwords: Vec<String>,
}
impl Default for Matching {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD, stopwords: DEFAULT_STOPWORDS.iter().map(ToString::to_string).collect() }
    }
}

/// Front matter text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    pub title: String,
    pub subtitle: Option<String>,
    pub intro: Option<String>,
    /// Title of the outline entry covering the front matter.
    pub front_matter_bookmark: String,
    /// Custom front matter template replacing the built-in one.
    pub template: Option<PathBuf>,
}
impl Default for Book {
    fn default() -> Self {
        Self {
            title: "Go by Example".to_string(),
            subtitle: Some("Famously published at https://gobyexample.com".to_string()),
            intro: Some(
                "Use your PDF viewer's bookmark panel to navigate between examples. The bookmarks provide \
                 clickable links to jump directly to each Go programming example."
                    .to_string(),
            ),
            front_matter_bookmark: DEFAULT_FRONT_MATTER_BOOKMARK.to_string(),
            template: None,
        }
    }
}

/// Where documents are listed and downloaded from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    pub listing_url: String,
    pub raw_base_url: String,
    /// Stripped from document titles; empty to keep titles unchanged.
    pub title_prefix: String,
    pub assets: Vec<String>,
}
impl Default for Source {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            raw_base_url: DEFAULT_RAW_BASE_URL.to_string(),
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
            assets: DEFAULT_ASSETS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Explicit locations of external tools; discovered on `PATH` when unset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub chrome: Option<PathBuf>,
    pub pdfcpu: Option<PathBuf>,
}

/// Stylesheets injected into every rendered document, in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Render {
    /// Names of built-in stylesheets.
    pub styles: Vec<String>,
    /// Additional stylesheets read from disk.
    pub stylesheets: Vec<PathBuf>,
}
impl Default for Render {
    fn default() -> Self {
        Self { styles: vec!["print.css".to_string()], stylesheets: Vec::new() }
    }
}

impl Config {
    /// Default location of the configuration file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "bindery").map(|dirs| dirs.config_dir().join(FILE_NAME))
    }

    /// The provider stack without extracting it.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.is_file()) {
                    tracing::debug!(path = %path.display(), "Using configuration file");
                    figment = figment.merge(Toml::file(path));
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads and validates the configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.matching.threshold > 0.0 && self.matching.threshold <= 1.0) {
            exn::bail!(ErrorKind::Invalid("matching.threshold"));
        }
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("concurrency"));
        }
        if self.book.title.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("book.title"));
        }
        if self.output.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("output"));
        }
        Ok(())
    }

    pub fn politeness(&self) -> Duration {
        Duration::from_millis(self.politeness_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.matching.stopwords, ["go", "by", "example"]);
        assert_eq!(config.politeness(), Duration::from_millis(100));
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                    concurrency = 2
                    output = "book.pdf"

                    [matching]
                    threshold = 0.5

                    [book]
                    title = "Rust by Example"

                    [tools]
                    pdfcpu = "/opt/pdfcpu/bin/pdfcpu"
                "#,
            )?;
            jail.set_env("BINDERY_CONCURRENCY", "8");
            jail.set_env("BINDERY_BOOK__SUBTITLE", "Second edition");
            let config = Config::load(Some(Path::new("custom.toml"))).unwrap();
            assert_eq!(config.concurrency, 8);
            assert_eq!(config.output, PathBuf::from("book.pdf"));
            assert_eq!(config.matching.threshold, 0.5);
            assert_eq!(config.matching.stopwords, ["go", "by", "example"]);
            assert_eq!(config.book.title, "Rust by Example");
            assert_eq!(config.book.subtitle.as_deref(), Some("Second edition"));
            assert_eq!(config.tools.pdfcpu, Some(PathBuf::from("/opt/pdfcpu/bin/pdfcpu")));
            assert_eq!(config.source, Source::default());
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/definitely/not/bindery.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_malformed_value() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", r#"concurrency = "lots""#)?;
            let err = Config::load(Some(Path::new("bad.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load));
            Ok(())
        });
    }

    #[rstest]
    #[case::zero_threshold(|c: &mut Config| c.matching.threshold = 0.0, "matching.threshold")]
    #[case::large_threshold(|c: &mut Config| c.matching.threshold = 1.5, "matching.threshold")]
    #[case::no_concurrency(|c: &mut Config| c.concurrency = 0, "concurrency")]
    #[case::blank_title(|c: &mut Config| c.book.title = "  ".into(), "book.title")]
    fn test_validation(#[case] change: fn(&mut Config), #[case] field: &str) {
        let mut config = Config::default();
        change(&mut config);
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(f) if *f == field));
    }
}
