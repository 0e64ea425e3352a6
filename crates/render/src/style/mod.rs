//! CSS style management for rendered documents.
//!
//! Styles are assembled through [`StyleConfig`]'s builder API, combining
//! compile-time embedded builtins (see [`StyleConfig::list_builtins`]) with
//! user-provided files or raw CSS content. All styles are read eagerly at
//! construction time so that missing files fail fast rather than at render time.

mod assets;

use crate::error::{ErrorKind, Result};
use crate::style::assets::Builtins;
use exn::ResultExt;
use std::borrow::Cow;
use std::{fs::File, path::Path};
use std::{io::Read, io::Write};

enum Style {
    Builtin(Cow<'static, [u8]>),
    // Styles are constructed once per run and needed for every document, so
    // file contents are read up front.
    UserContent(String),
}
impl Style {
    fn write_all_to(&self, w: &mut impl Write) -> std::io::Result<()> {
        let content = match self {
            Self::Builtin(content) => content.as_ref(),
            Self::UserContent(content) => content.as_bytes(),
        };
        w.write_all(b"<style>")?;
        w.write_all(content)?;
        w.write_all(b"</style>\n")
    }
}

/// An ordered collection of CSS stylesheets to inject into rendered documents.
///
/// Styles are applied in insertion order; later styles override earlier ones.
/// Use the builder methods to compose builtins, files, and raw CSS content.
///
/// # Example
///
/// ```no_run
/// use bindery_render::StyleConfig;
/// # use bindery_render::error::Result;
///
/// # fn get_styles() -> Result<StyleConfig> {
/// let styles = StyleConfig::new()
///     .with_builtin("print.css")?
///     .with_file("/path/to/custom.css")?;
/// # Ok(styles)
/// # }
/// ```
#[derive(Default)]
pub struct StyleConfig {
    styles: Vec<Style>,
}
impl StyleConfig {
    /// Creates an empty style configuration with no stylesheets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names of all embedded builtin stylesheets (e.g. `"print.css"`).
    pub fn list_builtins() -> Vec<Cow<'static, str>> {
        assets::Builtins::list()
    }

    /// Appends a builtin stylesheet by name.
    ///
    /// Returns [`ErrorKind::AssetNotFound`](crate::error::ErrorKind::AssetNotFound)
    /// if `name` does not match any embedded asset. Use [`list_builtins()`](Self::list_builtins)
    /// to discover available names.
    pub fn with_builtin(mut self, name: impl AsRef<str>) -> Result<Self> {
        self.styles.push(Style::Builtin(Builtins::load(name)?));
        Ok(self)
    }

    /// Appends a stylesheet read from a file on disk.
    ///
    /// The file is read immediately so that missing or unreadable files
    /// surface as errors during construction rather than at render time.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            exn::bail!(ErrorKind::AssetNotFound(path.display().to_string()));
        }
        let mut file = File::open(path).or_raise(|| ErrorKind::Io)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf).or_raise(|| ErrorKind::Io)?;
        self.styles.push(Style::UserContent(buf));
        Ok(self)
    }

    /// Appends raw CSS content as a stylesheet.
    #[cfg(test)]
    pub(crate) fn with_content(mut self, content: impl Into<String>) -> Self {
        self.styles.push(Style::UserContent(content.into()));
        self
    }

    pub(crate) fn write_all_to(&self, w: &mut impl Write) -> std::io::Result<usize> {
        for style in &self.styles {
            style.write_all_to(w)?;
        }
        Ok(self.styles.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_styles_written_in_order() {
        let styles = StyleConfig::new().with_builtin("print.css").unwrap().with_content("body { color: red; }");
        let mut out = Vec::new();
        assert_eq!(styles.write_all_to(&mut out).unwrap(), 2);
        let out = String::from_utf8(out).unwrap();
        let builtin = out.find("@page").unwrap();
        let custom = out.find("color: red").unwrap();
        assert!(builtin < custom);
        assert_eq!(out.matches("<style>").count(), 2);
    }

    #[test]
    fn test_unknown_builtin() {
        let err = StyleConfig::new().with_builtin("missing.css").err().unwrap();
        assert!(matches!(&*err, ErrorKind::AssetNotFound(name) if name == "builtin:missing.css"));
    }

    #[test]
    fn test_file_styles_read_eagerly() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "h1 {{ margin: 0; }}").unwrap();
        let styles = StyleConfig::new().with_file(file.path()).unwrap();
        drop(file);
        let mut out = Vec::new();
        styles.write_all_to(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("h1 { margin: 0; }"));
        assert!(StyleConfig::new().with_file("/no/such/file.css").is_err());
    }
}
