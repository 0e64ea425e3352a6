//! Front matter (introduction + table of contents) and its fixed-point sizing.
//!
//! The table of contents lists the first page of every item, but those page
//! numbers depend on how long the front matter itself turns out to be. The
//! length only depends on the *number* of entries, not on the numbers printed,
//! so two passes settle it:
//!
//! 1. render with placeholder numbers (`accumulate(1, …)`) and measure `F`;
//! 2. render again with the real numbers (`accumulate(F + 1, …)`), keep it.
//!
//! Both passes go through [`FrontMatter::pass`] so that only the starting page
//! differs between them.

use crate::collab::Render;
use crate::error::{Error, ErrorKind, Result};
use crate::models::{PageCount, PageRange};
use crate::paginate::accumulate;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::instrument;
use upon::{Engine, Template};

/// Template used when no custom front matter template is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/front-matter.html");
/// Front matter length assumed when the placeholder pass cannot be measured.
pub const FALLBACK_FRONT_MATTER_PAGES: u32 = 2;
const LABEL: &str = "front-matter";

/// A compiled front matter template plus the text it is filled with.
///
/// Templates are compiled on construction so that syntax errors surface before
/// any rendering happens. Available variables: `title`, `subtitle`, `intro`
/// and `entries` (a list of `{ ordinal, title, page }`). Text is passed through
/// unchanged; templates escape it with the `escape` formatter
/// (`{{ entry.title|escape }}`).
pub struct FrontMatter {
    engine: Engine<'static>,
    template: Template<'static>,
    title: String,
    subtitle: Option<String>,
    intro: Option<String>,
}
impl FromStr for FrontMatter {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        let template = engine.compile(s.to_string()).or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, template, title: String::new(), subtitle: None, intro: None })
    }
}

/// The settled front matter.
#[derive(Debug)]
pub struct Resolved {
    /// Length of the retained front matter artifact.
    pub pages: PageCount,
    /// The retained (second pass) artifact.
    pub artifact: PathBuf,
    /// Item ranges, numbered from the page after the front matter.
    pub ranges: Vec<PageRange>,
}

impl FrontMatter {
    /// Front matter built from [`DEFAULT_TEMPLATE`].
    pub fn builtin(title: impl Into<String>) -> Result<Self> {
        Ok(DEFAULT_TEMPLATE.parse::<Self>()?.with_title(title))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<Option<String>>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_intro(mut self, intro: impl Into<Option<String>>) -> Self {
        self.intro = intro.into();
        self
    }

    /// Fills the template with one table of contents entry per range.
    pub fn html(&self, ranges: &[PageRange]) -> Result<String> {
        let entries: Vec<upon::Value> = ranges
            .iter()
            .enumerate()
            .map(|(i, range)| {
                upon::value! {
                    ordinal: (i as u64) + 1,
                    title: &range.title,
                    page: u64::from(range.from),
                }
            })
            .collect();
        let parameters = upon::value! {
            title: &self.title,
            subtitle: self.subtitle.as_deref(),
            intro: self.intro.as_deref(),
            entries: upon::Value::List(entries),
        };
        self.template.render(&self.engine, parameters).to_string().or_raise(|| ErrorKind::Template)
    }

    /// Settles the front matter length and renders the final front matter
    /// into `scratch`. `units` are the `(title, pages)` pairs of the items,
    /// in book order; `base` is where relative references resolve.
    #[instrument(skip_all, fields(items = units.len()))]
    pub async fn resolve(&self, render: &dyn Render, units: &[(String, u32)], base: &Path, scratch: &Path) -> Result<Resolved> {
        let placeholder = scratch.join(format!("{LABEL}.placeholder.pdf"));
        let measured = match self.pass(render, units, 1, base, &placeholder).await {
            Ok(_) => render.measure_pages(&placeholder, LABEL).await,
            Err(e) => Err(e),
        };
        let assumed = PageCount::or_assume(measured, FALLBACK_FRONT_MATTER_PAGES, LABEL);
        if let Err(e) = tokio::fs::remove_file(&placeholder).await {
            tracing::debug!(path = %placeholder.display(), error = %e, "Placeholder front matter not removed");
        }
        tracing::debug!(pages = %assumed, "Front matter placeholder measured");

        let artifact = scratch.join(format!("{LABEL}.pdf"));
        let start = assumed.get() + 1;
        let ranges = self.pass(render, units, start, base, &artifact).await.or_raise(|| ErrorKind::FrontMatter)?;
        let (pages, ranges) = match render.measure_pages(&artifact, LABEL).await {
            Ok(actual) if actual == assumed.get() => (PageCount::Measured(actual), ranges),
            Ok(actual) => {
                // Printed numbers are now off; keep the outline truthful at least.
                tracing::warn!(expected = assumed.get(), actual, "Front matter length changed between passes");
                (PageCount::Measured(actual), accumulate(actual + 1, units.iter().map(|(t, p)| (t, *p)))?)
            },
            Err(e) => {
                tracing::warn!(error = %e, pages = %assumed, "Final front matter could not be measured");
                (assumed, ranges)
            },
        };
        Ok(Resolved { pages, artifact, ranges })
    }

    async fn pass(
        &self,
        render: &dyn Render,
        units: &[(String, u32)],
        start: u32,
        base: &Path,
        save_to: &Path,
    ) -> Result<Vec<PageRange>> {
        let ranges = accumulate(start, units.iter().map(|(title, pages)| (title, *pages)))?;
        let html = self.html(&ranges)?;
        render.render(html.as_bytes(), base, save_to).await?;
        Ok(ranges)
    }
}

/// Template formatters for HTML output.
mod addons {
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    /// Escapes the characters that are significant in HTML text and attribute
    /// values; anything that is not a string is formatted as usual.
    fn escape_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => {
                for c in s.chars() {
                    match c {
                        '&' => f.write_str("&amp;")?,
                        '<' => f.write_str("&lt;")?,
                        '>' => f.write_str("&gt;")?,
                        '"' => f.write_str("&quot;")?,
                        '\'' => f.write_str("&#39;")?,
                        c => f.write_char(c)?,
                    }
                }
            },
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("escape", escape_formatter);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fake renderer: an artifact's page count is derived from the number of
    /// table of contents entries (or a fixed count for anything else), and
    /// rendering writes the document verbatim so tests can inspect it.
    ///
    /// `extra_pages` adds pages to artifacts with a given file name; `delays`
    /// holds back documents containing a needle before they are written.
    #[derive(Default)]
    pub(crate) struct FakeRender {
        pub entries_per_page: u32,
        pub fail_on: Vec<&'static str>,
        pub unmeasurable: bool,
        pub extra_pages: Vec<(&'static str, u32)>,
        pub delays: Vec<(&'static str, Duration)>,
        pub pages: Mutex<HashMap<PathBuf, u32>>,
        pub rendered: Mutex<Vec<PathBuf>>,
    }
    impl FakeRender {
        pub(crate) fn new(entries_per_page: u32) -> Self {
            Self { entries_per_page, ..Self::default() }
        }
    }
    #[async_trait]
    impl Render for FakeRender {
        async fn render(&self, document: &[u8], _base: &Path, save_to: &Path) -> Result<()> {
            let text = String::from_utf8_lossy(document);
            if self.fail_on.iter().any(|needle| text.contains(needle)) {
                exn::bail!(ErrorKind::Render(format!("refusing {}", save_to.display())));
            }
            let pages = match text.matches("<li>").count() as u32 {
                0 => text.matches("<section>").count().max(1) as u32,
                entries => 1 + entries.div_ceil(self.entries_per_page.max(1)),
            };
            let extra: u32 = self
                .extra_pages
                .iter()
                .filter(|(name, _)| save_to.file_name().is_some_and(|f| f == *name))
                .map(|(_, extra)| extra)
                .sum();
            if let Some((_, delay)) = self.delays.iter().find(|(needle, _)| text.contains(needle)) {
                tokio::time::sleep(*delay).await;
            }
            let pages = pages + extra;
            tokio::fs::write(save_to, document).await.map_err(ErrorKind::Io)?;
            self.pages.lock().unwrap().insert(save_to.to_path_buf(), pages);
            self.rendered.lock().unwrap().push(save_to.to_path_buf());
            Ok(())
        }

        async fn measure(&self, artifact: &Path) -> Result<u32> {
            if self.unmeasurable {
                exn::bail!(ErrorKind::Render("no page count".into()));
            }
            let pages = self.pages.lock().unwrap().get(artifact).copied();
            match pages {
                Some(pages) => Ok(pages),
                None => exn::bail!(ErrorKind::NotFound(artifact.to_path_buf())),
            }
        }
    }

    fn units() -> Vec<(String, u32)> {
        vec![("Arrays".into(), 1), ("Channels".into(), 2), ("Goroutines".into(), 1)]
    }

    #[test]
    fn test_builtin_template_compiles() {
        let front = FrontMatter::builtin("Go by Example").unwrap();
        let ranges = accumulate(3, [("Arrays", 1), ("Channels & Select", 2)]).unwrap();
        let html = front.with_subtitle(Some("Sub".to_string())).html(&ranges).unwrap();
        assert!(html.contains("<title>Go by Example</title>"));
        assert!(html.contains("1. Arrays"));
        assert!(html.contains("2. Channels &amp; Select"));
        assert!(html.contains("#page=4"));
        assert!(html.contains("<h2>Sub</h2>"));
    }

    #[test]
    fn test_invalid_template_fails_fast() {
        let err = "{% for entry in %}".parse::<FrontMatter>().err().unwrap();
        assert!(matches!(&*err, ErrorKind::Template));
    }

    #[tokio::test]
    async fn test_two_pass_resolution() {
        let scratch = tempfile::tempdir().unwrap();
        let render = FakeRender::new(3);
        let front = FrontMatter::builtin("Go by Example").unwrap();
        let resolved = front.resolve(&render, &units(), scratch.path(), scratch.path()).await.unwrap();
        assert_eq!(resolved.pages, PageCount::Measured(2));
        let spans: Vec<_> = resolved.ranges.iter().map(|r| (r.title.as_str(), r.from, r.thru)).collect();
        assert_eq!(spans, [("Arrays", 3, 3), ("Channels", 4, 5), ("Goroutines", 6, 6)]);
        assert_eq!(resolved.artifact, scratch.path().join("front-matter.pdf"));
        assert!(resolved.artifact.exists());
        // Placeholder rendered first, then discarded.
        let rendered = render.rendered.lock().unwrap().clone();
        assert_eq!(rendered.len(), 2);
        assert!(!rendered[0].exists());
        let retained = std::fs::read_to_string(&resolved.artifact).unwrap();
        assert!(retained.contains("#page=3") && retained.contains("#page=6"));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let scratch = tempfile::tempdir().unwrap();
        let render = FakeRender::new(2);
        let front = FrontMatter::builtin("Book").unwrap();
        let first = front.resolve(&render, &units(), scratch.path(), scratch.path()).await.unwrap();
        let second = front.resolve(&render, &units(), scratch.path(), scratch.path()).await.unwrap();
        assert_eq!(first.pages, second.pages);
        assert_eq!(first.ranges, second.ranges);
    }

    #[tokio::test]
    async fn test_final_pass_longer_than_placeholder() {
        let scratch = tempfile::tempdir().unwrap();
        let render = FakeRender { extra_pages: vec![("front-matter.pdf", 1)], ..FakeRender::new(3) };
        let front = FrontMatter::builtin("Go by Example").unwrap();
        let resolved = front.resolve(&render, &units(), scratch.path(), scratch.path()).await.unwrap();
        // Placeholder measured 2 pages, the retained front matter 3.
        assert_eq!(resolved.pages, PageCount::Measured(3));
        let spans: Vec<_> = resolved.ranges.iter().map(|r| (r.title.as_str(), r.from, r.thru)).collect();
        assert_eq!(spans, [("Arrays", 4, 4), ("Channels", 5, 6), ("Goroutines", 7, 7)]);
    }

    #[tokio::test]
    async fn test_unmeasurable_front_matter_assumes_fallback() {
        let scratch = tempfile::tempdir().unwrap();
        let render = FakeRender { unmeasurable: true, ..FakeRender::new(3) };
        let front = FrontMatter::builtin("Book").unwrap();
        let resolved = front.resolve(&render, &units(), scratch.path(), scratch.path()).await.unwrap();
        assert_eq!(resolved.pages, PageCount::Assumed(FALLBACK_FRONT_MATTER_PAGES));
        assert_eq!(resolved.ranges[0].from, FALLBACK_FRONT_MATTER_PAGES + 1);
    }

    #[tokio::test]
    async fn test_final_render_failure_is_fatal() {
        let scratch = tempfile::tempdir().unwrap();
        let render = FakeRender { fail_on: vec!["Table of Contents"], ..FakeRender::new(3) };
        let front = FrontMatter::builtin("Book").unwrap();
        let err = front.resolve(&render, &units(), scratch.path(), scratch.path()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::FrontMatter));
    }

    #[test]
    fn test_escape_formatter() {
        let front = "{{ title|escape }}".parse::<FrontMatter>().unwrap().with_title(r#"<a href="x">'&'</a>"#);
        let html = front.html(&[]).unwrap();
        assert_eq!(html, "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_unescaped_values_pass_through() {
        let front = "{{ title }}".parse::<FrontMatter>().unwrap().with_title("<b>Bold</b>");
        assert_eq!(front.html(&[]).unwrap(), "<b>Bold</b>");
    }

    #[test]
    fn test_builtin_template_escapes_text() {
        let front = FrontMatter::builtin("Tips & <Tricks>").unwrap().with_intro(Some("Use \"bookmarks\"".to_string()));
        let ranges = accumulate(3, [("Channels & Select", 2)]).unwrap();
        let html = front.html(&ranges).unwrap();
        assert!(html.contains("<title>Tips &amp; &lt;Tricks&gt;</title>"));
        assert!(html.contains("Use &quot;bookmarks&quot;"));
        assert!(html.contains("1. Channels &amp; Select"));
    }
}
