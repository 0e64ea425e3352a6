use crate::error::{ErrorKind, Result};
use crate::{Renderer, TempFile};
use exn::ResultExt;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::instrument;

impl Renderer {
    /// Renders an HTML stream into a PDF at `save_to`.
    ///
    /// The document is copied to a temporary file on its way to Chrome, with
    /// a `<base>` element pointing at `base` (so relative stylesheets, scripts
    /// and images resolve there) and the configured stylesheets injected
    /// before the closing head tag.
    #[instrument(skip_all, fields(base = %base.as_ref().display(), save_to = %save_to.as_ref().display()))]
    pub fn render_to<R: Read>(&self, html: R, base: impl AsRef<Path>, save_to: impl AsRef<Path>) -> Result<()> {
        let input = self.persist_html(html, base.as_ref())?;
        self.chrome.execute(input.path(), save_to.as_ref())
    }

    pub fn render_slice_to(&self, html: &[u8], base: impl AsRef<Path>, save_to: impl AsRef<Path>) -> Result<()> {
        self.render_to(Cursor::new(html), base, save_to)
    }

    fn persist_html<R: Read>(&self, html: R, base: &Path) -> Result<TempFile> {
        let mut tmp = tempfile::Builder::new().suffix(".html").tempfile().or_raise(|| ErrorKind::Io)?;
        self.inject_head(html, &mut tmp, base)?;
        tmp.flush().or_raise(|| ErrorKind::Io)?;
        Ok(tmp)
    }

    /// Streams `html` into `out`, writing the `<base>` element and styles
    /// right before the first `</head` (matched case-insensitively). Returns
    /// whether the closing tag was found.
    fn inject_head<R: Read, W: Write>(&self, mut html: R, out: &mut W, base: &Path) -> Result<bool> {
        const NEEDLE: &[u8] = b"</head";
        const CARRY_SIZE: usize = NEEDLE.len() - 1;
        // Two pages in memory at a time.
        const BUFFER_CAPACITY: usize = 8192;
        const BUFFER_WINDOW: usize = BUFFER_CAPACITY - CARRY_SIZE;
        // Each read lands after the bytes carried over from the previous one,
        // so a needle split across two reads is still found. Only bytes that
        // cannot be the start of the needle are flushed before the next read.
        let mut buffer = vec![0; BUFFER_WINDOW + CARRY_SIZE];
        let mut carry: usize = 0;
        loop {
            let bytes = html.read(&mut buffer[carry..carry + BUFFER_WINDOW]).or_raise(|| ErrorKind::Io)?;
            if bytes == 0 {
                out.write_all(&buffer[..carry]).or_raise(|| ErrorKind::Io)?;
                break;
            }
            let filled = carry + bytes;
            if let Some(pos) = buffer[..filled].windows(NEEDLE.len()).position(|w| w.eq_ignore_ascii_case(NEEDLE)) {
                out.write_all(&buffer[..pos]).or_raise(|| ErrorKind::Io)?;
                let blocks = self.inject(out, base)?;
                out.write_all(&buffer[pos..filled]).or_raise(|| ErrorKind::Io)?;
                tracing::debug!(position = pos, blocks, "Base and stylesheets injected into HTML");
                std::io::copy(&mut html, out).or_raise(|| ErrorKind::Io)?;
                return Ok(true);
            }
            let safe = filled.saturating_sub(CARRY_SIZE);
            out.write_all(&buffer[..safe]).or_raise(|| ErrorKind::Io)?;
            buffer.copy_within(safe..filled, 0);
            carry = filled - safe;
        }
        tracing::warn!("Base and stylesheets not injected; closing head tag not found");
        Ok(false)
    }

    fn inject(&self, w: &mut impl Write, base: &Path) -> Result<usize> {
        let href = base.display().to_string();
        let href = href.trim_end_matches('/').replace('"', "%22");
        writeln!(w, "<base href=\"file://{href}/\">").or_raise(|| ErrorKind::Io)?;
        let blocks = self.styles.write_all_to(w).or_raise(|| ErrorKind::Io)?;
        Ok(blocks + 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::chrome::Chrome;
    use crate::{Renderer, StyleConfig};
    use rstest::rstest;
    use std::path::Path;

    fn renderer() -> Renderer {
        let styles = StyleConfig::new().with_content("pre { color: teal; }");
        Renderer::with_chrome(Chrome::Binary { path: "/bin/false".into() }, styles)
    }

    fn inject(html: &str) -> (bool, String) {
        let mut out = Vec::new();
        let found = renderer().inject_head(html.as_bytes(), &mut out, Path::new("/cache/store")).unwrap();
        (found, String::from_utf8(out).unwrap())
    }

    #[rstest]
    #[case::short("<html><head><title>x</title></head><body></body></html>")]
    #[case::uppercase("<HTML><HEAD></HEAD><BODY></BODY></HTML>")]
    #[case::straddles_buffer(&format!("<html><head>{}</head><body></body></html>", " ".repeat(8182)))]
    #[case::far_down(&format!("<html><head>{}</head><body>{}</body></html>", "x".repeat(20_000), "y".repeat(20_000)))]
    fn test_injected_before_closing_head(#[case] html: &str) {
        let (found, out) = inject(html);
        assert!(found);
        let base = out.find("<base href=\"file:///cache/store/\">").unwrap();
        let style = out.find("pre { color: teal; }").unwrap();
        let close = out.to_ascii_lowercase().find("</head").unwrap();
        assert!(base < style && style < close);
        // Nothing lost or duplicated.
        let injected = out.len() - html.len();
        assert_eq!(out.replacen(&out[base..base + injected], "", 1), html);
    }

    #[test]
    fn test_missing_head_passes_through() {
        let html = "<p>fragment</p>";
        let (found, out) = inject(html);
        assert!(!found);
        assert_eq!(out, html);
    }
}
