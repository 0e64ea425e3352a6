//! Absolute page numbering for concatenated units.

use crate::error::{ErrorKind, Result};
use crate::models::{PageCount, PageRange};

/// Page count substituted when a collaborator cannot report one.
pub const FALLBACK_ITEM_PAGES: u32 = 1;

/// Assigns each `(title, pages)` unit its absolute, inclusive page span,
/// starting at `start` and packing units back to back.
///
/// This is the single source of truth for page numbers; the table of contents
/// and the bookmark outline are both derived from its output. A unit that
/// reports zero pages is a collaborator defect and is rejected.
///
/// ```
/// use bindery_book::paginate::accumulate;
/// let ranges = accumulate(3, [("Arrays", 1), ("Channels", 2), ("Goroutines", 1)]).unwrap();
/// let spans: Vec<_> = ranges.iter().map(|r| (r.from, r.thru)).collect();
/// assert_eq!(spans, [(3, 3), (4, 5), (6, 6)]);
/// ```
pub fn accumulate<T: AsRef<str>>(start: u32, units: impl IntoIterator<Item = (T, u32)>) -> Result<Vec<PageRange>> {
    let initial = (start, Vec::new());
    let (_, ranges) = units.into_iter().try_fold(initial, |(cursor, mut ranges), (title, pages)| -> Result<_> {
        let title = title.as_ref();
        if pages == 0 {
            exn::bail!(ErrorKind::EmptyRender(title.to_string()));
        }
        ranges.push(PageRange { title: title.to_string(), from: cursor, thru: cursor + pages - 1 });
        Ok((cursor + pages, ranges))
    })?;
    Ok(ranges)
}

impl PageCount {
    /// Resolves a measurement attempt into a page count, substituting `fallback`
    /// (and saying so in the logs) when the measurement failed.
    pub fn or_assume<E: std::fmt::Display>(measured: std::result::Result<u32, E>, fallback: u32, id: &str) -> Self {
        match measured {
            Ok(pages) => Self::Measured(pages),
            Err(e) => {
                tracing::warn!(id, error = %e, pages = fallback, "Could not determine page count; assuming fallback");
                Self::Assumed(fallback)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, &[1, 1, 1])]
    #[case(3, &[1, 2, 1])]
    #[case(5, &[4, 1, 7, 2, 2])]
    #[case(101, &[13])]
    fn test_ranges_follow_prefix_sums(#[case] start: u32, #[case] pages: &[u32]) {
        let units: Vec<_> = pages.iter().enumerate().map(|(i, p)| (format!("item {i}"), *p)).collect();
        let ranges = accumulate(start, units).unwrap();
        assert_eq!(ranges.len(), pages.len());
        for (k, range) in ranges.iter().enumerate() {
            let preceding: u32 = pages[..k].iter().sum();
            assert_eq!(range.from, start + preceding);
            assert_eq!(range.thru, range.from + pages[k] - 1);
            assert_eq!(range.title, format!("item {k}"));
        }
        for pair in ranges.windows(2) {
            assert_eq!(pair[1].from, pair[0].thru + 1);
        }
    }

    #[test]
    fn test_empty_input() {
        let ranges = accumulate::<&str>(3, []).unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_zero_pages_rejected() {
        let err = accumulate(1, [("Arrays", 1), ("Channels", 0)]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::EmptyRender(title) if title == "Channels"));
    }

    #[test]
    fn test_or_assume() {
        assert_eq!(PageCount::or_assume::<String>(Ok(4), 1, "arrays"), PageCount::Measured(4));
        assert_eq!(PageCount::or_assume(Err("unreadable"), 1, "arrays"), PageCount::Assumed(1));
    }
}
