//! Bookmark outline of the bound book.

use crate::models::{Bookmark, PageCount, PageRange};

/// Builds the outline: one entry spanning the front matter, then one entry
/// per item, numbered in book order (`"3. Goroutines"`).
///
/// `ranges` must already be numbered from the page after the front matter;
/// the item entries mirror them exactly, so the outline and the table of
/// contents can never disagree.
pub fn assemble(front_title: &str, front_pages: PageCount, ranges: &[PageRange]) -> Vec<Bookmark> {
    let front = Bookmark::new(front_title, 1, front_pages.get().max(1));
    let items = ranges
        .iter()
        .enumerate()
        .map(|(i, range)| Bookmark::new(format!("{}. {}", i + 1, range.title), range.from, range.thru));
    std::iter::once(front).chain(items).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::accumulate;

    #[test]
    fn test_outline_mirrors_ranges() {
        let ranges = accumulate(3, [("Arrays", 1), ("Channels", 2), ("Goroutines", 1)]).unwrap();
        let outline = assemble("Introduction & Table of Contents", PageCount::Measured(2), &ranges);
        assert_eq!(
            outline,
            [
                Bookmark::new("Introduction & Table of Contents", 1, 2),
                Bookmark::new("1. Arrays", 3, 3),
                Bookmark::new("2. Channels", 4, 5),
                Bookmark::new("3. Goroutines", 6, 6),
            ]
        );
    }

    #[test]
    fn test_outline_without_items() {
        let outline = assemble("Contents", PageCount::Assumed(2), &[]);
        assert_eq!(outline, [Bookmark::new("Contents", 1, 2)]);
    }
}
