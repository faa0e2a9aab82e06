//! Page arithmetic for post listings, plus the page-link markup shown under
//! each listing.

use crate::escape;
use std::fmt::Write;

/// A resolved position inside a paginated listing. Construction never fails:
/// a requested page outside `1..=total_pages` is clamped into range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// The current page, 1-indexed.
    pub page: usize,

    /// The number of pages; at least 1 even for an empty listing.
    pub total_pages: usize,

    /// The number of items per page.
    pub page_size: usize,
}

impl Pagination {
    /// Builds a [`Pagination`] for `total_items` items split into pages of
    /// `page_size`. `requested` is the page the client asked for; `None`
    /// selects the first page.
    pub fn new(total_items: usize, page_size: usize, requested: Option<usize>) -> Pagination {
        let page_size = page_size.max(1);
        let total_pages = match total_items % page_size {
            0 => total_items / page_size,
            _ => total_items / page_size + 1,
        }
        .max(1);
        Pagination {
            page: requested.unwrap_or(1).max(1).min(total_pages),
            total_pages,
            page_size,
        }
    }

    /// The index of the first item on the current page.
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }

    /// Renders the page links for a listing served at `path`. Listings with a
    /// single page get no links at all. The current page is plain text; every
    /// other page links to `{path}?page={n}`.
    pub fn links(&self, path: &str) -> String {
        if self.total_pages < 2 {
            return String::new();
        }

        let path = escape::html(path);
        let mut out = String::from("<ul class=\"pages\">");
        for p in 1..=self.total_pages {
            if p == self.page {
                let _ = write!(out, "<li>Page {}</li>", p);
            } else {
                let _ = write!(out, "<li><a href=\"{}?page={}\">Page {}</a></li>", path, p, p);
            }
        }
        out.push_str("</ul>");
        out
    }
}

/// Parses the raw `page` query parameter. Anything that isn't a positive
/// integer falls back to the first page.
pub fn parse_page(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(3, Pagination::new(12, 5, None).total_pages);
        assert_eq!(2, Pagination::new(10, 5, None).total_pages);
        assert_eq!(1, Pagination::new(1, 5, None).total_pages);
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let p = Pagination::new(0, 5, Some(3));
        assert_eq!(1, p.total_pages);
        assert_eq!(1, p.page);
        assert_eq!(0, p.offset());
    }

    #[test]
    fn test_offsets() {
        assert_eq!(0, Pagination::new(12, 5, Some(1)).offset());
        assert_eq!(5, Pagination::new(12, 5, Some(2)).offset());
        assert_eq!(10, Pagination::new(12, 5, Some(3)).offset());
    }

    #[test]
    fn test_out_of_range_page_is_clamped() {
        assert_eq!(3, Pagination::new(12, 5, Some(5)).page);
        assert_eq!(1, Pagination::new(12, 5, Some(0)).page);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(Some(2), parse_page(Some("2")));
        assert_eq!(None, parse_page(Some("two")));
        assert_eq!(None, parse_page(Some("-1")));
        assert_eq!(None, parse_page(None));
    }

    #[test]
    fn test_links_empty_for_single_page() {
        assert_eq!("", Pagination::new(3, 5, None).links("/"));
    }

    #[test]
    fn test_links_current_page_is_plain_text() {
        let links = Pagination::new(6, 5, Some(1)).links("/tags/1-rust");
        assert_eq!(
            "<ul class=\"pages\"><li>Page 1</li>\
             <li><a href=\"/tags/1-rust?page=2\">Page 2</a></li></ul>",
            links
        );
        assert_eq!(1, links.matches("<a ").count());
        assert_eq!(2, links.matches("<li>").count());
    }
}
