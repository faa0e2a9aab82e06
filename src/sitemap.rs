//! Builds the XML sitemap: the front page, every post and every tag.

use crate::escape;
use crate::post::Post;
use crate::tag::Tag;
use std::fmt::Write;
use url::{ParseError, Url};

struct SitemapEntry {
    loc: String,
    last_modified: Option<String>,
}

/// Renders a sitemap for `home_page`, listing every post and tag without
/// pagination or filtering.
pub fn sitemap_xml(home_page: &Url, posts: &[Post], tags: &[Tag]) -> Result<String, ParseError> {
    let mut entries = vec![SitemapEntry {
        loc: home_page.to_string(),
        last_modified: posts.first().map(|p| p.created.format("%Y-%m-%d").to_string()),
    }];
    for post in posts {
        entries.push(SitemapEntry {
            loc: home_page.join(&post.absolute_url())?.to_string(),
            last_modified: Some(post.created.format("%Y-%m-%d").to_string()),
        });
    }
    for tag in tags {
        entries.push(SitemapEntry {
            loc: home_page.join(&tag.absolute_url())?.to_string(),
            last_modified: None,
        });
    }

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for entry in entries {
        xml.push_str("  <url>\n");
        let _ = writeln!(xml, "    <loc>{}</loc>", escape::html(&entry.loc));
        if let Some(lastmod) = entry.last_modified {
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", lastmod);
        }
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    Ok(xml)
}
