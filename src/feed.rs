//! Support for creating an RSS 2.0 feed from a list of posts.

use crate::post::Post;
use rss::{Channel, Error as RssError, Guid, Item};
use std::fmt;
use std::io::Write;
use url::{ParseError, Url};

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,

    /// The blog's root URL, e.g. `http://example.org/`. Post links are
    /// resolved against it.
    pub home_page: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`Post`]s (newest first) and writes the result to a [`std::io::Write`].
pub fn write_feed<W: Write>(config: FeedConfig, posts: &[Post], w: W) -> Result<()> {
    feed(config, posts)?.write_to(w)?;
    Ok(())
}

/// Builds the channel. Its `pubDate` is the creation time of the newest post;
/// a blog without posts gets a channel with no items and no `pubDate`.
fn feed(config: FeedConfig, posts: &[Post]) -> Result<Channel> {
    let mut channel = Channel::default();
    channel.set_title(config.title.clone());
    channel.set_link(config.home_page.to_string());
    channel.set_description(config.title);
    channel.set_pub_date(posts.first().map(|p| p.created.to_rfc2822()));
    channel.set_items(feed_items(&config.home_page, posts)?);
    Ok(channel)
}

fn feed_items(home_page: &Url, posts: &[Post]) -> Result<Vec<Item>> {
    let mut items: Vec<Item> = Vec::with_capacity(posts.len());
    for post in posts {
        let link = home_page.join(&post.absolute_url())?.to_string();

        let mut guid = Guid::default();
        guid.set_value(link.clone());
        guid.set_permalink(true);

        let mut item = Item::default();
        item.set_title(post.title.clone());
        item.set_link(link);
        item.set_description(crate::markdown::to_html(&post.body));
        item.set_categories(
            post.tags
                .iter()
                .map(|t| {
                    let mut category = rss::Category::default();
                    category.set_name(t.clone());
                    category
                })
                .collect::<Vec<_>>(),
        );
        item.set_pub_date(post.created.to_rfc2822());
        item.set_guid(guid);
        items.push(item);
    }
    Ok(items)
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is an RSS serialization error.
    Rss(RssError),

    /// Returned when a post URL can't be resolved against the home page.
    UrlParse(ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Rss(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Rss(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<RssError> for Error {
    /// Converts [`RssError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: RssError) -> Error {
        Error::Rss(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator when joining URLs.
    fn from(err: ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{DateTime, Utc};

    fn config() -> FeedConfig {
        FeedConfig {
            title: String::from("My Blog"),
            home_page: Url::parse("http://example.org/").unwrap(),
        }
    }

    fn post(id: u64, title: &str, created: &str) -> Post {
        Post {
            id,
            title: title.to_owned(),
            body: String::from("Some *text*"),
            tags: vec![String::from("rust")],
            created: DateTime::parse_from_rfc3339(created)
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn render(posts: &[Post]) -> Result<String> {
        let mut out: Vec<u8> = Vec::new();
        write_feed(config(), posts, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_feed_uses_newest_post_date() -> Result<()> {
        let posts = vec![
            post(2, "Newer", "2021-04-17T10:00:00Z"),
            post(1, "Older", "2021-04-16T10:00:00Z"),
        ];
        let channel = feed(config(), &posts)?;
        assert_eq!(Some("Sat, 17 Apr 2021 10:00:00 +0000"), channel.pub_date());
        assert_eq!(2, channel.items().len());
        assert_eq!(
            Some("http://example.org/posts/2-newer"),
            channel.items()[0].link()
        );
        Ok(())
    }

    #[test]
    fn test_empty_feed_has_no_pub_date() -> Result<()> {
        let channel = feed(config(), &[])?;
        assert_eq!(None, channel.pub_date());
        assert!(channel.items().is_empty());

        let xml = render(&[])?;
        assert!(xml.contains("<rss"));
        assert!(!xml.contains("<pubDate>"));
        assert!(!xml.contains("<item>"));
        Ok(())
    }

    #[test]
    fn test_feed_xml_contains_items() -> Result<()> {
        let xml = render(&[post(5, "Hello", "2021-04-16T10:00:00Z")])?;
        assert!(xml.contains("<title>Hello</title>"));
        assert!(xml.contains("<link>http://example.org/posts/5-hello</link>"));
        assert!(xml.contains("<category>rust</category>"));
        Ok(())
    }
}
