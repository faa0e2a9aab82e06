use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// Converts a post's markdown body to HTML.
///
/// Headings are demoted by two levels so that they stay subordinate to both
/// the site title (h1) and the post title (h2): `#` becomes h3, and anything
/// that would fall past h6 is capped at h6.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options).map(demote_headings));
    out
}

fn demote_headings(ev: Event) -> Event {
    match ev {
        Event::Start(Tag::Heading(level)) => Event::Start(Tag::Heading((level + 2).min(6))),
        Event::End(Tag::Heading(level)) => Event::End(Tag::Heading((level + 2).min(6))),
        _ => ev,
    }
}
