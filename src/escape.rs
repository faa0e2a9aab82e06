/// Escapes text for inclusion in HTML or XML element content and attribute
/// values.
pub fn html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_html_escapes_markup() {
        assert_eq!(
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;",
            html("<a href=\"x\">Tom & Jerry's</a>")
        );
    }

    #[test]
    fn test_html_leaves_plain_text() {
        assert_eq!("plain text", html("plain text"));
    }
}
