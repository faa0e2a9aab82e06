//! Turns titles into the human-readable part of post and tag URLs.

/// Converts `input` into a URL slug: lower-cased, stripped of everything
/// except ASCII letters, digits, hyphens and whitespace, with each run of
/// whitespace collapsed into a single hyphen. Slugs are cosmetic; the numeric
/// id in front of them is what routing actually looks up, so two titles may
/// share a slug.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| {
            c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || *c == '-'
                || c.is_whitespace()
        })
        .collect();
    kept.split_whitespace().collect::<Vec<&str>>().join("-")
}
