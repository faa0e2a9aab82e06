//! Defines the [`Tag`] type, the denormalized per-title post count shown in
//! the sidebar and linked to from the sitemap.

use crate::escape;
use crate::slug::slugify;
use gtmpl::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A materialized tag. Tags are never written by the post editor; they are
/// created, recounted and deleted only by
/// [`crate::reconcile::reconcile_tags`], so between a post edit and the next
/// reconciliation the counts may lag behind the posts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Assigned by the store on insert.
    pub id: u64,

    /// The tag title. It is matched case-sensitively against
    /// [`crate::post::Post::tags`] entries.
    pub title: String,

    /// How many posts carried this title at the last reconciliation. A
    /// reconciled tag never has a count of zero.
    pub posts_count: u64,
}

impl Tag {
    /// The URL of the tag's listing, e.g. `/tags/3-rust`.
    pub fn absolute_url(&self) -> String {
        format!("/tags/{}-{}", self.id, slugify(&self.title))
    }

    /// Orders tags for display: most used first, then alphabetically.
    pub fn display_order(a: &Tag, b: &Tag) -> Ordering {
        b.posts_count
            .cmp(&a.posts_count)
            .then_with(|| a.title.cmp(&b.title))
    }
}

impl From<&Tag> for Value {
    /// Converts [`Tag`]s into [`Value`]s for templating.
    fn from(t: &Tag) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), Value::from(t.id));
        m.insert("title".to_owned(), Value::String(escape::html(&t.title)));
        m.insert("posts_count".to_owned(), Value::from(t.posts_count));
        m.insert("absolute_url".to_owned(), Value::String(t.absolute_url()));
        Value::Object(m)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tag(id: u64, title: &str, posts_count: u64) -> Tag {
        Tag {
            id,
            title: title.to_owned(),
            posts_count,
        }
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!("/tags/3-web-dev", tag(3, "Web Dev", 1).absolute_url());
    }

    #[test]
    fn test_display_order() {
        let mut tags = vec![
            tag(1, "b", 1),
            tag(2, "c", 4),
            tag(3, "a", 1),
            tag(4, "d", 4),
        ];
        tags.sort_by(Tag::display_order);
        let titles: Vec<&str> = tags.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(vec!["c", "d", "a", "b"], titles);
    }
}
