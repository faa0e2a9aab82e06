//! Defines the [`Post`] entity, the [`PostForm`] submitted by the editor, and
//! the validation that turns one into the other. See [`Post::to_value`] for
//! how posts are exposed to templates.

use crate::escape;
use crate::markdown;
use crate::slug::slugify;
use chrono::{DateTime, Utc};
use gtmpl::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A stored blog post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Assigned by the store on insert and never changed afterwards.
    pub id: u64,

    /// The post's title. Never empty.
    pub title: String,

    /// The post's markdown source. Never empty.
    pub body: String,

    /// Tag titles, sorted and de-duplicated. These are plain strings; the
    /// [`crate::tag::Tag`] entities that count them are only brought up to
    /// date by [`crate::reconcile::reconcile_tags`].
    #[serde(default)]
    pub tags: Vec<String>,

    /// When the post was first stored.
    pub created: DateTime<Utc>,
}

impl Post {
    /// The canonical URL for the post, e.g. `/posts/12-hello-world`.
    pub fn absolute_url(&self) -> String {
        format!("/posts/{}-{}", self.id, slugify(&self.title))
    }

    /// The URL of the post's edit form.
    pub fn edit_url(&self) -> String {
        format!("/posts/edit/{}", self.id)
    }

    /// The title form-url-encoded, for share links.
    pub fn quoted_title(&self) -> String {
        url::form_urlencoded::byte_serialize(self.title.as_bytes()).collect()
    }

    /// Applies validated form fields to an existing post. `id` and `created`
    /// are left alone.
    pub fn apply(&mut self, fields: PostFields) {
        self.title = fields.title;
        self.body = fields.body;
        self.tags = fields.tags;
    }

    /// Converts the post into a template value. Text fields are HTML-escaped;
    /// `body_html` holds the rendered markdown.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), Value::from(self.id));
        m.insert("title".to_owned(), Value::String(escape::html(&self.title)));
        m.insert("body".to_owned(), Value::String(escape::html(&self.body)));
        m.insert("body_html".to_owned(), Value::String(markdown::to_html(&self.body)));
        m.insert(
            "tags".to_owned(),
            Value::Array(
                self.tags
                    .iter()
                    .map(|t| Value::String(escape::html(t)))
                    .collect(),
            ),
        );
        m.insert(
            "created".to_owned(),
            Value::String(self.created.format("%Y-%m-%d %H:%M").to_string()),
        );
        m.insert("absolute_url".to_owned(), Value::String(self.absolute_url()));
        m.insert("edit_url".to_owned(), Value::String(self.edit_url()));
        m.insert("quoted_title".to_owned(), Value::String(self.quoted_title()));
        Value::Object(m)
    }
}

/// The validated contents of a [`PostForm`], ready to be stored.
#[derive(Clone, Debug, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// The raw fields of the new/edit post form. Missing fields deserialize as
/// empty strings so that validation, not the extractor, decides what happens.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub post_title: String,

    #[serde(default)]
    pub post_body: String,

    #[serde(default)]
    pub post_tags: String,
}

impl PostForm {
    /// Pre-fills the form from a stored post, for the edit page.
    pub fn from_post(post: &Post) -> PostForm {
        PostForm {
            post_title: post.title.clone(),
            post_body: post.body.clone(),
            post_tags: post.tags.join(","),
        }
    }

    /// Checks the required fields and normalizes the tag text.
    pub fn validate(&self) -> Result<PostFields, ValidationError> {
        if self.post_title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.post_body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(PostFields {
            title: self.post_title.clone(),
            body: self.post_body.clone(),
            tags: split_tags(&self.post_tags),
        })
    }
}

/// Splits comma-separated tag text into trimmed, sorted, de-duplicated tag
/// titles. Empty entries (e.g. from `"a,,b"` or a blank field) are dropped.
pub fn split_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Why a [`PostForm`] was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// The title was empty or whitespace.
    EmptyTitle,

    /// The body was empty or whitespace.
    EmptyBody,
}

impl fmt::Display for ValidationError {
    /// Displays a [`ValidationError`] as a message for the form page.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::EmptyTitle => write!(f, "A post needs a title."),
            ValidationError::EmptyBody => write!(f, "A post needs a body."),
        }
    }
}

impl std::error::Error for ValidationError {}
