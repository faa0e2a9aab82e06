//! Typed template contexts. Every page is a [`Layout`] (the fields shared by
//! all HTML views) plus one [`View`] carrying exactly the fields its template
//! needs. [`Page::to_value`] flattens both into the single object the
//! template sees.

use crate::escape;
use crate::identity::Admin;
use crate::pagination::Pagination;
use crate::post::{Post, PostForm};
use crate::tag::Tag;
use gtmpl::Value;
use std::collections::HashMap;

/// The HTML templates a theme provides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Template {
    Posts,
    Post,
    PostForm,
    NotFound,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::Posts,
        Template::Post,
        Template::PostForm,
        Template::NotFound,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Template::Posts => "posts.html",
            Template::Post => "post.html",
            Template::PostForm => "post_form.html",
            Template::NotFound => "page_not_found.html",
        }
    }
}

/// Fields every HTML page receives.
#[derive(Clone, Debug)]
pub struct Layout {
    /// The page title, shown in `<title>`.
    pub title: String,
    pub blog_title: String,

    /// The `Host` the request was addressed to.
    pub host: String,

    /// All tags in display order, for the sidebar.
    pub tags: Vec<Tag>,

    /// Set only when the caller is an administrator.
    pub admin: Option<Admin>,
}

/// A page of posts: the front page or a single tag's listing.
#[derive(Clone, Debug)]
pub struct ListingView {
    pub posts: Vec<Post>,
    pub pagination: Pagination,

    /// The request path, which page links are built from.
    pub path: String,
}

/// A single post.
#[derive(Clone, Debug)]
pub struct PostView {
    pub post: Post,

    /// The full URL the post was requested at, for share links.
    pub url: String,
}

/// The new/edit post form, echoing whatever was last submitted.
#[derive(Clone, Debug)]
pub struct FormView {
    pub form: PostForm,

    /// Why the last submission was rejected, if it was.
    pub error: Option<String>,
}

#[derive(Clone, Debug)]
pub enum View {
    Listing(ListingView),
    Post(PostView),
    Form(FormView),
    NotFound,
}

/// Everything needed to render one HTML response.
#[derive(Clone, Debug)]
pub struct Page {
    pub layout: Layout,
    pub view: View,
}

impl Page {
    pub fn template(&self) -> Template {
        match self.view {
            View::Listing(_) => Template::Posts,
            View::Post(_) => Template::Post,
            View::Form(_) => Template::PostForm,
            View::NotFound => Template::NotFound,
        }
    }

    /// Converts the page into the object passed to its template. Plain text
    /// is HTML-escaped here; only `pagination` and the posts' `body_html` are
    /// markup.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        let layout = &self.layout;
        m.insert("title".to_owned(), text(&layout.title));
        m.insert("blog_title".to_owned(), text(&layout.blog_title));
        m.insert("host".to_owned(), text(&layout.host));
        m.insert(
            "tags".to_owned(),
            Value::Array(layout.tags.iter().map(Value::from).collect()),
        );
        if let Some(admin) = &layout.admin {
            m.insert("is_admin".to_owned(), Value::Bool(true));
            m.insert("logout_url".to_owned(), text(&admin.logout_url));
        }

        match &self.view {
            View::Listing(listing) => {
                m.insert(
                    "posts".to_owned(),
                    Value::Array(listing.posts.iter().map(Post::to_value).collect()),
                );
                m.insert("page".to_owned(), Value::from(listing.pagination.page as u64));
                m.insert(
                    "total_pages".to_owned(),
                    Value::from(listing.pagination.total_pages as u64),
                );
                m.insert("path".to_owned(), text(&listing.path));
                m.insert(
                    "pagination".to_owned(),
                    Value::String(listing.pagination.links(&listing.path)),
                );
            }
            View::Post(view) => {
                m.insert("post".to_owned(), view.post.to_value());
                m.insert("url".to_owned(), text(&view.url));
            }
            View::Form(view) => {
                m.insert("post_title".to_owned(), text(&view.form.post_title));
                m.insert("post_body".to_owned(), text(&view.form.post_body));
                m.insert("post_tags".to_owned(), text(&view.form.post_tags));
                m.insert(
                    "error".to_owned(),
                    match &view.error {
                        Some(error) => text(error),
                        None => Value::Nil,
                    },
                );
            }
            View::NotFound => {}
        }
        // A map rather than an object, so that `{{if .is_admin}}` reads an
        // absent key as false instead of failing.
        Value::Map(m)
    }
}

fn text(s: &str) -> Value {
    Value::String(escape::html(s))
}
