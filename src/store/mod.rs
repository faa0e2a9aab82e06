//! The repository interface between the request handlers and wherever posts
//! and tags actually live. [`MemoryStore`] keeps everything in process;
//! [`YamlStore`] additionally snapshots the data to a YAML file after every
//! write.
//!
//! Each call is atomic on its own. Nothing here spans calls, so a
//! multi-step operation like tag reconciliation can interleave with post
//! writes from other requests.

mod yaml;

pub use yaml::YamlStore;

use crate::post::{Post, PostFields};
use crate::tag::Tag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::RwLock;

/// Storage for [`Post`]s and [`Tag`]s. Listings of posts are always newest
/// first; listings of tags follow [`Tag::display_order`].
pub trait Store: Send + Sync {
    /// Returns one page of posts, optionally restricted to posts carrying
    /// the exact tag title `tag`, together with the total number of matching
    /// posts.
    fn list_posts(&self, tag: Option<&str>, offset: usize, limit: usize)
        -> Result<(Vec<Post>, usize)>;

    /// Returns every post, newest first.
    fn all_posts(&self) -> Result<Vec<Post>>;

    fn get_post(&self, id: u64) -> Result<Option<Post>>;

    /// Stores a new post, assigning its id.
    fn insert_post(&self, fields: PostFields, created: DateTime<Utc>) -> Result<Post>;

    /// Overwrites an existing post. Fails with [`Error::PostNotFound`] if the
    /// id is unknown.
    fn put_post(&self, post: &Post) -> Result<()>;

    fn get_tag(&self, id: u64) -> Result<Option<Tag>>;

    /// Returns every tag in display order.
    fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Stores a new tag, assigning its id.
    fn insert_tag(&self, title: &str, posts_count: u64) -> Result<Tag>;

    /// Overwrites an existing tag. Fails with [`Error::TagNotFound`] if the
    /// id is unknown.
    fn put_tag(&self, tag: &Tag) -> Result<()>;

    /// Deletes a tag. Deleting an unknown id is not an error.
    fn delete_tag(&self, id: u64) -> Result<()>;
}

/// The complete contents of a store. [`YamlStore`] serializes this as-is.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct State {
    #[serde(default)]
    last_post_id: u64,

    #[serde(default)]
    last_tag_id: u64,

    #[serde(default)]
    posts: BTreeMap<u64, Post>,

    #[serde(default)]
    tags: BTreeMap<u64, Tag>,
}

impl State {
    fn newest_first<'a>(&'a self, tag: Option<&'a str>) -> Vec<&'a Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .values()
            .filter(|p| match tag {
                Some(tag) => p.tags.iter().any(|t| t == tag),
                None => true,
            })
            .collect();
        posts.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
        posts
    }

    fn list_posts(&self, tag: Option<&str>, offset: usize, limit: usize) -> (Vec<Post>, usize) {
        let matching = self.newest_first(tag);
        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        (page, total)
    }

    fn all_posts(&self) -> Vec<Post> {
        self.newest_first(None).into_iter().cloned().collect()
    }

    fn insert_post(&mut self, fields: PostFields, created: DateTime<Utc>) -> Post {
        self.last_post_id += 1;
        let post = Post {
            id: self.last_post_id,
            title: fields.title,
            body: fields.body,
            tags: fields.tags,
            created,
        };
        self.posts.insert(post.id, post.clone());
        post
    }

    fn put_post(&mut self, post: &Post) -> Result<()> {
        match self.posts.get_mut(&post.id) {
            Some(existing) => {
                *existing = post.clone();
                Ok(())
            }
            None => Err(Error::PostNotFound(post.id)),
        }
    }

    fn list_tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.tags.values().cloned().collect();
        tags.sort_by(Tag::display_order);
        tags
    }

    fn insert_tag(&mut self, title: &str, posts_count: u64) -> Tag {
        self.last_tag_id += 1;
        let tag = Tag {
            id: self.last_tag_id,
            title: title.to_owned(),
            posts_count,
        };
        self.tags.insert(tag.id, tag.clone());
        tag
    }

    fn put_tag(&mut self, tag: &Tag) -> Result<()> {
        match self.tags.get_mut(&tag.id) {
            Some(existing) => {
                *existing = tag.clone();
                Ok(())
            }
            None => Err(Error::TagNotFound(tag.id)),
        }
    }

    fn delete_tag(&mut self, id: u64) {
        self.tags.remove(&id);
    }
}

/// A [`Store`] that keeps everything in memory. Data is lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl Store for MemoryStore {
    fn list_posts(
        &self,
        tag: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Post>, usize)> {
        let state = self.state.read().map_err(|_| Error::Poisoned)?;
        Ok(state.list_posts(tag, offset, limit))
    }

    fn all_posts(&self) -> Result<Vec<Post>> {
        let state = self.state.read().map_err(|_| Error::Poisoned)?;
        Ok(state.all_posts())
    }

    fn get_post(&self, id: u64) -> Result<Option<Post>> {
        let state = self.state.read().map_err(|_| Error::Poisoned)?;
        Ok(state.posts.get(&id).cloned())
    }

    fn insert_post(&self, fields: PostFields, created: DateTime<Utc>) -> Result<Post> {
        let mut state = self.state.write().map_err(|_| Error::Poisoned)?;
        Ok(state.insert_post(fields, created))
    }

    fn put_post(&self, post: &Post) -> Result<()> {
        let mut state = self.state.write().map_err(|_| Error::Poisoned)?;
        state.put_post(post)
    }

    fn get_tag(&self, id: u64) -> Result<Option<Tag>> {
        let state = self.state.read().map_err(|_| Error::Poisoned)?;
        Ok(state.tags.get(&id).cloned())
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        let state = self.state.read().map_err(|_| Error::Poisoned)?;
        Ok(state.list_tags())
    }

    fn insert_tag(&self, title: &str, posts_count: u64) -> Result<Tag> {
        let mut state = self.state.write().map_err(|_| Error::Poisoned)?;
        Ok(state.insert_tag(title, posts_count))
    }

    fn put_tag(&self, tag: &Tag) -> Result<()> {
        let mut state = self.state.write().map_err(|_| Error::Poisoned)?;
        state.put_tag(tag)
    }

    fn delete_tag(&self, id: u64) -> Result<()> {
        let mut state = self.state.write().map_err(|_| Error::Poisoned)?;
        state.delete_tag(id);
        Ok(())
    }
}

/// The result of a fallible store operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed store operation.
#[derive(Debug)]
pub enum Error {
    /// Returned when updating a post that doesn't exist.
    PostNotFound(u64),

    /// Returned when updating a tag that doesn't exist.
    TagNotFound(u64),

    /// Returned when a thread panicked while holding the store lock.
    Poisoned,

    /// Returned for I/O problems reading or writing the data file.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when the data file can't be parsed or serialized.
    Yaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::PostNotFound(id) => write!(f, "post {} not found", id),
            Error::TagNotFound(id) => write!(f, "tag {} not found", id),
            Error::Poisoned => write!(f, "store lock poisoned"),
            Error::Io { path, err } => {
                write!(f, "Accessing data file '{}': {}", path.display(), err)
            }
            Error::Yaml(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::Yaml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts [`serde_yaml::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator when (de)serializing the data file.
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}
