//! Brings the [`Tag`] entities back in line with the tag titles actually
//! carried by posts.
//!
//! Post writes never touch tags, so tag counts drift until this runs. A pass
//! is a series of independent store calls with no surrounding transaction:
//! if it fails halfway, the tags written so far stay written, and the next
//! successful pass finishes the job.

use crate::store::{Result, Store};
use crate::tag::Tag;
use std::collections::HashMap;

/// What a reconciliation pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl Report {
    /// The number of store writes the pass performed.
    pub fn writes(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// Recounts every tag title across all posts, then deletes tags nobody
/// uses any more, updates tags whose count changed and creates tags for
/// titles seen for the first time. Running it twice without post changes in
/// between performs no writes the second time.
pub fn reconcile_tags(store: &dyn Store) -> Result<Report> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for post in store.all_posts()? {
        for title in post.tags {
            *counts.entry(title).or_insert(0) += 1;
        }
    }

    let mut report = Report::default();
    for tag in store.list_tags()? {
        match counts.remove(&tag.title) {
            None => {
                store.delete_tag(tag.id)?;
                report.deleted += 1;
            }
            Some(count) if count != tag.posts_count => {
                store.put_tag(&Tag {
                    posts_count: count,
                    ..tag
                })?;
                report.updated += 1;
            }
            Some(_) => {}
        }
    }

    // Sorted so that new tags get ids in a stable order.
    let mut fresh: Vec<(String, u64)> = counts.into_iter().collect();
    fresh.sort();
    for (title, count) in fresh {
        store.insert_tag(&title, count)?;
        report.created += 1;
    }

    log::info!(
        "Reconciled tags: {} created, {} updated, {} deleted",
        report.created,
        report.updated,
        report.deleted
    );
    Ok(report)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::{Post, PostFields};
    use crate::store::MemoryStore;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps a [`MemoryStore`] and counts every write that reaches it.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: AtomicUsize,
    }

    impl CountingStore {
        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn bump(&self) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Store for CountingStore {
        fn list_posts(
            &self,
            tag: Option<&str>,
            offset: usize,
            limit: usize,
        ) -> Result<(Vec<Post>, usize)> {
            self.inner.list_posts(tag, offset, limit)
        }

        fn all_posts(&self) -> Result<Vec<Post>> {
            self.inner.all_posts()
        }

        fn get_post(&self, id: u64) -> Result<Option<Post>> {
            self.inner.get_post(id)
        }

        fn insert_post(&self, fields: PostFields, created: DateTime<Utc>) -> Result<Post> {
            self.bump();
            self.inner.insert_post(fields, created)
        }

        fn put_post(&self, post: &Post) -> Result<()> {
            self.bump();
            self.inner.put_post(post)
        }

        fn get_tag(&self, id: u64) -> Result<Option<Tag>> {
            self.inner.get_tag(id)
        }

        fn list_tags(&self) -> Result<Vec<Tag>> {
            self.inner.list_tags()
        }

        fn insert_tag(&self, title: &str, posts_count: u64) -> Result<Tag> {
            self.bump();
            self.inner.insert_tag(title, posts_count)
        }

        fn put_tag(&self, tag: &Tag) -> Result<()> {
            self.bump();
            self.inner.put_tag(tag)
        }

        fn delete_tag(&self, id: u64) -> Result<()> {
            self.bump();
            self.inner.delete_tag(id)
        }
    }

    fn add_post(store: &dyn Store, tags: &[&str]) -> Result<Post> {
        store.insert_post(
            PostFields {
                title: String::from("post"),
                body: String::from("body"),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
            Utc::now(),
        )
    }

    fn counts(store: &dyn Store) -> Result<Vec<(String, u64)>> {
        Ok(store
            .list_tags()?
            .into_iter()
            .map(|t| (t.title, t.posts_count))
            .collect())
    }

    #[test]
    fn test_creates_counts_from_posts() -> Result<()> {
        let store = MemoryStore::new();
        add_post(&store, &["a", "b"])?;
        add_post(&store, &["b"])?;

        let report = reconcile_tags(&store)?;
        assert_eq!(
            Report {
                created: 2,
                updated: 0,
                deleted: 0
            },
            report
        );
        assert_eq!(
            vec![(String::from("b"), 2), (String::from("a"), 1)],
            counts(&store)?
        );
        Ok(())
    }

    #[test]
    fn test_second_run_writes_nothing() -> Result<()> {
        let store = CountingStore::default();
        add_post(&store, &["a", "b"])?;
        add_post(&store, &["b"])?;

        reconcile_tags(&store)?;
        let before = store.writes();
        let report = reconcile_tags(&store)?;
        assert_eq!(0, report.writes());
        assert_eq!(before, store.writes());
        Ok(())
    }

    #[test]
    fn test_orphan_tag_is_deleted() -> Result<()> {
        let store = MemoryStore::new();
        add_post(&store, &["kept"])?;
        store.insert_tag("orphan", 3)?;

        let report = reconcile_tags(&store)?;
        assert_eq!(1, report.deleted);
        assert_eq!(vec![(String::from("kept"), 1)], counts(&store)?);
        Ok(())
    }

    #[test]
    fn test_changed_count_is_updated_in_place() -> Result<()> {
        let store = MemoryStore::new();
        let tag = store.insert_tag("a", 5)?;
        add_post(&store, &["a"])?;

        let report = reconcile_tags(&store)?;
        assert_eq!(1, report.updated);
        assert_eq!(
            Some(Tag {
                id: tag.id,
                title: String::from("a"),
                posts_count: 1
            }),
            store.get_tag(tag.id)?
        );
        Ok(())
    }

    #[test]
    fn test_edited_post_moves_counts() -> Result<()> {
        let store = MemoryStore::new();
        let mut post = add_post(&store, &["old"])?;
        add_post(&store, &["old"])?;
        reconcile_tags(&store)?;

        post.tags = vec![String::from("new")];
        store.put_post(&post)?;
        reconcile_tags(&store)?;

        assert_eq!(
            vec![(String::from("new"), 1), (String::from("old"), 1)],
            counts(&store)?
        );
        Ok(())
    }

    #[test]
    fn test_no_posts_removes_every_tag() -> Result<()> {
        let store = MemoryStore::new();
        store.insert_tag("a", 1)?;
        store.insert_tag("b", 2)?;
        let report = reconcile_tags(&store)?;
        assert_eq!(2, report.deleted);
        assert!(store.list_tags()?.is_empty());
        Ok(())
    }
}
