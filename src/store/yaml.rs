use super::{Error, Result, State, Store};
use crate::post::{Post, PostFields};
use crate::tag::Tag;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// A [`Store`] that keeps its data in memory and rewrites a YAML snapshot of
/// it after every successful write. The snapshot is written to a temporary
/// file next to the target and renamed into place, so a crash mid-write
/// leaves the previous snapshot intact.
#[derive(Debug)]
pub struct YamlStore {
    path: PathBuf,
    state: RwLock<State>,
}

impl YamlStore {
    /// Opens the data file at `path`. A missing or empty file yields an empty
    /// store; the file is created on the first write.
    pub fn open(path: &Path) -> Result<YamlStore> {
        let state = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => State::default(),
            Ok(content) => serde_yaml::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => State::default(),
            Err(err) => {
                return Err(Error::Io {
                    path: path.to_owned(),
                    err,
                })
            }
        };
        log::info!(
            "Opened data file '{}' ({} posts, {} tags)",
            path.display(),
            state.posts.len(),
            state.tags.len()
        );
        Ok(YamlStore {
            path: path.to_owned(),
            state: RwLock::new(state),
        })
    }

    /// Runs `f` against the state under the write lock and persists the
    /// result. The in-memory state is only replaced once the snapshot has
    /// been written, so a failed write leaves both unchanged.
    fn write<T>(&self, f: impl FnOnce(&mut State) -> Result<T>) -> Result<T> {
        let mut state = self.state.write().map_err(|_| Error::Poisoned)?;
        let mut next = state.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *state = next;
        Ok(out)
    }

    fn persist(&self, state: &State) -> Result<()> {
        let content = serde_yaml::to_string(state)?;
        let io_err = |err| Error::Io {
            path: self.path.clone(),
            err,
        };

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("data.yaml"));
        let temp_path = self
            .path
            .with_file_name(format!(".{}.tmp.{}", file_name, std::process::id()));

        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        });
        if let Err(err) = written.and_then(|_| fs::rename(&temp_path, &self.path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(io_err(err));
        }
        Ok(())
    }
}

impl Store for YamlStore {
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
        self.write(|state| Ok(state.insert_post(fields, created)))
    }

    fn put_post(&self, post: &Post) -> Result<()> {
        self.write(|state| state.put_post(post))
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
        self.write(|state| Ok(state.insert_tag(title, posts_count)))
    }

    fn put_tag(&self, tag: &Tag) -> Result<()> {
        self.write(|state| state.put_tag(tag))
    }

    fn delete_tag(&self, id: u64) -> Result<()> {
        self.write(|state| {
            state.delete_tag(id);
            Ok(())
        })
    }
}
