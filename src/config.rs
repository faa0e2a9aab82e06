//! Loads the blog's [`Config`] from a `blog.yaml` project file.

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file [`Config::from_directory`] looks for.
pub const PROJECT_FILE: &str = "blog.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(5)
    }
}

fn default_blog_title() -> String {
    String::from("Title of Blog")
}

fn default_listen() -> String {
    String::from("127.0.0.1:8080")
}

fn default_logout_url() -> String {
    String::from("/")
}

#[derive(Deserialize)]
struct Project {
    #[serde(default = "default_blog_title")]
    blog_title: String,

    #[serde(default)]
    posts_per_page: PageSize,

    #[serde(default = "default_listen")]
    listen: String,

    #[serde(default)]
    data_file: Option<PathBuf>,

    #[serde(default)]
    theme: Option<PathBuf>,

    #[serde(default)]
    admin_token: Option<String>,

    #[serde(default = "default_logout_url")]
    logout_url: String,
}

/// Immutable application settings, built once at startup and shared by every
/// request.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Shown in every page header and as the feed title.
    pub blog_title: String,

    /// How many posts each listing page shows. Always at least 1.
    pub posts_per_page: usize,

    /// The address the HTTP server binds to.
    pub listen: String,

    /// Where posts and tags are persisted. `None` keeps them in memory.
    pub data_file: Option<PathBuf>,

    /// A theme directory containing `theme.yaml`. `None` uses the embedded
    /// theme.
    pub theme_directory: Option<PathBuf>,

    /// The token an administrator presents in the `admin_token` cookie.
    /// `None` means nobody is an administrator.
    pub admin_token: Option<String>,

    /// Where the administrator's logout link points.
    pub logout_url: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            blog_title: default_blog_title(),
            posts_per_page: PageSize::default().0,
            listen: default_listen(),
            data_file: None,
            theme_directory: None,
            admin_token: None,
            logout_url: default_logout_url(),
        }
    }
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a `blog.yaml` and
    /// loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(Error::NotFound),
            }
        }
    }

    /// Loads a project file. Relative `data_file` and `theme` paths are
    /// resolved against the file's directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;
        if project.posts_per_page.0 == 0 {
            return Err(Error::InvalidPageSize);
        }

        let project_root = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Config {
            blog_title: project.blog_title,
            posts_per_page: project.posts_per_page.0,
            listen: project.listen,
            data_file: project.data_file.map(|p| project_root.join(p)),
            theme_directory: project.theme.map(|p| project_root.join(p)),
            admin_token: project.admin_token.filter(|t| !t.is_empty()),
            logout_url: project.logout_url,
        })
    }
}

/// The result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no `blog.yaml` exists in the directory or its
    /// ancestors.
    NotFound,

    /// Returned for I/O problems opening the project file.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid YAML for a [`Config`].
    Parse {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    /// Returned when `posts_per_page` is zero.
    InvalidPageSize,
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::Open { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Loading configuration '{}': {}", path.display(), err)
            }
            Error::InvalidPageSize => write!(f, "posts_per_page must be at least 1"),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::Parse { path: _, err } => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "blog_title: Notes\n").unwrap();

        let config = Config::from_directory(dir.path())?;
        assert_eq!(
            Config {
                blog_title: String::from("Notes"),
                ..Config::default()
            },
            config
        );
        assert_eq!(5, config.posts_per_page);
        Ok(())
    }

    #[test]
    fn test_relative_paths_resolve_against_project() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_FILE),
            "posts_per_page: 10\ndata_file: data/blog.yaml\ntheme: theme\nadmin_token: hunter2\n",
        )
        .unwrap();

        let config = Config::from_project_file(&dir.path().join(PROJECT_FILE))?;
        assert_eq!(10, config.posts_per_page);
        assert_eq!(Some(dir.path().join("data/blog.yaml")), config.data_file);
        assert_eq!(Some(dir.path().join("theme")), config.theme_directory);
        assert_eq!(Some(String::from("hunter2")), config.admin_token);
        Ok(())
    }

    #[test]
    fn test_found_in_parent_directory() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "listen: 0.0.0.0:9000\n").unwrap();

        assert_eq!("0.0.0.0:9000", Config::from_directory(&nested)?.listen);
        Ok(())
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE);
        std::fs::write(&path, "posts_per_page: 0\n").unwrap();
        match Config::from_project_file(&path) {
            Err(Error::InvalidPageSize) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
