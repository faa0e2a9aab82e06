//! Turns a [`Page`] into HTML. The [`Renderer`] trait is the seam between the
//! handlers and the template engine; [`GtmplRenderer`] implements it with Go
//! style templates from a [`Theme`].
//!
//! A theme maps each [`Template`] to a list of files. The files are
//! concatenated in order and parsed as one template, so a theme typically
//! lists a shared header, the view's own file and a shared footer.

use crate::view::{Page, Template};
use gtmpl::Template as GoTemplate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Renders pages to HTML.
pub trait Renderer: Send + Sync {
    fn render(&self, page: &Page) -> Result<String>;
}

/// The source text of every [`Template`].
#[derive(Clone, Debug)]
pub struct Theme {
    sources: HashMap<Template, String>,
}

/// The layout of a theme directory's `theme.yaml`: for each view, the files
/// (relative to the theme directory) that make up its template.
#[derive(Deserialize)]
struct ThemeFile {
    posts_template: Vec<PathBuf>,
    post_template: Vec<PathBuf>,
    post_form_template: Vec<PathBuf>,
    page_not_found_template: Vec<PathBuf>,
}

impl Theme {
    /// The theme compiled into the binary.
    pub fn embedded() -> Theme {
        const HEADER: &str = include_str!("../theme/header.html");
        const FOOTER: &str = include_str!("../theme/footer.html");

        let mut sources = HashMap::new();
        for template in Template::ALL.iter() {
            let body = match template {
                Template::Posts => include_str!("../theme/posts.html"),
                Template::Post => include_str!("../theme/post.html"),
                Template::PostForm => include_str!("../theme/post_form.html"),
                Template::NotFound => include_str!("../theme/page_not_found.html"),
            };
            sources.insert(*template, format!("{}{}{}", HEADER, body, FOOTER));
        }
        Theme { sources }
    }

    /// Loads a theme from `dir`, which must contain a `theme.yaml`.
    pub fn load(dir: &Path) -> Result<Theme> {
        let theme_path = dir.join("theme.yaml");
        let theme_file: ThemeFile = serde_yaml::from_reader(open(&theme_path)?)
            .map_err(|err| Error::ThemeFile {
                path: theme_path.clone(),
                err,
            })?;

        let mut sources = HashMap::new();
        for (template, files) in vec![
            (Template::Posts, theme_file.posts_template),
            (Template::Post, theme_file.post_template),
            (Template::PostForm, theme_file.post_form_template),
            (Template::NotFound, theme_file.page_not_found_template),
        ] {
            sources.insert(template, concat_files(files.iter().map(|f| dir.join(f)))?);
        }
        Ok(Theme { sources })
    }

    fn source(&self, template: Template) -> Result<&str> {
        self.sources
            .get(&template)
            .map(String::as_str)
            .ok_or(Error::MissingTemplate(template))
    }
}

// Loads the template files' contents and concatenates them, separated by a
// space.
fn concat_files(files: impl Iterator<Item = PathBuf>) -> Result<String> {
    let mut contents = String::new();
    for file in files {
        open(&file)?
            .read_to_string(&mut contents)
            .map_err(|err| Error::OpenTemplateFile {
                path: file.clone(),
                err,
            })?;
        contents.push(' ');
    }
    Ok(contents)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|err| Error::OpenTemplateFile {
        path: path.to_owned(),
        err,
    })
}

/// A [`Renderer`] backed by [`gtmpl`]. Templates are checked once when the
/// renderer is built and then parsed from source on every render, which
/// keeps the renderer free of parsed template state.
pub struct GtmplRenderer {
    theme: Theme,
}

impl GtmplRenderer {
    /// Builds a renderer, failing if any of the theme's templates doesn't
    /// parse.
    pub fn new(theme: Theme) -> Result<GtmplRenderer> {
        let renderer = GtmplRenderer { theme };
        for template in Template::ALL.iter() {
            renderer.parse(*template)?;
        }
        Ok(renderer)
    }

    fn parse(&self, template: Template) -> Result<GoTemplate> {
        let mut parsed = GoTemplate::default();
        parsed
            .parse(self.theme.source(template)?)
            .map_err(|err| Error::ParseTemplate(template, err))?;
        Ok(parsed)
    }
}

impl Renderer for GtmplRenderer {
    fn render(&self, page: &Page) -> Result<String> {
        let template = page.template();
        let context = gtmpl::Context::from(page.to_value())
            .map_err(|err| Error::ExecuteTemplate(template, err))?;
        let mut out: Vec<u8> = Vec::new();
        self.parse(template)?
            .execute(&mut out, &context)
            .map_err(|err| Error::ExecuteTemplate(template, err))?;
        String::from_utf8(out).map_err(|_| Error::InvalidUtf8(template))
    }
}

/// The result of a fallible rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading a theme or rendering a page.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening theme files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned when `theme.yaml` can't be parsed.
    ThemeFile {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    /// Returned when a theme has no source for a template.
    MissingTemplate(Template),

    /// Returned for errors parsing a template.
    ParseTemplate(Template, String),

    /// Returned for errors executing a template.
    ExecuteTemplate(Template, String),

    /// Returned when a template produced bytes that aren't UTF-8.
    InvalidUtf8(Template),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ThemeFile { path, err } => {
                write!(f, "Parsing theme file '{}': {}", path.display(), err)
            }
            Error::MissingTemplate(t) => write!(f, "theme has no {}", t.file_name()),
            Error::ParseTemplate(t, err) => {
                write!(f, "Parsing template {}: {}", t.file_name(), err)
            }
            Error::ExecuteTemplate(t, err) => {
                write!(f, "Rendering template {}: {}", t.file_name(), err)
            }
            Error::InvalidUtf8(t) => {
                write!(f, "Template {} produced invalid UTF-8", t.file_name())
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ThemeFile { path: _, err } => Some(err),
            _ => None,
        }
    }
}
