//! Wires the blog together: [`AppState`] holds the shared services and
//! [`routes`] maps URLs onto [`crate::handlers`].

use crate::config::Config;
use crate::handlers;
use crate::identity::{Anonymous, IdentityProvider, TokenIdentity};
use crate::render::{self, GtmplRenderer, Renderer, Theme};
use crate::store::{self, MemoryStore, Store, YamlStore};
use actix_web::web;
use std::fmt;
use std::sync::Arc;

/// Everything a request handler needs. Built once at startup and shared by
/// every worker through [`web::Data`].
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub renderer: Arc<dyn Renderer>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Builds the services a [`Config`] describes: a [`YamlStore`] when a
    /// data file is configured (otherwise a [`MemoryStore`]), the configured
    /// theme (otherwise the embedded one) and a [`TokenIdentity`] when an
    /// admin token is set.
    pub fn open(config: Config) -> Result<AppState> {
        let store: Arc<dyn Store> = match &config.data_file {
            Some(path) => Arc::new(YamlStore::open(path)?),
            None => {
                log::warn!("No data_file configured; posts will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };

        let theme = match &config.theme_directory {
            Some(dir) => {
                log::info!("Loading theme from {}", dir.display());
                Theme::load(dir)?
            }
            None => Theme::embedded(),
        };
        let renderer: Arc<dyn Renderer> = Arc::new(GtmplRenderer::new(theme)?);

        let identity: Arc<dyn IdentityProvider> = match &config.admin_token {
            Some(token) => Arc::new(TokenIdentity::new(token.clone(), config.logout_url.clone())),
            None => Arc::new(Anonymous),
        };

        Ok(AppState {
            config,
            store,
            renderer,
            identity,
        })
    }
}

/// Registers every route. Order matters: the literal paths `/posts/new`,
/// `/posts/edit/{id}` and `/tags/update` must come before the `{id}-{slug}`
/// patterns that would otherwise swallow them, and the catch-all comes last.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/rss.xml", web::get().to(handlers::rss))
        .route("/sitemap.xml", web::get().to(handlers::sitemap))
        .service(
            web::resource("/posts/new")
                .route(web::get().to(handlers::new_post_form))
                .route(web::post().to(handlers::create_post)),
        )
        .service(
            web::resource("/posts/edit/{id}")
                .route(web::get().to(handlers::edit_post_form))
                .route(web::post().to(handlers::update_post)),
        )
        .route("/posts/{rest:.*}", web::get().to(handlers::show_post))
        .route("/tags/update", web::get().to(handlers::update_tags))
        .route("/tags/{rest:.*}", web::get().to(handlers::show_tag))
        .default_service(web::route().to(handlers::not_found));
}

/// The result of assembling the application.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem assembling the application at startup.
#[derive(Debug)]
pub enum Error {
    /// Returned when the data file can't be opened.
    Store(store::Error),

    /// Returned when the theme can't be loaded or doesn't parse.
    Render(render::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Store(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(err) => Some(err),
            Error::Render(err) => Some(err),
        }
    }
}

impl From<store::Error> for Error {
    /// Converts [`store::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator when opening the store.
    fn from(err: store::Error) -> Error {
        Error::Store(err)
    }
}

impl From<render::Error> for Error {
    /// Converts [`render::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator when loading the theme.
    fn from(err: render::Error) -> Error {
        Error::Render(err)
    }
}
