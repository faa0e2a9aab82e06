//! The request handlers behind each route in [`crate::app::routes`].
//!
//! Handlers read and write through [`AppState::store`], build a typed
//! [`Page`] and hand it to [`AppState::renderer`]. Validation failures
//! re-render the form, unknown ids render the not-found page with a 404, and
//! everything else that goes wrong becomes an [`Error`] (a 500).

use crate::app::AppState;
use crate::feed::{self, write_feed, FeedConfig};
use crate::pagination::{parse_page, Pagination};
use crate::post::PostForm;
use crate::reconcile::reconcile_tags;
use crate::render;
use crate::sitemap::sitemap_xml;
use crate::store;
use crate::view::{FormView, Layout, ListingView, Page, PostView, View};
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use url::Url;

const INDEX_TITLE: &str = "Fresh posts";
const NEW_POST_TITLE: &str = "Create new blog post";
const EDIT_POST_TITLE: &str = "Edit blog post";
const NOT_FOUND_TITLE: &str = "Page not found";

/// `GET /`
pub async fn index(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    listing(&req, &state, INDEX_TITLE.to_owned(), None)
}

/// `GET /posts/new`
pub async fn new_post_form(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    if let Some(denied) = deny_writes(&req, &state) {
        return Ok(denied);
    }
    form_page(&req, &state, NEW_POST_TITLE, PostForm::default(), None)
}

/// `POST /posts/new`
pub async fn create_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    if let Some(denied) = deny_writes(&req, &state) {
        return Ok(denied);
    }
    let form = form.into_inner();
    match form.validate() {
        Err(err) => {
            log::debug!("Rejected new post: {}", err);
            form_page(&req, &state, NEW_POST_TITLE, form, Some(err.to_string()))
        }
        Ok(fields) => {
            let post = state.store.insert_post(fields, Utc::now())?;
            log::info!("Created post {} at {}", post.id, post.absolute_url());
            Ok(redirect("/"))
        }
    }
}

/// `GET /posts/{id}...`
pub async fn show_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    rest: web::Path<String>,
) -> Result<HttpResponse> {
    let post = match leading_id(&rest) {
        Some(id) => state.store.get_post(id)?,
        None => None,
    };
    match post {
        None => not_found_page(&req, &state),
        Some(post) => {
            let url = {
                let info = req.connection_info();
                format!("{}://{}{}", info.scheme(), info.host(), req.path())
            };
            let layout = state.layout(&req, post.title.clone())?;
            render_page(
                &state,
                StatusCode::OK,
                Page {
                    layout,
                    view: View::Post(PostView { post, url }),
                },
            )
        }
    }
}

/// `GET /posts/edit/{id}`
pub async fn edit_post_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    if let Some(denied) = deny_writes(&req, &state) {
        return Ok(denied);
    }
    let post = match parse_id(&id) {
        Some(id) => state.store.get_post(id)?,
        None => None,
    };
    match post {
        None => not_found_page(&req, &state),
        Some(post) => form_page(&req, &state, EDIT_POST_TITLE, PostForm::from_post(&post), None),
    }
}

/// `POST /posts/edit/{id}`
pub async fn update_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<String>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    if let Some(denied) = deny_writes(&req, &state) {
        return Ok(denied);
    }
    let post = match parse_id(&id) {
        Some(id) => state.store.get_post(id)?,
        None => None,
    };
    let mut post = match post {
        None => return not_found_page(&req, &state),
        Some(post) => post,
    };

    let form = form.into_inner();
    match form.validate() {
        Err(err) => {
            log::debug!("Rejected edit of post {}: {}", post.id, err);
            form_page(&req, &state, EDIT_POST_TITLE, form, Some(err.to_string()))
        }
        Ok(fields) => {
            post.apply(fields);
            state.store.put_post(&post)?;
            log::info!("Updated post {}", post.id);
            Ok(redirect(&post.absolute_url()))
        }
    }
}

/// `GET /tags/update`
pub async fn update_tags(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    if let Some(denied) = deny_writes(&req, &state) {
        return Ok(denied);
    }
    let report = reconcile_tags(state.store.as_ref())?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format!(
            "created {}, updated {}, deleted {}\n",
            report.created, report.updated, report.deleted
        )))
}

/// `GET /tags/{id}...`
pub async fn show_tag(
    req: HttpRequest,
    state: web::Data<AppState>,
    rest: web::Path<String>,
) -> Result<HttpResponse> {
    let tag = match leading_id(&rest) {
        Some(id) => state.store.get_tag(id)?,
        None => None,
    };
    match tag {
        None => not_found_page(&req, &state),
        Some(tag) => listing(
            &req,
            &state,
            format!("All posts with tag \"{}\"", tag.title),
            Some(&tag.title),
        ),
    }
}

/// `GET /rss.xml`
pub async fn rss(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let posts = state.store.all_posts()?;
    let mut body: Vec<u8> = Vec::new();
    write_feed(
        FeedConfig {
            title: state.config.blog_title.clone(),
            home_page: home_page(&req)?,
        },
        &posts,
        &mut body,
    )?;
    Ok(HttpResponse::Ok()
        .content_type("application/rss+xml")
        .body(body))
}

/// `GET /sitemap.xml`
pub async fn sitemap(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let posts = state.store.all_posts()?;
    let tags = state.store.list_tags()?;
    let xml = sitemap_xml(&home_page(&req)?, &posts, &tags)?;
    Ok(HttpResponse::Ok().content_type("text/xml").body(xml))
}

/// Everything no other route matched.
pub async fn not_found(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    not_found_page(&req, &state)
}

/// Renders one page of posts, optionally restricted to a tag title. The
/// `page` query parameter picks the page and is clamped into range.
fn listing(
    req: &HttpRequest,
    state: &AppState,
    title: String,
    tag: Option<&str>,
) -> Result<HttpResponse> {
    let page_size = state.config.posts_per_page;
    let (_, total) = state.store.list_posts(tag, 0, 0)?;
    let pagination = Pagination::new(total, page_size, requested_page(req));
    let (posts, _) = state.store.list_posts(tag, pagination.offset(), page_size)?;

    let layout = state.layout(req, title)?;
    render_page(
        state,
        StatusCode::OK,
        Page {
            layout,
            view: View::Listing(ListingView {
                posts,
                pagination,
                path: req.path().to_owned(),
            }),
        },
    )
}

fn form_page(
    req: &HttpRequest,
    state: &AppState,
    title: &str,
    form: PostForm,
    error: Option<String>,
) -> Result<HttpResponse> {
    let layout = state.layout(req, title)?;
    render_page(
        state,
        StatusCode::OK,
        Page {
            layout,
            view: View::Form(FormView { form, error }),
        },
    )
}

fn not_found_page(req: &HttpRequest, state: &AppState) -> Result<HttpResponse> {
    log::debug!("No page for {} {}", req.method(), req.path());
    let layout = state.layout(req, NOT_FOUND_TITLE)?;
    render_page(
        state,
        StatusCode::NOT_FOUND,
        Page {
            layout,
            view: View::NotFound,
        },
    )
}

fn render_page(state: &AppState, status: StatusCode, page: Page) -> Result<HttpResponse> {
    let html = state.renderer.render(&page)?;
    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(html))
}

/// Turns away callers who aren't administrators from the routes that change
/// posts or tags, if the identity provider restricts them.
fn deny_writes(req: &HttpRequest, state: &AppState) -> Option<HttpResponse> {
    if !state.identity.guards_writes() || state.identity.resolve(req).is_some() {
        return None;
    }
    log::info!("Refused {} {} to a non-admin caller", req.method(), req.path());
    Some(
        HttpResponse::Forbidden()
            .content_type("text/plain; charset=utf-8")
            .body("Forbidden"),
    )
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

impl AppState {
    /// Builds the fields every HTML page shares.
    fn layout(&self, req: &HttpRequest, title: impl Into<String>) -> store::Result<Layout> {
        // The connection info borrow must end before cookies are read, which
        // borrows the request extensions mutably.
        let host = req.connection_info().host().to_owned();
        let admin = self.identity.resolve(req);
        Ok(Layout {
            title: title.into(),
            blog_title: self.config.blog_title.clone(),
            host,
            tags: self.store.list_tags()?,
            admin,
        })
    }
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

fn requested_page(req: &HttpRequest) -> Option<usize> {
    web::Query::<PageQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| parse_page(q.page.as_deref()))
}

fn home_page(req: &HttpRequest) -> std::result::Result<Url, url::ParseError> {
    let info = req.connection_info();
    Url::parse(&format!("{}://{}/", info.scheme(), info.host()))
}

/// Parses an id that makes up the whole path segment, e.g. `12`.
fn parse_id(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Parses the id at the front of a `{id}-{slug}` path, ignoring whatever
/// follows the digits.
fn leading_id(rest: &str) -> Option<u64> {
    let end = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or_else(|| rest.len());
    parse_id(&rest[..end])
}

/// The result of a request handler.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure that turns a request into a 500.
#[derive(Debug)]
pub enum Error {
    /// Returned when the store fails.
    Store(store::Error),

    /// Returned when a page can't be rendered.
    Render(render::Error),

    /// Returned when the RSS feed can't be built.
    Feed(feed::Error),

    /// Returned when the request's host doesn't form a valid URL.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Store(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        log::error!("Request failed: {}", self);
        HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body("Internal Server Error")
    }
}

impl From<store::Error> for Error {
    /// Converts [`store::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator on store calls.
    fn from(err: store::Error) -> Error {
        Error::Store(err)
    }
}

impl From<render::Error> for Error {
    /// Converts [`render::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator when rendering.
    fn from(err: render::Error) -> Error {
        Error::Render(err)
    }
}

impl From<feed::Error> for Error {
    /// Converts [`feed::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator when building the feed.
    fn from(err: feed::Error) -> Error {
        Error::Feed(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use
    /// the `?` operator when building absolute URLs.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
