//! The library code for the `tagblog` server, a small blog whose posts carry
//! free-form tags. The moving parts are:
//!
//! 1. The data model: [`crate::post`] and [`crate::tag`], kept in a
//!    [`crate::store::Store`]
//! 2. The request side: [`crate::app`] maps URLs onto [`crate::handlers`],
//!    which build a [`crate::view::Page`] and hand it to a
//!    [`crate::render::Renderer`]
//! 3. The feeds: an RSS channel ([`crate::feed`]) and a sitemap
//!    ([`crate::sitemap`])
//!
//! Tags are denormalized. A post stores the titles of its tags, and the tag
//! records (with their post counts) are rebuilt from the posts on demand by
//! [`crate::reconcile::reconcile_tags`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod app;
pub mod config;
pub mod escape;
pub mod feed;
pub mod handlers;
pub mod identity;
pub mod markdown;
pub mod pagination;
pub mod post;
pub mod reconcile;
pub mod render;
pub mod sitemap;
pub mod slug;
pub mod store;
pub mod tag;
pub mod view;
