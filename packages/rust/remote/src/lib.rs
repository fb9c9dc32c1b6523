//! HTTP clients for the remote content store and edge-delivery admin API.
//!
//! This crate provides:
//! - [`ContentClient`]: copy template trees, read/write source documents, list folders
//! - [`AdminClient`]: register site configs, trigger preview/publish
//! - [`auth`]: pluggable bearer-token providers

pub mod admin;
pub mod auth;
pub mod content;
mod http;

pub use admin::AdminClient;
pub use auth::{CachedToken, ChainedToken, EnvToken, StaticToken, TokenFile, TokenProvider};
pub use content::{ContentClient, ListItem};
pub use http::build_client;
