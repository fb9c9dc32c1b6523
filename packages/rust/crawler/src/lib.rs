//! Content-tree crawler and page lister.
//!
//! This crate provides:
//! - [`tree`]: concurrent, throttled recursive walk of a content-store folder
//! - [`pages`]: turns a crawled site tree into page descriptors

pub mod pages;
pub mod tree;

pub use pages::{is_page, list_pages, page_name};
pub use tree::{CrawlResult, TreeCrawler};
