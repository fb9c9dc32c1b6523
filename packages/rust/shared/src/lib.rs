//! Shared types, error model, and configuration for sitegen.
//!
//! This crate is the foundation depended on by all other sitegen crates.
//! It provides:
//! - [`SitegenError`]: the unified error type
//! - Domain types ([`SiteRequest`], [`PageDescriptor`], [`StatusEvent`], [`Action`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], [`FanoutConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AuthConfig, CrawlConfig, CrawlSection, FanoutConfig, GithubConfig, RemoteConfig,
    SiteSection, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SitegenError};
pub use types::{
    Action, PageDescriptor, PageStatus, ProvisionStep, SiteConfigPayload, SiteLinks, SiteRequest,
    StatusEvent, normalize_site_name,
};
