//! Application configuration for sitegen.
//!
//! User config lives at `~/.sitegen/sitegen.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SitegenError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitegen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sitegen";

/// Default local-development token override file, inside the config dir.
const LOCAL_TOKEN_FILE_NAME: &str = "local-token";

// ---------------------------------------------------------------------------
// Config structs (matching sitegen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote API origins.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Organization and template settings.
    #[serde(default)]
    pub site: SiteSection,

    /// Default code-repository binding.
    #[serde(default)]
    pub github: GithubConfig,

    /// Content-tree crawl settings.
    #[serde(default)]
    pub crawl: CrawlSection,

    /// Preview/publish fan-out settings.
    #[serde(default)]
    pub fanout: FanoutConfig,

    /// Credential lookup.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// `[remote]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Content-store admin origin (copy, source, list).
    #[serde(default = "default_content_origin")]
    pub content_origin: String,

    /// Edge-delivery admin origin (config, preview, live).
    #[serde(default = "default_admin_origin")]
    pub admin_origin: String,

    /// Origin the edge pulls markup from; goes into the site config.
    #[serde(default = "default_content_delivery_origin")]
    pub content_delivery_origin: String,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            content_origin: default_content_origin(),
            admin_origin: default_admin_origin(),
            content_delivery_origin: default_content_delivery_origin(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_content_origin() -> String {
    "https://admin.da.live".into()
}
fn default_admin_origin() -> String {
    "https://admin.hlx.page".into()
}
fn default_content_delivery_origin() -> String {
    "https://content.da.live".into()
}
fn default_request_timeout() -> u64 {
    30
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    /// Organization all sites are created under.
    #[serde(default = "default_org")]
    pub org: String,

    /// Template site cloned for every new site.
    #[serde(default = "default_template")]
    pub template: String,

    /// Documents whose placeholders are rewritten after cloning.
    #[serde(default = "default_template_files")]
    pub template_files: Vec<String>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            org: default_org(),
            template: default_template(),
            template_files: default_template_files(),
        }
    }
}

fn default_org() -> String {
    "adobecom".into()
}
fn default_template() -> String {
    "milo-starter".into()
}
fn default_template_files() -> Vec<String> {
    vec![
        "/index.html".into(),
        "/gnav.html".into(),
        "/footer.html".into(),
    ]
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_owner")]
    pub owner: String,
    #[serde(default = "default_github_repo")]
    pub repo: String,
    #[serde(default = "default_github_url")]
    pub url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: default_github_owner(),
            repo: default_github_repo(),
            url: default_github_url(),
        }
    }
}

fn default_github_owner() -> String {
    "adobecom".into()
}
fn default_github_repo() -> String {
    "milo-starter".into()
}
fn default_github_url() -> String {
    "https://github.com/adobecom/milo-starter".into()
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSection {
    /// Concurrent listing requests.
    #[serde(default = "default_crawl_concurrency")]
    pub concurrency: u32,

    /// Delay in ms before each listing request.
    #[serde(default = "default_throttle")]
    pub throttle_ms: u64,

    /// Also crawl the site's `.da` library tree.
    #[serde(default = "default_true")]
    pub include_library: bool,

    /// File extensions (without dot) that are never pages.
    #[serde(default = "default_skip_extensions")]
    pub skip_extensions: Vec<String>,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            concurrency: default_crawl_concurrency(),
            throttle_ms: default_throttle(),
            include_library: true,
            skip_extensions: default_skip_extensions(),
        }
    }
}

fn default_crawl_concurrency() -> u32 {
    5
}
fn default_throttle() -> u64 {
    250
}
fn default_true() -> bool {
    true
}
fn default_skip_extensions() -> Vec<String> {
    ["svg", "png", "jpg", "jpeg", "gif", "webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// `[fanout]` section; also the runtime fan-out config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Maximum preview/publish requests in flight.
    #[serde(default = "default_fanout_concurrency")]
    pub concurrency: u32,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            concurrency: default_fanout_concurrency(),
        }
    }
}

fn default_fanout_concurrency() -> u32 {
    8
}

/// `[auth]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Name of the env var holding the bearer token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Local development override file. Defaults to `~/.sitegen/local-token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            token_file: None,
        }
    }
}

fn default_token_env() -> String {
    "SITEGEN_TOKEN".into()
}

impl AuthConfig {
    /// Resolved path of the local token override file, if one can be determined.
    pub fn token_file_path(&self) -> Option<PathBuf> {
        match &self.token_file {
            Some(p) => Some(PathBuf::from(p)),
            None => config_dir().ok().map(|d| d.join(LOCAL_TOKEN_FILE_NAME)),
        }
    }
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum concurrent listing requests.
    pub concurrency: u32,
    /// Delay in ms before each listing request.
    pub throttle_ms: u64,
    /// Also crawl the `.da` library tree.
    pub include_library: bool,
    /// Extensions excluded from the page list.
    pub skip_extensions: Vec<String>,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            concurrency: config.crawl.concurrency,
            throttle_ms: config.crawl.throttle_ms,
            include_library: config.crawl.include_library,
            skip_extensions: config.crawl.skip_extensions.clone(),
        }
    }
}

impl AppConfig {
    /// Reject values that would make provisioning impossible.
    pub fn validate(&self) -> Result<()> {
        if self.site.org.trim().is_empty() {
            return Err(SitegenError::config("site.org must not be empty"));
        }
        if self.site.template.trim().is_empty() {
            return Err(SitegenError::config("site.template must not be empty"));
        }
        if self.fanout.concurrency == 0 || self.crawl.concurrency == 0 {
            return Err(SitegenError::config("concurrency must be at least 1"));
        }
        for origin in [
            &self.remote.content_origin,
            &self.remote.admin_origin,
            &self.remote.content_delivery_origin,
        ] {
            url::Url::parse(origin)
                .map_err(|e| SitegenError::config(format!("invalid origin '{origin}': {e}")))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sitegen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SitegenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sitegen/sitegen.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SitegenError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| SitegenError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SitegenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SitegenError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SitegenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
