//! Core domain types for site provisioning.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{Result, SitegenError};

/// Characters that are not allowed in a site slug.
static ILLEGAL_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("valid slug regex"));

/// Normalize a user-supplied site name into a lowercase hyphenated slug.
///
/// Every character outside `[A-Za-z0-9]` becomes `-`; runs are not collapsed.
/// Normalizing an already-normalized slug returns it unchanged.
pub fn normalize_site_name(raw: &str) -> String {
    ILLEGAL_SLUG_CHARS.replace_all(raw, "-").to_lowercase()
}

// ---------------------------------------------------------------------------
// SiteRequest
// ---------------------------------------------------------------------------

/// A validated request to provision one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRequest {
    /// Normalized site slug.
    pub site_name: String,
    /// Free-form description substituted into the templates.
    pub site_description: String,
    /// Owner of the code repository bound to the site.
    pub github_owner: String,
    /// Code repository name.
    pub github_repo: String,
    /// Code repository URL.
    pub github_url: String,
}

impl SiteRequest {
    /// Build a request, normalizing the name and filling GitHub defaults from config.
    pub fn new(
        raw_name: &str,
        description: &str,
        github_owner: Option<&str>,
        github_repo: Option<&str>,
        github_url: Option<&str>,
        config: &AppConfig,
    ) -> Result<Self> {
        if raw_name.trim().is_empty() || description.trim().is_empty() {
            return Err(SitegenError::validation("Some fields empty."));
        }

        let pick = |value: Option<&str>, fallback: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(fallback)
                .to_string()
        };

        Ok(Self {
            site_name: normalize_site_name(raw_name),
            site_description: description.to_string(),
            github_owner: pick(github_owner, &config.github.owner),
            github_repo: pick(github_repo, &config.github.repo),
            github_url: pick(github_url, &config.github.url),
        })
    }

    /// Human-readable name used in templates (`my-site` → `my site`).
    pub fn display_name(&self) -> String {
        self.site_name.replace('-', " ")
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Admin-API state change applied to every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Render to the staging edge endpoint.
    Preview,
    /// Render to the production edge endpoint.
    Publish,
}

impl Action {
    /// Path segment the admin API expects for this action.
    pub fn route(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Publish => "live",
        }
    }

    /// Progressive label used in status messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Preview => "Previewing",
            Self::Publish => "Publishing",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preview => write!(f, "preview"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

// ---------------------------------------------------------------------------
// PageDescriptor
// ---------------------------------------------------------------------------

/// Processing status of a single page during a fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl PageStatus {
    /// Whether the page has settled.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Transitions are monotonic: pending → processing → completed | error.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Error)
        )
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One discovered document tracked through preview/publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// Display name relative to the site root (`/` for the root).
    pub name: String,
    /// Full content-store path, e.g. `/org/site/index.html`.
    pub path: String,
    /// Current status.
    pub status: PageStatus,
}

impl PageDescriptor {
    /// A fresh pending descriptor.
    pub fn pending(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            status: PageStatus::Pending,
        }
    }

    /// Return a copy with the status advanced, rejecting illegal transitions.
    pub fn with_status(&self, next: PageStatus) -> Result<Self> {
        if !self.status.can_transition_to(next) {
            return Err(SitegenError::validation(format!(
                "page {}: illegal status transition {} -> {next}",
                self.name, self.status
            )));
        }
        Ok(Self {
            status: next,
            ..self.clone()
        })
    }

    /// Same page, reset to pending (for the next action).
    pub fn reset(&self) -> Self {
        Self::pending(self.name.clone(), self.path.clone())
    }
}

// ---------------------------------------------------------------------------
// StatusEvent
// ---------------------------------------------------------------------------

/// Ephemeral notification pushed to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub message: String,
    pub pages: Option<Vec<PageDescriptor>>,
    pub action: Option<Action>,
}

impl StatusEvent {
    /// A plain phase message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pages: None,
            action: None,
        }
    }

    /// A fan-out start notification carrying the page list.
    pub fn fanout(action: Action, pages: Vec<PageDescriptor>) -> Self {
        Self {
            message: format!("{} {} pages...", action.label(), pages.len()),
            pages: Some(pages),
            action: Some(action),
        }
    }
}

// ---------------------------------------------------------------------------
// ProvisionStep
// ---------------------------------------------------------------------------

/// The ordered steps of site provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionStep {
    Copy,
    Template,
    Configure,
    Preview,
    Publish,
}

impl ProvisionStep {
    /// All steps in execution order.
    pub const ALL: [Self; 5] = [
        Self::Copy,
        Self::Template,
        Self::Configure,
        Self::Preview,
        Self::Publish,
    ];

    /// Phase message reported before the step runs.
    pub fn phase_message(self) -> &'static str {
        match self {
            Self::Copy => "Copying content.",
            Self::Template => "Templating content.",
            Self::Configure => "Creating new site.",
            Self::Preview => "Previewing pages.",
            Self::Publish => "Publishing pages.",
        }
    }

    /// Whether re-running this step against an already-provisioned site is safe.
    ///
    /// The content store refuses to clone onto an existing destination, so a
    /// repeated copy fails. Templating finds no placeholders left and writes the
    /// same text back; config registration overwrites; preview/publish are
    /// idempotent on the admin side.
    pub fn is_retry_safe(self) -> bool {
        !matches!(self, Self::Copy)
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Copy => "copy",
            Self::Template => "template",
            Self::Configure => "configure",
            Self::Preview => "preview",
            Self::Publish => "publish",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ProvisionStep {
    type Err = SitegenError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.to_string() == s)
            .ok_or_else(|| SitegenError::validation(format!("unknown step '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// SiteConfigPayload
// ---------------------------------------------------------------------------

/// Site configuration registered with the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfigPayload {
    pub version: u32,
    pub content: ContentBinding,
    pub code: CodeBinding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBinding {
    pub source: ContentSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSource {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBinding {
    pub owner: String,
    pub repo: String,
    pub source: CodeSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl SiteConfigPayload {
    /// Bind the site's content tree and code repository.
    pub fn for_site(request: &SiteRequest, content_delivery_origin: &str, org: &str) -> Self {
        let origin = content_delivery_origin.trim_end_matches('/');
        Self {
            version: 1,
            content: ContentBinding {
                source: ContentSource {
                    url: format!("{origin}/{org}/{}/", request.site_name),
                    kind: "markup".into(),
                },
            },
            code: CodeBinding {
                owner: request.github_owner.clone(),
                repo: request.github_repo.clone(),
                source: CodeSource {
                    kind: "github".into(),
                    url: request.github_url.clone(),
                },
            },
        }
    }
}

// ---------------------------------------------------------------------------
// SiteLinks
// ---------------------------------------------------------------------------

/// Next-step links shown once a site is live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLinks {
    pub edit_nav: String,
    pub edit_footer: String,
    pub view_content: String,
    pub visit_site: String,
}

impl SiteLinks {
    pub fn new(org: &str, site: &str) -> Self {
        Self {
            edit_nav: format!("https://da.live/edit#/{org}/{site}/nav"),
            edit_footer: format!("https://da.live/edit#/{org}/{site}/footer"),
            view_content: format!("https://da.live/#/{org}/{site}"),
            visit_site: format!("https://main--{site}--{org}.aem.page"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_replaces_illegal_chars() {
        assert_eq!(normalize_site_name("My Site!"), "my-site-");
        assert_eq!(normalize_site_name("Test Site"), "test-site");
        assert_eq!(normalize_site_name("a_b.c"), "a-b-c");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["My Site!", "Ünïcode Name", "already-slug", "x  y"] {
            let once = normalize_site_name(raw);
            assert_eq!(normalize_site_name(&once), once);
            assert!(once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }
    }

    #[test]
    fn site_request_fills_github_defaults() {
        let config = AppConfig::default();
        let req = SiteRequest::new("Test Site", "d", None, Some(""), None, &config).unwrap();
        assert_eq!(req.site_name, "test-site");
        assert_eq!(req.github_owner, "adobecom");
        assert_eq!(req.github_repo, "milo-starter");
        assert_eq!(req.display_name(), "test site");
    }

    #[test]
    fn site_request_keeps_surrounding_whitespace_in_slug() {
        let config = AppConfig::default();
        let req = SiteRequest::new(" My Site", "d", None, None, None, &config).unwrap();
        assert_eq!(req.site_name, "-my-site");
    }

    #[test]
    fn site_request_rejects_empty_fields() {
        let config = AppConfig::default();
        let err = SiteRequest::new("  ", "d", None, None, None, &config).unwrap_err();
        assert!(err.to_string().contains("Some fields empty."));
        assert!(SiteRequest::new("name", "", None, None, None, &config).is_err());
    }

    #[test]
    fn page_status_transitions_are_monotonic() {
        let page = PageDescriptor::pending("/index", "/org/site/index.html");
        assert!(page.with_status(PageStatus::Completed).is_err());

        let processing = page.with_status(PageStatus::Processing).unwrap();
        let done = processing.with_status(PageStatus::Completed).unwrap();
        assert!(done.status.is_terminal());
        assert!(done.with_status(PageStatus::Error).is_err());
        assert!(processing.with_status(PageStatus::Processing).is_err());
        // original untouched
        assert_eq!(page.status, PageStatus::Pending);
    }

    #[test]
    fn fanout_event_message() {
        let pages = vec![PageDescriptor::pending("/a", "/o/s/a.html")];
        let ev = StatusEvent::fanout(Action::Publish, pages);
        assert_eq!(ev.message, "Publishing 1 pages...");
        assert_eq!(ev.action, Some(Action::Publish));
    }

    #[test]
    fn step_parsing_and_retry_safety() {
        assert_eq!("template".parse::<ProvisionStep>().unwrap(), ProvisionStep::Template);
        assert!("bogus".parse::<ProvisionStep>().is_err());
        assert!(!ProvisionStep::Copy.is_retry_safe());
        assert!(ProvisionStep::ALL[1..].iter().all(|s| s.is_retry_safe()));
    }

    #[test]
    fn config_payload_shape() {
        let config = AppConfig::default();
        let req = SiteRequest::new("demo", "d", None, None, None, &config).unwrap();
        let payload = SiteConfigPayload::for_site(&req, "https://content.da.live/", "adobecom");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["content"]["source"]["url"], "https://content.da.live/adobecom/demo/");
        assert_eq!(json["content"]["source"]["type"], "markup");
        assert_eq!(json["code"]["source"]["type"], "github");
        assert_eq!(json["code"]["repo"], "milo-starter");
    }

    #[test]
    fn site_links() {
        let links = SiteLinks::new("adobecom", "demo");
        assert_eq!(links.visit_site, "https://main--demo--adobecom.aem.page");
        assert!(links.edit_nav.ends_with("/adobecom/demo/nav"));
    }
}
