//! Content-store client: template cloning, source documents, folder listings.

use std::sync::Arc;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sitegen_shared::{Result, SitegenError};
use tracing::{debug, info, instrument};

use crate::auth::TokenProvider;
use crate::http;

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListItem {
    /// Absolute content path, e.g. `/org/site/index.html`.
    pub path: String,
    /// Entry name without extension.
    #[serde(default)]
    pub name: String,
    /// File extension; folders have none.
    #[serde(default)]
    pub ext: Option<String>,
}

impl ListItem {
    pub fn is_folder(&self) -> bool {
        self.ext.is_none()
    }
}

/// Client for the content-store admin API (`/copy`, `/source`, `/list`).
#[derive(Clone)]
pub struct ContentClient {
    client: Client,
    origin: String,
    org: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ContentClient {
    pub fn new(
        client: Client,
        origin: impl Into<String>,
        org: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client,
            origin: origin.into(),
            org: org.into(),
            tokens,
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    /// Root of a site's content tree: `/<org>/<site>`.
    pub fn site_root(&self, site: &str) -> String {
        format!("/{}/{site}", self.org)
    }

    /// Clone the template tree into `/<org>/<site>`.
    ///
    /// The store refuses to clone onto an existing destination.
    #[instrument(skip(self))]
    pub async fn copy_tree(&self, template: &str, site: &str) -> Result<()> {
        let url = http::join(&self.origin, &format!("copy/{}/{template}/", self.org));
        let form = Form::new().text("destination", self.site_root(site));
        let token = self.tokens.token().await?;

        http::send(
            self.client.post(&url).bearer_auth(token).multipart(form),
            "copy content",
        )
        .await?;

        info!(%url, destination = %self.site_root(site), "template copied");
        Ok(())
    }

    /// Read a source document.
    #[instrument(skip(self))]
    pub async fn get_source(&self, site: &str, path: &str) -> Result<String> {
        let url = self.source_url(site, path);
        let token = self.tokens.token().await?;

        let response = http::send(
            self.client.get(&url).bearer_auth(token),
            &format!("fetch {path}"),
        )
        .await?;

        response
            .text()
            .await
            .map_err(|e| SitegenError::Network(format!("{url}: failed to read body: {e}")))
    }

    /// Overwrite a source document with HTML.
    #[instrument(skip(self, html), fields(len = html.len()))]
    pub async fn put_source(&self, site: &str, path: &str, html: String) -> Result<()> {
        let url = self.source_url(site, path);
        let part = Part::text(html)
            .mime_str("text/html")
            .map_err(|e| SitegenError::Network(format!("{url}: {e}")))?;
        let form = Form::new().part("data", part);
        let token = self.tokens.token().await?;

        http::send(
            self.client.post(&url).bearer_auth(token).multipart(form),
            &format!("update {path}"),
        )
        .await?;

        debug!(%url, "source updated");
        Ok(())
    }

    /// List the direct children of a content folder.
    pub async fn list(&self, path: &str) -> Result<Vec<ListItem>> {
        let url = http::join(&self.origin, &format!("list{path}"));
        let token = self.tokens.token().await?;

        let response = http::send(
            self.client.get(&url).bearer_auth(token),
            &format!("list {path}"),
        )
        .await?;

        let body = response
            .text()
            .await
            .map_err(|e| SitegenError::Network(format!("{url}: failed to read body: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| SitegenError::parse(format!("{url}: invalid listing: {e}")))
    }

    fn source_url(&self, site: &str, path: &str) -> String {
        http::join(
            &self.origin,
            &format!("source/{}/{site}{path}", self.org),
        )
    }
}
