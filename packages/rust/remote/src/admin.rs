//! Edge-delivery admin client: site config registration and page actions.

use std::sync::Arc;

use reqwest::Client;
use sitegen_shared::{Action, Result, SiteConfigPayload};
use tracing::{debug, info, instrument};

use crate::auth::TokenProvider;
use crate::http;

/// Client for the admin API (`/config`, `/preview`, `/live`).
#[derive(Clone)]
pub struct AdminClient {
    client: Client,
    origin: String,
    org: String,
    tokens: Arc<dyn TokenProvider>,
}

impl AdminClient {
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

    /// Register (or overwrite) the site configuration.
    #[instrument(skip(self, payload))]
    pub async fn create_site_config(&self, site: &str, payload: &SiteConfigPayload) -> Result<()> {
        let url = http::join(
            &self.origin,
            &format!("config/{}/sites/{site}.json", self.org),
        );
        let token = self.tokens.token().await?;

        http::send(
            self.client.post(&url).bearer_auth(token).json(payload),
            "create config",
        )
        .await?;

        info!(%url, "site config registered");
        Ok(())
    }

    /// Trigger `action` for one page. `target` is the admin-side path,
    /// e.g. `/org/site/main/index`.
    pub async fn trigger(&self, action: Action, target: &str) -> Result<()> {
        let url = http::join(&self.origin, &format!("{}{target}", action.route()));
        let token = self.tokens.token().await?;

        http::send(
            self.client.post(&url).bearer_auth(token),
            &format!("{action} {target}"),
        )
        .await?;

        debug!(%url, %action, "page action accepted");
        Ok(())
    }
}
