//! Bearer-token providers.
//!
//! Every remote call asks a [`TokenProvider`] for a token right before it is
//! sent. Providers compose: [`ChainedToken`] tries a local development override
//! before falling back to the environment, and [`CachedToken`] memoizes the
//! first successful lookup until [`TokenProvider::invalidate`] is called.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use sitegen_shared::{AuthConfig, Result, SitegenError};
use tracing::debug;

/// Source of bearer tokens for the remote APIs.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Look up a token. Fails with [`SitegenError::Auth`] when none is available.
    async fn token(&self) -> Result<String>;

    /// Drop any cached token so the next lookup hits the source again.
    fn invalidate(&self) {}
}

/// Fixed token, e.g. from `--token`.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String> {
        if self.0.is_empty() {
            return Err(SitegenError::auth("empty token"));
        }
        Ok(self.0.clone())
    }
}

/// Token read from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl TokenProvider for EnvToken {
    async fn token(&self) -> Result<String> {
        match std::env::var(&self.var) {
            Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
            _ => Err(SitegenError::auth(format!(
                "no token found. Set the {} environment variable.",
                self.var
            ))),
        }
    }
}

/// Local development override: a file whose trimmed contents are the token.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenProvider for TokenFile {
    async fn token(&self) -> Result<String> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SitegenError::auth(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let token = content.trim();
        if token.is_empty() {
            return Err(SitegenError::auth(format!(
                "{} is empty",
                self.path.display()
            )));
        }
        Ok(token.to_string())
    }
}

/// First provider that yields a token wins.
pub struct ChainedToken {
    providers: Vec<Arc<dyn TokenProvider>>,
}

impl ChainedToken {
    pub fn new(providers: Vec<Arc<dyn TokenProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl TokenProvider for ChainedToken {
    async fn token(&self) -> Result<String> {
        let mut reasons = Vec::new();
        for provider in &self.providers {
            match provider.token().await {
                Ok(token) => return Ok(token),
                Err(e) => {
                    debug!(error = %e, "token provider declined");
                    reasons.push(e.to_string());
                }
            }
        }
        Err(SitegenError::auth(format!(
            "no token provider succeeded ({})",
            reasons.join("; ")
        )))
    }

    fn invalidate(&self) {
        for provider in &self.providers {
            provider.invalidate();
        }
    }
}

/// Memoizes the first successful lookup of the wrapped provider.
pub struct CachedToken {
    inner: Arc<dyn TokenProvider>,
    cached: Mutex<Option<String>>,
}

impl CachedToken {
    pub fn new(inner: Arc<dyn TokenProvider>) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }

    /// The default lookup: local override file, then the configured env var.
    pub fn from_config(auth: &AuthConfig) -> Self {
        let mut providers: Vec<Arc<dyn TokenProvider>> = Vec::new();
        if let Some(path) = auth.token_file_path() {
            providers.push(Arc::new(TokenFile::new(path)));
        }
        providers.push(Arc::new(EnvToken::new(auth.token_env.clone())));
        Self::new(Arc::new(ChainedToken::new(providers)))
    }
}

#[async_trait]
impl TokenProvider for CachedToken {
    async fn token(&self) -> Result<String> {
        let hit = self
            .cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(token) = hit {
            return Ok(token);
        }

        let token = self.inner.token().await?;
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(token)
    }

    fn invalidate(&self) {
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.invalidate();
    }
}
