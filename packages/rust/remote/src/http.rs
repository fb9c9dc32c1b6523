//! Shared HTTP plumbing: client construction and status mapping.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use sitegen_shared::{Result, SitegenError};

/// User-Agent string for all remote requests.
const USER_AGENT: &str = concat!("sitegen/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Build a reqwest client shared by the content and admin clients.
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SitegenError::Network(format!("failed to build HTTP client: {e}")))
}

/// Send a request and turn non-2xx answers into [`SitegenError::Http`].
pub(crate) async fn send(request: RequestBuilder, operation: &str) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| SitegenError::Network(format!("{operation}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SitegenError::http(
            operation,
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
        ));
    }

    Ok(response)
}

/// Join an origin and an absolute path without doubling slashes.
pub(crate) fn join(origin: &str, path: &str) -> String {
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_slashes() {
        assert_eq!(join("https://a.test/", "/x/y"), "https://a.test/x/y");
        assert_eq!(join("https://a.test", "x"), "https://a.test/x");
    }

    #[tokio::test]
    async fn non_success_maps_to_http_error() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/nope"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_client(5).unwrap();
        let err = send(client.get(format!("{}/nope", server.uri())), "fetch thing")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fetch thing failed: HTTP 404 Not Found");
    }
}
