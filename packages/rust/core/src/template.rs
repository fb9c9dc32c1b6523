//! Placeholder rewriting for the cloned template documents.

use futures::future::join_all;
use sitegen_remote::ContentClient;
use sitegen_shared::{Result, SiteRequest};
use tracing::{debug, info, instrument, warn};

pub const NAME_PLACEHOLDER: &str = "{{name-site}}";
pub const DESCRIPTION_PLACEHOLDER: &str = "{{description-site}}";

/// Substitute the site name and description into a template document.
pub fn apply_placeholders(text: &str, request: &SiteRequest) -> String {
    text.replace(NAME_PLACEHOLDER, &request.display_name())
        .replace(DESCRIPTION_PLACEHOLDER, &request.site_description)
}

/// Rewrite every file in `files` concurrently.
///
/// Every rewrite runs to completion even when a sibling fails; the step then
/// fails with the first error in file order. Files already written stay
/// written.
///
/// A document with no placeholders left is not written back, so re-running
/// against a templated site changes nothing.
#[instrument(skip_all, fields(site = %request.site_name, files = files.len()))]
pub async fn replace_templates(
    content: &ContentClient,
    request: &SiteRequest,
    files: &[String],
) -> Result<()> {
    let results = join_all(
        files
            .iter()
            .map(|path| rewrite_file(content, request, path)),
    )
    .await;

    let failed = results.iter().filter(|r| r.is_err()).count();
    if let Some(first) = results.into_iter().find_map(|r| r.err()) {
        warn!(failed, total = files.len(), "template rewrite failed");
        return Err(first);
    }

    info!("templates rewritten");
    Ok(())
}

async fn rewrite_file(content: &ContentClient, request: &SiteRequest, path: &str) -> Result<()> {
    let site = request.site_name.as_str();
    let text = content.get_source(site, path).await?;
    let templated = apply_placeholders(&text, request);
    if templated == text {
        debug!(%path, "no placeholders left, skipping write");
        return Ok(());
    }
    content.put_source(site, path, templated).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use sitegen_remote::{StaticToken, build_client};
    use sitegen_shared::AppConfig;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SiteRequest {
        SiteRequest::new("My Site", "A fine site", None, None, None, &AppConfig::default()).unwrap()
    }

    #[test]
    fn placeholders_are_replaced_everywhere() {
        let text = "<h1>{{name-site}}</h1><p>{{description-site}}</p><i>{{name-site}}</i>";
        assert_eq!(
            apply_placeholders(text, &request()),
            "<h1>my site</h1><p>A fine site</p><i>my site</i>"
        );
    }

    #[test]
    fn templating_is_idempotent() {
        let once = apply_placeholders("<h1>{{name-site}}</h1>", &request());
        assert_eq!(apply_placeholders(&once, &request()), once);
    }

    #[tokio::test]
    async fn rewrites_each_file_and_skips_clean_ones() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/source/acme/my-site/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>{{name-site}}</h1>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/source/acme/my-site/footer.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<footer>static</footer>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/source/acme/my-site/index.html"))
            .and(body_string_contains("<h1>my site</h1>"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/source/acme/my-site/footer.html"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let content = ContentClient::new(
            build_client(5).unwrap(),
            server.uri(),
            "acme",
            Arc::new(StaticToken::new("t")),
        );
        let files = vec!["/index.html".to_string(), "/footer.html".to_string()];
        replace_templates(&content, &request(), &files).await.unwrap();
    }

    #[tokio::test]
    async fn failing_file_does_not_cancel_siblings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/source/acme/my-site/gnav.html"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/source/acme/my-site/index.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<h1>{{name-site}}</h1>")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/source/acme/my-site/index.html"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let content = ContentClient::new(
            build_client(5).unwrap(),
            server.uri(),
            "acme",
            Arc::new(StaticToken::new("t")),
        );
        let files = vec!["/index.html".to_string(), "/gnav.html".to_string()];
        let err = replace_templates(&content, &request(), &files)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fetch /gnav.html failed: HTTP 404 Not Found");
    }

    #[tokio::test]
    async fn missing_template_fails_the_step() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/source/acme/my-site/gnav.html"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let content = ContentClient::new(
            build_client(5).unwrap(),
            server.uri(),
            "acme",
            Arc::new(StaticToken::new("t")),
        );
        let err = replace_templates(&content, &request(), &["/gnav.html".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fetch /gnav.html failed: HTTP 404 Not Found");
    }
}
