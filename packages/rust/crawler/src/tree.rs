//! Concurrent content-tree crawler.
//!
//! Starts from a folder path, lists it through the content store, and
//! descends into every sub-folder. Listing requests run in batches bounded by
//! the configured concurrency, each preceded by the throttle delay. Every
//! document found is handed to the caller's callback.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sitegen_remote::{ContentClient, ListItem};
use sitegen_shared::{CrawlConfig, Result, SitegenError};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

// ---------------------------------------------------------------------------
// CrawlResult
// ---------------------------------------------------------------------------

/// Summary of a completed crawl.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Documents handed to the callback.
    pub files_visited: usize,
    /// Folders listed (including the root).
    pub folders_listed: usize,
    /// Total duration of the crawl.
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// TreeCrawler
// ---------------------------------------------------------------------------

/// Recursive folder walker over the content-store listing API.
#[derive(Clone)]
pub struct TreeCrawler {
    content: ContentClient,
    config: CrawlConfig,
}

impl TreeCrawler {
    pub fn new(content: ContentClient, config: CrawlConfig) -> Self {
        Self { content, config }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentClient {
        &self.content
    }

    /// Crawl every folder below `root`, calling `on_file` once per document.
    ///
    /// Any listing failure aborts the crawl.
    #[instrument(skip_all, fields(root = %root))]
    pub async fn crawl<F>(&self, root: &str, mut on_file: F) -> Result<CrawlResult>
    where
        F: FnMut(&ListItem),
    {
        let start_time = Instant::now();
        let concurrency = self.config.concurrency.max(1) as usize;
        let semaphore = Arc::new(Semaphore::new(concurrency));

        let mut queue: Vec<String> = vec![root.to_string()];
        let mut visited: HashSet<String> = HashSet::new();
        let mut files_visited = 0;
        let mut folders_listed = 0;

        info!(
            concurrency,
            throttle_ms = self.config.throttle_ms,
            "starting tree crawl"
        );

        while !queue.is_empty() {
            // Take a batch from the queue (up to concurrency limit)
            let batch: Vec<String> = {
                let drain_count = queue.len().min(concurrency);
                queue.drain(..drain_count).collect()
            };

            let mut handles = Vec::new();

            for folder in batch {
                if !visited.insert(folder.clone()) {
                    continue;
                }

                let content = self.content.clone();
                let sem = semaphore.clone();
                let throttle = self.config.throttle_ms;

                handles.push(tokio::spawn(async move {
                    let _permit = sem
                        .acquire_owned()
                        .await
                        .map_err(|e| SitegenError::Network(format!("crawl aborted: {e}")))?;

                    if throttle > 0 {
                        tokio::time::sleep(Duration::from_millis(throttle)).await;
                    }

                    debug!(%folder, "listing folder");
                    content.list(&folder).await
                }));
            }

            for handle in handles {
                let items = handle
                    .await
                    .map_err(|e| SitegenError::Network(format!("crawl task failed: {e}")))??;
                folders_listed += 1;

                for item in items {
                    if item.is_folder() {
                        queue.push(item.path);
                    } else {
                        files_visited += 1;
                        on_file(&item);
                    }
                }
            }
        }

        let result = CrawlResult {
            files_visited,
            folders_listed,
            duration: start_time.elapsed(),
        };

        info!(
            files = result.files_visited,
            folders = result.folders_listed,
            duration_ms = result.duration.as_millis(),
            "tree crawl completed"
        );

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use sitegen_remote::{StaticToken, build_client};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    pub(crate) fn crawl_config() -> CrawlConfig {
        CrawlConfig {
            concurrency: 2,
            throttle_ms: 0,
            include_library: false,
            skip_extensions: vec!["png".into()],
        }
    }

    pub(crate) fn crawler_for(server: &MockServer, config: CrawlConfig) -> TreeCrawler {
        let content = ContentClient::new(
            build_client(5).unwrap(),
            server.uri(),
            "acme",
            Arc::new(StaticToken::new("t")),
        );
        TreeCrawler::new(content, config)
    }

    pub(crate) async fn mount_listing(server: &MockServer, folder: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/list{folder}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn crawl_descends_into_folders() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "/acme/site",
            r#"[{"path":"/acme/site/index.html","name":"index","ext":"html"},
                {"path":"/acme/site/docs","name":"docs"},
                {"path":"/acme/site/blog","name":"blog"}]"#,
        )
        .await;
        mount_listing(
            &server,
            "/acme/site/docs",
            r#"[{"path":"/acme/site/docs/a.html","name":"a","ext":"html"},
                {"path":"/acme/site/docs/deep","name":"deep"}]"#,
        )
        .await;
        mount_listing(&server, "/acme/site/blog", "[]").await;
        mount_listing(
            &server,
            "/acme/site/docs/deep",
            r#"[{"path":"/acme/site/docs/deep/b.html","name":"b","ext":"html"}]"#,
        )
        .await;

        let mut seen = Vec::new();
        let result = crawler_for(&server, crawl_config())
            .crawl("/acme/site", |item| seen.push(item.path.clone()))
            .await
            .unwrap();

        seen.sort();
        assert_eq!(
            seen,
            vec![
                "/acme/site/docs/a.html",
                "/acme/site/docs/deep/b.html",
                "/acme/site/index.html",
            ]
        );
        assert_eq!(result.files_visited, 3);
        assert_eq!(result.folders_listed, 4);
    }

    /// Empty listing after a fixed delay, recording when each request arrived.
    #[derive(Clone, Default)]
    struct SlowListing {
        arrivals: Arc<Mutex<Vec<Instant>>>,
    }

    impl Respond for SlowListing {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            self.arrivals.lock().unwrap().push(Instant::now());
            ResponseTemplate::new(200)
                .set_body_string("[]")
                .set_delay(LISTING_DELAY)
        }
    }

    const LISTING_DELAY: Duration = Duration::from_millis(200);

    /// Most requests that arrived within one listing delay of each other.
    fn max_overlap(arrivals: &[Instant]) -> usize {
        let window = LISTING_DELAY * 3 / 4;
        let mut sorted = arrivals.to_vec();
        sorted.sort();
        (0..sorted.len())
            .map(|i| {
                sorted[..=i]
                    .iter()
                    .filter(|earlier| sorted[i].duration_since(**earlier) < window)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn listings_are_bounded_by_concurrency() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "/acme/site",
            r#"[{"path":"/acme/site/a","name":"a"},
                {"path":"/acme/site/b","name":"b"},
                {"path":"/acme/site/c","name":"c"},
                {"path":"/acme/site/d","name":"d"},
                {"path":"/acme/site/e","name":"e"}]"#,
        )
        .await;
        let slow = SlowListing::default();
        Mock::given(method("GET"))
            .and(path_regex(r"^/list/acme/site/[a-e]$"))
            .respond_with(slow.clone())
            .expect(5)
            .mount(&server)
            .await;

        let result = crawler_for(&server, crawl_config())
            .crawl("/acme/site", |_| {})
            .await
            .unwrap();

        assert_eq!(result.folders_listed, 6);
        let arrivals = slow.arrivals.lock().unwrap().clone();
        let overlap = max_overlap(&arrivals);
        assert!(overlap <= 2, "{overlap} listings in flight");
        assert!(overlap >= 2, "expected parallel listings, got {overlap}");
        // Five sub-folders at two at a time take three rounds.
        assert!(result.duration >= LISTING_DELAY * 3);
    }

    #[tokio::test]
    async fn every_listing_waits_for_the_throttle() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "/acme/site",
            r#"[{"path":"/acme/site/docs","name":"docs"}]"#,
        )
        .await;
        mount_listing(&server, "/acme/site/docs", "[]").await;

        let config = CrawlConfig {
            throttle_ms: 150,
            ..crawl_config()
        };
        let result = crawler_for(&server, config)
            .crawl("/acme/site", |_| {})
            .await
            .unwrap();

        assert_eq!(result.folders_listed, 2);
        assert!(result.duration >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn listing_failure_aborts_crawl() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list/acme/site"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = crawler_for(&server, crawl_config())
            .crawl("/acme/site", |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), Some(401));
    }
}
