//! End-to-end `provision` pipeline: copy → template → configure → preview → publish.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sitegen_crawler::{TreeCrawler, list_pages};
use sitegen_remote::{AdminClient, ContentClient, TokenProvider, build_client};
use sitegen_shared::{
    Action, AppConfig, CrawlConfig, PageDescriptor, ProvisionStep, Result, SiteConfigPayload,
    SiteLinks, SiteRequest, StatusEvent,
};
use tracing::{info, instrument};

use crate::progress::ProgressReporter;
use crate::runner;
use crate::template;

/// Final phase message.
const DONE_MESSAGE: &str = "Done!";

/// Options for a `provision` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionOptions {
    /// Steps before this one are skipped.
    pub resume_from: ProvisionStep,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            resume_from: ProvisionStep::Copy,
        }
    }
}

impl ProvisionOptions {
    /// Re-run the sequence starting at `step`. Only meaningful for an
    /// already-copied site; see [`ProvisionStep::is_retry_safe`].
    pub fn resume_from(step: ProvisionStep) -> Self {
        Self { resume_from: step }
    }

    fn runs(&self, step: ProvisionStep) -> bool {
        step >= self.resume_from
    }
}

/// Result of a successful `provision` run.
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    /// The request that was provisioned.
    pub site: SiteRequest,
    /// Pages after publishing, all `completed`.
    pub pages: Vec<PageDescriptor>,
    /// Next-step links for the new site.
    pub links: SiteLinks,
    /// Steps that were skipped because of `resume_from`.
    pub skipped: Vec<ProvisionStep>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Drives provisioning against one content store and one admin API.
pub struct Provisioner {
    content: ContentClient,
    admin: AdminClient,
    crawler: TreeCrawler,
    template: String,
    template_files: Vec<String>,
    content_delivery_origin: String,
    concurrency: usize,
}

impl Provisioner {
    /// Build clients for the configured origins, sharing one HTTP client and
    /// one token provider.
    pub fn from_config(config: &AppConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        config.validate()?;

        let client = build_client(config.remote.request_timeout_secs)?;
        let org = config.site.org.clone();
        let content = ContentClient::new(
            client.clone(),
            config.remote.content_origin.clone(),
            org.clone(),
            tokens.clone(),
        );
        let admin = AdminClient::new(client, config.remote.admin_origin.clone(), org, tokens);
        let crawler = TreeCrawler::new(content.clone(), CrawlConfig::from(config));

        Ok(Self {
            content,
            admin,
            crawler,
            template: config.site.template.clone(),
            template_files: config.site.template_files.clone(),
            content_delivery_origin: config.remote.content_delivery_origin.clone(),
            concurrency: config.fanout.concurrency as usize,
        })
    }

    /// Override the preview/publish concurrency limit.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn org(&self) -> &str {
        self.content.org()
    }

    /// `/<org>/<site>`.
    pub fn site_root(&self, site: &str) -> String {
        self.content.site_root(site)
    }

    /// Crawl a site and return its pending page list.
    pub async fn list_pages(&self, site: &str) -> Result<Vec<PageDescriptor>> {
        list_pages(&self.crawler, &self.site_root(site)).await
    }

    /// Apply one action to `pages` of `site`.
    pub async fn run_action(
        &self,
        site: &str,
        pages: &[PageDescriptor],
        action: Action,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<PageDescriptor>> {
        runner::run_action(
            &self.admin,
            &self.site_root(site),
            pages,
            action,
            self.concurrency,
            progress,
        )
        .await
    }

    /// Run the provisioning sequence.
    ///
    /// Each step reports its phase message before running. The first failure
    /// aborts the remaining steps and is returned as [`sitegen_shared::SitegenError::Step`];
    /// completed steps are not rolled back.
    #[instrument(skip_all, fields(site = %request.site_name, resume_from = %options.resume_from))]
    pub async fn provision(
        &self,
        request: &SiteRequest,
        options: ProvisionOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<ProvisionOutcome> {
        let start = Instant::now();
        let site = request.site_name.as_str();
        let mut skipped = Vec::new();

        info!(org = %self.org(), template = %self.template, "starting provisioning");

        // --- Step 1: Copy ---
        if options.runs(ProvisionStep::Copy) {
            progress.status(&StatusEvent::message(ProvisionStep::Copy.phase_message()));
            self.content
                .copy_tree(&self.template, site)
                .await
                .map_err(|e| e.in_step(ProvisionStep::Copy))?;
        } else {
            skipped.push(ProvisionStep::Copy);
        }

        // --- Step 2: Template ---
        if options.runs(ProvisionStep::Template) {
            progress.status(&StatusEvent::message(ProvisionStep::Template.phase_message()));
            template::replace_templates(&self.content, request, &self.template_files)
                .await
                .map_err(|e| e.in_step(ProvisionStep::Template))?;
        } else {
            skipped.push(ProvisionStep::Template);
        }

        // --- Step 3: Configure ---
        if options.runs(ProvisionStep::Configure) {
            progress.status(&StatusEvent::message(ProvisionStep::Configure.phase_message()));
            let payload =
                SiteConfigPayload::for_site(request, &self.content_delivery_origin, self.org());
            self.admin
                .create_site_config(site, &payload)
                .await
                .map_err(|e| e.in_step(ProvisionStep::Configure))?;
        } else {
            skipped.push(ProvisionStep::Configure);
        }

        // --- Step 4: Preview ---
        let mut pages: Option<Vec<PageDescriptor>> = None;
        if options.runs(ProvisionStep::Preview) {
            progress.status(&StatusEvent::message(ProvisionStep::Preview.phase_message()));
            let listed = self
                .list_pages(site)
                .await
                .map_err(|e| e.in_step(ProvisionStep::Preview))?;
            self.run_action(site, &listed, Action::Preview, progress)
                .await
                .map_err(|e| e.in_step(ProvisionStep::Preview))?;
            pages = Some(listed);
        } else {
            skipped.push(ProvisionStep::Preview);
        }

        // --- Step 5: Publish ---
        progress.status(&StatusEvent::message(ProvisionStep::Publish.phase_message()));
        let listed = match pages {
            Some(listed) => listed,
            None => self
                .list_pages(site)
                .await
                .map_err(|e| e.in_step(ProvisionStep::Publish))?,
        };
        let published = self
            .run_action(site, &listed, Action::Publish, progress)
            .await
            .map_err(|e| e.in_step(ProvisionStep::Publish))?;

        progress.status(&StatusEvent::message(DONE_MESSAGE));

        let outcome = ProvisionOutcome {
            site: request.clone(),
            pages: published,
            links: SiteLinks::new(self.org(), site),
            skipped,
            elapsed: start.elapsed(),
        };

        info!(
            pages = outcome.pages.len(),
            elapsed_ms = outcome.elapsed.as_millis(),
            "site provisioned"
        );

        Ok(outcome)
    }
}
