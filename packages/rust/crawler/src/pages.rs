//! Page listing: crawl a site's content tree into page descriptors.

use sitegen_shared::{PageDescriptor, Result};
use tracing::{info, instrument, warn};

use crate::tree::TreeCrawler;

/// Folder holding the site's block library; crawled alongside the pages.
const LIBRARY_FOLDER: &str = ".da";

/// Document extension stripped from page names and admin paths.
const DOCUMENT_EXTENSION: &str = ".html";

/// Whether a content path is a page (not an image or other skipped asset).
pub fn is_page(path: &str, skip_extensions: &[String]) -> bool {
    let Some((_, ext)) = path.rsplit_once('.') else {
        return true;
    };
    if ext.contains('/') {
        return true;
    }
    !skip_extensions
        .iter()
        .any(|skip| skip.eq_ignore_ascii_case(ext))
}

/// Display name of a page: its path relative to `root`, without `.html`.
/// The root itself is named `/`.
pub fn page_name(root: &str, path: &str) -> String {
    let relative = match path.strip_prefix(root) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    };
    let name = relative
        .strip_suffix(DOCUMENT_EXTENSION)
        .unwrap_or(relative);
    if name.is_empty() {
        "/".to_string()
    } else {
        name.to_string()
    }
}

/// Crawl `site_root` (and its library folder, if configured) and return one
/// pending descriptor per page, sorted by path.
#[instrument(skip(crawler))]
pub async fn list_pages(crawler: &TreeCrawler, site_root: &str) -> Result<Vec<PageDescriptor>> {
    let skip = crawler.config().skip_extensions.clone();
    let mut pages: Vec<PageDescriptor> = Vec::new();

    let mut collect = |path: &str| {
        if is_page(path, &skip) {
            pages.push(PageDescriptor::pending(page_name(site_root, path), path));
        }
    };

    crawler
        .crawl(site_root, |item| collect(&item.path))
        .await?;

    if crawler.config().include_library {
        let library = format!("{site_root}/{LIBRARY_FOLDER}");
        if let Err(e) = crawler.crawl(&library, |item| collect(&item.path)).await {
            // The library is optional; a site without one still provisions.
            warn!(%library, error = %e, "library crawl failed, continuing without it");
        }
    }

    pages.sort_by(|a, b| a.path.cmp(&b.path));
    pages.dedup_by(|a, b| a.path == b.path);

    info!(count = pages.len(), "pages listed");
    Ok(pages)
}
