//! Breadth-first crawler for the site's navigation tree.
//!
//! The crawler starts from the navigator root, follows links that stay inside
//! the navigator (labelling each subtree with a sanitized folder name), and
//! records every link that points at a document page. Only anchors inside the
//! configured container classes are considered, so site-wide menus are ignored.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use lekcjonarz_shared::{CrawlConfig, Job, LekcjonarzError, Result, sanitize_folder_label};

use crate::fetcher::PageFetcher;

// ---------------------------------------------------------------------------
// NavigationReport
// ---------------------------------------------------------------------------

/// Summary of a completed navigation crawl.
#[derive(Debug, Clone)]
pub struct NavigationReport {
    /// Leaf document links as `(folder, base_url)` jobs, in discovery order.
    pub leaves: Vec<Job>,
    /// Number of navigator pages fetched successfully.
    pub pages_scanned: usize,
    /// Navigator pages that could not be fetched (URL, error message).
    pub errors: Vec<(String, String)>,
    /// Total duration of the crawl.
    pub duration: Duration,
}

/// A link found on a navigator page.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NavLink {
    /// Another navigator page, with its sanitized folder label.
    Navigation { url: String, folder: String },
    /// A document page.
    Document { url: String },
}

// ---------------------------------------------------------------------------
// NavigationCrawler
// ---------------------------------------------------------------------------

/// Walks the navigator tree and collects document links.
pub struct NavigationCrawler<'a> {
    config: &'a CrawlConfig,
    fetcher: &'a PageFetcher,
    container_selector: Selector,
}

impl<'a> NavigationCrawler<'a> {
    /// Create a crawler; fails if the container classes do not form a valid selector.
    pub fn new(config: &'a CrawlConfig, fetcher: &'a PageFetcher) -> Result<Self> {
        let container_selector = container_selector(&config.nav_containers)?;
        Ok(Self {
            config,
            fetcher,
            container_selector,
        })
    }

    /// Crawl from the configured navigator root.
    ///
    /// A navigator page that fails to load is logged and its subtree is simply
    /// not expanded; the crawl itself never fails on network errors.
    #[instrument(skip_all, fields(root = %self.config.navigator_url))]
    pub async fn crawl(&self) -> Result<NavigationReport> {
        let start = Instant::now();

        let mut queue: VecDeque<(String, String)> = VecDeque::new();
        queue.push_back((
            self.config.navigator_url.to_string(),
            self.config.root_folder.clone(),
        ));

        let mut visited: HashSet<String> = HashSet::new();
        let mut seen_leaves: HashSet<String> = HashSet::new();
        let mut leaves: Vec<Job> = Vec::new();
        let mut errors: Vec<(String, String)> = Vec::new();
        let mut pages_scanned = 0usize;

        info!("starting navigation crawl");

        while let Some((url, folder)) = queue.pop_front() {
            if !visited.insert(url.clone()) {
                continue;
            }

            let page = match self.fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(%url, error = %e, "navigator page failed, subtree skipped");
                    errors.push((url, e.to_string()));
                    continue;
                }
            };
            pages_scanned += 1;

            let Ok(page_url) = Url::parse(&url) else {
                continue;
            };
            let links = self.extract_nav_links(&page.body, &page_url);
            debug!(%url, links = links.len(), "navigator page scanned");

            for link in links {
                match link {
                    NavLink::Navigation { url, folder } => {
                        if !visited.contains(&url) {
                            queue.push_back((url, folder));
                        }
                    }
                    NavLink::Document { url } => {
                        if seen_leaves.insert(url.clone()) {
                            leaves.push(Job::new(folder.clone(), url));
                        }
                    }
                }
            }
        }

        let report = NavigationReport {
            leaves,
            pages_scanned,
            errors,
            duration: start.elapsed(),
        };

        info!(
            pages_scanned = report.pages_scanned,
            leaves = report.leaves.len(),
            errors = report.errors.len(),
            duration_ms = report.duration.as_millis(),
            "navigation crawl completed"
        );

        Ok(report)
    }

    /// Classify anchors inside the whitelisted containers of one navigator page.
    fn extract_nav_links(&self, body: &str, page_url: &Url) -> Vec<NavLink> {
        let doc = Html::parse_document(body);
        let anchor_sel = Selector::parse("a[href]").unwrap();
        let mut links = Vec::new();

        for container in doc.select(&self.container_selector) {
            for anchor in container.select(&anchor_sel) {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                let Some(full_url) = resolve(&self.config.base_url, page_url, href) else {
                    continue;
                };

                if href.contains(&self.config.nav_link_pattern) {
                    let label = anchor.text().collect::<String>();
                    links.push(NavLink::Navigation {
                        url: full_url,
                        folder: sanitize_folder_label(label.trim(), &self.config.folder_prefixes),
                    });
                } else if href.contains(&self.config.doc_link_pattern) {
                    links.push(NavLink::Document { url: full_url });
                }
            }
        }

        links
    }
}

/// Build a selector matching any `div` carrying one of the given classes.
pub(crate) fn container_selector(classes: &[String]) -> Result<Selector> {
    if classes.is_empty() {
        return Err(LekcjonarzError::config("nav_containers must not be empty"));
    }
    let css = classes
        .iter()
        .map(|class| format!("div.{class}"))
        .collect::<Vec<_>>()
        .join(", ");
    Selector::parse(&css)
        .map_err(|e| LekcjonarzError::config(format!("invalid container class list '{css}': {e}")))
}

/// Resolve an href to an absolute URL without a fragment.
///
/// Root-relative links resolve against the site origin, others against the
/// page they appear on.
pub(crate) fn resolve(base_url: &Url, page_url: &Url, href: &str) -> Option<String> {
    if href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }
    let anchor = if href.starts_with('/') { base_url } else { page_url };
    let mut resolved = anchor.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}
