//! Pagination expansion for document pages.
//!
//! A document page may carry a pager (`div.pgr`) linking to numbered
//! continuation pages (`.../doc/123.Title/2`). On this site every even page
//! repeats its odd predecessor, so only odd-numbered pages are kept, and a
//! trailing odd page is a continuation fragment. Multi-page special events
//! keep every page.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use futures::stream::{self, StreamExt};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use lekcjonarz_shared::{CrawlConfig, Job, LekcjonarzError, Result, SpecialCase};

use crate::engine::resolve;
use crate::fetcher::PageFetcher;

/// Trailing page number of a paginated URL (`.../7`); 0 when absent.
pub fn page_number(url: &str) -> u32 {
    static SUFFIX_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"/(\d+)$").expect("valid regex"));

    SUFFIX_RE
        .captures(url)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// Sort page URLs by their trailing page number (stable for equal keys).
pub fn sort_by_page_number(urls: &mut [String]) {
    urls.sort_by_key(|url| page_number(url));
}

/// Apply the odd/even retention rule to pages already sorted by number.
///
/// With `keep_all` every page survives. Otherwise positive even pages are
/// dropped, and the last page is dropped too if its number is odd. The base
/// page (number 0) is always kept.
pub fn retain_pages(sorted: Vec<String>, keep_all: bool) -> Vec<String> {
    if keep_all {
        return sorted;
    }

    let last = sorted.len().saturating_sub(1);
    sorted
        .into_iter()
        .enumerate()
        .filter(|(index, url)| {
            let number = page_number(url);
            let even_continuation = number > 0 && number % 2 == 0;
            let trailing_odd = *index == last && number % 2 != 0;
            !even_continuation && !trailing_odd
        })
        .map(|(_, url)| url)
        .collect()
}

/// Expands base document links into the full list of pages to fetch.
pub struct PaginationExpander<'a> {
    config: &'a CrawlConfig,
    fetcher: &'a PageFetcher,
    pager_selector: Selector,
}

impl<'a> PaginationExpander<'a> {
    pub fn new(config: &'a CrawlConfig, fetcher: &'a PageFetcher) -> Result<Self> {
        let css = format!("div.{} a[href]", config.pager_class);
        let pager_selector = Selector::parse(&css).map_err(|e| {
            LekcjonarzError::config(format!("invalid pager class '{}': {e}", config.pager_class))
        })?;
        Ok(Self {
            config,
            fetcher,
            pager_selector,
        })
    }

    /// Expand every leaf into its retained pages.
    ///
    /// Leaves are fetched concurrently but results keep the input order; the
    /// output is de-duplicated by URL, first occurrence wins.
    #[instrument(skip_all, fields(leaves = leaves.len()))]
    pub async fn expand(&self, leaves: &[Job]) -> Vec<Job> {
        let expanded: Vec<Vec<Job>> = stream::iter(leaves)
            .map(|leaf| self.expand_leaf(leaf))
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let mut seen = HashSet::new();
        let jobs: Vec<Job> = expanded
            .into_iter()
            .flatten()
            .filter(|job| seen.insert(job.url.clone()))
            .collect();

        info!(leaves = leaves.len(), jobs = jobs.len(), "pagination expanded");
        jobs
    }

    /// Expand a single leaf. A leaf whose page cannot be fetched is kept as
    /// its own single job so the failure surfaces during extraction.
    async fn expand_leaf(&self, leaf: &Job) -> Vec<Job> {
        let page = match self.fetcher.fetch(&leaf.url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %leaf.url, error = %e, "base page failed, keeping it unexpanded");
                return vec![leaf.clone()];
            }
        };

        let Some(mut pages) = self.pager_links(&page.body, &leaf.url) else {
            return vec![leaf.clone()];
        };
        pages.insert(leaf.url.clone());

        let mut sorted: Vec<String> = pages.into_iter().collect();
        sort_by_page_number(&mut sorted);

        let keep_all = SpecialCase::find(&self.config.special_cases, &leaf.url).is_some();
        let kept = retain_pages(sorted, keep_all);
        debug!(url = %leaf.url, keep_all, kept = kept.len(), "pager found");

        kept.into_iter()
            .map(|url| Job::new(leaf.folder.clone(), url))
            .collect()
    }

    /// Absolute URLs linked from the pager, or `None` when the page has no pager.
    fn pager_links(&self, body: &str, page_url: &str) -> Option<BTreeSet<String>> {
        let doc = Html::parse_document(body);
        let page_url = Url::parse(page_url).ok()?;

        let mut anchors = doc.select(&self.pager_selector).peekable();
        anchors.peek()?;

        Some(
            anchors
                .filter_map(|a| a.value().attr("href"))
                .filter_map(|href| resolve(&self.config.base_url, &page_url, href))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lekcjonarz_shared::{AppConfig, HttpConfig};
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn numbered(base: &str, numbers: &[u32]) -> Vec<String> {
        numbers
            .iter()
            .map(|n| {
                if *n == 0 {
                    base.to_string()
                } else {
                    format!("{base}/{n}")
                }
            })
            .collect()
    }

    fn numbers(urls: &[String]) -> Vec<u32> {
        urls.iter().map(|u| page_number(u)).collect()
    }

    #[test]
    fn page_number_parsing() {
        assert_eq!(page_number("https://x/doc/123.Niedziela"), 0);
        assert_eq!(page_number("https://x/doc/123.Niedziela/5"), 5);
        assert_eq!(page_number("https://x/doc/123.Niedziela/"), 0);
    }

    #[test]
    fn odd_even_retention() {
        let pages = numbered("https://x/doc/1.Dzien", &[0, 1, 2, 3, 4, 5]);
        let kept = retain_pages(pages, false);
        assert_eq!(numbers(&kept), vec![0, 1, 3]);
    }

    #[test]
    fn special_case_keeps_everything() {
        let pages = numbered("https://x/doc/1.Wigilia-Paschalna", &[0, 1, 2, 3, 4, 5]);
        let kept = retain_pages(pages, true);
        assert_eq!(numbers(&kept), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn trailing_even_page_keeps_last_odd() {
        let pages = numbered("https://x/doc/1.Dzien", &[0, 1, 2, 3, 4]);
        assert_eq!(numbers(&retain_pages(pages, false)), vec![0, 1, 3]);
    }

    #[test]
    fn base_page_alone_is_kept() {
        let pages = numbered("https://x/doc/1.Dzien", &[0]);
        assert_eq!(numbers(&retain_pages(pages, false)), vec![0]);
    }

    #[test]
    fn sorting_is_numeric() {
        let mut pages = numbered("https://x/doc/1.Dzien", &[10, 2, 0, 1]);
        sort_by_page_number(&mut pages);
        assert_eq!(numbers(&pages), vec![0, 1, 2, 10]);
    }

    fn setup(server_uri: &str) -> (CrawlConfig, PageFetcher) {
        let mut app = AppConfig::default();
        app.site.base_url = server_uri.to_string();
        app.http.rate_limit_ms = 0;
        (
            CrawlConfig::try_from(&app).unwrap(),
            PageFetcher::new(&HttpConfig::from(&app)).unwrap(),
        )
    }

    fn pager_page(base_path: &str, pages: &[u32]) -> String {
        let anchors: String = pages
            .iter()
            .map(|n| format!(r#"<a href="{base_path}/{n}">{n}</a>"#))
            .collect();
        format!(r#"<html><body><div class="pgr">{anchors}</div></body></html>"#)
    }

    #[tokio::test]
    async fn expands_pagers_and_preserves_leaf_order() {
        let server = MockServer::start().await;

        Mock::given(path("/doc/1.Dzien"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(pager_page("/doc/1.Dzien", &[1, 2, 3, 4, 5])),
            )
            .mount(&server)
            .await;
        Mock::given(path("/doc/2.Bez-pagera"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><p>x</p></body></html>"))
            .mount(&server)
            .await;
        Mock::given(path("/doc/3.Wigilia-Paschalna"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(pager_page("/doc/3.Wigilia-Paschalna", &[1, 2])),
            )
            .mount(&server)
            .await;
        Mock::given(path("/doc/4.Zepsuty"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (config, fetcher) = setup(&server.uri());
        let expander = PaginationExpander::new(&config, &fetcher).unwrap();

        let uri = server.uri();
        let leaves = vec![
            Job::new("A", format!("{uri}/doc/1.Dzien")),
            Job::new("B", format!("{uri}/doc/2.Bez-pagera")),
            Job::new("C", format!("{uri}/doc/3.Wigilia-Paschalna")),
            Job::new("D", format!("{uri}/doc/4.Zepsuty")),
            Job::new("A", format!("{uri}/doc/1.Dzien")),
        ];
        let jobs = expander.expand(&leaves).await;

        let got: Vec<(&str, String)> = jobs
            .iter()
            .map(|j| (j.folder.as_str(), j.url.replace(&uri, "")))
            .collect();
        assert_eq!(
            got,
            vec![
                ("A", "/doc/1.Dzien".to_string()),
                ("A", "/doc/1.Dzien/1".to_string()),
                ("A", "/doc/1.Dzien/3".to_string()),
                ("B", "/doc/2.Bez-pagera".to_string()),
                ("C", "/doc/3.Wigilia-Paschalna".to_string()),
                ("C", "/doc/3.Wigilia-Paschalna/1".to_string()),
                ("C", "/doc/3.Wigilia-Paschalna/2".to_string()),
                ("D", "/doc/4.Zepsuty".to_string()),
            ]
        );
    }
}
