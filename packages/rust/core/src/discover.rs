//! Discovery phase: navigator crawl → pagination expansion → Job Store.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use lekcjonarz_crawler::{NavigationCrawler, PageFetcher, PaginationExpander};
use lekcjonarz_shared::{CrawlConfig, LekcjonarzError, Result};

use crate::jobs::save_jobs;
use crate::pipeline::ProgressReporter;

/// Result of a discovery run.
#[derive(Debug, Clone)]
pub struct DiscoverySummary {
    /// Navigator pages fetched.
    pub pages_scanned: usize,
    /// Navigator pages that failed (their subtrees are missing from the jobs).
    pub nav_errors: usize,
    /// Distinct document links found in the navigator.
    pub leaves: usize,
    /// Jobs written after pagination expansion.
    pub jobs: usize,
    /// Job Store path.
    pub out: PathBuf,
    pub duration: Duration,
}

/// Crawl the navigator, expand pagination and persist the Job Store.
///
/// Fails without touching `out` when the navigator root itself cannot be
/// fetched; individual subtree failures only shrink the result.
#[instrument(skip_all, fields(root = %config.navigator_url, out = %out.display()))]
pub async fn run_discovery(
    config: &CrawlConfig,
    fetcher: &PageFetcher,
    out: &Path,
    progress: &dyn ProgressReporter,
) -> Result<DiscoverySummary> {
    let start = Instant::now();

    progress.phase("Crawling navigator");
    let report = NavigationCrawler::new(config, fetcher)?.crawl().await?;
    if report.pages_scanned == 0 {
        let reason = report
            .errors
            .first()
            .map(|(_, e)| e.clone())
            .unwrap_or_else(|| "no pages fetched".to_string());
        return Err(LekcjonarzError::Network(format!(
            "navigator root {} unreachable: {reason}",
            config.navigator_url
        )));
    }

    progress.phase("Expanding pagination");
    progress.planned(report.leaves.len());
    let jobs = PaginationExpander::new(config, fetcher)?
        .expand(&report.leaves)
        .await;

    save_jobs(out, &jobs)?;

    let summary = DiscoverySummary {
        pages_scanned: report.pages_scanned,
        nav_errors: report.errors.len(),
        leaves: report.leaves.len(),
        jobs: jobs.len(),
        out: out.to_path_buf(),
        duration: start.elapsed(),
    };

    info!(
        leaves = summary.leaves,
        jobs = summary.jobs,
        duration_ms = summary.duration.as_millis(),
        "discovery completed"
    );
    progress.done(&format!(
        "{} jobs from {} navigator pages",
        summary.jobs, summary.pages_scanned
    ));

    Ok(summary)
}
