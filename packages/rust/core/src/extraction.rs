//! Extraction phase: Job Store → pages → consolidated days on disk.
//!
//! Work units (single jobs or special-case groups) are fetched and parsed
//! through a bounded stream. Each unit returns its own outcome; once the
//! stream drains, days are written and the failure manifest is built in unit
//! order, so units that land on the same output file resolve the same way
//! on every run.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use lekcjonarz_crawler::PageFetcher;
use lekcjonarz_extract::{PageReadings, extract_day, read_page};
use lekcjonarz_shared::{DaySet, ExtractConfig, FailureRecord, Job, Result, SpecialCase};

use crate::aggregate::{WorkUnit, merge_group, plan_units};
use crate::jobs::load_jobs;
use crate::pipeline::ProgressReporter;
use crate::writer::{OutputWriter, write_manifest};

/// Result of an extraction run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Jobs read from the Job Store.
    pub jobs: usize,
    /// Work units after special-case grouping.
    pub units: usize,
    /// Distinct output files written, in unit order of their first write.
    pub written: Vec<PathBuf>,
    /// Jobs abandoned, in unit order (also persisted to the manifest).
    pub failures: Vec<FailureRecord>,
    /// Jobs skipped because the run was cancelled.
    pub cancelled: usize,
    /// Where the failure manifest was written.
    pub manifest: PathBuf,
    pub duration: Duration,
}

/// A parsed day waiting to be written.
#[derive(Debug)]
struct PendingDay {
    folder: String,
    day: DaySet,
    jobs: Vec<Job>,
}

#[derive(Debug)]
struct UnitOutcome {
    index: usize,
    pending: Option<PendingDay>,
    failures: Vec<FailureRecord>,
    cancelled: usize,
}

impl UnitOutcome {
    fn new(index: usize) -> Self {
        Self {
            index,
            pending: None,
            failures: Vec::new(),
            cancelled: 0,
        }
    }
}

/// Runs the extraction phase against one output directory.
pub struct Extractor<'a> {
    config: &'a ExtractConfig,
    fetcher: &'a PageFetcher,
    writer: OutputWriter,
    progress: &'a dyn ProgressReporter,
}

impl<'a> Extractor<'a> {
    pub fn new(
        config: &'a ExtractConfig,
        fetcher: &'a PageFetcher,
        progress: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            config,
            fetcher,
            writer: OutputWriter::new(&config.output_dir),
            progress,
        }
    }

    /// Load the configured Job Store and process it.
    ///
    /// A missing or malformed Job Store aborts before any request is made.
    #[instrument(skip_all, fields(jobs_file = %self.config.jobs_file.display()))]
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunSummary> {
        let jobs = load_jobs(&self.config.jobs_file)?;
        self.run_jobs(jobs, cancel).await
    }

    /// Process an in-memory job list and write the failure manifest.
    ///
    /// Days are written in job-list order after all fetches finish: when two
    /// units map to the same file, the later unit's day is what remains.
    #[instrument(skip_all, fields(jobs = jobs.len(), out = %self.writer.root().display()))]
    pub async fn run_jobs(&self, jobs: Vec<Job>, cancel: &CancellationToken) -> Result<RunSummary> {
        let start = Instant::now();
        let job_count = jobs.len();
        let units = plan_units(jobs, &self.config.special_cases);
        let unit_count = units.len();

        self.progress.phase("Extracting readings");
        self.progress.planned(unit_count);
        info!(jobs = job_count, units = unit_count, concurrency = self.config.concurrency, "extraction started");

        let mut outcomes: Vec<UnitOutcome> = stream::iter(units.into_iter().enumerate())
            .map(|(index, unit)| self.process(index, unit, cancel))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;
        outcomes.sort_by_key(|outcome| outcome.index);

        let mut written: Vec<PathBuf> = Vec::new();
        let mut failures = Vec::new();
        let mut cancelled = 0;
        for outcome in outcomes {
            failures.extend(outcome.failures);
            cancelled += outcome.cancelled;
            if let Some(pending) = outcome.pending {
                if let Some(path) = self.persist(pending, &mut failures) {
                    if written.contains(&path) {
                        debug!(path = %path.display(), "output file overwritten by a later unit");
                    } else {
                        written.push(path);
                    }
                }
            }
        }

        write_manifest(&self.config.errors_file, &failures)?;

        let summary = RunSummary {
            jobs: job_count,
            units: unit_count,
            written,
            failures,
            cancelled,
            manifest: self.config.errors_file.clone(),
            duration: start.elapsed(),
        };

        info!(
            written = summary.written.len(),
            failed = summary.failures.len(),
            cancelled = summary.cancelled,
            duration_ms = summary.duration.as_millis(),
            "extraction completed"
        );
        self.progress.done(&format!(
            "{} days written, {} failed, {} cancelled",
            summary.written.len(),
            summary.failures.len(),
            summary.cancelled
        ));

        Ok(summary)
    }

    async fn process(&self, index: usize, unit: WorkUnit, cancel: &CancellationToken) -> UnitOutcome {
        if cancel.is_cancelled() {
            debug!(unit = unit.label(), "cancelled before start");
            let mut outcome = UnitOutcome::new(index);
            outcome.cancelled = unit.jobs().len();
            return outcome;
        }

        let outcome = match &unit {
            WorkUnit::Single(job) => self.process_single(index, job).await,
            WorkUnit::Group { case, jobs } => self.process_group(index, case, jobs).await,
        };
        self.progress.unit_finished(unit.label());
        outcome
    }

    async fn process_single(&self, index: usize, job: &Job) -> UnitOutcome {
        let mut outcome = UnitOutcome::new(index);
        self.progress.job_started(&job.url);

        let day = match self.fetcher.fetch(&job.url).await {
            Ok(page) => extract_day(&job.url, &page.body, &self.config.sigla),
            Err(e) => Err(e),
        };

        match day {
            Ok(day) => {
                outcome.pending = Some(PendingDay {
                    folder: job.folder.clone(),
                    day,
                    jobs: vec![job.clone()],
                });
            }
            Err(e) => self.record_failure(job, &e.to_string(), e.is_job_scoped(), &mut outcome.failures),
        }
        outcome
    }

    /// Fetch and parse every member page in order, then merge. A failing page
    /// is recorded and left out; the group is written if any page succeeded.
    #[instrument(skip_all, fields(event = %case.title, pages = jobs.len()))]
    async fn process_group(&self, index: usize, case: &SpecialCase, jobs: &[Job]) -> UnitOutcome {
        let mut outcome = UnitOutcome::new(index);
        let mut pages = Vec::with_capacity(jobs.len());

        for job in jobs {
            self.progress.job_started(&job.url);
            match self.read_job(job).await {
                Ok(page) => pages.push(page.blocks),
                Err(e) => self.record_failure(job, &e.to_string(), e.is_job_scoped(), &mut outcome.failures),
            }
        }

        let Some(first) = jobs.first() else {
            return outcome;
        };
        if pages.is_empty() {
            warn!(event = %case.title, "no member page could be read, nothing written");
            return outcome;
        }

        outcome.pending = Some(PendingDay {
            folder: first.folder.clone(),
            day: DaySet {
                url: first.url.clone(),
                tytul_dnia: case.title.clone(),
                czytania: merge_group(pages),
            },
            jobs: jobs.to_vec(),
        });
        outcome
    }

    async fn read_job(&self, job: &Job) -> Result<PageReadings> {
        let page = self.fetcher.fetch(&job.url).await?;
        read_page(&page.body, &self.config.sigla)
    }

    /// Write one day; a write error fails every job of its unit.
    fn persist(&self, pending: PendingDay, failures: &mut Vec<FailureRecord>) -> Option<PathBuf> {
        match self.writer.write_day(&pending.folder, &pending.day) {
            Ok(path) => Some(path),
            Err(e) => {
                for job in &pending.jobs {
                    self.record_failure(job, &e.to_string(), false, failures);
                }
                None
            }
        }
    }

    fn record_failure(
        &self,
        job: &Job,
        message: &str,
        job_scoped: bool,
        failures: &mut Vec<FailureRecord>,
    ) {
        if job_scoped {
            warn!(url = %job.url, folder = %job.folder, error = %message, "job failed");
        } else {
            error!(url = %job.url, folder = %job.folder, error = %message, "job failed");
        }
        self.progress.job_failed(&job.url, message);
        failures.push(FailureRecord::from(job));
    }
}
