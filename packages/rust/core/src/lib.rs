//! Core pipeline orchestration for Lekcjonarz.
//!
//! This crate ties the crawler and the extractor together into the two
//! end-to-end phases: `discover` (navigator → Job Store) and `extract`
//! (Job Store → one JSON file per day, plus an error manifest).

pub mod aggregate;
pub mod discover;
pub mod extraction;
pub mod jobs;
pub mod pipeline;
pub mod writer;

pub use aggregate::{WorkUnit, merge_group, plan_units};
pub use discover::{DiscoverySummary, run_discovery};
pub use extraction::{Extractor, RunSummary};
pub use jobs::{load_jobs, save_jobs};
pub use pipeline::{ProgressReporter, SilentProgress};
pub use writer::{OutputWriter, write_manifest};

pub use tokio_util::sync::CancellationToken;
