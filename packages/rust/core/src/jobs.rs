//! Job Store: the `[[folder, url], ...]` file handed from discovery to extraction.

use std::path::Path;

use tracing::{info, instrument};

use lekcjonarz_shared::{Job, LekcjonarzError, Result};

use crate::writer::write_json_atomic;

/// Load the job list. A missing or malformed file is fatal for the run.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_jobs(path: &Path) -> Result<Vec<Job>> {
    let content = std::fs::read_to_string(path).map_err(|e| LekcjonarzError::io(path, e))?;
    let jobs: Vec<Job> = serde_json::from_str(&content).map_err(|e| {
        LekcjonarzError::validation(format!("invalid job store {}: {e}", path.display()))
    })?;
    info!(jobs = jobs.len(), "job store loaded");
    Ok(jobs)
}

/// Persist the job list, order preserved.
#[instrument(skip_all, fields(path = %path.display(), jobs = jobs.len()))]
pub fn save_jobs(path: &Path, jobs: &[Job]) -> Result<()> {
    write_json_atomic(path, jobs)?;
    info!("job store saved");
    Ok(())
}
