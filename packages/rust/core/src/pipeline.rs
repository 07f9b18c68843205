//! Progress reporting shared by the discovery and extraction phases.

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the number of work units is known.
    fn planned(&self, units: usize);
    /// Called before a page is fetched.
    fn job_started(&self, url: &str);
    /// Called when a page was abandoned.
    fn job_failed(&self, url: &str, error: &str);
    /// Called when a work unit (single day or event group) completes.
    fn unit_finished(&self, label: &str);
    /// Called when the phase completes.
    fn done(&self, message: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn planned(&self, _units: usize) {}
    fn job_started(&self, _url: &str) {}
    fn job_failed(&self, _url: &str, _error: &str) {}
    fn unit_finished(&self, _label: &str) {}
    fn done(&self, _message: &str) {}
}
