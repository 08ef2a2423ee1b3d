use tracing::debug;

use super::{Job, run_guarded};
use crate::error::{Error, Result};

/// Runs jobs one at a time on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor {
    /// Report the jobs after the first failure as skipped instead of running
    /// them.
    pub stop_on_failure: bool,
}

impl SequentialExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    pub fn run<J: Job>(&self, jobs: Vec<J>) -> Vec<Result<J::Output>> {
        let mut failed = false;
        jobs.iter()
            .map(|job| {
                if failed && self.stop_on_failure {
                    debug!(job = %job.label(), "skipped after earlier failure");
                    return Err(Error::Executor(format!(
                        "skipped {}: an earlier job failed",
                        job.label()
                    )));
                }
                let result = run_guarded(job);
                failed |= result.is_err();
                result
            })
            .collect()
    }
}
