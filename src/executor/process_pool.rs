use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::debug;

use super::{Job, WorkerReply, default_workers, fail_all};
use crate::error::{Error, Result};

/// Argument that switches the executable into worker mode.
pub const WORKER_ARG: &str = "worker";

/// Runs every job in its own worker process.
///
/// The job goes to the worker's stdin as JSON; the worker answers with a
/// JSON [`WorkerReply`] on stdout and exits. At most `workers` processes
/// are alive at once.
#[derive(Debug, Clone, Default)]
pub struct ProcessPoolExecutor {
    workers: Option<usize>,
    program: Option<PathBuf>,
    args: Option<Vec<String>>,
}

impl ProcessPoolExecutor {
    /// `None` uses the available parallelism.
    pub fn new(workers: Option<usize>) -> Self {
        Self {
            workers,
            program: None,
            args: None,
        }
    }

    /// Worker executable; defaults to the current executable, which then
    /// has to dispatch the `worker` argument to [`crate::run_worker`].
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Worker arguments; defaults to `worker`.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(default_workers).max(1)
    }

    fn program(&self) -> Result<PathBuf> {
        match &self.program {
            Some(program) => Ok(program.clone()),
            None => std::env::current_exe()
                .map_err(|e| Error::Executor(format!("cannot locate worker executable: {e}"))),
        }
    }

    pub fn run<J: Job>(&self, jobs: Vec<J>) -> Vec<Result<J::Output>> {
        let program = match self.program() {
            Ok(program) => program,
            Err(err) => return fail_all(jobs.len(), &err),
        };

        let workers = self.workers();
        let pool = match ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool,
            Err(err) => {
                let error = Error::Executor(format!("failed to start process pool: {err}"));
                return fail_all(jobs.len(), &error);
            }
        };

        debug!(workers, jobs = jobs.len(), program = %program.display(), "running on process pool");
        pool.install(|| {
            jobs.into_par_iter()
                .map(|job| self.run_in_worker(&program, &job))
                .collect()
        })
    }

    fn run_in_worker<J: Job>(&self, program: &Path, job: &J) -> Result<J::Output> {
        let label = job.label();
        let payload = serde_json::to_vec(job)
            .map_err(|e| Error::Executor(format!("cannot serialize job {label}: {e}")))?;

        let mut command = Command::new(program);
        match &self.args {
            Some(args) => command.args(args),
            None => command.arg(WORKER_ARG),
        };
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Executor(format!("cannot start worker {}: {e}", program.display())))?;

        // The worker reads all of stdin before writing anything, so the
        // whole payload can be written before collecting stdout.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Err(std::io::Error::other("worker stdin is not piped")),
        };

        let output = child
            .wait_with_output()
            .map_err(|e| Error::Executor(format!("worker for {label} was lost: {e}")))?;
        if !output.status.success() {
            return Err(Error::Executor(format!("worker for {label} exited with {}", output.status)));
        }

        match serde_json::from_slice::<WorkerReply<J::Output>>(&output.stdout) {
            Ok(reply) => reply.into_result(),
            Err(err) => {
                written.map_err(|e| Error::Executor(format!("cannot send job {label} to worker: {e}")))?;
                Err(Error::Executor(format!("garbled reply from worker for {label}: {err}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::test_jobs::Square;

    #[test]
    fn missing_program_fails_every_job() {
        let executor = ProcessPoolExecutor::new(Some(2)).with_program("/no/such/worker-binary");
        let results = executor.run(vec![Square::new(1), Square::new(2)]);
        assert_eq!(results.len(), 2);
        for result in results {
            assert!(matches!(result, Err(Error::Executor(ref m)) if m.contains("cannot start worker")));
        }
    }

    #[cfg(unix)]
    #[test]
    fn garbled_reply_is_an_executor_error() {
        // `echo` ignores stdin and prints something that is not a reply.
        let executor = ProcessPoolExecutor::new(Some(1))
            .with_program("echo")
            .with_args(["not json"]);
        let results = executor.run(vec![Square::new(3)]);
        assert!(matches!(results[0], Err(Error::Executor(_))));
    }

    #[cfg(unix)]
    #[test]
    fn failing_worker_is_an_executor_error() {
        let executor = ProcessPoolExecutor::new(Some(1)).with_program("false").with_args(Vec::<String>::new());
        let results = executor.run(vec![Square::new(3)]);
        assert!(matches!(results[0], Err(Error::Executor(ref m)) if m.contains("exited")));
    }
}
