//! Scheduling of independent jobs.
//!
//! Every strategy takes jobs in submission order and returns one result per
//! job in that same order, whatever order they finish in. A panicking job
//! (or a crashed worker process) yields an [`Error::Executor`] for that job
//! only.

mod process_pool;
mod sequential;
mod thread_pool;
pub mod worker;

pub use process_pool::ProcessPoolExecutor;
pub use sequential::SequentialExecutor;
pub use thread_pool::ThreadPoolExecutor;
pub use worker::WorkerReply;

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{ExecutionMode, Strictness};
use crate::error::{Error, Result};

/// A self-contained unit of work.
///
/// Jobs are serializable so the process pool can ship them to a worker; the
/// in-process strategies never serialize them.
pub trait Job: Send + Serialize + DeserializeOwned {
    type Output: Send + Serialize + DeserializeOwned;

    /// Short description for logs and error messages.
    fn label(&self) -> String;

    fn run(&self) -> Result<Self::Output>;
}

/// Scheduling strategy.
#[derive(Debug, Clone)]
pub enum Executor {
    Sequential(SequentialExecutor),
    ThreadPool(ThreadPoolExecutor),
    ProcessPool(ProcessPoolExecutor),
}

impl Executor {
    /// Builds the executor for a run. Under fail-fast the sequential
    /// strategy stops at the first failure.
    pub fn from_mode(mode: &ExecutionMode, strictness: Strictness) -> Self {
        match mode {
            ExecutionMode::Sequential => Self::Sequential(SequentialExecutor {
                stop_on_failure: strictness == Strictness::FailFast,
            }),
            ExecutionMode::ThreadPool { workers } => Self::ThreadPool(ThreadPoolExecutor::new(*workers)),
            ExecutionMode::ProcessPool { workers, program } => {
                let mut executor = ProcessPoolExecutor::new(*workers);
                if let Some(program) = program {
                    executor = executor.with_program(program);
                }
                Self::ProcessPool(executor)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential(_) => "sequential",
            Self::ThreadPool(_) => "thread-pool",
            Self::ProcessPool(_) => "process-pool",
        }
    }

    /// Runs every job and returns their results in submission order.
    pub fn run<J: Job>(&self, jobs: Vec<J>) -> Vec<Result<J::Output>> {
        match self {
            Self::Sequential(executor) => executor.run(jobs),
            Self::ThreadPool(executor) => executor.run(jobs),
            Self::ProcessPool(executor) => executor.run(jobs),
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::Sequential(SequentialExecutor::default())
    }
}

/// Runs a job, turning a panic into an executor error.
pub(crate) fn run_guarded<J: Job>(job: &J) -> Result<J::Output> {
    match panic::catch_unwind(AssertUnwindSafe(|| job.run())) {
        Ok(result) => result,
        Err(payload) => Err(Error::Executor(format!(
            "job {} panicked: {}",
            job.label(),
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".into()
    }
}

/// Worker count used when none is configured.
pub(crate) fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Fails every job with the same error.
pub(crate) fn fail_all<T>(count: usize, error: &Error) -> Vec<Result<T>> {
    (0..count).map(|_| Err(error.clone())).collect()
}


#[cfg(test)]
mod tests {
    use super::test_jobs::Square;
    use super::*;

    #[test]
    fn panics_become_executor_errors() {
        let err = run_guarded(&Square::new(13)).unwrap_err();
        match err {
            Error::Executor(message) => {
                assert!(message.contains("square(13)"));
                assert!(message.contains("unlucky"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn mode_selects_strategy() {
        let sequential = Executor::from_mode(&ExecutionMode::Sequential, Strictness::FailFast);
        assert!(matches!(
            sequential,
            Executor::Sequential(SequentialExecutor { stop_on_failure: true })
        ));

        let best_effort = Executor::from_mode(&ExecutionMode::Sequential, Strictness::BestEffort);
        assert!(matches!(
            best_effort,
            Executor::Sequential(SequentialExecutor { stop_on_failure: false })
        ));

        let pool = Executor::from_mode(&ExecutionMode::thread_pool(Some(3)), Strictness::FailFast);
        assert_eq!(pool.name(), "thread-pool");
    }

    #[test]
    fn every_strategy_preserves_order() {
        let executors = [
            Executor::default(),
            Executor::ThreadPool(ThreadPoolExecutor::new(Some(4))),
        ];
        for executor in executors {
            let jobs = vec![Square::slow(1, 30), Square::slow(2, 0), Square::new(-3), Square::slow(4, 10)];
            let results = executor.run(jobs);
            assert_eq!(results.len(), 4, "{}", executor.name());
            assert_eq!(results[0], Ok(1));
            assert_eq!(results[1], Ok(4));
            assert!(matches!(results[2], Err(Error::Render(_))));
            assert_eq!(results[3], Ok(16));
        }
    }
}
