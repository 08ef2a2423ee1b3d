use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::debug;

use super::{Job, default_workers, fail_all, run_guarded};
use crate::error::{Error, Result};

/// Runs jobs on a dedicated rayon pool of bounded size.
///
/// The pool lives for one `run` call, so concurrent runs never share
/// threads with each other or with rayon's global pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPoolExecutor {
    workers: Option<usize>,
}

impl ThreadPoolExecutor {
    /// `None` uses the available parallelism.
    pub fn new(workers: Option<usize>) -> Self {
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(default_workers).max(1)
    }

    pub fn run<J: Job>(&self, jobs: Vec<J>) -> Vec<Result<J::Output>> {
        let workers = self.workers();
        let pool = match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("svg-assets-{index}"))
            .build()
        {
            Ok(pool) => pool,
            Err(err) => {
                let error = Error::Executor(format!("failed to start thread pool: {err}"));
                return fail_all(jobs.len(), &error);
            }
        };

        debug!(workers, jobs = jobs.len(), "running on thread pool");
        pool.install(|| jobs.into_par_iter().map(|job| run_guarded(&job)).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::executor::test_jobs::Square;

    #[test]
    fn zero_workers_means_one() {
        assert_eq!(ThreadPoolExecutor::new(Some(0)).workers(), 1);
        assert!(ThreadPoolExecutor::new(None).workers() >= 1);
    }

    #[test]
    fn panics_stay_isolated() {
        let results = ThreadPoolExecutor::new(Some(2)).run(vec![Square::new(13), Square::new(5)]);
        assert!(matches!(results[0], Err(Error::Executor(_))));
        assert_eq!(results[1], Ok(25));
    }

    static THREADS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    #[derive(Serialize, Deserialize)]
    struct RecordThread;

    impl Job for RecordThread {
        type Output = ();

        fn label(&self) -> String {
            "record-thread".into()
        }

        fn run(&self) -> Result<()> {
            std::thread::sleep(std::time::Duration::from_millis(5));
            let name = std::thread::current().name().unwrap_or_default().to_string();
            THREADS.lock().unwrap().push(name);
            Ok(())
        }
    }

    #[test]
    fn pool_is_bounded() {
        let jobs = (0..16).map(|_| RecordThread).collect();
        ThreadPoolExecutor::new(Some(2)).run(jobs);

        let names: HashSet<String> = THREADS.lock().unwrap().iter().cloned().collect();
        assert!(!names.is_empty() && names.len() <= 2, "{names:?}");
        assert!(names.iter().all(|n| n.starts_with("svg-assets-")));
    }
}
