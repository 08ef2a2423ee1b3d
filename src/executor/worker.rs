//! Worker side of the process pool.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::{Job, run_guarded};
use crate::error::{Error, Result};

/// What a worker writes back for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerReply<T> {
    Ok(T),
    Err(Error),
}

impl<T> WorkerReply<T> {
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(err) => Err(err),
        }
    }
}

impl<T> From<Result<T>> for WorkerReply<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) => Self::Err(err),
        }
    }
}

/// Reads one JSON job from `input`, runs it and writes the reply to `output`.
///
/// A job that fails (or cannot be parsed) still produces a reply; only I/O
/// failures on the streams themselves are returned as errors.
pub fn serve<J, R, W>(mut input: R, mut output: W) -> Result<()>
where
    J: Job,
    R: Read,
    W: Write,
{
    let mut payload = Vec::new();
    input
        .read_to_end(&mut payload)
        .map_err(|e| Error::Executor(format!("worker cannot read job: {e}")))?;

    let reply: WorkerReply<J::Output> = match serde_json::from_slice::<J>(&payload) {
        Ok(job) => run_guarded(&job).into(),
        Err(err) => WorkerReply::Err(Error::Executor(format!("malformed job: {err}"))),
    };

    serde_json::to_writer(&mut output, &reply)
        .map_err(|e| Error::Executor(format!("worker cannot write reply: {e}")))?;
    output
        .flush()
        .map_err(|e| Error::Executor(format!("worker cannot write reply: {e}")))
}

/// [`serve`] over the process's stdin and stdout.
pub fn serve_stdio<J: Job>() -> Result<()> {
    serve::<J, _, _>(io::stdin().lock(), io::stdout().lock())
}
