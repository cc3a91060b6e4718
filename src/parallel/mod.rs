//! Bounded parallel dispatch and per-batch result aggregation

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::{ErrorKind, ResizError};

pub mod progress;
pub mod scheduler;

pub use progress::*;
pub use scheduler::*;

/// Outcome of one unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Success {
        source_path: PathBuf,
        output_path: PathBuf,
    },
    Failure {
        source_path: PathBuf,
        kind: ErrorKind,
        detail: String,
    },
}

impl TaskOutcome {
    /// Successful conversion of `source_path` into `output_path`
    pub fn success(source_path: PathBuf, output_path: PathBuf) -> Self {
        Self::Success {
            source_path,
            output_path,
        }
    }

    /// Failed conversion of `source_path`
    pub fn failure(source_path: PathBuf, error: &ResizError) -> Self {
        Self::Failure {
            source_path,
            kind: error.kind(),
            detail: error.user_message(),
        }
    }

    pub fn source_path(&self) -> &Path {
        match self {
            Self::Success { source_path, .. } | Self::Failure { source_path, .. } => source_path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Aggregate of every outcome in one batch run
///
/// `succeeded.len() + failed.len()` equals the number of dispatched files.
/// Order within each list follows completion, not dispatch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub succeeded: Vec<TaskOutcome>,
    pub failed: Vec<TaskOutcome>,
    pub elapsed: Duration,
}

impl BatchResult {
    /// File the outcome under the matching list
    pub fn record(&mut self, outcome: TaskOutcome) {
        if outcome.is_success() {
            self.succeeded.push(outcome);
        } else {
            self.failed.push(outcome);
        }
    }

    /// Number of accounted files
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.is_zero() {
            return 0.0;
        }
        self.total() as f64 / self.elapsed.as_secs_f64()
    }

    /// Every source path, successes first
    pub fn source_paths(&self) -> impl Iterator<Item = &Path> {
        self.succeeded
            .iter()
            .chain(self.failed.iter())
            .map(TaskOutcome::source_path)
    }
}
