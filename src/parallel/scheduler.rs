//! Worker-slot scheduler: a shared FIFO queue drained by a bounded number of slots

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{ResizError, Result};
use crate::parallel::{BatchResult, ProgressTracker, TaskOutcome};

/// Half the hardware parallelism minus one, never below one
pub fn default_concurrency() -> usize {
    (num_cpus::get() / 2).saturating_sub(1).max(1)
}

/// Runs one unit of work per file with at most `concurrency` in flight
#[derive(Clone)]
pub struct TaskScheduler {
    concurrency: usize,
    progress: Option<Arc<ProgressTracker>>,
}

impl TaskScheduler {
    /// Create a scheduler with an explicit slot count
    pub fn new(concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(ResizError::invalid_parameters(
                "Concurrency limit must be greater than 0",
            ));
        }

        Ok(Self {
            concurrency,
            progress: None,
        })
    }

    /// Create a scheduler sized by [`default_concurrency`]
    pub fn with_default_concurrency() -> Self {
        Self {
            concurrency: default_concurrency(),
            progress: None,
        }
    }

    /// Publish progress updates through `tracker`
    pub fn with_progress(mut self, tracker: Arc<ProgressTracker>) -> Self {
        self.progress = Some(tracker);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Dispatch every file and wait for all outcomes.
    ///
    /// Each file contributes exactly one outcome. Errors and panics from `unit`
    /// become failures for that file only.
    pub async fn run<F>(&self, files: Vec<PathBuf>, unit: F) -> BatchResult
    where
        F: Fn(&Path) -> Result<PathBuf> + Send + Sync + 'static,
    {
        let started = Instant::now();
        let total = files.len();
        let slots = self.concurrency.min(total);

        info!(
            "Dispatching {} files across {} worker slots",
            total, slots
        );

        if let Some(progress) = &self.progress {
            progress.start(total);
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(files)));
        let unit = Arc::new(unit);
        let (sender, mut receiver) = mpsc::channel::<TaskOutcome>(slots.max(1) * 2);

        let mut workers = Vec::with_capacity(slots);
        for slot in 0..slots {
            let queue = Arc::clone(&queue);
            let unit = Arc::clone(&unit);
            let sender = sender.clone();

            workers.push(tokio::spawn(async move {
                while let Some(file) = next_file(&queue) {
                    let outcome = run_unit(Arc::clone(&unit), file).await;
                    if sender.send(outcome).await.is_err() {
                        break;
                    }
                }
                debug!("Worker slot {} drained", slot);
            }));
        }
        // Aggregation ends once every slot has dropped its sender
        drop(sender);

        let mut result = BatchResult::default();
        while let Some(outcome) = receiver.recv().await {
            if let Some(progress) = &self.progress {
                progress.record(&outcome);
            }
            result.record(outcome);
        }

        for joined in futures::future::join_all(workers).await {
            if let Err(e) = joined {
                warn!("Worker slot ended abnormally: {}", e);
            }
        }

        result.elapsed = started.elapsed();

        if let Some(progress) = &self.progress {
            progress.complete_batch();
        }

        info!(
            "Batch finished: {} succeeded, {} failed in {:.2}s",
            result.succeeded.len(),
            result.failed.len(),
            result.elapsed.as_secs_f64()
        );

        result
    }
}

fn next_file(queue: &Mutex<VecDeque<PathBuf>>) -> Option<PathBuf> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

async fn run_unit<F>(unit: Arc<F>, file: PathBuf) -> TaskOutcome
where
    F: Fn(&Path) -> Result<PathBuf> + Send + Sync + 'static,
{
    let path = file.clone();
    let joined = tokio::task::spawn_blocking(move || unit(&path)).await;

    match joined {
        Ok(Ok(output)) => {
            debug!("Converted {:?} -> {:?}", file, output);
            TaskOutcome::success(file, output)
        }
        Ok(Err(error)) => {
            warn!("Failed to convert {:?}: {}", file, error);
            TaskOutcome::failure(file, &error)
        }
        Err(join_error) => {
            let reason = if join_error.is_panic() {
                "unit of work panicked"
            } else {
                "unit of work was cancelled"
            };
            let error = ResizError::parallel(format!("{} while converting {:?}", reason, file));
            warn!("{}", error);
            TaskOutcome::failure(file, &error)
        }
    }
}
