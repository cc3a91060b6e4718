//! Batch coordinator: validation, resolution, provisioning, then dispatch

use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use crate::config::{BatchOptions, ConversionRequest};
use crate::error::{ResizError, Result};
use crate::parallel::{BatchResult, ProgressTracker, TaskOutcome, TaskScheduler};
use crate::paths::{self, SourceSet};
use crate::processing::{convert_file, CodecEngine, ImageCodec};

/// Lifecycle of one batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Validating,
    Resolving,
    Provisioning,
    Dispatching,
    Aggregating,
    Done,
    /// Terminal; no task was dispatched
    Failed(String),
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Validating => f.write_str("validating"),
            Self::Resolving => f.write_str("resolving"),
            Self::Provisioning => f.write_str("provisioning"),
            Self::Dispatching => f.write_str("dispatching"),
            Self::Aggregating => f.write_str("aggregating"),
            Self::Done => f.write_str("done"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Drives one batch from raw options to a [`BatchResult`]
pub struct BatchCoordinator {
    codec: Arc<dyn CodecEngine>,
    scheduler: TaskScheduler,
    state: Mutex<BatchState>,
}

impl BatchCoordinator {
    /// Coordinator using `codec` and the default worker slot count
    pub fn new(codec: Arc<dyn CodecEngine>) -> Self {
        Self {
            codec,
            scheduler: TaskScheduler::with_default_concurrency(),
            state: Mutex::new(BatchState::Idle),
        }
    }

    /// Override the worker slot count
    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self> {
        self.scheduler = TaskScheduler::new(concurrency)?;
        Ok(self)
    }

    /// Publish per-file progress through `tracker`
    pub fn with_progress(mut self, tracker: Arc<ProgressTracker>) -> Self {
        self.scheduler = self.scheduler.with_progress(tracker);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.scheduler.concurrency()
    }

    /// Current lifecycle state
    pub fn state(&self) -> BatchState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn transition(&self, next: BatchState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Batch state: {} -> {}", *state, next);
        *state = next;
    }

    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| {
            error!("Batch aborted before dispatch: {}", e);
            self.transition(BatchState::Failed(e.to_string()));
            e
        })
    }

    /// Run the whole batch.
    ///
    /// Returns `Err` only for failures before dispatch. Once dispatch begins
    /// every per-file problem is reported in [`BatchResult::failed`].
    pub async fn run_batch(&self, options: BatchOptions) -> Result<BatchResult> {
        self.transition(BatchState::Validating);
        let validated = self.guard(options.validate())?;

        self.transition(BatchState::Resolving);
        let sources = self.guard(paths::resolve(&validated.source))?;

        self.transition(BatchState::Provisioning);
        let destination = self.guard(paths::provision(validated.destination.as_deref(), &sources))?;

        let request = Arc::new(validated.into_request(sources.root().to_path_buf(), destination));
        info!(
            "Converting {} files from {:?} into {:?} as {} (quality {})",
            sources.len(),
            request.source_path(),
            request.destination_dir(),
            request.output_format(),
            request.quality()
        );

        self.transition(BatchState::Dispatching);
        let expected = sources.len();
        let (files, collisions) = split_collisions(&request, sources.into_files());
        let codec = Arc::clone(&self.codec);
        let shared = Arc::clone(&request);
        let unit = move |file: &Path| convert_file(codec.as_ref(), &shared, file);
        let mut result = self.scheduler.run(files, unit).await;

        self.transition(BatchState::Aggregating);
        for outcome in collisions {
            result.record(outcome);
        }
        debug_assert_eq!(result.total(), expected);
        if !result.is_complete_success() {
            info!("{} of {} files failed", result.failed.len(), expected);
        }

        self.transition(BatchState::Done);
        Ok(result)
    }
}

/// Keep the first file per output path; later ones become failures.
///
/// Files whose output name cannot be built are left for the unit of work to report.
fn split_collisions(
    request: &ConversionRequest,
    files: Vec<PathBuf>,
) -> (Vec<PathBuf>, Vec<TaskOutcome>) {
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(files.len());
    let mut dispatch = Vec::with_capacity(files.len());
    let mut collisions = Vec::new();

    for file in files {
        let output = match request.output_path_for(&file) {
            Ok(output) => output,
            Err(_) => {
                dispatch.push(file);
                continue;
            }
        };

        match claimed.entry(output) {
            Entry::Vacant(slot) => {
                slot.insert(file.clone());
                dispatch.push(file);
            }
            Entry::Occupied(first) => {
                let error = ResizError::codec(
                    &file,
                    format!("output collides with {}", first.get().display()),
                );
                warn!("{}", error);
                collisions.push(TaskOutcome::failure(file, &error));
            }
        }
    }

    (dispatch, collisions)
}

/// Validate options and resolve the source set without touching the destination
pub fn resolve_sources(options: &BatchOptions) -> Result<SourceSet> {
    let validated = options.validate()?;
    paths::resolve(&validated.source)
}

/// Run a batch with the built-in codec and default concurrency
pub async fn run_batch(options: BatchOptions) -> Result<BatchResult> {
    BatchCoordinator::new(Arc::new(ImageCodec::new()))
        .run_batch(options)
        .await
}
