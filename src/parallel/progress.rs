//! Progress tracking for batch dispatch

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::parallel::TaskOutcome;

/// Thread-safe progress tracker fed by the scheduler's aggregator
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    sender: broadcast::Sender<ProgressUpdate>,
    start_time: Mutex<Option<Instant>>,

    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Current progress state
#[derive(Debug, Clone, Default)]
pub struct ProgressState {
    pub total_files: usize,
    pub completed_files: usize,
    pub failed_files: usize,
    pub elapsed_time: Duration,
    pub estimated_remaining: Option<Duration>,
    pub files_per_second: f64,
    pub completion_percentage: f64,
}

/// Progress update event
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    Started {
        total_files: usize,
    },
    FileCompleted {
        source_path: PathBuf,
        success: bool,
    },
    BatchCompleted {
        final_state: ProgressState,
    },
}

impl ProgressTracker {
    /// Create a new progress tracker
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1000);

        Self {
            state: Mutex::new(ProgressState::default()),
            sender,
            start_time: Mutex::new(None),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Start tracking progress for a batch
    pub fn start(&self, total_files: usize) {
        *self.start_time.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = ProgressState {
            total_files,
            ..ProgressState::default()
        };

        self.completed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);

        // No subscriber is fine
        let _ = self.sender.send(ProgressUpdate::Started { total_files });

        debug!("Started progress tracking for {} files", total_files);
    }

    /// Account for one finished file
    pub fn record(&self, outcome: &TaskOutcome) {
        let success = outcome.is_success();
        if success {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        self.update_state();

        let _ = self.sender.send(ProgressUpdate::FileCompleted {
            source_path: outcome.source_path().to_path_buf(),
            success,
        });
    }

    fn update_state(&self) {
        let Some(started) = *self.start_time.lock().unwrap_or_else(PoisonError::into_inner) else {
            return;
        };

        let elapsed = started.elapsed();
        let completed = self.completed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let processed = completed + failed;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.completed_files = completed;
        state.failed_files = failed;
        state.elapsed_time = elapsed;

        if state.total_files > 0 {
            state.completion_percentage = (processed as f64 / state.total_files as f64) * 100.0;
        }

        if elapsed.as_secs_f64() > 0.0 {
            state.files_per_second = processed as f64 / elapsed.as_secs_f64();

            if processed > 0 && state.total_files > processed {
                let remaining = (state.total_files - processed) as f64;
                let per_file = elapsed.as_secs_f64() / processed as f64;
                state.estimated_remaining = Some(Duration::from_secs_f64(remaining * per_file));
            } else {
                state.estimated_remaining = None;
            }
        }
    }

    /// Get current progress state
    pub fn get_state(&self) -> ProgressState {
        self.update_state();
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.sender.subscribe()
    }

    /// Mark batch as completed
    pub fn complete_batch(&self) {
        let final_state = self.get_state();

        info!(
            "Progress: {}/{} files converted in {:.2}s",
            final_state.completed_files,
            final_state.total_files,
            final_state.elapsed_time.as_secs_f64()
        );

        let _ = self.sender.send(ProgressUpdate::BatchCompleted { final_state });
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResizError;

    #[tokio::test]
    async fn test_progress_tracker_basic() {
        let tracker = ProgressTracker::new();

        tracker.start(10);
        let state = tracker.get_state();
        assert_eq!(state.total_files, 10);
        assert_eq!(state.completed_files, 0);

        tracker.record(&TaskOutcome::success("a.jpg".into(), "out/a.jpg".into()));
        tracker.record(&TaskOutcome::failure(
            "b.jpg".into(),
            &ResizError::codec("b.jpg", "bad"),
        ));

        let state = tracker.get_state();
        assert_eq!(state.completed_files, 1);
        assert_eq!(state.failed_files, 1);
        assert_eq!(state.completion_percentage, 20.0);
    }

    #[tokio::test]
    async fn test_progress_updates() {
        let tracker = ProgressTracker::new();
        let mut receiver = tracker.subscribe();

        tracker.start(5);
        let update = receiver.recv().await.unwrap();
        assert!(matches!(update, ProgressUpdate::Started { total_files: 5 }));

        tracker.record(&TaskOutcome::success("a.jpg".into(), "out/a.jpg".into()));
        match receiver.recv().await.unwrap() {
            ProgressUpdate::FileCompleted {
                source_path,
                success,
            } => {
                assert_eq!(source_path, PathBuf::from("a.jpg"));
                assert!(success);
            }
            other => panic!("expected FileCompleted, got {:?}", other),
        }
    }

    #[test]
    fn test_record_before_start_is_harmless() {
        let tracker = ProgressTracker::new();
        tracker.record(&TaskOutcome::success("a.jpg".into(), "out/a.jpg".into()));
        assert_eq!(tracker.get_state().total_files, 0);
    }
}
