//! Convert a directory of images to WebP with a progress feed

use std::sync::Arc;

use resiz::parallel::{ProgressTracker, ProgressUpdate};
use resiz::{init, BatchCoordinator, BatchOptions, ImageCodec, TaskOutcome};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init()?;

    let source = std::env::args().nth(1).unwrap_or_else(|| "photos".to_string());

    let tracker = Arc::new(ProgressTracker::new());
    let mut updates = tracker.subscribe();
    tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            match update {
                ProgressUpdate::Started { total_files } => {
                    println!("Converting {} files", total_files)
                }
                ProgressUpdate::FileCompleted {
                    source_path,
                    success,
                } => println!("  {} {}", if success { "ok " } else { "err" }, source_path.display()),
                ProgressUpdate::BatchCompleted { .. } => break,
            }
        }
    });

    let coordinator = BatchCoordinator::new(Arc::new(ImageCodec::new()))
        .with_concurrency(4)?
        .with_progress(tracker);

    let options = BatchOptions::new(&source)
        .width(1280)
        .format("webp")
        .quality(80);

    let result = coordinator.run_batch(options).await?;

    println!(
        "{} converted, {} failed in {:.2}s",
        result.succeeded.len(),
        result.failed.len(),
        result.elapsed.as_secs_f64()
    );
    for outcome in &result.failed {
        if let TaskOutcome::Failure {
            source_path,
            detail,
            ..
        } = outcome
        {
            println!("  {}: {}", source_path.display(), detail);
        }
    }

    Ok(())
}
