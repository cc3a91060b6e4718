//! Resiz - batch image conversion orchestrator
//!
//! Resolves a source file or directory tree, provisions a writable
//! destination, plans output dimensions per file and drives each file
//! through a codec engine on a bounded pool of worker slots.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use resiz::{run_batch, BatchOptions};
//!
//! # async fn example() -> resiz::Result<()> {
//! let options = BatchOptions::new("photos")
//!     .destination("photos-web")
//!     .width(1920)
//!     .format("webp")
//!     .quality(85);
//!
//! let result = run_batch(options).await?;
//! println!("{} converted, {} failed", result.succeeded.len(), result.failed.len());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod error;
pub mod parallel;
pub mod paths;
pub mod processing;

// Re-export commonly used types
pub use batch::{run_batch, BatchCoordinator, BatchState};
pub use config::{BatchOptions, Config, ConversionRequest, Profile};
pub use error::{ErrorKind, ResizError, Result};
pub use parallel::{default_concurrency, BatchResult, TaskOutcome, TaskScheduler};
pub use processing::{CodecEngine, DimensionPlan, Dimensions, ImageCodec, OutputFormat};

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging from `RUST_LOG` (default `info`)
///
/// Safe to call more than once; only the first subscriber is installed.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    install_subscriber(filter, false);
    log_system_summary();
    Ok(())
}

/// Initialize logging from the `[logging]` section of `config`
pub fn init_with_config(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.logging.level).map_err(|e| {
        ResizError::config(format!(
            "Invalid log level '{}': {}",
            config.logging.level, e
        ))
    })?;
    install_subscriber(filter, config.logging.json_format);
    log_system_summary();
    Ok(())
}

fn install_subscriber(filter: EnvFilter, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        info!("Resiz v{} initialized", VERSION);
    }
}

fn log_system_summary() {
    use sysinfo::{System, SystemExt};

    let mut system = System::new();
    system.refresh_memory();

    const MIN_MEMORY_MB: u64 = 512;
    let available_mb = system.available_memory() / (1024 * 1024);
    if available_mb < MIN_MEMORY_MB {
        warn!(
            "Low available memory: {}MB (recommended: >{}MB)",
            available_mb, MIN_MEMORY_MB
        );
    }

    debug!(
        "Detected {} logical CPUs, default concurrency {}",
        num_cpus::get(),
        default_concurrency()
    );
}
