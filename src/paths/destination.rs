//! Destination directory provisioning and write probing

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::error::{ResizError, Result};
use crate::paths::source::{SourceKind, SourceSet};

/// Prefix of synthesized destination directory names
pub const FALLBACK_DIR_PREFIX: &str = "resized_";

/// Name of the directory synthesized when no destination is given
pub fn fallback_dir_name(now: DateTime<Local>) -> String {
    format!("{}{}", FALLBACK_DIR_PREFIX, now.format("%Y%m%d%H%M%S"))
}

/// Where the synthesized directory goes for this source
///
/// File source: sibling of the file's parent directory.
/// Directory source: sibling of the directory.
pub fn fallback_destination(source: &SourceSet, now: DateTime<Local>) -> PathBuf {
    let anchor = match source.kind() {
        SourceKind::File => source.root().parent().unwrap_or(source.root()),
        SourceKind::Directory => source.root(),
    };
    let base = anchor.parent().unwrap_or(anchor);
    base.join(fallback_dir_name(now))
}

/// Resolve, create and write-probe the destination directory.
///
/// Creation is idempotent. The returned path is absolute.
pub fn provision(explicit: Option<&Path>, source: &SourceSet) -> Result<PathBuf> {
    let requested = match explicit {
        Some(dir) => absolutize(dir)?,
        None => fallback_destination(source, Local::now()),
    };

    std::fs::create_dir_all(&requested)
        .map_err(|e| ResizError::destination_not_writable(&requested, e))?;

    let dir = std::fs::canonicalize(&requested)
        .map_err(|e| ResizError::destination_not_writable(&requested, e))?;

    if !dir.is_dir() {
        return Err(ResizError::destination_not_writable(
            &dir,
            io::Error::new(io::ErrorKind::Other, "destination is not a directory"),
        ));
    }

    probe_writable(&dir)?;

    info!("Destination directory: {:?}", dir);
    Ok(dir)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| ResizError::destination_not_writable(path, e))?;
    Ok(cwd.join(path))
}

/// Create and remove a uniquely named probe file in `dir`
pub fn probe_writable(dir: &Path) -> Result<()> {
    let probe = dir.join(format!(".resiz-probe-{}", uuid::Uuid::new_v4()));

    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .map_err(|e| ResizError::destination_not_writable(dir, e))?;

    remove_best_effort(&probe);
    debug!("Destination {:?} passed the write probe", dir);
    Ok(())
}

/// Best-effort cleanup: an already-missing file is clean, other failures are logged only
pub fn remove_best_effort(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove probe file {:?}: {}", path, e),
    }
}
