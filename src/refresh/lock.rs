//! Update lock file.
//!
//! Only one update run may write database files at a time, across processes
//! sharing the same database directory. The lock is a file created with
//! `create_new`; it is removed when the guard drops.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::config::LOCK_STALE_AFTER;
use crate::error_handling::GeoIpError;

/// Held update lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct UpdateLock {
    path: PathBuf,
}

impl UpdateLock {
    /// Takes the lock at `path`.
    ///
    /// Fails with [`GeoIpError::LockHeld`] while another run holds it. A lock
    /// file older than [`LOCK_STALE_AFTER`] is reclaimed once.
    pub fn acquire(path: &Path) -> Result<Self, GeoIpError> {
        Self::acquire_with_stale_after(path, LOCK_STALE_AFTER)
    }

    pub(crate) fn acquire_with_stale_after(
        path: &Path,
        stale_after: Duration,
    ) -> Result<Self, GeoIpError> {
        match Self::create(path) {
            Err(GeoIpError::LockHeld { .. }) if is_stale(path, stale_after) => {
                log::warn!("Removing stale update lock {}", path.display());
                if let Err(e) = std::fs::remove_file(path) {
                    if e.kind() != ErrorKind::NotFound {
                        return Err(GeoIpError::io(path, e));
                    }
                }
                Self::create(path)
            }
            other => other,
        }
    }

    fn create(path: &Path) -> Result<Self, GeoIpError> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(GeoIpError::LockHeld {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(GeoIpError::io(path, e)),
        };
        // Owner pid helps when a lock has to be cleared by hand
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            log::debug!("Failed to write pid to {}: {}", path.display(), e);
        }
        log::debug!("Acquired update lock {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Lock file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Released update lock {}", self.path.display()),
            Err(e) => log::warn!(
                "Failed to remove update lock {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age >= stale_after)
}
