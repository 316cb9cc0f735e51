//! The transient photo file a capture writes into.

use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Lifecycle of a captured photo file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhotoState {
    /// Empty file created, waiting for the camera
    Created,
    /// Camera reported the picture was saved
    Captured,
    /// Handed to the recognition pipeline
    Consumed,
    Deleted,
}

/// A photo file owned by one capture cycle.
///
/// Dropping it without calling [`CapturedPhoto::delete`] still removes the file.
#[derive(Debug)]
pub struct CapturedPhoto {
    path: PathBuf,
    state: PhotoState,
}

impl CapturedPhoto {
    /// Creates an empty `JPEG_<yyyyMMdd_HHmmss>_<random>.jpg` in `dir`.
    pub fn create_in(dir: &Path) -> io::Result<Self> {
        let prefix = format!("JPEG_{}_", Local::now().format("%Y%m%d_%H%M%S"));
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".jpg")
            .tempfile_in(dir)?;
        let (_, path) = file.keep().map_err(|e| e.error)?;

        log::debug!("Created photo file {}", path.display());
        Ok(Self {
            path,
            state: PhotoState::Created,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> PhotoState {
        self.state
    }

    pub fn mark_captured(&mut self) {
        self.state = PhotoState::Captured;
    }

    pub fn mark_consumed(&mut self) {
        self.state = PhotoState::Consumed;
    }

    /// Removes the file if it still exists. Safe to call more than once.
    pub fn delete(&mut self) -> io::Result<()> {
        if self.state == PhotoState::Deleted {
            return Ok(());
        }
        self.state = PhotoState::Deleted;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("Deleted photo {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for CapturedPhoto {
    fn drop(&mut self) {
        if let Err(e) = self.delete() {
            log::warn!("Failed to delete photo {}: {}", self.path.display(), e);
        }
    }
}
