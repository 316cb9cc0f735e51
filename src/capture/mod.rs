//! Photo capture through a camera handler.
//!
//! This module provides:
//! - Photo file lifecycle (`CapturedPhoto`)
//! - Content references for the camera (`FileProvider`, `ContentUri`)
//! - Camera handlers (`CameraHandler`, `CommandCamera`)
//! - The controller tying them together (`CaptureController`)

pub mod camera;
pub mod photo;
pub mod provider;

pub use camera::{CameraHandler, CameraResult, CaptureRequest, CommandCamera};
pub use photo::CapturedPhoto;
pub use provider::FileProvider;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no camera available")]
    CameraUnavailable,
    #[error("failed to create photo file: {0}")]
    CreateFile(#[source] io::Error),
    #[error("photo {} is outside the provider root", .0.display())]
    NotExposable(PathBuf),
    #[error("camera failed: {0}")]
    Camera(#[source] io::Error),
    #[error("capture canceled")]
    Canceled,
}

/// Launches the camera against a freshly created photo file.
pub struct CaptureController {
    provider: FileProvider,
    camera: Option<Box<dyn CameraHandler>>,
}

impl CaptureController {
    pub fn new(provider: FileProvider, camera: Option<Box<dyn CameraHandler>>) -> Self {
        Self { provider, camera }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let provider = FileProvider::new(config.provider_authority.clone(), config.pictures_dir());
        let camera = CommandCamera::resolve(&config.camera_command)
            .map(|c| Box::new(c) as Box<dyn CameraHandler>);
        Self::new(provider, camera)
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    /// Runs one camera round-trip. On success the returned photo holds the
    /// picture; on any failure the photo file has already been removed.
    pub fn take_picture(&mut self) -> Result<CapturedPhoto, CaptureError> {
        let camera = self.camera.as_mut().ok_or(CaptureError::CameraUnavailable)?;

        let mut photo =
            CapturedPhoto::create_in(self.provider.root()).map_err(CaptureError::CreateFile)?;
        let uri = self
            .provider
            .uri_for(photo.path())
            .ok_or_else(|| CaptureError::NotExposable(photo.path().to_path_buf()))?;
        let request = CaptureRequest::new(uri);
        log::debug!("Capture request {}: {}", request.request_code, request.output);

        match camera.capture(&request, &self.provider) {
            Ok(CameraResult::Ok) => {
                photo.mark_captured();
                Ok(photo)
            }
            Ok(CameraResult::Canceled) => Err(CaptureError::Canceled),
            Err(e) => Err(CaptureError::Camera(e)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use super::photo::PhotoState;
    use image::{ImageBuffer, Rgb};
    use std::path::Path;
    use tempfile::tempdir;

    /// Writes a small JPEG into the requested output.
    pub struct StillCamera {
        pub result: CameraResult,
    }

    impl CameraHandler for StillCamera {
        fn capture(
            &mut self,
            request: &CaptureRequest,
            provider: &FileProvider,
        ) -> io::Result<CameraResult> {
            let path = provider.resolve(&request.output).unwrap();
            let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(8, 8);
            img.save_with_format(&path, image::ImageFormat::Jpeg)
                .map_err(io::Error::other)?;
            Ok(self.result)
        }
    }

    fn controller(dir: &Path, camera: Option<Box<dyn CameraHandler>>) -> CaptureController {
        CaptureController::new(FileProvider::new("test.provider", dir), camera)
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_take_picture_keeps_photo() {
        let dir = tempdir().unwrap();
        let camera = StillCamera { result: CameraResult::Ok };
        let mut controller = controller(dir.path(), Some(Box::new(camera)));

        let photo = controller.take_picture().unwrap();
        assert_eq!(photo.state(), PhotoState::Captured);
        assert!(std::fs::metadata(photo.path()).unwrap().len() > 0);
    }

    #[test]
    fn test_no_camera_is_noop() {
        let dir = tempdir().unwrap();
        let mut controller = controller(dir.path(), None);

        assert!(!controller.has_camera());
        assert!(matches!(
            controller.take_picture(),
            Err(CaptureError::CameraUnavailable)
        ));
        assert_eq!(files_in(dir.path()), 0);
    }

    #[test]
    fn test_canceled_capture_removes_file() {
        let dir = tempdir().unwrap();
        let camera = StillCamera { result: CameraResult::Canceled };
        let mut controller = controller(dir.path(), Some(Box::new(camera)));

        assert!(matches!(controller.take_picture(), Err(CaptureError::Canceled)));
        assert_eq!(files_in(dir.path()), 0);
    }
}
