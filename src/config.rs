//! Application configuration.
//!
//! Loads settings from config.json next to the executable at startup. Every
//! field has a default, so a partial (or missing) file is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ocr::normalize::{BoundsProbe, Rotation, SurfaceSize};

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bundled language model. Defaults to `<exe_dir>/resources/eng.traineddata`.
    pub model_path: Option<PathBuf>,
    /// Download eng.traineddata when the bundled model is missing
    pub download_missing_model: bool,
    /// Explicit tesseract executable, otherwise PATH and common locations are searched
    pub tesseract_path: Option<PathBuf>,
    /// Camera program and arguments. `{output}` is replaced with the photo path.
    /// Empty disables capture.
    pub camera_command: Vec<String>,
    /// Authority used for content references handed to the camera
    pub provider_authority: String,
    /// Where captured photos are created. Defaults to the user's pictures directory.
    pub pictures_dir: Option<PathBuf>,
    /// Size of the preview surface the photo is scaled against
    pub surface: SurfaceSize,
    /// How photo bounds are obtained before decoding
    pub bounds_probe: BoundsProbe,
    /// Rotation applied after decoding (0, 90, 180 or 270)
    pub rotation: Rotation,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            download_missing_model: true,
            tesseract_path: None,
            camera_command: vec![
                "fswebcam".to_string(),
                "--no-banner".to_string(),
                "-r".to_string(),
                "1920x1080".to_string(),
                "{output}".to_string(),
            ],
            provider_authority: "wocr.fileprovider".to_string(),
            pictures_dir: None,
            surface: SurfaceSize {
                width: 480,
                height: 640,
            },
            bounds_probe: BoundsProbe::default(),
            rotation: Rotation::default(),
        }
    }
}

impl AppConfig {
    pub fn model_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| crate::paths::get_resources_dir().join("eng.traineddata"))
    }

    pub fn pictures_dir(&self) -> PathBuf {
        self.pictures_dir
            .clone()
            .unwrap_or_else(crate::paths::get_pictures_dir)
    }
}

/// Loads configuration from `path`, or returns defaults if it is missing or invalid.
pub fn load_config(path: &Path) -> AppConfig {
    log::info!("Looking for config at: {}", path.display());

    if !path.exists() {
        log::info!("config.json not found. Using default config.");
        return AppConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                log::info!("Config loaded from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to parse config.json: {}. Using defaults.", e);
                AppConfig::default()
            }
        },
        Err(e) => {
            log::warn!("Failed to read config.json: {}. Using defaults.", e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json"));
        assert_eq!(config.surface, SurfaceSize { width: 480, height: 640 });
        assert_eq!(config.rotation, Rotation::None);
        assert_eq!(config.bounds_probe, BoundsProbe::Unset);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "rotation": 90, "bounds_probe": "header", "camera_command": [] }"#,
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.rotation, Rotation::Quarter);
        assert_eq!(config.bounds_probe, BoundsProbe::Header);
        assert!(config.camera_command.is_empty());
        assert_eq!(config.provider_authority, "wocr.fileprovider");
    }

    #[test]
    fn test_invalid_rotation_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "rotation": 45 }"#).unwrap();

        let config = load_config(&path);
        assert_eq!(config.rotation, Rotation::None);
    }
}
