use image::DynamicImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Language the bundled model is trained for.
pub const LANGUAGE: &str = "eng";

/// Characters the engine may emit for a code.
pub const CODE_WHITELIST: &str = "> +0123456789";

/// Tesseract page segmentation modes used by this app.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSegMode {
    /// Automatic page segmentation with orientation and script detection
    AutoOsd,
}

impl PageSegMode {
    /// Value passed to `--psm`.
    pub fn as_arg(self) -> u8 {
        match self {
            Self::AutoOsd => 1,
        }
    }
}

/// Engine settings fixed for the life of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OcrConfig {
    pub whitelist: &'static str,
    pub page_seg_mode: PageSegMode,
}

impl OcrConfig {
    pub const CODE: OcrConfig = OcrConfig {
        whitelist: CODE_WHITELIST,
        page_seg_mode: PageSegMode::AutoOsd,
    };

    /// True if every character in `text`, apart from line breaks, is whitelisted.
    pub fn permits(&self, text: &str) -> bool {
        text.chars()
            .all(|c| c == '\n' || c == '\r' || self.whitelist.contains(c))
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no image set")]
    NoImage,
    #[error("failed to write engine input: {0}")]
    Input(#[from] image::ImageError),
    #[error("failed to run tesseract: {0}")]
    Io(#[from] std::io::Error),
    #[error("tesseract failed: {0}")]
    Failed(String),
}

/// Capability interface over an OCR engine.
///
/// Mirrors the engine's stateful API: configure, set an image, read the text,
/// then `clear` before the next image.
pub trait RecognitionEngine: Send {
    fn set_whitelist(&mut self, whitelist: &str);
    fn set_page_seg_mode(&mut self, mode: PageSegMode);
    fn set_image(&mut self, image: DynamicImage);
    /// Runs recognition on the current image.
    fn utf8_text(&mut self) -> Result<String, EngineError>;
    /// Drops the current image and any recognition results.
    fn clear(&mut self);

    fn configure(&mut self, config: &OcrConfig) {
        self.set_whitelist(config.whitelist);
        self.set_page_seg_mode(config.page_seg_mode);
    }

    /// Sets `image`, recognizes it and clears the engine state.
    fn recognize(&mut self, image: DynamicImage) -> Result<String, EngineError> {
        self.set_image(image);
        let text = self.utf8_text();
        self.clear();
        text
    }
}

/// Runs the tesseract executable against a provisioned tessdata directory.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata_dir: PathBuf,
    language: String,
    whitelist: Option<String>,
    page_seg_mode: PageSegMode,
    image: Option<DynamicImage>,
}

impl TesseractEngine {
    pub fn new(executable: PathBuf, tessdata_dir: PathBuf, language: &str) -> Self {
        Self {
            executable,
            tessdata_dir,
            language: language.to_string(),
            whitelist: None,
            page_seg_mode: PageSegMode::AutoOsd,
            image: None,
        }
    }

    fn command(&self, input: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input)
            .arg("stdout")
            .arg("--tessdata-dir")
            .arg(&self.tessdata_dir)
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.page_seg_mode.as_arg().to_string());
        if let Some(whitelist) = &self.whitelist {
            cmd.arg("-c")
                .arg(format!("tessedit_char_whitelist={}", whitelist));
        }
        cmd
    }
}

impl RecognitionEngine for TesseractEngine {
    fn set_whitelist(&mut self, whitelist: &str) {
        self.whitelist = Some(whitelist.to_string());
    }

    fn set_page_seg_mode(&mut self, mode: PageSegMode) {
        self.page_seg_mode = mode;
    }

    fn set_image(&mut self, image: DynamicImage) {
        self.image = Some(image);
    }

    fn utf8_text(&mut self) -> Result<String, EngineError> {
        let image = self.image.as_ref().ok_or(EngineError::NoImage)?;

        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        image.save(temp_input.path())?;

        let output = self.command(temp_input.path()).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn clear(&mut self) {
        self.image = None;
    }
}
