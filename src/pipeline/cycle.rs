use crate::capture::CapturedPhoto;
use crate::ocr::engine::{OcrConfig, RecognitionEngine};
use crate::ocr::extract::{extract_code, ExtractedCode};
use crate::ocr::normalize::{normalize, NormalizeOptions, SurfaceSize};

use super::state::{CycleError, CycleState};

/// Settings the worker applies to every photo.
#[derive(Clone, Copy, Debug)]
pub struct PipelineSettings {
    pub surface: SurfaceSize,
    pub normalize: NormalizeOptions,
}

/// What a finished cycle produced.
#[derive(Debug)]
pub struct CycleReport {
    /// Dimensions of the normalized bitmap, if decoding got that far
    pub preview: Option<(u32, u32)>,
    /// `Ok(None)` means no code line was found
    pub result: Result<Option<ExtractedCode>, CycleError>,
}

/// Normalizes, recognizes and extracts from `photo`, then deletes it.
///
/// The photo is deleted whatever the outcome. `observe` sees each state
/// change, ending with `Idle`.
pub fn process_photo(
    mut photo: CapturedPhoto,
    engine: &mut dyn RecognitionEngine,
    settings: &PipelineSettings,
    observe: &mut dyn FnMut(CycleState),
) -> CycleReport {
    photo.mark_consumed();

    let mut preview = None;
    let result = recognize_photo(&photo, engine, settings, &mut preview, observe);

    if let Err(e) = photo.delete() {
        log::warn!("Failed to delete {}: {}", photo.path().display(), e);
    }
    observe(CycleState::Idle);

    match &result {
        Ok(Some(code)) => log::info!("Code found: {}", code),
        Ok(None) => log::info!("No {}-character line found", crate::ocr::extract::CODE_LENGTH),
        Err(e) => log::error!("Capture cycle failed: {}", e),
    }

    CycleReport { preview, result }
}

fn recognize_photo(
    photo: &CapturedPhoto,
    engine: &mut dyn RecognitionEngine,
    settings: &PipelineSettings,
    preview: &mut Option<(u32, u32)>,
    observe: &mut dyn FnMut(CycleState),
) -> Result<Option<ExtractedCode>, CycleError> {
    observe(CycleState::Normalizing);
    let img = normalize(photo.path(), settings.surface, &settings.normalize)?;
    *preview = Some((img.width(), img.height()));

    observe(CycleState::Recognizing);
    let text = engine.recognize(img)?;
    if !OcrConfig::CODE.permits(&text) {
        log::warn!("Engine returned characters outside the whitelist");
    }
    log::debug!("Recognized text:\n{}", text);

    observe(CycleState::Extracting);
    Ok(extract_code(&text))
}
