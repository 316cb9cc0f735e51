pub mod setup;
pub mod normalize;
pub mod engine;
pub mod extract;

pub use engine::{OcrConfig, RecognitionEngine, TesseractEngine};
pub use setup::{find_tesseract_executable, provision_tessdata, ModelSource, TessdataDir};

use anyhow::{Context, Result};

use crate::config::AppConfig;

/// Provisions tessdata and builds a configured engine on top of it.
///
/// The returned directory must outlive the engine.
pub fn ensure_tesseract(config: &AppConfig) -> Result<(TesseractEngine, TessdataDir)> {
    let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
    log::info!("Using tesseract at {}", executable.display());

    let source = ModelSource::resolve(
        &config.model_path(),
        engine::LANGUAGE,
        config.download_missing_model,
    )?;
    let tessdata = provision_tessdata(&source, engine::LANGUAGE)
        .context("failed to provision tessdata")?;

    let mut engine = TesseractEngine::new(
        executable,
        tessdata.tessdata().to_path_buf(),
        engine::LANGUAGE,
    );
    engine.configure(&OcrConfig::CODE);

    Ok((engine, tessdata))
}
