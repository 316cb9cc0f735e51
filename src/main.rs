//! wocr
//!
//! Takes a photo through a camera program, runs Tesseract over it and shows
//! the 52-character code found in the recognized text.

mod app;
mod capture;
mod config;
mod logging;
mod ocr;
mod paths;
mod pipeline;
mod screen;

use anyhow::{Context, Result};
use std::sync::mpsc::channel;

use app::{App, AppEvent};
use capture::CaptureController;
use ocr::normalize::NormalizeOptions;
use pipeline::{CaptureWorker, PipelineSettings};
use screen::Screen;

fn main() -> Result<()> {
    std::fs::create_dir_all(paths::get_logs_dir()).context("failed to create logs directory")?;
    logging::init(&paths::get_logs_dir());
    logging::install_panic_hook();

    log::info!("wocr {} starting", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(&paths::get_config_path());
    let pictures_dir = config.pictures_dir();
    // Each tap retries creating its photo file, so a missing directory only
    // disables capture.
    if let Err(e) = paths::ensure_directories(&pictures_dir) {
        log::warn!("Failed to create {}: {}", pictures_dir.display(), e);
    }

    let screen = Screen::new(config.surface);
    let settings = PipelineSettings {
        surface: screen.surface_size(),
        normalize: NormalizeOptions {
            bounds_probe: config.bounds_probe,
            rotation: config.rotation,
        },
    };

    let (events, receiver) = channel();

    // Held for the whole run: the engine reads its model from this directory.
    let mut tessdata = None;
    let worker = match ocr::ensure_tesseract(&config) {
        Ok((engine, dir)) => {
            tessdata = Some(dir);
            let dispatch = events.clone();
            let worker = CaptureWorker::spawn(Box::new(engine), settings, move |event| {
                let _ = dispatch.send(AppEvent::Worker(event));
            })
            .context("failed to start capture worker")?;
            Some(worker)
        }
        Err(e) => {
            log::error!("OCR setup failed, captures are disabled: {:#}", e);
            None
        }
    };

    let controller = CaptureController::from_config(&config);
    if !controller.has_camera() {
        log::warn!(
            "No camera handler for {:?}, capture is disabled",
            config.camera_command
        );
    }
    app::spawn_input_reader(events).context("failed to start input reader")?;

    let mut app = App::new(controller, worker, screen, std::io::stdout());
    app.run(receiver)?;

    drop(tessdata);
    log::info!("wocr exiting");
    Ok(())
}
