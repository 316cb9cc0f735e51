//! Main-thread event loop tying the screen, camera and worker together.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::capture::CaptureController;
use crate::pipeline::{CaptureWorker, CycleError, CycleState, ErrorKind, SubmitError, WorkerEvent};
use crate::screen::Screen;

/// Everything the main thread reacts to.
#[derive(Debug)]
pub enum AppEvent {
    TakePicture,
    Quit,
    Worker(WorkerEvent),
}

/// The screen is drawn to `out`.
pub struct App<W: Write> {
    controller: CaptureController,
    worker: Option<CaptureWorker>,
    screen: Screen,
    out: W,
}

impl<W: Write> App<W> {
    /// `worker` is `None` when OCR setup failed; captures then fail fast.
    pub fn new(
        controller: CaptureController,
        worker: Option<CaptureWorker>,
        screen: Screen,
        out: W,
    ) -> Self {
        Self {
            controller,
            worker,
            screen,
            out,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Handles one event. Returns false once the app should exit.
    pub fn handle(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::TakePicture => {
                if let Err(e) = self.take_picture() {
                    match e.kind() {
                        ErrorKind::CameraUnavailable => {
                            log::debug!("Take picture ignored: {}", e)
                        }
                        _ => log::warn!("Take picture failed: {}", e),
                    }
                }
            }
            AppEvent::Worker(event) => self.screen.apply(event),
            AppEvent::Quit => return false,
        }
        true
    }

    /// Launches the camera and hands the photo to the worker.
    pub fn take_picture(&mut self) -> Result<(), CycleError> {
        let worker = self.worker.as_ref().ok_or(CycleError::EngineUnavailable)?;
        if worker.is_busy() {
            return Err(CycleError::Busy);
        }

        self.screen.set_status(CycleState::CapturePending);
        // The camera call blocks, so show the pending state first.
        if let Err(e) = self.screen.render(&mut self.out) {
            log::warn!("Failed to draw screen: {}", e);
        }
        let photo = match self.controller.take_picture() {
            Ok(photo) => photo,
            Err(e) => {
                self.screen.set_status(CycleState::Idle);
                return Err(e.into());
            }
        };
        self.screen.set_status(CycleState::Captured);

        worker.submit(photo).map_err(|e| {
            self.screen.set_status(CycleState::Idle);
            match e {
                SubmitError::Busy => CycleError::Busy,
                SubmitError::Closed => CycleError::EngineUnavailable,
            }
        })
    }

    /// Runs until `Quit` arrives or every sender is gone.
    pub fn run(&mut self, events: Receiver<AppEvent>) -> io::Result<()> {
        self.screen.render(&mut self.out)?;

        while let Ok(event) = events.recv() {
            let redraw = !matches!(event, AppEvent::Worker(WorkerEvent::State(_)));
            if !self.handle(event) {
                break;
            }
            if redraw {
                self.screen.render(&mut self.out)?;
            }
        }

        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
        Ok(())
    }
}

/// Maps an input line to an event. Unknown input is ignored.
pub fn parse_command(line: &str) -> Option<AppEvent> {
    match line.trim() {
        "" | "c" | "capture" => Some(AppEvent::TakePicture),
        "q" | "quit" | "exit" => Some(AppEvent::Quit),
        _ => None,
    }
}

/// Forwards stdin commands to the event loop from a background thread.
pub fn spawn_input_reader(events: Sender<AppEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("input".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if let Some(event) = parse_command(&line) {
                    if events.send(event).is_err() {
                        return;
                    }
                }
            }
            let _ = events.send(AppEvent::Quit);
        })?;
    Ok(())
}
