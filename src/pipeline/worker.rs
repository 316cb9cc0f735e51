//! Background worker that owns the OCR engine.
//!
//! The main thread submits captured photos; the worker processes them one at
//! a time and reports back through a dispatch callback. While a photo is in
//! flight, further submissions are rejected rather than queued.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::capture::CapturedPhoto;
use crate::ocr::engine::RecognitionEngine;
use crate::ocr::extract::ExtractedCode;

use super::cycle::{process_photo, CycleReport, PipelineSettings};
use super::state::{CycleError, CycleState};

/// Messages from the worker to the main thread.
#[derive(Debug)]
pub enum WorkerEvent {
    State(CycleState),
    Preview { width: u32, height: u32 },
    Finished(Result<Option<ExtractedCode>, CycleError>),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("worker is busy")]
    Busy,
    #[error("worker has stopped")]
    Closed,
}

pub struct CaptureWorker {
    jobs: Option<SyncSender<CapturedPhoto>>,
    busy: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    /// Starts the worker thread. It takes sole ownership of `engine`.
    pub fn spawn<F>(
        engine: Box<dyn RecognitionEngine>,
        settings: PipelineSettings,
        dispatch: F,
    ) -> io::Result<Self>
    where
        F: Fn(WorkerEvent) + Send + 'static,
    {
        let (jobs, receiver) = sync_channel(1);
        let busy = Arc::new(AtomicBool::new(false));

        let worker_busy = Arc::clone(&busy);
        let handle = thread::Builder::new()
            .name("capture-worker".to_string())
            .spawn(move || run_worker(receiver, engine, settings, worker_busy, dispatch))?;

        Ok(Self {
            jobs: Some(jobs),
            busy,
            handle: Some(handle),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Hands `photo` to the worker.
    ///
    /// On rejection the photo is dropped here, which deletes its file.
    pub fn submit(&self, photo: CapturedPhoto) -> Result<(), SubmitError> {
        let jobs = self.jobs.as_ref().ok_or(SubmitError::Closed)?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Rejecting {}: worker busy", photo.path().display());
            return Err(SubmitError::Busy);
        }

        match jobs.try_send(photo) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.busy.store(false, Ordering::Release);
                Err(SubmitError::Busy)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.busy.store(false, Ordering::Release);
                Err(SubmitError::Closed)
            }
        }
    }

    /// Closes the job channel and waits for the worker to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Capture worker panicked");
            }
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Processes photos until the job channel closes.
fn run_worker<F>(
    jobs: Receiver<CapturedPhoto>,
    mut engine: Box<dyn RecognitionEngine>,
    settings: PipelineSettings,
    busy: Arc<AtomicBool>,
    dispatch: F,
) where
    F: Fn(WorkerEvent),
{
    log::info!("Capture worker started");

    while let Ok(photo) = jobs.recv() {
        log::info!(
            "Capture worker: processing {} ({:?})",
            photo.path().display(),
            photo.state()
        );

        // A panic drops the photo during unwinding, which deletes its file.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            process_photo(photo, engine.as_mut(), &settings, &mut |state| {
                dispatch(WorkerEvent::State(state))
            })
        }));
        let report = match outcome {
            Ok(report) => report,
            Err(payload) => {
                let msg = crate::logging::panic_message(payload.as_ref());
                log::error!("Capture cycle panicked: {}", msg);
                engine.clear();
                dispatch(WorkerEvent::State(CycleState::Idle));
                CycleReport {
                    preview: None,
                    result: Err(CycleError::Panicked(msg)),
                }
            }
        };

        if let Some((width, height)) = report.preview {
            dispatch(WorkerEvent::Preview { width, height });
        }

        // Free the slot before reporting so the next tap is accepted.
        busy.store(false, Ordering::Release);
        dispatch(WorkerEvent::Finished(report.result));
    }

    log::info!("Capture worker: channel closed, exiting");
}
