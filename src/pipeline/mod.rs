//! Capture processing off the main thread.
//!
//! This module provides:
//! - The capture cycle state machine and its errors
//! - One cycle: decode → recognize → extract → delete photo
//! - A single-slot worker that owns the OCR engine

pub mod cycle;
pub mod state;
pub mod worker;

pub use cycle::PipelineSettings;
pub use state::{CycleError, CycleState, ErrorKind};
pub use worker::{CaptureWorker, SubmitError, WorkerEvent};
