//! Terminal screen: preview area, code field and a status line.

use std::io::{self, Write};

use crate::ocr::normalize::SurfaceSize;
use crate::pipeline::{CycleState, WorkerEvent};

pub struct Screen {
    surface: SurfaceSize,
    status: CycleState,
    preview: Option<(u32, u32)>,
    code: String,
}

impl Screen {
    pub fn new(surface: SurfaceSize) -> Self {
        Self {
            surface,
            status: CycleState::Idle,
            preview: None,
            code: String::new(),
        }
    }

    /// Current size of the preview surface.
    pub fn surface_size(&self) -> SurfaceSize {
        self.surface
    }

    pub fn status(&self) -> CycleState {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn preview(&self) -> Option<(u32, u32)> {
        self.preview
    }

    pub fn set_status(&mut self, status: CycleState) {
        self.status = status;
    }

    /// Applies a worker update. A cycle without a code leaves the field as it was.
    pub fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::State(state) => self.status = state,
            WorkerEvent::Preview { width, height } => self.preview = Some((width, height)),
            WorkerEvent::Finished(Ok(Some(code))) => {
                self.code = code.as_str().to_string();
                self.status = CycleState::Idle;
            }
            WorkerEvent::Finished(_) => self.status = CycleState::Idle,
        }
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        let preview = match self.preview() {
            Some((w, h)) => format!("{}x{}", w, h),
            None => "(empty)".to_string(),
        };
        writeln!(
            out,
            "[preview {}x{}] {}",
            self.surface.width, self.surface.height, preview
        )?;
        writeln!(out, "Code:   {}", self.code())?;
        writeln!(out, "Status: {}", self.status())?;
        writeln!(out, "[Enter/c] take picture  [q] quit")?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::extract::extract_code;
    use crate::pipeline::CycleError;

    fn screen() -> Screen {
        Screen::new(SurfaceSize {
            width: 480,
            height: 640,
        })
    }

    #[test]
    fn test_code_overwritten_by_new_code() {
        let mut screen = screen();
        let first = extract_code(&"1".repeat(52)).unwrap();
        let second = extract_code(&"2".repeat(52)).unwrap();

        screen.apply(WorkerEvent::Finished(Ok(Some(first))));
        screen.apply(WorkerEvent::Finished(Ok(Some(second))));
        assert_eq!(screen.code(), "2".repeat(52));
    }

    #[test]
    fn test_no_code_leaves_field_unchanged() {
        let mut screen = screen();
        let code = extract_code(&"1".repeat(52)).unwrap();
        screen.apply(WorkerEvent::Finished(Ok(Some(code))));

        screen.apply(WorkerEvent::State(CycleState::Recognizing));
        screen.apply(WorkerEvent::Finished(Ok(None)));
        assert_eq!(screen.code(), "1".repeat(52));
        assert_eq!(screen.status(), CycleState::Idle);

        screen.apply(WorkerEvent::Finished(Err(CycleError::Busy)));
        assert_eq!(screen.code(), "1".repeat(52));
    }

    #[test]
    fn test_render() {
        let mut screen = screen();
        screen.apply(WorkerEvent::Preview {
            width: 640,
            height: 480,
        });
        let mut out = Vec::new();
        screen.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[preview 480x640] 640x480"));
        assert!(text.contains("Status: Idle"));
    }
}
