//! Camera handlers that fill a capture request's output file.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::provider::{ContentUri, FileProvider};

/// Request code for photo captures.
pub const CAMERA_REQUEST: u32 = 1000;

const OUTPUT_PLACEHOLDER: &str = "{output}";

/// A request for a camera to save a picture to `output`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureRequest {
    pub request_code: u32,
    pub output: ContentUri,
}

impl CaptureRequest {
    pub fn new(output: ContentUri) -> Self {
        Self {
            request_code: CAMERA_REQUEST,
            output,
        }
    }
}

/// How the camera run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraResult {
    Ok,
    Canceled,
}

pub trait CameraHandler: Send {
    /// Takes a picture into the file behind `request.output`. Blocks until done.
    fn capture(
        &mut self,
        request: &CaptureRequest,
        provider: &FileProvider,
    ) -> io::Result<CameraResult>;
}

/// Runs an external capture program such as `fswebcam` or `libcamera-still`.
#[derive(Debug)]
pub struct CommandCamera {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandCamera {
    /// Builds a handler from `[program, args...]`, or `None` if the program
    /// cannot be found.
    pub fn resolve(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        let program = find_program(program)?;
        Some(Self {
            program,
            args: args.to_vec(),
        })
    }

    fn command(&self, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        for arg in &self.args {
            if arg.contains(OUTPUT_PLACEHOLDER) {
                cmd.arg(arg.replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy()));
            } else {
                cmd.arg(arg);
            }
        }
        cmd
    }
}

impl CameraHandler for CommandCamera {
    fn capture(
        &mut self,
        request: &CaptureRequest,
        provider: &FileProvider,
    ) -> io::Result<CameraResult> {
        let output = provider.resolve(&request.output).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot resolve {}", request.output),
            )
        })?;

        log::info!(
            "Launching camera {} (request {})",
            self.program.display(),
            request.request_code
        );
        let result = self.command(&output).output()?;

        if result.status.success() {
            Ok(CameraResult::Ok)
        } else {
            log::warn!(
                "Camera exited with {}: {}",
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            );
            Ok(CameraResult::Canceled)
        }
    }
}

/// Locates `program` directly or on PATH.
fn find_program(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }
    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_request_code() {
        let uri: ContentUri = "content://a/JPEG_1.jpg".parse().unwrap();
        assert_eq!(CaptureRequest::new(uri).request_code, 1000);
    }

    #[test]
    fn test_resolve_unknown_program() {
        let command = vec!["definitely-not-a-camera-binary".to_string()];
        assert!(CommandCamera::resolve(&command).is_none());
        assert!(CommandCamera::resolve(&[]).is_none());
    }

    #[test]
    fn test_output_placeholder_substituted() {
        let dir = tempdir().unwrap();
        let program = dir.path().join("cam");
        std::fs::write(&program, b"").unwrap();

        let command = vec![
            program.to_string_lossy().to_string(),
            "--out={output}".to_string(),
            "-q".to_string(),
        ];
        let camera = CommandCamera::resolve(&command).unwrap();
        let cmd = camera.command(Path::new("/pics/JPEG_1.jpg"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(args, vec!["--out=/pics/JPEG_1.jpg", "-q"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_maps_to_result() {
        let dir = tempdir().unwrap();
        let provider = FileProvider::new("auth", dir.path());
        let target = dir.path().join("JPEG_1.jpg");
        std::fs::write(&target, b"").unwrap();
        let request = CaptureRequest::new(provider.uri_for(&target).unwrap());

        let mut ok = CommandCamera::resolve(&["true".to_string()]).unwrap();
        assert_eq!(ok.capture(&request, &provider).unwrap(), CameraResult::Ok);

        let mut failing = CommandCamera::resolve(&["false".to_string()]).unwrap();
        assert_eq!(
            failing.capture(&request, &provider).unwrap(),
            CameraResult::Canceled
        );
    }
}
