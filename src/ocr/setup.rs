use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bundled model not found at {}", .0.display())]
    ModelMissing(PathBuf),
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to download {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("tesseract not found, install Tesseract-OCR or set tesseract_path")]
    TesseractNotFound,
}

fn io_err<'a>(
    action: &'static str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> ProvisionError + 'a {
    move |source| ProvisionError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}

/// Where the language model bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelSource {
    /// Model file shipped with the application
    Bundled(PathBuf),
    /// Fetched from the tessdata repository
    Download(String),
}

impl ModelSource {
    /// Picks the bundled model if present, otherwise the download URL when allowed.
    pub fn resolve(
        bundled: &Path,
        language: &str,
        allow_download: bool,
    ) -> Result<Self, ProvisionError> {
        if bundled.exists() {
            Ok(Self::Bundled(bundled.to_path_buf()))
        } else if allow_download {
            Ok(Self::Download(format!("{}/{}.traineddata", TESSDATA_REPO, language)))
        } else {
            Err(ProvisionError::ModelMissing(bundled.to_path_buf()))
        }
    }
}

/// A temporary base directory holding `tessdata/<lang>.traineddata`.
///
/// The directory is removed when this is dropped.
pub struct TessdataDir {
    root: TempDir,
    tessdata: PathBuf,
}

impl TessdataDir {
    /// Base directory (parent of `tessdata/`).
    pub fn base(&self) -> &Path {
        self.root.path()
    }

    /// The `tessdata/` directory handed to the engine.
    pub fn tessdata(&self) -> &Path {
        &self.tessdata
    }
}

/// Creates a fresh `tesseract-*` temp directory and installs the model into it.
pub fn provision_tessdata(
    source: &ModelSource,
    language: &str,
) -> Result<TessdataDir, ProvisionError> {
    let root = tempfile::Builder::new()
        .prefix("tesseract-")
        .tempdir()
        .map_err(io_err("create temp dir", &std::env::temp_dir()))?;

    let tessdata = root.path().join("tessdata");
    fs::create_dir_all(&tessdata).map_err(io_err("create", &tessdata))?;

    let model = install_model(&tessdata, language, source)?;
    log::debug!("Model installed at {}", model.display());
    let dir = TessdataDir { root, tessdata };
    log::info!("Tessdata base dir: {}", dir.base().display());
    Ok(dir)
}

/// Writes `<tessdata_dir>/<language>.traineddata` from `source`.
///
/// The target must not exist yet; a second install into the same directory fails.
pub fn install_model(
    tessdata_dir: &Path,
    language: &str,
    source: &ModelSource,
) -> Result<PathBuf, ProvisionError> {
    let target = tessdata_dir.join(format!("{}.traineddata", language));

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
        .map_err(io_err("create", &target))?;

    let written = match source {
        ModelSource::Bundled(path) => copy_bundled(path, file, &target)?,
        ModelSource::Download(url) => download(url, file, &target)?,
    };

    log::info!("Installed {} ({} bytes)", target.display(), written);
    Ok(target)
}

fn copy_bundled(path: &Path, file: File, target: &Path) -> Result<u64, ProvisionError> {
    let src = File::open(path).map_err(io_err("open", path))?;
    let mut reader = BufReader::new(src);
    let mut writer = BufWriter::new(file);
    let written = io::copy(&mut reader, &mut writer).map_err(io_err("copy into", target))?;
    writer.flush().map_err(io_err("write", target))?;
    Ok(written)
}

fn download(url: &str, mut file: File, target: &Path) -> Result<u64, ProvisionError> {
    log::info!("Downloading {}...", url);

    let download_err = |source| ProvisionError::Download {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(download_err)?;

    let response = client
        .get(url)
        .header("User-Agent", "wocr")
        .send()
        .map_err(download_err)?;

    if !response.status().is_success() {
        return Err(ProvisionError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let bytes = response.bytes().map_err(download_err)?;
    file.write_all(&bytes).map_err(io_err("write", target))?;
    Ok(bytes.len() as u64)
}

/// Finds the tesseract executable: configured path first, then PATH, then
/// common install locations.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf, ProvisionError> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        log::warn!("Configured tesseract {} does not exist", path.display());
    }

    // Check PATH
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    let common_paths = [
        "/usr/bin/tesseract",
        "/usr/local/bin/tesseract",
        "/opt/homebrew/bin/tesseract",
        r"C:\Program Files\Tesseract-OCR\tesseract.exe",
        r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    ];

    common_paths
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or(ProvisionError::TesseractNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn bundled_model(dir: &Path) -> PathBuf {
        let path = dir.join("eng.traineddata");
        fs::write(&path, (0..=255u8).cycle().take(5000).collect::<Vec<_>>()).unwrap();
        path
    }

    #[test]
    fn test_provision_copies_model_byte_for_byte() {
        let src = tempdir().unwrap();
        let model = bundled_model(src.path());

        let dir = provision_tessdata(&ModelSource::Bundled(model.clone()), "eng").unwrap();

        assert_eq!(dir.tessdata(), dir.base().join("tessdata"));
        let installed = dir.tessdata().join("eng.traineddata");
        assert_eq!(fs::read(installed).unwrap(), fs::read(model).unwrap());
        assert!(
            dir.base()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("tesseract-")
        );
    }

    #[test]
    fn test_install_twice_fails() {
        let src = tempdir().unwrap();
        let model = bundled_model(src.path());
        let tessdata = tempdir().unwrap();
        let source = ModelSource::Bundled(model);

        install_model(tessdata.path(), "eng", &source).unwrap();
        let err = install_model(tessdata.path(), "eng", &source).unwrap_err();
        assert!(matches!(err, ProvisionError::Io { action: "create", .. }));
    }

    #[test]
    fn test_missing_bundled_model_is_io_error() {
        let tessdata = tempdir().unwrap();
        let source = ModelSource::Bundled(tessdata.path().join("missing.traineddata"));

        let err = install_model(tessdata.path(), "eng", &source).unwrap_err();
        assert!(matches!(err, ProvisionError::Io { action: "open", .. }));
    }

    #[test]
    fn test_tempdir_removed_on_drop() {
        let src = tempdir().unwrap();
        let dir = provision_tessdata(&ModelSource::Bundled(bundled_model(src.path())), "eng")
            .unwrap();
        let base = dir.base().to_path_buf();
        drop(dir);
        assert!(!base.exists());
    }

    #[test]
    fn test_model_source_resolve() {
        let src = tempdir().unwrap();
        let model = bundled_model(src.path());
        assert_eq!(
            ModelSource::resolve(&model, "eng", false).unwrap(),
            ModelSource::Bundled(model)
        );

        let missing = src.path().join("nope.traineddata");
        assert_eq!(
            ModelSource::resolve(&missing, "eng", true).unwrap(),
            ModelSource::Download(
                "https://github.com/tesseract-ocr/tessdata/raw/main/eng.traineddata".to_string()
            )
        );
        assert!(matches!(
            ModelSource::resolve(&missing, "eng", false),
            Err(ProvisionError::ModelMissing(_))
        ));
    }
}
