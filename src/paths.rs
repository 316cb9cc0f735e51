use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the bundled resources directory: `<exe_dir>/resources/`
pub fn get_resources_dir() -> PathBuf {
    get_exe_dir().join("resources")
}

/// Returns the config file path: `<exe_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Returns the directory captured photos are written to.
///
/// Prefers the user's pictures directory, falling back to `<exe_dir>/pictures/`.
pub fn get_pictures_dir() -> PathBuf {
    dirs::picture_dir()
        .map(|p| p.join("wocr"))
        .unwrap_or_else(|| get_exe_dir().join("pictures"))
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories(pictures_dir: &std::path::Path) -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(pictures_dir)?;
    Ok(())
}
