use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ExtractError;

/// Install locations checked when tesseract is not configured and not on PATH.
const COMMON_EXECUTABLE_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

const COMMON_TESSDATA_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];

/// Finds the Tesseract executable: the configured path first, then PATH,
/// then common install locations.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf, ExtractError> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ExtractError::ocr(
            "engine setup",
            format!("configured tesseract not found at {}", path.display()),
        ));
    }

    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for path in COMMON_EXECUTABLE_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            crate::log(&format!("Found Tesseract at: {}", path));
            return Ok(p);
        }
    }

    Err(ExtractError::ocr(
        "engine setup",
        "Tesseract not found. Install Tesseract-OCR or set tesseract.executable in config.json",
    ))
}

/// Finds a tessdata directory that holds `<language>.traineddata`.
///
/// Returns None when nothing matches, leaving Tesseract to use its compiled-in
/// default.
pub fn find_tessdata_dir(configured: Option<&Path>, language: &str) -> Option<PathBuf> {
    if let Some(dir) = configured {
        return Some(dir.to_path_buf());
    }

    let traineddata = format!("{}.traineddata", language);

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        for dir in [prefix.clone(), prefix.join("tessdata")] {
            if dir.join(&traineddata).exists() {
                return Some(dir);
            }
        }
    }

    COMMON_TESSDATA_DIRS
        .iter()
        .map(PathBuf::from)
        .find(|dir| dir.join(&traineddata).exists())
}
