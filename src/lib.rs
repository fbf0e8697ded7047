//! Chart OCR
//!
//! Recovers approximate numeric series from a photographed or screenshotted
//! chart. The image is enhanced into one or more binary candidates, each is
//! run through Tesseract, near-duplicate OCR outputs are merged, and the
//! remaining text is classified into a title, axis labels and numeric rows.
//!
//! Extraction is best effort: noisy lines are dropped, never reported as errors.

pub mod config;
pub mod error;
pub mod export;
pub mod ocr;
pub mod paths;

pub use config::{Aggregation, ExtractorConfig, ParseMode, PreprocessConfig, Profile, TesseractConfig};
pub use error::ExtractError;
pub use ocr::{ChartExtractor, Extraction, GraphRecord, Number, TesseractCli, TextRecognizer};

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Logs a message to stderr and, when the logs directory exists, to the log file.
///
/// Stdout is left alone so extraction results can be piped.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    eprint!("{}", line);
    if !paths::get_logs_dir().is_dir() {
        return;
    }
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths::get_log_file())
    {
        let _ = file.write_all(line.as_bytes());
    }
}
