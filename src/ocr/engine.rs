use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;

use super::preprocess::Candidate;
use super::setup::{find_tessdata_dir, find_tesseract_executable};
use crate::config::TesseractConfig;
use crate::error::ExtractError;

/// Text extraction capability consumed by the pipeline.
///
/// Implementations own their engine settings; the pipeline only hands over
/// candidates, in order, and collects one raw text per candidate.
pub trait TextRecognizer {
    fn extract_text(&self, candidate: &Candidate) -> Result<String, ExtractError>;
}

/// Runs the Tesseract command-line binary on each candidate.
#[derive(Clone, Debug)]
pub struct TesseractCli {
    executable: PathBuf,
    tessdata_dir: Option<PathBuf>,
    language: String,
    engine_mode: u8,
    page_segmentation_mode: u8,
}

impl TesseractCli {
    /// Resolves the executable and tessdata directory from the config.
    pub fn from_config(config: &TesseractConfig) -> Result<Self, ExtractError> {
        let executable = find_tesseract_executable(config.executable.as_deref())?;
        let tessdata_dir = find_tessdata_dir(config.tessdata_dir.as_deref(), &config.language);

        crate::log(&format!(
            "Using Tesseract {} (tessdata: {}, --oem {} --psm {})",
            executable.display(),
            tessdata_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "default".to_string()),
            config.engine_mode,
            config.page_segmentation_mode
        ));

        Ok(Self {
            executable,
            tessdata_dir,
            language: config.language.clone(),
            engine_mode: config.engine_mode,
            page_segmentation_mode: config.page_segmentation_mode,
        })
    }

    /// Arguments for recognizing `input`, printing plain text to stdout.
    fn args(&self, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            input.as_os_str().to_owned(),
            "stdout".into(),
            "--oem".into(),
            self.engine_mode.to_string().into(),
            "--psm".into(),
            self.page_segmentation_mode.to_string().into(),
            "-l".into(),
            self.language.clone().into(),
        ];
        if let Some(dir) = &self.tessdata_dir {
            args.push("--tessdata-dir".into());
            args.push(dir.as_os_str().to_owned());
        }
        args
    }
}

impl TextRecognizer for TesseractCli {
    fn extract_text(&self, candidate: &Candidate) -> Result<String, ExtractError> {
        let fail = |reason: String| ExtractError::ocr(candidate.to_string(), reason);

        let temp_input = NamedTempFile::with_suffix(".png")
            .map_err(|e| fail(format!("failed to create temp file: {}", e)))?;
        candidate
            .image
            .save(temp_input.path())
            .map_err(|e| fail(format!("failed to write temp image: {}", e)))?;

        let output = Command::new(&self.executable)
            .args(self.args(temp_input.path()))
            .output()
            .map_err(|e| fail(format!("failed to run {}: {}", self.executable.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!(
                "Tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        crate::log(&format!(
            "OCR {}: {} characters, {} lines",
            candidate,
            text.len(),
            text.lines().filter(|l| !l.trim().is_empty()).count()
        ));
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::preprocess::Branch;
    use image::GrayImage;

    fn cli(tessdata_dir: Option<PathBuf>) -> TesseractCli {
        TesseractCli {
            executable: PathBuf::from("tesseract"),
            tessdata_dir,
            language: "eng".to_string(),
            engine_mode: 3,
            page_segmentation_mode: 11,
        }
    }

    #[test]
    fn test_args_sparse_text() {
        let args = cli(None).args(Path::new("in.png"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(
            args,
            vec!["in.png", "stdout", "--oem", "3", "--psm", "11", "-l", "eng"]
        );
    }

    #[test]
    fn test_args_with_tessdata() {
        let args = cli(Some(PathBuf::from("/data/tessdata"))).args(Path::new("in.png"));
        let tail: Vec<String> = args[8..].iter().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(tail, vec!["--tessdata-dir", "/data/tessdata"]);
    }

    #[test]
    fn test_missing_executable_is_engine_error() {
        let mut engine = cli(None);
        engine.executable = PathBuf::from("/nonexistent/tesseract");
        let candidate = Candidate {
            index: 0,
            branch: Branch::MORPH,
            image: GrayImage::new(4, 4),
        };

        let err = engine.extract_text(&candidate).unwrap_err();
        match err {
            ExtractError::OcrEngine { candidate, .. } => {
                assert_eq!(candidate, "candidate 1 (morph)")
            }
            other => panic!("expected OcrEngine, got {}", other),
        }
    }
}
