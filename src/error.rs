//! Error types for the extraction pipeline.
//!
//! Only terminal failures live here. Noisy or unparseable OCR lines are not
//! errors; the structure parser drops them silently.

use thiserror::Error;

/// Terminal failure of one pipeline stage for one input.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The input could not be decoded, or decoded to an empty image.
    #[error("image decode failed for {input}: {reason}")]
    ImageDecode { input: String, reason: String },

    /// The external OCR engine failed or is unavailable.
    #[error("OCR engine failed on {candidate}: {reason}")]
    OcrEngine { candidate: String, reason: String },

    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl ExtractError {
    pub fn decode(input: impl Into<String>, reason: impl ToString) -> Self {
        Self::ImageDecode {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    pub fn ocr(candidate: impl Into<String>, reason: impl ToString) -> Self {
        Self::OcrEngine {
            candidate: candidate.into(),
            reason: reason.to_string(),
        }
    }

    /// Name of the pipeline stage that raised this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ImageDecode { .. } => "image enhancement",
            Self::OcrEngine { .. } => "OCR",
            Self::InvalidConfig(_) | Self::Pattern(_) => "setup",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_identify_input() {
        let err = ExtractError::decode("chart.png", "unsupported format");
        assert_eq!(
            err.to_string(),
            "image decode failed for chart.png: unsupported format"
        );
        assert_eq!(err.stage(), "image enhancement");

        let err = ExtractError::ocr("candidate 2 (edge-blend)", "exit status 1");
        assert!(err.to_string().contains("candidate 2 (edge-blend)"));
        assert_eq!(err.stage(), "OCR");
    }
}
