//! Configuration types for the extraction pipeline.
//!
//! Loaded from config.json (explicit path, next to the executable, or in the
//! user config directory). Missing fields fall back to defaults. The loaded
//! value is passed explicitly into the pipeline; there is no global instance.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExtractError;

/// Named preprocessing strategy. Each profile yields a fixed set of
/// candidate branches from the same enhanced grayscale image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Edge map blended into the enhanced image, then binarized.
    SinglePass,
    /// Two candidates: closing only, and edge blend.
    MultiPass,
    /// Blur and closing at a higher resolution.
    MorphOnly,
}

impl Profile {
    /// Resize width used when the config does not set one.
    pub fn default_width(self) -> u32 {
        match self {
            Profile::SinglePass | Profile::MultiPass => 1200,
            Profile::MorphOnly => 1600,
        }
    }

    pub fn default_mode(self) -> ParseMode {
        match self {
            Profile::SinglePass => ParseMode::Labeled,
            Profile::MultiPass | Profile::MorphOnly => ParseMode::DataOnly,
        }
    }

    pub fn default_aggregation(self) -> Aggregation {
        match self {
            Profile::MultiPass => Aggregation::Merged,
            Profile::SinglePass | Profile::MorphOnly => Aggregation::PerVariant,
        }
    }
}

/// How lines of OCR text are classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// First line is the title, then up to two label lines, then data rows.
    Labeled,
    /// Numeric rows only.
    DataOnly,
}

/// How per-variant records are combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// One record per unique OCR text.
    PerVariant,
    /// A single record with rows concatenated across unique texts.
    Merged,
}

/// Image enhancement parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub profile: Profile,
    /// Resize width; height scales proportionally. None = profile default.
    pub target_width: Option<u32>,
    /// CLAHE clip limit (relative to a uniform histogram)
    pub clahe_clip_limit: f32,
    /// CLAHE tiles as [columns, rows]
    pub clahe_tile_grid: [u32; 2],
    /// Square structuring element side for closing and dilation
    pub kernel_size: u32,
    /// Gaussian kernel side for the morph-only profile (odd)
    pub blur_kernel_size: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Weight of the dilated edge map in the blend; the enhanced image gets 1 - weight
    pub edge_blend_weight: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            profile: Profile::MultiPass,
            target_width: None,
            clahe_clip_limit: 3.0,
            clahe_tile_grid: [8, 8],
            kernel_size: 3,
            blur_kernel_size: 5,
            canny_low: 50.0,
            canny_high: 150.0,
            edge_blend_weight: 0.3,
        }
    }
}

impl PreprocessConfig {
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    pub fn width(&self) -> u32 {
        self.target_width
            .unwrap_or_else(|| self.profile.default_width())
    }
}

/// Tesseract invocation settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    /// Path to the tesseract executable. None = search PATH and common locations.
    pub executable: Option<PathBuf>,
    /// Directory holding *.traineddata. None = TESSDATA_PREFIX or Tesseract's default.
    pub tessdata_dir: Option<PathBuf>,
    pub language: String,
    /// --oem value (3 = default engine)
    pub engine_mode: u8,
    /// --psm value (11 = sparse text, no particular order)
    pub page_segmentation_mode: u8,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            executable: None,
            tessdata_dir: None,
            language: "eng".to_string(),
            engine_mode: 3,
            page_segmentation_mode: 11,
        }
    }
}

/// Complete extraction configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub preprocess: PreprocessConfig,
    pub tesseract: TesseractConfig,
    /// OCR texts more similar than this (exclusive) to an accepted text are dropped
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// None = profile default
    pub mode: Option<ParseMode>,
    /// None = profile default
    pub aggregation: Option<Aggregation>,
}

fn default_similarity_threshold() -> f64 {
    0.85
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            tesseract: TesseractConfig::default(),
            similarity_threshold: default_similarity_threshold(),
            mode: None,
            aggregation: None,
        }
    }
}

impl ExtractorConfig {
    pub fn parse_mode(&self) -> ParseMode {
        self.mode
            .unwrap_or_else(|| self.preprocess.profile.default_mode())
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
            .unwrap_or_else(|| self.preprocess.profile.default_aggregation())
    }

    /// Checks that every parameter is in a range the pipeline can use.
    pub fn validate(&self) -> Result<(), ExtractError> {
        let p = &self.preprocess;
        let invalid = |msg: String| Err(ExtractError::InvalidConfig(msg));

        if p.width() == 0 {
            return invalid("target_width must be positive".to_string());
        }
        if !(p.clahe_clip_limit > 0.0) {
            return invalid(format!(
                "clahe_clip_limit must be positive, got {}",
                p.clahe_clip_limit
            ));
        }
        if p.clahe_tile_grid.contains(&0) {
            return invalid(format!(
                "clahe_tile_grid must be at least 1x1, got {:?}",
                p.clahe_tile_grid
            ));
        }
        if p.kernel_size == 0 || p.kernel_size > 255 {
            return invalid(format!("kernel_size must be 1..=255, got {}", p.kernel_size));
        }
        if p.blur_kernel_size == 0 || p.blur_kernel_size % 2 == 0 {
            return invalid(format!(
                "blur_kernel_size must be odd, got {}",
                p.blur_kernel_size
            ));
        }
        if p.canny_low < 0.0 || p.canny_low > p.canny_high {
            return invalid(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {} / {}",
                p.canny_low, p.canny_high
            ));
        }
        if !(0.0..=1.0).contains(&p.edge_blend_weight) {
            return invalid(format!(
                "edge_blend_weight must be within [0, 1], got {}",
                p.edge_blend_weight
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return invalid(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            ));
        }
        if self.tesseract.language.trim().is_empty() {
            return invalid("tesseract language must not be empty".to_string());
        }
        Ok(())
    }

    /// Reads and parses a config file. Errors are returned, not swallowed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        crate::log(&format!("Config loaded from {}", path.display()));
        Ok(config)
    }
}

/// Loads configuration.
///
/// An explicit path must load successfully. Otherwise the first existing file
/// among the implicit locations is used; if it cannot be read or parsed, a
/// warning is logged and defaults are returned.
pub fn load_config(explicit: Option<&Path>) -> Result<ExtractorConfig> {
    if let Some(path) = explicit {
        return ExtractorConfig::from_file(path);
    }

    for candidate in crate::paths::config_search_paths() {
        if !candidate.exists() {
            continue;
        }
        return match ExtractorConfig::from_file(&candidate) {
            Ok(config) => Ok(config),
            Err(e) => {
                crate::log(&format!("{:#}. Using defaults.", e));
                Ok(ExtractorConfig::default())
            }
        };
    }

    crate::log("config.json not found. Using default config.");
    Ok(ExtractorConfig::default())
}
