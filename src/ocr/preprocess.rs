//! Image enhancement for OCR.
//!
//! Every input goes through the same trunk: resize to a fixed width, convert
//! to grayscale, and apply CLAHE. The profile then decides which branches are
//! taken from the enhanced image. Each branch ends in an Otsu binarization and
//! yields one candidate for OCR.

use std::fmt;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{close, dilate};

use super::clahe::apply_clahe;
use crate::config::{PreprocessConfig, Profile};
use crate::error::ExtractError;

/// Optional steps applied to the enhanced image before binarization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Branch {
    /// Gaussian noise smoothing
    pub blur: bool,
    /// Morphological closing with the square structuring element
    pub close: bool,
    /// Canny edges, dilated and blended back into the image
    pub edge_blend: bool,
}

impl Branch {
    pub const MORPH: Branch = Branch { blur: false, close: true, edge_blend: false };
    pub const EDGE_BLEND: Branch = Branch { blur: false, close: false, edge_blend: true };
    pub const SMOOTHED_MORPH: Branch = Branch { blur: true, close: true, edge_blend: false };

    pub fn name(&self) -> &'static str {
        match (self.blur, self.close, self.edge_blend) {
            (false, false, false) => "plain",
            (false, true, false) => "morph",
            (false, false, true) => "edge-blend",
            (true, true, false) => "blur-morph",
            (true, false, false) => "blur",
            (true, false, true) => "blur-edge-blend",
            (false, true, true) => "morph-edge-blend",
            (true, true, true) => "blur-morph-edge-blend",
        }
    }
}

impl Profile {
    /// Branches taken for this profile, in candidate order.
    pub fn branches(self) -> &'static [Branch] {
        match self {
            Profile::SinglePass => &[Branch::EDGE_BLEND],
            Profile::MultiPass => &[Branch::MORPH, Branch::EDGE_BLEND],
            Profile::MorphOnly => &[Branch::SMOOTHED_MORPH],
        }
    }
}

/// One binarized image ready for OCR.
#[derive(Clone, Debug)]
pub struct Candidate {
    /// Position in the candidate set (0-based)
    pub index: usize,
    pub branch: Branch,
    pub image: GrayImage,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "candidate {} ({})", self.index + 1, self.branch.name())
    }
}

/// Turns a color image into the candidate set for its profile.
#[derive(Clone, Debug)]
pub struct ImageEnhancer {
    config: PreprocessConfig,
}

impl ImageEnhancer {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Decodes a JPEG/PNG file and enhances it.
    pub fn enhance_path(&self, path: &Path) -> Result<Vec<Candidate>, ExtractError> {
        let input = path.display().to_string();
        let img = image::open(path).map_err(|e| ExtractError::decode(&input, e))?;
        crate::log(&format!(
            "Loaded {} ({}x{})",
            input,
            img.width(),
            img.height()
        ));
        self.enhance_named(&img, &input)
    }

    /// Enhances an already decoded image.
    pub fn enhance(&self, img: &DynamicImage) -> Result<Vec<Candidate>, ExtractError> {
        self.enhance_named(img, "in-memory image")
    }

    fn enhance_named(&self, img: &DynamicImage, input: &str) -> Result<Vec<Candidate>, ExtractError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(ExtractError::decode(
                input,
                format!("image has zero dimension ({}x{})", img.width(), img.height()),
            ));
        }

        let cfg = &self.config;
        let resized = resize_to_width(img, cfg.width());
        let gray = resized.to_luma8();
        let [grid_x, grid_y] = cfg.clahe_tile_grid;
        let enhanced = apply_clahe(&gray, cfg.clahe_clip_limit, (grid_x, grid_y));

        crate::log(&format!(
            "Enhanced to {}x{} (profile {:?}, clip {}, grid {}x{})",
            enhanced.width(),
            enhanced.height(),
            cfg.profile,
            cfg.clahe_clip_limit,
            grid_x,
            grid_y
        ));

        let candidates = cfg
            .profile
            .branches()
            .iter()
            .enumerate()
            .map(|(index, &branch)| Candidate {
                index,
                branch,
                image: self.run_branch(&enhanced, branch),
            })
            .collect::<Vec<_>>();

        crate::log(&format!("Prepared {} candidate image(s)", candidates.len()));
        Ok(candidates)
    }

    fn run_branch(&self, enhanced: &GrayImage, branch: Branch) -> GrayImage {
        let cfg = &self.config;
        let radius = (cfg.kernel_size / 2).min(u8::MAX as u32) as u8;

        let mut current = enhanced.clone();
        if branch.blur {
            current = gaussian_blur_f32(&current, kernel_sigma(cfg.blur_kernel_size));
        }
        if branch.close && radius > 0 {
            current = close(&current, Norm::LInf, radius);
        }
        if branch.edge_blend {
            let edges = canny(&current, cfg.canny_low, cfg.canny_high);
            let edges = if radius > 0 {
                dilate(&edges, Norm::LInf, radius)
            } else {
                edges
            };
            current = blend(&current, &edges, cfg.edge_blend_weight);
        }

        let (binary, level) = binarize_otsu(&current);
        crate::log(&format!("Branch {}: Otsu threshold {}", branch.name(), level));
        binary
    }
}

/// Scales to `width`, keeping the aspect ratio (height truncated, at least 1).
pub fn resize_to_width(img: &DynamicImage, width: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    let height = ((width as f64 / w as f64) * h as f64) as u32;
    img.resize_exact(width, height.max(1), FilterType::Triangle)
}

/// Sigma a Gaussian kernel of side `size` implies when none is given explicitly.
fn kernel_sigma(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Weighted sum `(1 - weight) * base + weight * overlay`, saturated to u8.
pub fn blend(base: &GrayImage, overlay: &GrayImage, weight: f32) -> GrayImage {
    GrayImage::from_fn(base.width(), base.height(), |x, y| {
        let a = base.get_pixel(x, y)[0] as f32;
        let b = overlay.get_pixel(x, y)[0] as f32;
        let v = (1.0 - weight) * a + weight * b;
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Global Otsu binarization: pixels above the level become white, the rest black.
pub fn binarize_otsu(img: &GrayImage) -> (GrayImage, u8) {
    let level = otsu_level(img);
    let mut output = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] > level { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }
    (output, level)
}
