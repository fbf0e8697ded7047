//! JSON export of extraction results and candidate images.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{Aggregation, ParseMode, Profile};
use crate::ocr::{Candidate, Extraction, GraphRecord, RawText};

/// What gets written for one input image.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub source: String,
    pub profile: Profile,
    pub mode: ParseMode,
    pub aggregation: Aggregation,
    pub unique_texts: &'a [RawText],
    pub records: &'a [GraphRecord],
}

impl<'a> Report<'a> {
    pub fn new(
        source: &Path,
        profile: Profile,
        mode: ParseMode,
        aggregation: Aggregation,
        extraction: &'a Extraction,
    ) -> Self {
        Self {
            source: source.display().to_string(),
            profile,
            mode,
            aggregation,
            unique_texts: &extraction.unique_texts,
            records: &extraction.records,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize extraction report to JSON")
    }
}

/// Export a report to a JSON file.
///
/// The output is pretty-printed for human readability.
pub fn export_to_json(report: &Report<'_>, output_path: &Path) -> Result<()> {
    let json = report.to_json()?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}

/// Writes each candidate as `candidate_<n>_<branch>.png` into `dir`.
pub fn save_candidates(candidates: &[Candidate], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .context(format!("Failed to create directory: {}", dir.display()))?;

    candidates
        .iter()
        .map(|candidate| {
            let path = dir.join(format!(
                "candidate_{}_{}.png",
                candidate.index + 1,
                candidate.branch.name()
            ));
            candidate
                .image
                .save(&path)
                .context(format!("Failed to save candidate image: {}", path.display()))?;
            Ok(path)
        })
        .collect()
}
