pub mod clahe;
pub mod dedup;
pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use dedup::{remove_duplicates, similarity, RawText};
pub use engine::{TesseractCli, TextRecognizer};
pub use extract::{GraphRecord, Number, StructureParser};
pub use preprocess::{Branch, Candidate, ImageEnhancer};

use std::path::Path;

use image::DynamicImage;
use serde::Serialize;

use crate::config::{Aggregation, ExtractorConfig};
use crate::error::ExtractError;

/// Everything one extraction produced, kept for reporting.
#[derive(Clone, Debug, Serialize)]
pub struct Extraction {
    /// OCR output per candidate, in candidate order
    pub raw_texts: Vec<RawText>,
    /// Distinct OCR outputs, first occurrence first
    pub unique_texts: Vec<RawText>,
    /// One record per unique text, or a single merged record
    pub records: Vec<GraphRecord>,
}

/// The full pipeline: enhance, OCR every candidate, deduplicate, parse.
pub struct ChartExtractor<R: TextRecognizer> {
    enhancer: ImageEnhancer,
    recognizer: R,
    parser: StructureParser,
    similarity_threshold: f64,
    aggregation: Aggregation,
}

impl<R: TextRecognizer> ChartExtractor<R> {
    pub fn new(config: &ExtractorConfig, recognizer: R) -> Result<Self, ExtractError> {
        config.validate()?;
        Ok(Self {
            enhancer: ImageEnhancer::new(config.preprocess.clone()),
            recognizer,
            parser: StructureParser::new(config.parse_mode())?,
            similarity_threshold: config.similarity_threshold,
            aggregation: config.aggregation(),
        })
    }

    pub fn enhancer(&self) -> &ImageEnhancer {
        &self.enhancer
    }

    pub fn parser(&self) -> &StructureParser {
        &self.parser
    }

    /// Decodes `path` and runs the whole pipeline on it.
    pub fn extract_path(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let candidates = self.enhancer.enhance_path(path)?;
        self.process_candidates(&candidates)
    }

    pub fn extract_image(&self, img: &DynamicImage) -> Result<Extraction, ExtractError> {
        let candidates = self.enhancer.enhance(img)?;
        self.process_candidates(&candidates)
    }

    /// OCR, deduplication and parsing for an already enhanced candidate set.
    ///
    /// Candidates are recognized in order; the first OCR failure aborts.
    pub fn process_candidates(&self, candidates: &[Candidate]) -> Result<Extraction, ExtractError> {
        let raw_texts = candidates
            .iter()
            .map(|candidate| {
                self.recognizer
                    .extract_text(candidate)
                    .map(|text| RawText {
                        candidate: candidate.index,
                        text,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let unique_texts = remove_duplicates(&raw_texts, self.similarity_threshold);
        let per_variant = unique_texts.iter().map(|raw| self.parser.parse(&raw.text));

        let records = match self.aggregation {
            Aggregation::PerVariant => per_variant.collect(),
            Aggregation::Merged => vec![GraphRecord::merge(per_variant)],
        };

        crate::log(&format!(
            "Extraction done: {} candidate(s), {} unique text(s), {} row(s)",
            candidates.len(),
            unique_texts.len(),
            records.iter().map(|r| r.rows.len()).sum::<usize>()
        ));

        Ok(Extraction {
            raw_texts,
            unique_texts,
            records,
        })
    }
}
