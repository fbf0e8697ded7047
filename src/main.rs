//! Chart OCR command-line tool
//!
//! Reads a chart image, runs the preprocessing/OCR/reconstruction pipeline
//! and prints the recovered records as JSON.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use chart_ocr::config::{load_config, Aggregation, ParseMode, Profile};
use chart_ocr::export::{export_to_json, save_candidates, Report};
use chart_ocr::{log, paths, ChartExtractor, ExtractError, TesseractCli};

#[derive(Parser, Debug)]
#[command(name = "chart-ocr", version, about = "Recover numeric data from a chart image")]
struct Cli {
    /// Chart image (JPEG or PNG)
    image: PathBuf,

    /// Config file (defaults to config.json next to the executable)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preprocessing profile
    #[arg(short, long, value_enum)]
    profile: Option<Profile>,

    /// Line classification mode
    #[arg(short, long, value_enum)]
    mode: Option<ParseMode>,

    /// Return one record per distinct OCR text, or a single merged record
    #[arg(short, long, value_enum)]
    aggregation: Option<Aggregation>,

    /// Resize width before enhancement
    #[arg(short, long)]
    width: Option<u32>,

    /// Similarity above which OCR texts count as duplicates
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Path to the tesseract executable
    #[arg(long)]
    tesseract: Option<PathBuf>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save the binarized candidate images into this directory
    #[arg(long)]
    save_candidates: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let cli = Cli::parse();

    if let Err(e) = paths::ensure_directories() {
        log(&format!("Warning: could not create log directory: {}", e));
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(profile) = cli.profile {
        config.preprocess.profile = profile;
    }
    if let Some(width) = cli.width {
        config.preprocess.target_width = Some(width);
    }
    if let Some(threshold) = cli.threshold {
        config.similarity_threshold = threshold;
    }
    if cli.mode.is_some() {
        config.mode = cli.mode;
    }
    if cli.aggregation.is_some() {
        config.aggregation = cli.aggregation;
    }
    if cli.tesseract.is_some() {
        config.tesseract.executable = cli.tesseract.clone();
    }

    let recognizer = TesseractCli::from_config(&config.tesseract).map_err(with_stage)?;
    let extractor = ChartExtractor::new(&config, recognizer).map_err(with_stage)?;

    let candidates = extractor
        .enhancer()
        .enhance_path(&cli.image)
        .map_err(with_stage)?;

    if let Some(dir) = &cli.save_candidates {
        let saved = save_candidates(&candidates, dir)?;
        log(&format!("Saved {} candidate image(s) to {}", saved.len(), dir.display()));
    }

    let extraction = extractor
        .process_candidates(&candidates)
        .map_err(with_stage)?;

    for (idx, raw) in extraction.unique_texts.iter().enumerate() {
        log(&format!("Method {}:\n{}", idx + 1, raw.text.trim_end()));
    }

    let report = Report::new(
        &cli.image,
        config.preprocess.profile,
        config.parse_mode(),
        config.aggregation(),
        &extraction,
    );

    match &cli.output {
        Some(path) => {
            export_to_json(&report, path)?;
            log(&format!("Report saved: {}", path.display()));
        }
        None => println!("{}", report.to_json()?),
    }

    Ok(())
}

/// Prefixes a pipeline error with the stage that raised it.
fn with_stage(e: ExtractError) -> anyhow::Error {
    let stage = e.stage();
    anyhow::Error::new(e).context(format!("{} failed", stage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::try_parse_from([
            "chart-ocr",
            "chart.png",
            "--profile",
            "morph-only",
            "--mode",
            "labeled",
            "--threshold",
            "0.9",
            "--save-candidates",
            "out",
        ])
        .unwrap();

        assert_eq!(cli.image, PathBuf::from("chart.png"));
        assert_eq!(cli.profile, Some(Profile::MorphOnly));
        assert_eq!(cli.mode, Some(ParseMode::Labeled));
        assert_eq!(cli.threshold, Some(0.9));
        assert_eq!(cli.save_candidates, Some(PathBuf::from("out")));
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_cli_requires_image() {
        assert!(Cli::try_parse_from(["chart-ocr"]).is_err());
    }

    #[test]
    fn test_with_stage_names_stage() {
        let err = with_stage(ExtractError::ocr("candidate 1 (morph)", "exit status 1"));
        let text = format!("{:#}", err);
        assert!(text.starts_with("OCR failed"));
        assert!(text.contains("candidate 1 (morph)"));
    }
}
