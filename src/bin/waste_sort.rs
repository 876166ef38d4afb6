//! waste-sort - classify photos of waste items and report recyclability
//!
//! For every image argument:
//! 1. Decodes the file
//! 2. Runs the configured prediction backend
//! 3. Maps the top label to a recyclability category
//! 4. Prints the prediction and category (text or JSON lines)

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use waste_sort::{
    CategoryRules, ClassificationCategorizer, ClassificationResult, ClassifyError, DecodedImage,
    WasteSortConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file (overrides WASTE_SORT_CONFIG).
    #[arg(long, env = "WASTE_SORT_CONFIG")]
    config: Option<PathBuf>,
    /// Backend to use instead of the configured default.
    #[arg(long)]
    backend: Option<String>,
    /// Print one JSON object per image.
    #[arg(long)]
    json: bool,
    /// Images to classify (JPEG or PNG).
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = WasteSortConfig::load_from(args.config.as_deref())?;
    let registry = cfg.backend.build_registry()?;
    let backend = registry.select(args.backend.as_deref())?;
    backend.warm_up()?;

    log::info!("waste-sort starting");
    log::info!("  Backend: {} (available: {})", backend.name(), registry.list().join(", "));

    let categorizer = ClassificationCategorizer::new(backend, cfg.rules);
    if categorizer.rules().is_empty() {
        log::warn!("  Rules: none configured, every image will be reported as Unknown");
    } else {
        log::info!("  Rules: {}", categorizer.rules().len());
        for line in rule_lines(categorizer.rules()) {
            log::info!("    {}", line);
        }
    }

    let mut failures = 0usize;
    for path in &args.images {
        let outcome = DecodedImage::open(path).and_then(|image| categorizer.classify(&image));
        match outcome {
            Ok(result) => {
                if args.json {
                    println!("{}", json_line(path, &result)?);
                } else {
                    println!("{}", path.display());
                    println!("  {}", prediction_line(&result));
                    println!("  {}", recyclability_line(&result));
                }
            }
            Err(err) => {
                failures += 1;
                report_failure(path, err);
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!(
            "{} of {} images could not be classified",
            failures,
            args.images.len()
        ));
    }
    Ok(())
}

fn prediction_line(result: &ClassificationResult) -> String {
    match result.prediction() {
        Some(prediction) => format!(
            "Prediction: {} with confidence {}%",
            prediction.label,
            (prediction.confidence * 100.0) as u32
        ),
        None => "Unable to classify image.".to_string(),
    }
}

fn recyclability_line(result: &ClassificationResult) -> String {
    format!("Recyclability: {}", result.category())
}

fn json_line(path: &std::path::Path, result: &ClassificationResult) -> Result<String> {
    let value = serde_json::json!({
        "image": path.display().to_string(),
        "category": result.category(),
        "label": result.label(),
        "confidence": result.confidence(),
    });
    Ok(serde_json::to_string(&value)?)
}

/// `label -> category` entries, sorted by label.
fn rule_lines(rules: &CategoryRules) -> Vec<String> {
    let mut lines: Vec<String> = rules
        .iter()
        .map(|(label, category)| format!("{} -> {}", label, category.as_str()))
        .collect();
    lines.sort();
    lines
}

fn report_failure(path: &std::path::Path, err: ClassifyError) {
    let invalid_image = err.is_invalid_image();
    let message = failure_message(err);
    if invalid_image {
        log::warn!("{}: error processing image: {}", path.display(), message);
    } else {
        log::error!("{}: error during classification: {}", path.display(), message);
    }
    eprintln!("{}: {}", path.display(), message);
}

/// Error text including the backend's own chain.
fn failure_message(err: ClassifyError) -> String {
    format!("{:#}", anyhow::Error::from(err))
}
