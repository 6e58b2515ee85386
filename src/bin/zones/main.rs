//! `oar-zones`: zone detection from the command line.
//!
//! # Usage
//!
//! ```bash
//! oar-zones detect --file invoice.png --profile facture --output-dir out/
//! oar-zones detect --file scan.jpg --profile-file my_profile.json --format json --no-export
//! oar-zones profile invoice > invoice.json
//! ```
//!
//! Set `RUST_LOG=debug` to see per-stage metrics.

mod cli;

use clap::Parser;
use cli::{Cli, Command, DetectArgs, OutputFormat};
use oar_zones::core::ConfigValidator;
use oar_zones::domain::{DocumentCategory, DocumentTypeProfile, TesseractRecognizer};
use oar_zones::pipeline::{DetectionResult, ZoneDetector};
use oar_zones::utils::{init_tracing, load_image};
use tracing::{error, info, warn};

const PREVIEW_CHARS: usize = 60;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Detect(args) => run_detect(args),
        Command::Profile { category } => {
            let profile = DocumentTypeProfile::for_category(category);
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
    }
}

fn load_profile(args: &DetectArgs) -> Result<DocumentTypeProfile, Box<dyn std::error::Error>> {
    let mut profile = match &args.profile_file {
        Some(path) => {
            info!("Loading profile from {}", path.display());
            DocumentTypeProfile::from_json_file(path)?
        }
        None => DocumentTypeProfile::for_category(args.profile),
    };

    if let Some(threads) = args.threads {
        profile.parallel = profile.parallel.with_max_threads(Some(threads));
        profile.validate()?;
    }
    Ok(profile)
}

fn run_detect(args: DetectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let profile = load_profile(&args).inspect_err(|e| error!("Invalid profile: {}", e))?;
    let document_type = profile.category;
    let detector = ZoneDetector::new(profile)?;

    let recognizer = TesseractRecognizer::new()
        .with_binary(&args.tesseract)
        .with_languages(&args.lang);

    let image = load_image(&args.file)
        .inspect_err(|e| error!("Cannot load {}: {}", args.file.display(), e))?;
    info!(
        "Processing {} ({}x{}) with the {} profile",
        args.file.display(),
        image.width(),
        image.height(),
        document_type
    );

    let result = detector.detect(&image, &recognizer);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Pretty => print_summary(&result),
    }

    if !args.no_export {
        report_export(export(&args, &image, &result, document_type));
    }

    info!("{}", detector.stats());
    Ok(())
}

/// Export problems are logged; the detection result was already printed.
fn report_export(outcome: Result<(), Box<dyn std::error::Error>>) -> bool {
    match outcome {
        Ok(()) => true,
        Err(e) => {
            warn!("Export failed: {}", e);
            false
        }
    }
}

#[cfg(feature = "visualization")]
fn export(
    args: &DetectArgs,
    image: &image::RgbImage,
    result: &DetectionResult,
    document_type: DocumentCategory,
) -> Result<(), Box<dyn std::error::Error>> {
    use oar_zones::utils::visualization::{VisualizationConfig, export_zones};

    let config = match &args.font {
        Some(path) => VisualizationConfig::with_font_path(path)
            .inspect_err(|e| error!("Cannot load font {}: {}", path.display(), e))
            .unwrap_or_else(|_| VisualizationConfig::with_system_font()),
        None => VisualizationConfig::with_system_font(),
    };
    let basename = args
        .file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let files = export_zones(
        image,
        result,
        document_type.as_str(),
        &basename,
        &args.output_dir,
        &config,
    )?;
    info!("Metadata written to {}", files.metadata.display());
    Ok(())
}

#[cfg(not(feature = "visualization"))]
fn export(
    _args: &DetectArgs,
    _image: &image::RgbImage,
    _result: &DetectionResult,
    _document_type: DocumentCategory,
) -> Result<(), Box<dyn std::error::Error>> {
    warn!("Built without the `visualization` feature, nothing exported");
    Ok(())
}

fn print_summary(result: &DetectionResult) {
    if !result.success {
        println!(
            "Detection failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
        return;
    }

    let suffix = if result.recovered { " (recovered)" } else { "" };
    println!("{} zones{}", result.zone_count(), suffix);
    for zone in &result.zones {
        let preview: String = zone.content.chars().take(PREVIEW_CHARS).collect();
        println!(
            "{:>3}  #{:<3} {:<10} {:.2}  {:>4},{:<4} {:>4}x{:<4}  {}",
            zone.reading_order,
            zone.zone_id,
            zone.zone_type,
            zone.confidence,
            zone.bbox.x,
            zone.bbox.y,
            zone.bbox.width,
            zone.bbox.height,
            preview.replace('\n', " ")
        );
    }
    for (zone_type, count) in &result.zone_type_counts {
        println!("  {}: {}", zone_type, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_failure_is_not_fatal() {
        let failed: Result<(), Box<dyn std::error::Error>> =
            Err(std::io::Error::other("disk full").into());
        assert!(!report_export(failed));
        assert!(report_export(Ok(())));
    }
}
