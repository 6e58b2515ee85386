//! Command-line arguments of the `oar-zones` binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use oar_zones::domain::DocumentCategory;
use std::path::PathBuf;

/// Detects and classifies the zones of scanned documents.
#[derive(Parser)]
#[command(name = "oar-zones", version)]
#[command(about = "Semantic zone detection for scanned document images")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Detect, classify and export the zones of one image.
    Detect(DetectArgs),
    /// Print the preset profile of a document category as JSON.
    Profile {
        /// Document category (default, invoice, form, newspaper, handwritten, table, photo).
        #[arg(default_value = "default")]
        category: DocumentCategory,
    },
}

#[derive(Args)]
pub struct DetectArgs {
    /// Image file to process.
    #[arg(long, short)]
    pub file: PathBuf,

    /// Preset profile to use. French names such as `facture` are accepted.
    #[arg(long, default_value = "default")]
    pub profile: DocumentCategory,

    /// JSON profile file. Takes precedence over `--profile`.
    #[arg(long)]
    pub profile_file: Option<PathBuf>,

    /// Tesseract language models, `+`-separated.
    #[arg(long, env = "OAR_ZONES_LANG", default_value = "fra+eng")]
    pub lang: String,

    /// Path to the tesseract executable.
    #[arg(long, env = "OAR_ZONES_TESSERACT", default_value = "tesseract")]
    pub tesseract: PathBuf,

    /// Maximum number of recognition threads.
    #[arg(long)]
    pub threads: Option<usize>,

    /// Directory receiving zone crops, the annotated overview and metadata.
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// How to print the result.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Skip writing files.
    #[arg(long)]
    pub no_export: bool,

    /// Font used for overview labels. Falls back to a system font.
    #[arg(long)]
    pub font: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_arguments() {
        let cli = Cli::try_parse_from([
            "oar-zones",
            "detect",
            "--file",
            "scan.png",
            "--profile",
            "facture",
            "--format",
            "json",
            "--no-export",
        ])
        .unwrap();

        let Command::Detect(args) = cli.command else {
            panic!("expected the detect command");
        };
        assert_eq!(args.file, PathBuf::from("scan.png"));
        assert_eq!(args.profile, DocumentCategory::Invoice);
        assert!(matches!(args.format, OutputFormat::Json));
        assert!(args.no_export);
        assert_eq!(args.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_unknown_profile_is_rejected() {
        let parsed = Cli::try_parse_from(["oar-zones", "detect", "-f", "a.png", "--profile", "x"]);
        assert!(parsed.is_err());
    }
}
