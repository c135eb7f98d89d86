//! CLI argument parsing for pdfworks.
//!
//! One subcommand per transform, plus `info`. Output and limit flags are
//! global and can also come from `PDFWORKS_*` environment variables.
//!
//! # Examples
//!
//! ```no_run
//! use pdfworks::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! let output = cli.output_config().expect("Invalid configuration");
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{
    EngineConfig, ExportQuality, FitPolicy, ImageFormat, OutputConfig, OverwriteMode,
    PageSizePolicy, RasterQuality, RotationDelta, TextFormat, TextOptions,
};
use crate::error::Result;

/// Split, merge, rotate, compress and convert PDF documents.
#[derive(Parser, Debug)]
#[command(name = "pdfworks")]
#[command(version)]
#[command(about = "Split, merge, rotate, compress and convert PDF documents", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,

    /// Output and limit settings.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Output file path
    ///
    /// Defaults to the suggested name (e.g. report_pages_2-4.pdf) in the
    /// output directory.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for outputs written under their suggested names
    #[arg(long, global = true, value_name = "DIR", env = "PDFWORKS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Overwrite an existing output file without asking
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Never overwrite an existing output file
    #[arg(long, global = true, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show detailed information
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the result summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Number of files loaded concurrently
    ///
    /// Default is the number of CPU cores.
    #[arg(short, long, global = true, value_name = "N", env = "PDFWORKS_JOBS")]
    pub jobs: Option<usize>,

    /// Maximum input size in bytes
    #[arg(
        long,
        global = true,
        value_name = "BYTES",
        env = "PDFWORKS_MAX_INPUT_SIZE"
    )]
    pub max_input_size: Option<u64>,
}

/// Available operations.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Copy a page range into a new document
    Split {
        /// Input PDF
        input: PathBuf,
        /// First page (1-based)
        #[arg(long)]
        from: u32,
        /// Last page (inclusive)
        #[arg(long)]
        to: u32,
    },

    /// Concatenate documents in the order given
    ///
    /// Examples:
    ///   pdfworks merge a.pdf b.pdf -o both.pdf
    ///   pdfworks merge "chapter*.pdf"
    Merge {
        /// Input PDFs or glob patterns
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },

    /// Remove pages
    Delete {
        /// Input PDF
        input: PathBuf,
        /// Pages to remove, e.g. "2,4-6"
        #[arg(short, long, value_name = "RANGE")]
        pages: String,
    },

    /// Copy selected pages, in document order, into a new document
    Extract {
        /// Input PDF
        input: PathBuf,
        /// Pages to keep, e.g. "1-3,7"
        #[arg(short, long, value_name = "RANGE")]
        pages: String,
    },

    /// Rotate pages
    Rotate {
        /// Input PDF
        input: PathBuf,
        /// -90, 90, 180, left, right or half
        #[arg(short, long, allow_hyphen_values = true)]
        angle: RotationDelta,
        /// Pages to rotate (default: all)
        #[arg(short, long, value_name = "RANGE")]
        pages: Option<String>,
    },

    /// Rasterize every page to JPEG to shrink the file
    ///
    /// Text becomes unselectable.
    Compress {
        /// Input PDF
        input: PathBuf,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        quality: RasterQuality,
    },

    /// Build a document with one page per image
    ImagesToPdf {
        /// Input images or glob patterns, in page order
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
        /// fit, a4, letter or a3
        #[arg(long, default_value = "fit")]
        page_size: PageSizePolicy,
        /// contain, cover or stretch
        #[arg(long, default_value = "contain")]
        fit: FitPolicy,
    },

    /// Export pages as PNG or JPEG images
    ToImages {
        /// Input PDF
        input: PathBuf,
        /// png or jpeg
        #[arg(long, default_value = "png")]
        format: ImageFormat,
        /// standard (72 DPI), high (150 DPI) or maximum (300 DPI)
        #[arg(long, default_value = "high")]
        quality: ExportQuality,
        /// Pages to export (default: all)
        #[arg(short, long, value_name = "RANGE")]
        pages: Option<String>,
    },

    /// Extract text as plain text or a Word document
    ToText {
        /// Input PDF
        input: PathBuf,
        /// txt or docx
        #[arg(long, default_value = "txt")]
        format: TextFormat,
        /// Join each page into a single line
        #[arg(long)]
        no_line_breaks: bool,
        /// Omit the "--- Page N ---" markers
        #[arg(long)]
        no_page_numbers: bool,
    },

    /// Show page counts, versions and sizes
    Info {
        /// Input PDFs or glob patterns
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },
}

impl Command {
    /// Subcommand name, for progress labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Split { .. } => "split",
            Self::Merge { .. } => "merge",
            Self::Delete { .. } => "delete",
            Self::Extract { .. } => "extract",
            Self::Rotate { .. } => "rotate",
            Self::Compress { .. } => "compress",
            Self::ImagesToPdf { .. } => "images-to-pdf",
            Self::ToImages { .. } => "to-images",
            Self::ToText { .. } => "to-text",
            Self::Info { .. } => "info",
        }
    }

    /// Whether the command needs page rendering.
    pub fn needs_rasterizer(&self) -> bool {
        matches!(self, Self::Compress { .. } | Self::ToImages { .. })
    }
}

impl Cli {
    /// Output settings from the global flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are inconsistent.
    pub fn output_config(&self) -> Result<OutputConfig> {
        let global = &self.global;
        let overwrite_mode = if global.force {
            OverwriteMode::Force
        } else if global.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        let config = OutputConfig {
            output: global.output.clone(),
            output_dir: global.output_dir.clone(),
            overwrite_mode,
            quiet: global.quiet,
            verbose: global.verbose,
            json: global.json,
            jobs: global.jobs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Engine limits from the global flags.
    ///
    /// # Errors
    ///
    /// Returns an error if a limit is invalid.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::default();
        if let Some(max_input_size) = self.global.max_input_size {
            config.max_input_size = max_input_size;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Text options from `to-text` flags.
pub fn text_options(format: TextFormat, no_line_breaks: bool, no_page_numbers: bool) -> TextOptions {
    TextOptions {
        format,
        preserve_line_breaks: !no_line_breaks,
        include_page_numbers: !no_page_numbers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pdfworks").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_split_args() {
        let cli = parse(&["split", "report.pdf", "--from", "2", "--to", "4", "-o", "out.pdf"]);
        match cli.command {
            Command::Split { input, from, to } => {
                assert_eq!(input, PathBuf::from("report.pdf"));
                assert_eq!((from, to), (2, 4));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.global.output, Some(PathBuf::from("out.pdf")));
    }

    #[rstest]
    #[case("-90", RotationDelta::CounterClockwise90)]
    #[case("90", RotationDelta::Clockwise90)]
    #[case("half", RotationDelta::Half)]
    fn test_rotate_angles(#[case] angle: &str, #[case] expected: RotationDelta) {
        let cli = parse(&["rotate", "a.pdf", "--angle", angle]);
        assert!(matches!(cli.command, Command::Rotate { angle, .. } if angle == expected));
    }

    #[test]
    fn test_invalid_angle() {
        assert!(Cli::try_parse_from(["pdfworks", "rotate", "a.pdf", "--angle", "45"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["images-to-pdf", "a.png", "b.jpg"]);
        match cli.command {
            Command::ImagesToPdf {
                inputs,
                page_size,
                fit,
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(page_size, PageSizePolicy::Fit);
                assert_eq!(fit, FitPolicy::Contain);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = parse(&["to-images", "a.pdf"]);
        assert!(matches!(
            cli.command,
            Command::ToImages {
                format: ImageFormat::Png,
                quality: ExportQuality::High,
                pages: None,
                ..
            }
        ));
        assert!(cli.command.needs_rasterizer());
    }

    #[test]
    fn test_overwrite_modes() {
        let cli = parse(&["compress", "a.pdf"]);
        assert_eq!(cli.output_config().unwrap().overwrite_mode, OverwriteMode::Prompt);

        let cli = parse(&["compress", "a.pdf", "--force"]);
        assert_eq!(cli.output_config().unwrap().overwrite_mode, OverwriteMode::Force);

        let cli = parse(&["compress", "a.pdf", "--no-clobber"]);
        assert_eq!(
            cli.output_config().unwrap().overwrite_mode,
            OverwriteMode::NoClobber
        );

        assert!(Cli::try_parse_from(["pdfworks", "compress", "a.pdf", "-f", "--no-clobber"]).is_err());
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let cli = parse(&["merge", "a.pdf", "b.pdf", "--jobs", "0"]);
        assert!(cli.output_config().is_err());
    }

    #[test]
    fn test_engine_limits() {
        let cli = parse(&["info", "a.pdf", "--max-input-size", "1024"]);
        assert_eq!(cli.engine_config().unwrap().max_input_size, 1024);

        let cli = parse(&["info", "a.pdf", "--max-input-size", "0"]);
        assert!(cli.engine_config().is_err());
    }

    #[test]
    fn test_text_options() {
        let options = text_options(TextFormat::Docx, true, false);
        assert_eq!(options.format, TextFormat::Docx);
        assert!(!options.preserve_line_breaks);
        assert!(options.include_page_numbers);
    }
}
