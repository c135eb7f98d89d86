//! # pdfworks
//!
//! Page-set transformations on PDF documents: split, merge, delete,
//! extract, rotate, rasterize-compress, and conversions between PDF,
//! images, HTML and text.
//!
//! The [`engine`] works on in-memory bytes behind injected document
//! capabilities ([`backend`]). The remaining modules wrap it in a
//! command-line tool: loading files, writing results, and reporting
//! progress.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfworks::backend::LopdfReader;
//! use pdfworks::document::DocumentHandle;
//! use pdfworks::engine::{Operation, TransformEngine};
//! use pdfworks::selection::PageSelection;
//!
//! # async fn example(bytes: Vec<u8>) -> pdfworks::Result<()> {
//! let engine = TransformEngine::default();
//! let document = DocumentHandle::open(&LopdfReader::new(), bytes, "slides.pdf")?;
//! let selection = PageSelection::from_ranges("2,4", document.page_count())?;
//!
//! let progress = |percent: u8| println!("{percent}%");
//! let result = engine
//!     .execute(Operation::Delete { document: &document, selection: &selection }, &progress)
//!     .await?;
//! assert_eq!(result.suggested_file_name, "slides_edited.pdf");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod io;
pub mod output;
pub mod progress;
pub mod selection;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use error::{PdfWorksError, Result};

use std::io::Write;
use std::path::Path;

use crate::backend::{LopdfReader, LopdfWriter};
use crate::cli::{Cli, Command, text_options};
use crate::config::{OutputConfig, OverwriteMode, RasterQuality};
use crate::document::DocumentHandle;
use crate::engine::{Operation, PageScope, TransformEngine, TransformResult};
use crate::io::{InputLoader, OutputWriter};
use crate::output::{
    ConsoleProgress, OutputFormatter, display_load_statistics, display_result,
    display_validation_summary,
};
use crate::progress::{NoProgress, ProgressReporter};
use crate::selection::PageSelection;
use crate::utils::collect_paths_for_patterns;
use crate::validation::{InputKind, ValidationSummary, Validator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Reader for the command; attaches a rasterizer when one is available.
fn reader_for(command: &Command) -> LopdfReader {
    if !command.needs_rasterizer() {
        return LopdfReader::new();
    }

    #[cfg(feature = "pdfium")]
    {
        match backend::PdfiumRasterizer::new() {
            Ok(rasterizer) => return LopdfReader::with_rasterizer(std::sync::Arc::new(rasterizer)),
            Err(e) => tracing::warn!("{e}"),
        }
    }

    LopdfReader::new()
}

/// Run a parsed command line.
///
/// # Errors
///
/// Returns the first error from loading, transforming or writing.
pub async fn run(cli: Cli) -> Result<()> {
    let output = cli.output_config()?;
    let engine_config = cli.engine_config()?;
    let validator = Validator::from_config(&engine_config);
    let loader = InputLoader::new(validator.clone());
    let formatter = OutputFormatter::from_config(&output);

    let engine = TransformEngine::with_backends(
        reader_for(&cli.command),
        LopdfWriter::new(),
        engine_config,
    );

    if let Command::Info { inputs } = &cli.command {
        return info(&engine, &loader, &validator, inputs, &output, &formatter).await;
    }

    let progress = ConsoleProgress::new();
    let reporter: &dyn ProgressReporter = if formatter.should_print() {
        progress.set_message(cli.command.name());
        &progress
    } else {
        &NoProgress
    };

    let result = transform(&cli.command, &engine, &loader, &output, &formatter, reporter).await?;
    let TransformResult {
        bytes,
        suggested_file_name,
        media_type,
        summary,
    } = result;

    let path = output.resolve_output(&suggested_file_name);
    confirm_overwrite(&path, &output, &formatter)?;
    validator.validate_output(&output, &path).await?;
    let stats = OutputWriter::new().write(bytes, &path).await?;

    if output.json {
        let report = serde_json::json!({
            "output": stats.output_path,
            "mediaType": media_type,
            "summary": summary,
        });
        println!("{report:#}");
    } else {
        display_result(&formatter, &summary, &stats);
    }

    Ok(())
}

async fn transform(
    command: &Command,
    engine: &TransformEngine,
    loader: &InputLoader,
    output: &OutputConfig,
    formatter: &OutputFormatter,
    progress: &dyn ProgressReporter,
) -> Result<TransformResult> {
    let reader = engine.reader();

    match command {
        Command::Split { input, from, to } => {
            let document = loader.load_document(reader, input).await?;
            let operation = Operation::Split {
                document: &document,
                from: *from,
                to: *to,
            };
            engine.execute(operation, progress).await
        }
        Command::Merge { inputs } => {
            let paths = collect_paths_for_patterns(inputs)?;
            let (results, stats) = loader
                .load_documents(reader, &paths, output.effective_jobs())
                .await;
            display_load_statistics(formatter, &stats);
            let documents = results.into_iter().collect::<Result<Vec<DocumentHandle>>>()?;

            engine
                .execute(Operation::Merge { documents: &documents }, progress)
                .await
        }
        Command::Delete { input, pages } => {
            let document = loader.load_document(reader, input).await?;
            let selection = PageSelection::from_ranges(pages, document.page_count())?;
            let operation = Operation::Delete {
                document: &document,
                selection: &selection,
            };
            engine.execute(operation, progress).await
        }
        Command::Extract { input, pages } => {
            let document = loader.load_document(reader, input).await?;
            let selection = PageSelection::from_ranges(pages, document.page_count())?;
            let operation = Operation::Extract {
                document: &document,
                selection: &selection,
            };
            engine.execute(operation, progress).await
        }
        Command::Rotate {
            input,
            angle,
            pages,
        } => {
            let document = loader.load_document(reader, input).await?;
            let selection = match pages {
                Some(pages) => PageSelection::from_ranges(pages, document.page_count())?,
                None => PageSelection::new(document.page_count()),
            };
            let operation = Operation::Rotate {
                document: &document,
                delta: *angle,
                selection: &selection,
            };
            engine.execute(operation, progress).await
        }
        Command::Compress { input, quality } => {
            let document = loader.load_document(reader, input).await?;
            formatter.info(&compression_notice(*quality));
            let operation = Operation::Compress {
                document: &document,
                quality: *quality,
            };
            engine.execute(operation, progress).await
        }
        Command::ImagesToPdf {
            inputs,
            page_size,
            fit,
        } => {
            let paths = collect_paths_for_patterns(inputs)?;
            let images = loader.load_images(&paths, output.effective_jobs()).await?;
            let operation = Operation::ImagesToPdf {
                images: &images,
                page_size: *page_size,
                fit: *fit,
            };
            engine.execute(operation, progress).await
        }
        Command::ToImages {
            input,
            format,
            quality,
            pages,
        } => {
            let document = loader.load_document(reader, input).await?;
            let scope = match pages {
                Some(pages) => PageScope::Selection(PageSelection::from_ranges(
                    pages,
                    document.page_count(),
                )?),
                None => PageScope::All,
            };
            let operation = Operation::PdfToImages {
                document: &document,
                scope: &scope,
                format: *format,
                quality: *quality,
            };
            engine.execute(operation, progress).await
        }
        Command::ToText {
            input,
            format,
            no_line_breaks,
            no_page_numbers,
        } => {
            let document = loader.load_document(reader, input).await?;
            let operation = Operation::PdfToText {
                document: &document,
                options: text_options(*format, *no_line_breaks, *no_page_numbers),
            };
            engine.execute(operation, progress).await
        }
        Command::Info { .. } => Err(PdfWorksError::invalid_config(
            "info does not produce an output document",
        )),
    }
}

fn compression_notice(quality: RasterQuality) -> String {
    format!(
        "Compressing at {} quality (estimated reduction ~{}%)",
        format!("{quality:?}").to_lowercase(),
        quality.estimated_reduction()
    )
}

async fn info(
    engine: &TransformEngine,
    loader: &InputLoader,
    validator: &Validator,
    inputs: &[String],
    output: &OutputConfig,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut results = Vec::new();
    for path in collect_paths_for_patterns(inputs)? {
        let input = loader.read(&path, InputKind::Pdf).await?;
        results.push(validator.inspect(engine.reader(), &input.display_name(), &input.bytes)?);
    }
    let summary = ValidationSummary::from_results(results);

    if output.json {
        println!("{}", serde_json::to_string_pretty(&summary)
            .map_err(|e| PdfWorksError::other(e.to_string()))?);
    } else {
        display_validation_summary(formatter, &summary);
    }
    Ok(())
}

/// Decide whether an existing output may be replaced.
fn confirm_overwrite(path: &Path, output: &OutputConfig, formatter: &OutputFormatter) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    match output.overwrite_mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(PdfWorksError::OutputExists {
            path: path.to_path_buf(),
        }),
        // Nobody to ask in quiet or JSON mode.
        OverwriteMode::Prompt if formatter.is_quiet() => Err(PdfWorksError::OutputExists {
            path: path.to_path_buf(),
        }),
        OverwriteMode::Prompt => {
            formatter.warning(&format!("Output file already exists: {}", path.display()));
            print!("Overwrite? [y/N]: ");
            std::io::stdout().flush().ok();

            let mut response = String::new();
            std::io::stdin().read_line(&mut response)?;
            match response.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(()),
                _ => Err(PdfWorksError::Cancelled),
            }
        }
    }
}
