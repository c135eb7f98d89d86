//! The page-set transformation engine.
//!
//! [`TransformEngine::execute`] takes one [`Operation`] and produces a
//! [`TransformResult`]: the output bytes, a suggested file name and a
//! [`TransformSummary`] for display. The engine reads its inputs and never
//! modifies them. Every call builds a fresh output document, and a failure
//! at any step aborts the whole operation.
//!
//! Progress is reported per page through a [`ProgressReporter`]. The values
//! never decrease, and a successful call always ends at 100.
//!
//! # Examples
//!
//! ```no_run
//! use pdfworks::backend::LopdfReader;
//! use pdfworks::document::DocumentHandle;
//! use pdfworks::engine::{Operation, TransformEngine};
//! use pdfworks::progress::NoProgress;
//!
//! # async fn example(bytes: Vec<u8>) -> pdfworks::Result<()> {
//! let engine = TransformEngine::default();
//! let document = DocumentHandle::open(&LopdfReader::new(), bytes, "report.pdf")?;
//!
//! let result = engine
//!     .execute(Operation::Split { document: &document, from: 2, to: 4 }, &NoProgress)
//!     .await?;
//! assert_eq!(result.suggested_file_name, "report_pages_2-4.pdf");
//! # Ok(())
//! # }
//! ```

mod compress;
mod export;
mod html;
mod images;
mod pages;
mod text;

pub use html::{HtmlSnapshotter, HtmlSource, paginate_bands};
pub use images::{RasterInput, place_image};
pub use text::{reconstruct_page_text, render_rtf};

use serde::Serialize;
use tracing::{info, instrument};

use crate::backend::{
    DocumentReader, DocumentWriter, DocxWriter, LopdfReader, LopdfWriter, RichDocumentWriter,
};
use crate::config::{
    EngineConfig, ExportQuality, FitPolicy, HtmlPageSize, ImageFormat, PageSizePolicy,
    RasterQuality, RotationDelta, TextOptions,
};
use crate::document::{DocumentHandle, MergeFileEntry};
use crate::error::Result;
use crate::progress::{Progress, ProgressReporter};
use crate::selection::PageSelection;
use crate::validation::{InputKind, Validator};

/// Media type of PDF output.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";
/// Media type of zip archives.
pub const ZIP_MEDIA_TYPE: &str = "application/zip";
/// Media type of plain text output.
pub const TEXT_MEDIA_TYPE: &str = "text/plain";
/// Media type of Word documents.
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Media type of RTF documents.
pub const RTF_MEDIA_TYPE: &str = "application/rtf";

/// Name of a merged document.
pub const MERGED_FILE_NAME: &str = "merged.pdf";
/// Name of a document built from images.
pub const IMAGES_FILE_NAME: &str = "images_combined.pdf";
/// Name of a document built from HTML.
pub const HTML_FILE_NAME: &str = "html_export.pdf";

/// Which pages an export covers.
#[derive(Debug, Clone, PartialEq)]
pub enum PageScope {
    /// Every page.
    All,
    /// Only the selected pages, ascending.
    Selection(PageSelection),
}

/// A transformation request.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    /// Copy the inclusive, 1-based range `from..=to` into a new document.
    Split {
        /// Source document.
        document: &'a DocumentHandle,
        /// First page.
        from: u32,
        /// Last page.
        to: u32,
    },
    /// Concatenate every page of every input, in order.
    Merge {
        /// Inputs in merge order.
        documents: &'a [MergeFileEntry],
    },
    /// Keep every page except the selected ones.
    Delete {
        /// Source document.
        document: &'a DocumentHandle,
        /// Pages to remove.
        selection: &'a PageSelection,
    },
    /// Keep only the selected pages, ascending.
    Extract {
        /// Source document.
        document: &'a DocumentHandle,
        /// Pages to keep.
        selection: &'a PageSelection,
    },
    /// Rotate pages relative to their current rotation.
    Rotate {
        /// Source document.
        document: &'a DocumentHandle,
        /// Rotation to add.
        delta: RotationDelta,
        /// Pages to rotate; empty rotates every page.
        selection: &'a PageSelection,
    },
    /// Re-encode every page as a JPEG image.
    Compress {
        /// Source document.
        document: &'a DocumentHandle,
        /// Render scale and encode quality.
        quality: RasterQuality,
    },
    /// Build a document with one page per image.
    ImagesToPdf {
        /// Images in page order.
        images: &'a [RasterInput],
        /// Page size.
        page_size: PageSizePolicy,
        /// Placement of each image on its page.
        fit: FitPolicy,
    },
    /// Render HTML and paginate it.
    HtmlToPdf {
        /// Markup or URL.
        source: &'a HtmlSource,
        /// Page size.
        page_size: HtmlPageSize,
    },
    /// Render pages to images.
    PdfToImages {
        /// Source document.
        document: &'a DocumentHandle,
        /// Pages to export.
        scope: &'a PageScope,
        /// Image encoding.
        format: ImageFormat,
        /// Resolution tier.
        quality: ExportQuality,
    },
    /// Extract the text of every page.
    PdfToText {
        /// Source document.
        document: &'a DocumentHandle,
        /// Output format and layout.
        options: TextOptions,
    },
}

impl Operation<'_> {
    /// Short lowercase name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Split { .. } => "split",
            Self::Merge { .. } => "merge",
            Self::Delete { .. } => "delete",
            Self::Extract { .. } => "extract",
            Self::Rotate { .. } => "rotate",
            Self::Compress { .. } => "compress",
            Self::ImagesToPdf { .. } => "images-to-pdf",
            Self::HtmlToPdf { .. } => "html-to-pdf",
            Self::PdfToImages { .. } => "pdf-to-images",
            Self::PdfToText { .. } => "pdf-to-text",
        }
    }

    fn documents(&self) -> &[DocumentHandle] {
        match self {
            Self::Split { document, .. }
            | Self::Delete { document, .. }
            | Self::Extract { document, .. }
            | Self::Rotate { document, .. }
            | Self::Compress { document, .. }
            | Self::PdfToImages { document, .. }
            | Self::PdfToText { document, .. } => std::slice::from_ref(*document),
            Self::Merge { documents } => documents,
            Self::ImagesToPdf { .. } | Self::HtmlToPdf { .. } => &[],
        }
    }
}

/// What a transform produced, for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSummary {
    /// Human-readable one-line description.
    pub label: String,

    /// Pages in the output, or pages processed for non-PDF outputs.
    pub page_count: u32,

    /// Size of the output in bytes.
    pub output_size: u64,

    /// Number of files merged or exported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<usize>,

    /// Pages removed by a delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_removed: Option<u32>,

    /// Size of the input in bytes, for compression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,

    /// Size reduction in percent, floored at zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduction_percent: Option<u8>,

    /// Size reduction in percent; negative when the output grew.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_reduction_percent: Option<i64>,

    /// Words in extracted text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,

    /// Rotation applied, in signed degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_degrees: Option<i32>,

    /// Images consumed or produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count: Option<usize>,

    /// Text output fell back to RTF.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub rtf_fallback: bool,
}

/// Output of a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// Output bytes.
    pub bytes: Vec<u8>,
    /// File name to save the bytes under.
    pub suggested_file_name: String,
    /// Media type of `bytes`.
    pub media_type: &'static str,
    /// Display summary.
    pub summary: TransformSummary,
}

impl TransformResult {
    fn new(
        bytes: Vec<u8>,
        suggested_file_name: String,
        media_type: &'static str,
        mut summary: TransformSummary,
    ) -> Self {
        summary.output_size = bytes.len() as u64;
        Self {
            bytes,
            suggested_file_name,
            media_type,
            summary,
        }
    }
}

/// Runs [`Operation`]s against injected document capabilities.
pub struct TransformEngine<R = LopdfReader, W = LopdfWriter> {
    reader: R,
    writer: W,
    config: EngineConfig,
    validator: Validator,
    snapshotter: Option<Box<dyn HtmlSnapshotter>>,
    rich_writer: Option<Box<dyn RichDocumentWriter>>,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl TransformEngine {
    /// Engine over `lopdf` with the bundled DOCX writer and no HTML
    /// renderer.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_backends(LopdfReader::new(), LopdfWriter::new(), config)
    }
}

impl<R, W> TransformEngine<R, W>
where
    R: DocumentReader,
    W: DocumentWriter,
{
    /// Engine over custom capabilities.
    pub fn with_backends(reader: R, writer: W, config: EngineConfig) -> Self {
        Self {
            reader,
            writer,
            validator: Validator::from_config(&config),
            config,
            snapshotter: None,
            rich_writer: Some(Box::new(DocxWriter::new())),
        }
    }

    /// Install an HTML renderer, enabling [`Operation::HtmlToPdf`].
    pub fn with_html_snapshotter(mut self, snapshotter: Box<dyn HtmlSnapshotter>) -> Self {
        self.snapshotter = Some(snapshotter);
        self
    }

    /// Replace the rich-text writer; `None` makes text export fall back to
    /// RTF.
    pub fn with_rich_writer(mut self, rich_writer: Option<Box<dyn RichDocumentWriter>>) -> Self {
        self.rich_writer = rich_writer;
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Document reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Run one operation.
    ///
    /// # Errors
    ///
    /// Returns the operation's error. Inputs are left untouched and nothing
    /// is reported after the failure.
    #[instrument(skip_all, fields(operation = operation.name()))]
    pub async fn execute(
        &self,
        operation: Operation<'_>,
        progress: &dyn ProgressReporter,
    ) -> Result<TransformResult> {
        for document in operation.documents() {
            self.validator.validate_upload(
                document.display_name(),
                document.size(),
                None,
                InputKind::Pdf,
            )?;
        }

        let progress = Progress::new(progress);
        let result = match operation {
            Operation::Split { document, from, to } => self.split(document, from, to, &progress).await,
            Operation::Merge { documents } => self.merge(documents, &progress).await,
            Operation::Delete {
                document,
                selection,
            } => self.delete(document, selection, &progress).await,
            Operation::Extract {
                document,
                selection,
            } => self.extract(document, selection, &progress).await,
            Operation::Rotate {
                document,
                delta,
                selection,
            } => self.rotate(document, delta, selection, &progress).await,
            Operation::Compress { document, quality } => {
                self.compress(document, quality, &progress).await
            }
            Operation::ImagesToPdf {
                images,
                page_size,
                fit,
            } => self.images_to_pdf(images, page_size, fit, &progress).await,
            Operation::HtmlToPdf { source, page_size } => {
                self.html_to_pdf(source, page_size, &progress).await
            }
            Operation::PdfToImages {
                document,
                scope,
                format,
                quality,
            } => {
                self.pdf_to_images(document, scope, format, quality, &progress)
                    .await
            }
            Operation::PdfToText { document, options } => {
                self.pdf_to_text(document, options, &progress).await
            }
        }?;

        progress.finish();
        info!(
            output = %result.suggested_file_name,
            bytes = result.bytes.len(),
            "{}",
            result.summary.label
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_pdf;

    #[test]
    fn test_operation_names() {
        let document =
            DocumentHandle::open(&LopdfReader::new(), sample_pdf(1), "a.pdf").unwrap();
        let op = Operation::Split {
            document: &document,
            from: 1,
            to: 1,
        };
        assert_eq!(op.name(), "split");
        assert_eq!(op.documents().len(), 1);
        assert_eq!(Operation::Merge { documents: &[] }.name(), "merge");
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = TransformSummary {
            label: "3 pages".into(),
            page_count: 3,
            output_size: 10,
            reduction_percent: Some(0),
            raw_reduction_percent: Some(-5),
            ..Default::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["pageCount"], 3);
        assert_eq!(json["rawReductionPercent"], -5);
        assert!(json.get("fileCount").is_none());
        assert!(json.get("rtfFallback").is_none());
    }

    #[tokio::test]
    async fn test_oversized_input_rejected() {
        let document =
            DocumentHandle::open(&LopdfReader::new(), sample_pdf(2), "a.pdf").unwrap();
        let engine = TransformEngine::new(EngineConfig {
            max_input_size: 10,
            ..Default::default()
        });

        let err = engine
            .execute(
                Operation::Split {
                    document: &document,
                    from: 1,
                    to: 1,
                },
                &crate::progress::NoProgress,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::PdfWorksError::FileTooLarge { .. }));
    }
}
