//! Input validation for pdfworks.
//!
//! Every input passes through the [`Validator`] before a transform runs:
//! - Size limit (50 MiB by default)
//! - Media type, declared by the caller or detected from the bytes
//! - Output path checks for the command-line front end
//!
//! [`ValidationResult`] describes a successfully parsed document and backs
//! the `info` command.
//!
//! # Examples
//!
//! ```
//! use pdfworks::validation::{InputKind, Validator};
//!
//! let validator = Validator::new();
//! assert!(validator.validate_upload("doc.pdf", 1024, Some("application/pdf"), InputKind::Pdf).is_ok());
//! assert!(validator.validate_upload("doc.txt", 1024, Some("text/plain"), InputKind::Pdf).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::backend::{DocumentReader, PageSize, ParsedDocument};
use crate::config::{EngineConfig, MAX_INPUT_SIZE, OutputConfig, OverwriteMode};
use crate::error::{PdfWorksError, Result};
use crate::utils::format_file_size;

/// Media type of PDF documents.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// What an input is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A PDF document.
    Pdf,
    /// A raster image.
    Image,
}

impl InputKind {
    fn accepts(&self, media_type: &str) -> bool {
        match self {
            Self::Pdf => media_type == PDF_MEDIA_TYPE,
            Self::Image => media_type.starts_with("image/"),
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Self::Pdf => PDF_MEDIA_TYPE,
            Self::Image => "image/png, image/jpeg or another image type",
        }
    }
}

/// Detect a media type from the leading bytes, falling back to the file
/// extension.
pub fn detect_media_type(name: &str, bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF-") {
        return PDF_MEDIA_TYPE;
    }

    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }

    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("pdf") => PDF_MEDIA_TYPE,
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Read the `%PDF-x.y` header version.
fn header_version(bytes: &[u8]) -> Option<(u8, u8)> {
    let header = bytes.strip_prefix(b"%PDF-")?;
    let major = header.first().filter(|b| b.is_ascii_digit())? - b'0';
    let minor = header
        .get(2)
        .filter(|b| header.get(1) == Some(&b'.') && b.is_ascii_digit())?
        - b'0';
    Some((major, minor))
}

/// Result of validating a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Display name of the input.
    pub name: String,

    /// Number of pages.
    pub page_count: u32,

    /// PDF version (major, minor) from the header.
    pub version: Option<(u8, u8)>,

    /// Size in bytes.
    pub file_size: u64,

    /// Size of the first page in points.
    pub first_page: Option<(f32, f32)>,
}

impl ValidationResult {
    /// Format the file size as a human-readable string.
    pub fn format_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Summary of validation results for multiple files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    /// Individual validation results for each file.
    pub results: Vec<ValidationResult>,

    /// Total number of pages across all files.
    pub total_pages: u32,

    /// Total file size in bytes.
    pub total_size: u64,
}

impl ValidationSummary {
    /// Create a summary from validation results.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let total_pages = results.iter().map(|r| r.page_count).sum();
        let total_size = results.iter().map(|r| r.file_size).sum();

        Self {
            results,
            total_pages,
            total_size,
        }
    }

    /// Format the total file size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Validator for inputs and output paths.
#[derive(Debug, Clone)]
pub struct Validator {
    max_input_size: u64,
}

impl Validator {
    /// Create a validator with the default 50 MiB limit.
    pub fn new() -> Self {
        Self {
            max_input_size: MAX_INPUT_SIZE,
        }
    }

    /// Create a validator using the engine's limits.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_input_size: config.max_input_size,
        }
    }

    /// Configured size limit in bytes.
    pub fn max_input_size(&self) -> u64 {
        self.max_input_size
    }

    /// Check an input before it is read.
    ///
    /// Size is checked before the media type.
    ///
    /// # Errors
    ///
    /// Returns `FileTooLarge` above the size limit and `UnsupportedType`
    /// when `media_type` does not match `kind`.
    pub fn validate_upload(
        &self,
        name: &str,
        size: u64,
        media_type: Option<&str>,
        kind: InputKind,
    ) -> Result<()> {
        if size > self.max_input_size {
            return Err(PdfWorksError::FileTooLarge {
                name: name.to_string(),
                size,
                limit: self.max_input_size,
            });
        }

        if let Some(media_type) = media_type
            && !kind.accepts(media_type)
        {
            return Err(PdfWorksError::UnsupportedType {
                name: name.to_string(),
                media_type: media_type.to_string(),
                expected: kind.expected().to_string(),
            });
        }

        Ok(())
    }

    /// Check loaded bytes, detecting the media type when none is declared.
    ///
    /// # Errors
    ///
    /// Same as [`Validator::validate_upload`].
    pub fn validate_bytes(
        &self,
        name: &str,
        bytes: &[u8],
        media_type: Option<&str>,
        kind: InputKind,
    ) -> Result<()> {
        let media_type = media_type.unwrap_or_else(|| detect_media_type(name, bytes));
        self.validate_upload(name, bytes.len() as u64, Some(media_type), kind)
    }

    /// Validate and describe a PDF document.
    ///
    /// # Errors
    ///
    /// Returns the upload errors, `ParseError` for unreadable documents and
    /// for documents without pages.
    pub fn inspect<R: DocumentReader>(
        &self,
        reader: &R,
        name: &str,
        bytes: &[u8],
    ) -> Result<ValidationResult> {
        self.validate_bytes(name, bytes, None, InputKind::Pdf)?;

        let doc = reader.parse(bytes, name)?;
        let page_count = doc.page_count();
        if page_count == 0 {
            return Err(PdfWorksError::parse_error(name, "document has no pages"));
        }

        let first_page = doc
            .page_size(0)
            .ok()
            .map(|PageSize { width, height }| (width, height));

        Ok(ValidationResult {
            name: name.to_string(),
            page_count,
            version: header_version(bytes),
            file_size: bytes.len() as u64,
            first_page,
        })
    }

    /// Validate the output path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Output file exists and no_clobber is set
    /// - Output directory doesn't exist
    /// - Output directory is not writable
    pub async fn validate_output(&self, config: &OutputConfig, output_path: &Path) -> Result<()> {
        if output_path.exists() && config.overwrite_mode == OverwriteMode::NoClobber {
            return Err(PdfWorksError::OutputExists {
                path: output_path.to_path_buf(),
            });
        }

        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if !parent.exists() {
            return Err(PdfWorksError::invalid_config(format!(
                "Output directory does not exist: {}",
                parent.display()
            )));
        }

        let metadata = tokio::fs::metadata(&parent).await?;
        if metadata.permissions().readonly() {
            return Err(PdfWorksError::invalid_config(format!(
                "Output directory is not writable: {}",
                parent.display()
            )));
        }

        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
