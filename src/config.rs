//! Configuration and operation parameters.
//!
//! This module holds the typed parameters every transform receives:
//! - Quality and format choices with their fixed numeric mappings
//! - Page size and fit policies
//! - Engine-wide limits ([`EngineConfig`])
//! - Front-end output settings ([`OutputConfig`])
//!
//! All enums parse from the lowercase names used on the command line.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::backend::PageSize;
use crate::error::{PdfWorksError, Result};

/// Maximum accepted input size (50 MiB).
pub const MAX_INPUT_SIZE: u64 = 50 * 1024 * 1024;

fn invalid_choice(kind: &str, value: &str, choices: &str) -> PdfWorksError {
    PdfWorksError::invalid_config(format!(
        "Invalid {kind}: {value}. Must be one of: {choices}"
    ))
}

/// Rasterization quality for compression.
///
/// Each level fixes the render scale and the JPEG quality used when a page
/// is re-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterQuality {
    /// Smallest output.
    Low,
    /// Balanced size and legibility.
    #[default]
    Medium,
    /// Best legibility.
    High,
}

impl RasterQuality {
    /// Render scale relative to the page's natural size.
    pub fn render_scale(&self) -> f32 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 1.5,
            Self::High => 2.0,
        }
    }

    /// Lossy encode quality in `0.0..=1.0`.
    pub fn encode_quality(&self) -> f32 {
        match self {
            Self::Low => 0.5,
            Self::Medium => 0.7,
            Self::High => 0.8,
        }
    }

    /// Advertised size reduction in percent, shown before compressing.
    pub fn estimated_reduction(&self) -> u8 {
        match self {
            Self::Low => 60,
            Self::Medium => 40,
            Self::High => 20,
        }
    }
}

impl FromStr for RasterQuality {
    type Err = PdfWorksError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(invalid_choice("quality", s, "low, medium, high")),
        }
    }
}

/// Resolution tier for page-to-image export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    /// 72 DPI.
    Standard,
    /// About 150 DPI.
    #[default]
    High,
    /// About 300 DPI.
    Maximum,
}

impl ExportQuality {
    /// Render scale relative to 72 DPI.
    pub fn render_scale(&self) -> f32 {
        match self {
            Self::Standard => 1.0,
            Self::High => 2.08,
            Self::Maximum => 4.17,
        }
    }
}

impl FromStr for ExportQuality {
    type Err = PdfWorksError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "1" => Ok(Self::Standard),
            "high" | "2" => Ok(Self::High),
            "maximum" | "max" | "3" => Ok(Self::Maximum),
            _ => Err(invalid_choice("export quality", s, "standard, high, maximum")),
        }
    }
}

/// Raster image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Lossy JPEG.
    Jpeg,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// IANA media type.
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = PdfWorksError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            _ => Err(invalid_choice("image format", s, "png, jpeg")),
        }
    }
}

/// Page size used when turning images into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSizePolicy {
    /// Page takes the image's pixel dimensions.
    #[default]
    Fit,
    /// ISO A4 portrait.
    A4,
    /// US Letter portrait.
    Letter,
    /// ISO A3 portrait.
    A3,
}

impl PageSizePolicy {
    /// Fixed page size, or `None` when the page follows the image.
    pub fn fixed_size(&self) -> Option<PageSize> {
        match self {
            Self::Fit => None,
            Self::A4 => Some(PageSize::A4),
            Self::Letter => Some(PageSize::LETTER),
            Self::A3 => Some(PageSize::A3),
        }
    }
}

impl FromStr for PageSizePolicy {
    type Err = PdfWorksError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fit" | "fit-to-image" => Ok(Self::Fit),
            "a4" => Ok(Self::A4),
            "letter" => Ok(Self::Letter),
            "a3" => Ok(Self::A3),
            _ => Err(invalid_choice("page size", s, "fit, a4, letter, a3")),
        }
    }
}

/// How an image is scaled into its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPolicy {
    /// Largest size that fits both axes, centered.
    #[default]
    Contain,
    /// Smallest size that fills both axes, centered and cropped.
    Cover,
    /// Fill the page, ignoring aspect ratio.
    Stretch,
}

impl FromStr for FitPolicy {
    type Err = PdfWorksError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "contain" => Ok(Self::Contain),
            "cover" => Ok(Self::Cover),
            "stretch" | "fill" => Ok(Self::Stretch),
            _ => Err(invalid_choice("fit", s, "contain, cover, stretch")),
        }
    }
}

/// Page size for HTML conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HtmlPageSize {
    /// Paginate onto A4 pages.
    #[default]
    A4,
    /// Paginate onto Letter pages.
    Letter,
    /// Single page sized to the content.
    Auto,
}

impl HtmlPageSize {
    /// CSS pixel width of the layout container at 96 DPI.
    pub fn container_width(&self) -> u32 {
        match self {
            Self::A4 => 794,
            Self::Letter => 816,
            Self::Auto => 800,
        }
    }

    /// Fixed page size, or `None` for a single content-sized page.
    pub fn page_size(&self) -> Option<PageSize> {
        match self {
            Self::A4 => Some(PageSize::A4),
            Self::Letter => Some(PageSize::LETTER),
            Self::Auto => None,
        }
    }
}

impl FromStr for HtmlPageSize {
    type Err = PdfWorksError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" => Ok(Self::Letter),
            "auto" => Ok(Self::Auto),
            _ => Err(invalid_choice("page size", s, "a4, letter, auto")),
        }
    }
}

/// Output format for text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    /// UTF-8 plain text.
    #[default]
    Plain,
    /// Word document, with RTF as the fallback.
    Docx,
}

impl FromStr for TextFormat {
    type Err = PdfWorksError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "txt" | "text" | "plain" => Ok(Self::Plain),
            "docx" | "word" => Ok(Self::Docx),
            _ => Err(invalid_choice("text format", s, "txt, docx")),
        }
    }
}

/// Options for text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    /// Output format.
    pub format: TextFormat,
    /// Start a new line when the baseline jumps.
    pub preserve_line_breaks: bool,
    /// Prefix every page with a `--- Page N ---` marker.
    pub include_page_numbers: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            format: TextFormat::Plain,
            preserve_line_breaks: true,
            include_page_numbers: true,
        }
    }
}

/// Rotation applied on top of a page's current rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationDelta {
    /// 90 degrees counter-clockwise.
    CounterClockwise90,
    /// 90 degrees clockwise.
    Clockwise90,
    /// Half turn.
    Half,
}

impl RotationDelta {
    /// Parse a rotation delta from signed degrees.
    ///
    /// Accepts -90, 90 and 180 (270 is treated as -90).
    ///
    /// # Errors
    ///
    /// Returns an error for any other value.
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees {
            -90 | 270 => Ok(Self::CounterClockwise90),
            90 | -270 => Ok(Self::Clockwise90),
            180 | -180 => Ok(Self::Half),
            _ => Err(PdfWorksError::invalid_config(format!(
                "Invalid rotation: {degrees}. Must be -90, 90, or 180"
            ))),
        }
    }

    /// Signed degrees.
    pub fn as_degrees(&self) -> i32 {
        match self {
            Self::CounterClockwise90 => -90,
            Self::Clockwise90 => 90,
            Self::Half => 180,
        }
    }

    /// Compose with an existing page rotation, normalized to 0/90/180/270.
    pub fn apply_to(&self, current: i64) -> i64 {
        (current + i64::from(self.as_degrees())).rem_euclid(360)
    }
}

impl FromStr for RotationDelta {
    type Err = PdfWorksError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "left" | "ccw" => Ok(Self::CounterClockwise90),
            "right" | "cw" => Ok(Self::Clockwise90),
            "half" | "flip" => Ok(Self::Half),
            other => {
                let degrees: i32 = other.parse().map_err(|_| {
                    invalid_choice("rotation", s, "-90, 90, 180, left, right, half")
                })?;
                Self::from_degrees(degrees)
            }
        }
    }
}

/// Engine-wide limits and tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum accepted input size in bytes.
    pub max_input_size: u64,
    /// How long an HTML source may take to load.
    pub html_load_timeout: Duration,
    /// Oversampling factor for HTML snapshots.
    pub html_oversampling: f32,
    /// Maximum page height (points) for content-sized HTML pages.
    pub auto_page_max_height: f32,
    /// JPEG quality for page-to-image export.
    pub jpeg_export_quality: f32,
    /// Baseline jump (points) that starts a new line in text extraction.
    pub line_break_threshold: f32,
    /// Origin (`scheme://host[:port]`) URL sources must share, if any.
    pub document_origin: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_input_size: MAX_INPUT_SIZE,
            html_load_timeout: Duration::from_secs(10),
            html_oversampling: 2.0,
            auto_page_max_height: 14400.0,
            jpeg_export_quality: 0.92,
            line_break_threshold: 5.0,
            document_origin: None,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a limit is zero or a quality is outside `0.0..=1.0`.
    pub fn validate(&self) -> Result<()> {
        if self.max_input_size == 0 {
            return Err(PdfWorksError::invalid_config("Maximum input size must be positive"));
        }

        if self.html_load_timeout.is_zero() {
            return Err(PdfWorksError::invalid_config("HTML load timeout must be positive"));
        }

        if self.html_oversampling <= 0.0 {
            return Err(PdfWorksError::invalid_config("HTML oversampling must be positive"));
        }

        if self.auto_page_max_height <= 0.0 {
            return Err(PdfWorksError::invalid_config("Maximum page height must be positive"));
        }

        if !(0.0..=1.0).contains(&self.jpeg_export_quality) {
            return Err(PdfWorksError::invalid_config(
                "JPEG quality must be between 0.0 and 1.0",
            ));
        }

        if self.line_break_threshold < 0.0 {
            return Err(PdfWorksError::invalid_config(
                "Line break threshold cannot be negative",
            ));
        }

        Ok(())
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// Front-end settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Explicit output path; `None` uses the suggested name.
    pub output: Option<PathBuf>,
    /// Directory for suggested names when no explicit path is given.
    pub output_dir: Option<PathBuf>,
    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Verbose output.
    pub verbose: bool,
    /// Print the result summary as JSON.
    pub json: bool,
    /// Number of parallel loads (None = auto-detect).
    pub jobs: Option<usize>,
}

impl OutputConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if verbose and quiet are combined or jobs is zero.
    pub fn validate(&self) -> Result<()> {
        if self.verbose && self.quiet {
            return Err(PdfWorksError::invalid_config(
                "Cannot use both --verbose and --quiet",
            ));
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(PdfWorksError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        Ok(())
    }

    /// Get the effective number of parallel jobs.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Resolve where a result with the given suggested name is written.
    pub fn resolve_output(&self, suggested_name: &str) -> PathBuf {
        match (&self.output, &self.output_dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => dir.join(suggested_name),
            (None, None) => PathBuf::from(suggested_name),
        }
    }
}
