//! Document capabilities the engine depends on.
//!
//! The transform engine never touches PDF objects or pixels directly. It
//! drives three capabilities:
//!
//! - [`DocumentReader`]: parse bytes into a [`ParsedDocument`] that reports
//!   page count and size, renders pages and yields positioned text
//! - [`DocumentWriter`]: build output documents (copy pages, rotate, embed
//!   images, draw them, serialize)
//! - [`PageRasterizer`]: turn a page into pixels, plugged into the `lopdf`
//!   reader
//!
//! `lopdf` backs the reader and writer. Rasterization comes from the
//! `pdfium` feature or from a caller-supplied implementation. Extracted text
//! goes to a [`RichDocumentWriter`], by default the zip-based [`DocxWriter`].

pub mod docx;
pub mod lopdf_reader;
pub mod lopdf_writer;
#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod raster;
pub mod text;

pub use docx::DocxWriter;
pub use lopdf_reader::{LopdfDocument, LopdfReader};
pub use lopdf_writer::LopdfWriter;
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;

use image::RgbaImage;
use serde::Serialize;

use crate::error::Result;

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    /// Width in points.
    pub width: f32,
    /// Height in points.
    pub height: f32,
}

impl PageSize {
    /// ISO A4 portrait.
    pub const A4: PageSize = PageSize::new(595.28, 841.89);
    /// US Letter portrait.
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);
    /// ISO A3 portrait.
    pub const A3: PageSize = PageSize::new(841.89, 1190.55);

    /// Create a page size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

/// Rectangle in PDF user space (origin at the bottom-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a rectangle.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole page.
    pub fn full_page(size: PageSize) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }
}

/// A run of text with the position of its origin on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    /// Decoded text.
    pub text: String,
    /// Horizontal origin in points.
    pub x: f32,
    /// Baseline in points.
    pub y: f32,
}

/// Reconstructed text of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    /// Trimmed page text; lines separated by `\n`.
    pub text: String,
}

/// Encoded raster formats a writer can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// PNG bytes.
    Png,
    /// JPEG bytes.
    Jpeg,
}

/// Handle to an image embedded in an output document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbeddedImage<I> {
    /// Writer-specific image handle.
    pub id: I,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// Serialization options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Compress content streams.
    pub compress: bool,
    /// Drop objects no page references.
    pub prune: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            compress: true,
            prune: true,
        }
    }
}

/// A parsed source document.
pub trait ParsedDocument {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Size of a page (0-based index) at scale 1.0, honoring its rotation.
    fn page_size(&self, index: u32) -> Result<PageSize>;

    /// Render a page (0-based index) at `scale` times its natural size.
    fn render_page(&self, index: u32, scale: f32) -> Result<RgbaImage>;

    /// Text fragments of a page (0-based index) in content order.
    fn text_content(&self, index: u32) -> Result<Vec<TextFragment>>;
}

/// Parses document bytes.
pub trait DocumentReader {
    /// Parsed document type.
    type Document: ParsedDocument;

    /// Parse raw bytes; `name` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for corrupt or unreadable input.
    fn parse(&self, bytes: &[u8], name: &str) -> Result<Self::Document>;
}

/// Renders single pages of a PDF byte stream.
pub trait PageRasterizer {
    /// Render page `index` (0-based) of `bytes` at `scale`.
    fn render(&self, bytes: &[u8], index: u32, scale: f32) -> Result<RgbaImage>;
}

/// Builds output documents.
pub trait DocumentWriter {
    /// In-progress document.
    type Document;
    /// Page handle within a document.
    type Page: Copy;
    /// Embedded image handle within a document.
    type Image: Copy;

    /// Create an empty document.
    fn create(&self) -> Self::Document;

    /// Load an existing document for modification.
    fn load(&self, bytes: &[u8], name: &str) -> Result<Self::Document>;

    /// Copy pages (0-based indices, in the given order) of `source` into
    /// `target`. Copied pages are not yet part of `target`'s page list.
    fn copy_pages(
        &self,
        target: &mut Self::Document,
        source: &Self::Document,
        indices: &[u32],
    ) -> Result<Vec<Self::Page>>;

    /// Append a copied page to the end of the document.
    fn add_page(&self, doc: &mut Self::Document, page: Self::Page) -> Result<()>;

    /// Append a new empty page of the given size.
    fn add_blank_page(&self, doc: &mut Self::Document, size: PageSize) -> Result<Self::Page>;

    /// Pages of the document in order.
    fn pages(&self, doc: &Self::Document) -> Vec<Self::Page>;

    /// Effective rotation of a page in degrees.
    fn rotation(&self, doc: &Self::Document, page: Self::Page) -> Result<i64>;

    /// Set the rotation of a page in degrees.
    fn set_rotation(&self, doc: &mut Self::Document, page: Self::Page, degrees: i64)
    -> Result<()>;

    /// Embed encoded raster bytes.
    fn embed_raster(
        &self,
        doc: &mut Self::Document,
        bytes: &[u8],
        format: RasterFormat,
    ) -> Result<EmbeddedImage<Self::Image>>;

    /// Draw an embedded image into `rect` on `page`.
    fn draw_image(
        &self,
        doc: &mut Self::Document,
        page: Self::Page,
        image: Self::Image,
        rect: Rect,
    ) -> Result<()>;

    /// Serialize the document.
    fn save(&self, doc: &mut Self::Document, options: SaveOptions) -> Result<Vec<u8>>;
}

/// Writes extracted text into a rich document format.
pub trait RichDocumentWriter: Send + Sync {
    /// Serialize the pages.
    fn write_document(&self, pages: &[PageText]) -> Result<Vec<u8>>;
}
