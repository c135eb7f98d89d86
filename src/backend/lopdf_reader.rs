//! Document reader backed by `lopdf`.

use image::RgbaImage;
use lopdf::{Document, ObjectId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::lopdf_writer::{as_number, inherited_attribute};
use super::text::{PageResources, extract_fragments};
use super::{DocumentReader, PageRasterizer, PageSize, ParsedDocument, TextFragment};
use crate::error::{PdfWorksError, Result};

/// [`DocumentReader`] producing [`LopdfDocument`]s.
///
/// Rendering is delegated to an optional [`PageRasterizer`]; without one,
/// operations that need pixels fail with `Unsupported`.
#[derive(Clone, Default)]
pub struct LopdfReader {
    rasterizer: Option<Arc<dyn PageRasterizer + Send + Sync>>,
}

impl fmt::Debug for LopdfReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LopdfReader")
            .field("rasterizer", &self.rasterizer.is_some())
            .finish()
    }
}

impl LopdfReader {
    /// Reader without rendering support.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader that renders pages with `rasterizer`.
    pub fn with_rasterizer(rasterizer: Arc<dyn PageRasterizer + Send + Sync>) -> Self {
        Self {
            rasterizer: Some(rasterizer),
        }
    }

    /// Whether pages can be rendered.
    pub fn can_render(&self) -> bool {
        self.rasterizer.is_some()
    }
}

impl DocumentReader for LopdfReader {
    type Document = LopdfDocument;

    fn parse(&self, bytes: &[u8], name: &str) -> Result<LopdfDocument> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| PdfWorksError::parse_error(name, e.to_string()))?;
        let pages = doc.get_pages();

        Ok(LopdfDocument {
            bytes: Arc::from(bytes),
            doc,
            pages,
            name: name.to_string(),
            rasterizer: self.rasterizer.clone(),
        })
    }
}

/// A parsed PDF.
pub struct LopdfDocument {
    bytes: Arc<[u8]>,
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
    name: String,
    rasterizer: Option<Arc<dyn PageRasterizer + Send + Sync>>,
}

impl fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("name", &self.name)
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl LopdfDocument {
    /// Underlying `lopdf` document.
    pub fn inner(&self) -> &Document {
        &self.doc
    }

    fn page_id(&self, index: u32) -> Result<ObjectId> {
        self.pages.get(&(index + 1)).copied().ok_or_else(|| {
            PdfWorksError::parse_error(
                &self.name,
                format!("page index {index} out of bounds ({} pages)", self.pages.len()),
            )
        })
    }

    fn rotation(&self, page_id: ObjectId) -> i64 {
        inherited_attribute(&self.doc, page_id, b"Rotate")
            .and_then(|value| as_number(&self.doc, &value))
            .map(|degrees| (degrees as i64).rem_euclid(360))
            .unwrap_or(0)
    }
}

impl ParsedDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, index: u32) -> Result<PageSize> {
        let page_id = self.page_id(index)?;
        let media_box = inherited_attribute(&self.doc, page_id, b"MediaBox")
            .ok_or_else(|| PdfWorksError::parse_error(&self.name, "page has no MediaBox"))?;
        let values = self
            .doc
            .dereference(&media_box)
            .and_then(|(_, object)| object.as_array())
            .map_err(|e| PdfWorksError::parse_error(&self.name, e.to_string()))?;

        let coords: Vec<f32> = values
            .iter()
            .filter_map(|value| as_number(&self.doc, value))
            .collect();
        let [x0, y0, x1, y1] = coords[..] else {
            return Err(PdfWorksError::parse_error(&self.name, "malformed MediaBox"));
        };

        let (width, height) = ((x1 - x0).abs(), (y1 - y0).abs());
        Ok(match self.rotation(page_id) {
            90 | 270 => PageSize::new(height, width),
            _ => PageSize::new(width, height),
        })
    }

    fn render_page(&self, index: u32, scale: f32) -> Result<RgbaImage> {
        self.page_id(index)?;
        match &self.rasterizer {
            Some(rasterizer) => rasterizer.render(&self.bytes, index, scale),
            None => Err(PdfWorksError::unsupported(
                "Page rendering",
                "rebuild with the `pdfium` feature or supply a rasterizer",
            )),
        }
    }

    fn text_content(&self, index: u32) -> Result<Vec<TextFragment>> {
        let page_id = self.page_id(index)?;
        let content = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| PdfWorksError::parse_error(&self.name, e.to_string()))?;
        extract_fragments(&content, &PageResources::for_page(&self.doc, page_id))
    }
}
