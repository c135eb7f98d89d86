//! Document writer backed by `lopdf`.
//!
//! Pages copied between documents are imported object by object: every
//! reachable object gets a fresh id in the target, and links back into the
//! source page tree are dropped so a copied page never drags its siblings
//! along. Inheritable page attributes are resolved onto the copy first.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::codecs::jpeg::JpegDecoder;
use image::{ExtendedColorType, ImageDecoder, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use tracing::debug;

use super::raster::{decode, encode_jpeg};
use super::{DocumentWriter, EmbeddedImage, PageSize, RasterFormat, Rect, SaveOptions};
use crate::error::{PdfWorksError, Result};

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Upper bound on page tree depth when walking `/Parent` links.
const MAX_TREE_DEPTH: usize = 64;

/// [`DocumentWriter`] over `lopdf::Document`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfWriter;

impl LopdfWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self
    }
}

/// Look up a page attribute, walking up the page tree when it is inherited.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }

    None
}

/// Read a number that may be stored as an integer or a real.
pub(crate) fn as_number(doc: &Document, object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        Object::Reference(id) => doc.get_object(*id).ok().and_then(|o| as_number(doc, o)),
        _ => None,
    }
}

fn pages_root(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| PdfWorksError::write_error(format!("document has no page tree: {e}")))
}

fn is_page_tree_node(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .is_ok_and(|name| name == b"Page" || name == b"Pages")
}

/// Copies objects from one document into another under fresh ids.
struct Importer<'a> {
    source: &'a Document,
    ids: BTreeMap<ObjectId, ObjectId>,
}

impl<'a> Importer<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            ids: BTreeMap::new(),
        }
    }

    fn import(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => match self.import_reference(target, *id) {
                Some(new_id) => Object::Reference(new_id),
                None => Object::Null,
            },
            Object::Dictionary(dict) => Object::Dictionary(self.import_dictionary(target, dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.import(target, item)).collect())
            }
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.import_dictionary(target, &stream.dict);
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn import_reference(&mut self, target: &mut Document, id: ObjectId) -> Option<ObjectId> {
        if let Some(new_id) = self.ids.get(&id) {
            return Some(*new_id);
        }

        let object = self.source.get_object(id).ok()?;
        // Pages that are not being copied stay behind.
        if is_page_tree_node(object) {
            return None;
        }

        let new_id = target.new_object_id();
        self.ids.insert(id, new_id);
        let copy = self.import(target, object);
        target.objects.insert(new_id, copy);
        Some(new_id)
    }

    fn import_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            match self.import(target, value) {
                Object::Null if matches!(value, Object::Reference(_)) => {}
                imported => copy.set(key.clone(), imported),
            }
        }
        copy
    }
}

fn flate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn image_dictionary(width: u32, height: u32, color_space: &str, filter: &str) -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => filter,
    }
}

impl LopdfWriter {
    fn embed_jpeg(&self, doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage<ObjectId>> {
        let decoder = JpegDecoder::new(Cursor::new(bytes))?;
        let (width, height) = decoder.dimensions();

        let (data, color_space) = match decoder.original_color_type() {
            ExtendedColorType::L8 => (bytes.to_vec(), "DeviceGray"),
            ExtendedColorType::Rgb8 => (bytes.to_vec(), "DeviceRGB"),
            // CMYK and friends are re-encoded so every reader shows the same colors.
            other => {
                debug!(?other, "re-encoding JPEG to RGB");
                (encode_jpeg(&decode(bytes)?, 0.92)?, "DeviceRGB")
            }
        };

        let stream = Stream::new(
            image_dictionary(width, height, color_space, "DCTDecode"),
            data,
        )
        .with_compression(false);
        let id = doc.add_object(stream);

        Ok(EmbeddedImage { id, width, height })
    }

    fn embed_png(&self, doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage<ObjectId>> {
        let rgba = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.into_rgba8();
        let (width, height) = rgba.dimensions();

        let pixel_count = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        let mut dict = image_dictionary(width, height, "DeviceRGB", "FlateDecode");

        if alpha.iter().any(|&a| a < u8::MAX) {
            let mask = Stream::new(
                image_dictionary(width, height, "DeviceGray", "FlateDecode"),
                flate(&alpha)?,
            )
            .with_compression(false);
            let mask_id = doc.add_object(mask);
            dict.set("SMask", mask_id);
        }

        let id = doc.add_object(Stream::new(dict, flate(&rgb)?).with_compression(false));

        Ok(EmbeddedImage { id, width, height })
    }

    fn resolve_dictionary(doc: &Document, object: Option<&Object>) -> Result<Dictionary> {
        match object {
            Some(Object::Dictionary(dict)) => Ok(dict.clone()),
            Some(Object::Reference(id)) => Ok(doc.get_dictionary(*id)?.clone()),
            _ => Ok(Dictionary::new()),
        }
    }
}

impl DocumentWriter for LopdfWriter {
    type Document = Document;
    type Page = ObjectId;
    type Image = ObjectId;

    fn create(&self) -> Document {
        let mut doc = Document::with_version("1.7");

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Producer" => Object::string_literal(crate::NAME),
        });

        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc
    }

    fn load(&self, bytes: &[u8], name: &str) -> Result<Document> {
        Document::load_mem(bytes).map_err(|e| PdfWorksError::parse_error(name, e.to_string()))
    }

    fn copy_pages(
        &self,
        target: &mut Document,
        source: &Document,
        indices: &[u32],
    ) -> Result<Vec<ObjectId>> {
        let source_pages = source.get_pages();
        let mut importer = Importer::new(source);

        let mut plan = Vec::with_capacity(indices.len());
        for &index in indices {
            let source_id = source_pages.get(&(index + 1)).copied().ok_or_else(|| {
                PdfWorksError::write_error(format!(
                    "page index {index} out of bounds ({} pages)",
                    source_pages.len()
                ))
            })?;
            let new_id = target.new_object_id();
            importer.ids.insert(source_id, new_id);
            plan.push((source_id, new_id));
        }

        for &(source_id, new_id) in &plan {
            let mut page = source.get_dictionary(source_id)?.clone();
            page.remove(b"Parent");
            for key in INHERITABLE {
                if !page.has(key)
                    && let Some(value) = inherited_attribute(source, source_id, key)
                {
                    page.set(key.to_vec(), value);
                }
            }

            let copy = importer.import_dictionary(target, &page);
            target.objects.insert(new_id, Object::Dictionary(copy));
        }

        debug!(copied = plan.len(), "copied pages");
        Ok(plan.into_iter().map(|(_, new_id)| new_id).collect())
    }

    fn add_page(&self, doc: &mut Document, page: ObjectId) -> Result<()> {
        let pages_id = pages_root(doc)?;
        doc.get_dictionary_mut(page)?.set("Parent", pages_id);

        let pages = doc.get_dictionary_mut(pages_id)?;
        let mut kids = pages
            .get(b"Kids")
            .and_then(Object::as_array)
            .cloned()
            .unwrap_or_default();
        kids.push(Object::Reference(page));
        let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);

        pages.set("Kids", kids);
        pages.set("Count", count + 1);
        Ok(())
    }

    fn add_blank_page(&self, doc: &mut Document, size: PageSize) -> Result<ObjectId> {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(size.width),
                Object::Real(size.height),
            ],
            "Resources" => Dictionary::new(),
        });
        self.add_page(doc, page_id)?;
        Ok(page_id)
    }

    fn pages(&self, doc: &Document) -> Vec<ObjectId> {
        doc.get_pages().into_values().collect()
    }

    fn rotation(&self, doc: &Document, page: ObjectId) -> Result<i64> {
        Ok(inherited_attribute(doc, page, b"Rotate")
            .and_then(|value| as_number(doc, &value))
            .map(|degrees| degrees as i64)
            .unwrap_or(0))
    }

    fn set_rotation(&self, doc: &mut Document, page: ObjectId, degrees: i64) -> Result<()> {
        doc.get_dictionary_mut(page)?
            .set("Rotate", degrees.rem_euclid(360));
        Ok(())
    }

    fn embed_raster(
        &self,
        doc: &mut Document,
        bytes: &[u8],
        format: RasterFormat,
    ) -> Result<EmbeddedImage<ObjectId>> {
        match format {
            RasterFormat::Jpeg => self.embed_jpeg(doc, bytes),
            RasterFormat::Png => self.embed_png(doc, bytes),
        }
    }

    fn draw_image(&self, doc: &mut Document, page: ObjectId, image: ObjectId, rect: Rect) -> Result<()> {
        let name = format!("Im{}", image.0);

        let page_dict = doc.get_dictionary(page)?;
        let mut resources = Self::resolve_dictionary(doc, page_dict.get(b"Resources").ok())?;
        let mut xobjects = Self::resolve_dictionary(doc, resources.get(b"XObject").ok())?;
        xobjects.set(name.as_bytes().to_vec(), image);
        resources.set("XObject", xobjects);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(rect.width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(rect.height),
                        Object::Real(rect.x),
                        Object::Real(rect.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

        let page_dict = doc.get_dictionary_mut(page)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(Object::Reference(existing)) => {
                vec![Object::Reference(*existing), Object::Reference(content_id)]
            }
            Ok(Object::Array(existing)) => {
                let mut items = existing.clone();
                items.push(Object::Reference(content_id));
                items
            }
            _ => vec![Object::Reference(content_id)],
        };
        page_dict.set("Contents", contents);
        page_dict.set("Resources", resources);
        Ok(())
    }

    fn save(&self, doc: &mut Document, options: SaveOptions) -> Result<Vec<u8>> {
        if options.prune {
            doc.prune_objects();
        }
        if options.compress {
            doc.compress();
        }
        doc.renumber_objects();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| PdfWorksError::write_error(e.to_string()))?;
        Ok(buffer)
    }
}
