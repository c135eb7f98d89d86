//! Positioned text fragments from page content streams.
//!
//! Tracks the graphics and text matrices through the text operators and
//! emits one [`TextFragment`] per show-text operation, positioned at the
//! origin of the run in user space. Glyph advances are not measured, so
//! consecutive runs on one line share the line's starting position.
//!
//! Strings are decoded through the encoding of the font selected by `Tf`
//! (simple encodings and `/ToUnicode` maps, via `lopdf`). Form XObjects
//! invoked with `Do` are walked with their own resources and matrix.

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId, Stream};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::TextFragment;
use crate::error::{PdfWorksError, Result};

/// TJ adjustment (thousandths of a unit) treated as a word gap.
const WORD_GAP: f32 = -250.0;

/// Nesting limit for forms drawing forms.
const MAX_FORM_DEPTH: usize = 8;

/// Upper bound on page tree depth when collecting inherited resources.
const MAX_TREE_DEPTH: usize = 64;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

fn matrix(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(m)
}

/// Decode a PDF string: UTF-16BE with a byte order mark, otherwise one
/// character per byte.
///
/// Used for strings shown with a font whose encoding is unknown.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Fonts and XObjects visible to one content stream.
///
/// Built for a page with [`PageResources::for_page`]; forms get their own
/// set from their `/Resources`. The default value has no fonts, so every
/// string falls back to [`decode_pdf_string`].
#[derive(Default)]
pub struct PageResources<'a> {
    doc: Option<&'a Document>,
    fonts: BTreeMap<Vec<u8>, Encoding<'a>>,
    forms: BTreeMap<Vec<u8>, &'a Stream>,
}

impl<'a> PageResources<'a> {
    /// Resources of a page, including those inherited from the page tree.
    /// Entries closer to the page win.
    pub fn for_page(doc: &'a Document, page_id: ObjectId) -> Self {
        let mut dictionaries = Vec::new();
        let mut node = doc.get_dictionary(page_id).ok();
        for _ in 0..MAX_TREE_DEPTH {
            let Some(current) = node else { break };
            if let Some(resources) = resolve_dict(doc, current.get(b"Resources").ok()) {
                dictionaries.push(resources);
            }
            node = current
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|parent| doc.get_dictionary(parent))
                .ok();
        }
        Self::from_dictionaries(doc, dictionaries)
    }

    fn from_dictionaries(doc: &'a Document, dictionaries: Vec<&'a Dictionary>) -> Self {
        let mut resources = Self {
            doc: Some(doc),
            ..Self::default()
        };

        for dictionary in dictionaries {
            if let Some(fonts) = resolve_dict(doc, dictionary.get(b"Font").ok()) {
                for (name, value) in fonts.iter() {
                    if resources.fonts.contains_key(name) {
                        continue;
                    }
                    let Some(font) = resolve_dict(doc, Some(value)) else {
                        continue;
                    };
                    match font.get_font_encoding(doc) {
                        Ok(encoding) => {
                            resources.fonts.insert(name.clone(), encoding);
                        }
                        Err(e) => debug!(
                            font = %String::from_utf8_lossy(name),
                            error = %e,
                            "font encoding unavailable"
                        ),
                    }
                }
            }

            if let Some(xobjects) = resolve_dict(doc, dictionary.get(b"XObject").ok()) {
                for (name, value) in xobjects.iter() {
                    let form = doc
                        .dereference(value)
                        .and_then(|(_, object)| object.as_stream())
                        .ok()
                        .filter(|stream| {
                            stream.dict.get(b"Subtype").and_then(Object::as_name).ok()
                                == Some(b"Form".as_slice())
                        });
                    if let Some(form) = form {
                        resources.forms.entry(name.clone()).or_insert(form);
                    }
                }
            }
        }

        resources
    }

    /// Resources declared by a form, if it declares any.
    fn for_form(&self, form: &'a Stream) -> Option<Self> {
        let doc = self.doc?;
        let dictionary = resolve_dict(doc, form.dict.get(b"Resources").ok())?;
        Some(Self::from_dictionaries(doc, vec![dictionary]))
    }

    fn decode(&self, font: Option<&[u8]>, bytes: &[u8]) -> String {
        font.and_then(|name| self.fonts.get(name))
            .and_then(|encoding| Document::decode_text(encoding, bytes).ok())
            .unwrap_or_else(|| decode_pdf_string(bytes))
    }

    fn shown_text(&self, font: Option<&[u8]>, operand: &Object) -> String {
        match operand {
            Object::String(bytes, _) => self.decode(font, bytes),
            Object::Array(items) => {
                let mut text = String::new();
                for item in items {
                    match item {
                        Object::String(bytes, _) => text.push_str(&self.decode(font, bytes)),
                        other => {
                            if number(other).is_some_and(|gap| gap <= WORD_GAP)
                                && !text.ends_with(' ')
                            {
                                text.push(' ');
                            }
                        }
                    }
                }
                text
            }
            _ => String::new(),
        }
    }
}

fn resolve_dict<'a>(doc: &'a Document, object: Option<&'a Object>) -> Option<&'a Dictionary> {
    doc.dereference(object?)
        .and_then(|(_, object)| object.as_dict())
        .ok()
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Vec<u8>>,
}

#[derive(Debug)]
struct TextState {
    graphics: GraphicsState,
    saved: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    leading: f32,
}

impl TextState {
    fn new(graphics: GraphicsState) -> Self {
        Self {
            graphics,
            saved: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            leading: 0.0,
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = multiply(&translation(tx, ty), &self.tlm);
        self.tm = self.tlm;
    }

    fn show(&self, resources: &PageResources<'_>, operand: &Object) -> String {
        resources.shown_text(self.graphics.font.as_deref(), operand)
    }

    fn origin(&self) -> (f32, f32) {
        let m = multiply(&self.tm, &self.graphics.ctm);
        (m[4], m[5])
    }
}

/// Extract text fragments from a decoded content stream.
///
/// # Errors
///
/// Returns `ParseError` if the content stream cannot be tokenized.
pub fn extract_fragments(content: &[u8], resources: &PageResources<'_>) -> Result<Vec<TextFragment>> {
    let mut fragments = Vec::new();
    let graphics = GraphicsState {
        ctm: IDENTITY,
        font: None,
    };
    walk(content, resources, graphics, 0, &mut fragments)?;
    Ok(fragments)
}

fn walk(
    content: &[u8],
    resources: &PageResources<'_>,
    graphics: GraphicsState,
    depth: usize,
    fragments: &mut Vec<TextFragment>,
) -> Result<()> {
    let content = Content::decode(content)
        .map_err(|e| PdfWorksError::parse_error("content stream", e.to_string()))?;

    let mut state = TextState::new(graphics);

    for operation in &content.operations {
        let operands = &operation.operands;
        let shown = match operation.operator.as_str() {
            "q" => {
                state.saved.push(state.graphics.clone());
                None
            }
            "Q" => {
                if let Some(graphics) = state.saved.pop() {
                    state.graphics = graphics;
                }
                None
            }
            "cm" => {
                if let Some(m) = matrix(operands) {
                    state.graphics.ctm = multiply(&m, &state.graphics.ctm);
                }
                None
            }
            "BT" => {
                state.tm = IDENTITY;
                state.tlm = IDENTITY;
                None
            }
            "Tf" => {
                if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                    state.graphics.font = Some(name.to_vec());
                }
                None
            }
            "Tm" => {
                if let Some(m) = matrix(operands) {
                    state.tm = m;
                    state.tlm = m;
                }
                None
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
                None
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(number),
                    operands.get(1).and_then(number),
                ) {
                    if operation.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
                None
            }
            "T*" => {
                state.move_line(0.0, -state.leading);
                None
            }
            "Tj" | "TJ" => operands.first().map(|text| state.show(resources, text)),
            "'" => {
                state.move_line(0.0, -state.leading);
                operands.first().map(|text| state.show(resources, text))
            }
            "\"" => {
                state.move_line(0.0, -state.leading);
                operands.get(2).map(|text| state.show(resources, text))
            }
            "Do" => {
                if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                    draw_form(name, resources, &state.graphics, depth, fragments)?;
                }
                None
            }
            _ => None,
        };

        if let Some(text) = shown.filter(|text| !text.is_empty()) {
            let (x, y) = state.origin();
            fragments.push(TextFragment { text, x, y });
        }
    }

    Ok(())
}

fn draw_form(
    name: &[u8],
    resources: &PageResources<'_>,
    graphics: &GraphicsState,
    depth: usize,
    fragments: &mut Vec<TextFragment>,
) -> Result<()> {
    let Some(&form) = resources.forms.get(name) else {
        return Ok(());
    };
    if depth >= MAX_FORM_DEPTH {
        warn!(form = %String::from_utf8_lossy(name), "form nesting too deep, skipping");
        return Ok(());
    }

    let content = form
        .get_plain_content()
        .map_err(|e| PdfWorksError::parse_error("form content", e.to_string()))?;
    let form_matrix = form
        .dict
        .get(b"Matrix")
        .and_then(Object::as_array)
        .ok()
        .and_then(|values| matrix(values))
        .unwrap_or(IDENTITY);
    let nested = GraphicsState {
        ctm: multiply(&form_matrix, &graphics.ctm),
        font: graphics.font.clone(),
    };

    match resources.for_form(form) {
        Some(own) => walk(&content, &own, nested, depth + 1, fragments),
        None => walk(&content, resources, nested, depth + 1, fragments),
    }
}
