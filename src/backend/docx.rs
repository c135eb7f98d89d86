//! Minimal WordprocessingML writer.
//!
//! Produces a `.docx` package with one "Page N" heading per page followed by
//! one paragraph per line of text. Only the parts Word needs to open the file
//! are written: content types, package relationships, the main document and
//! a style sheet defining the heading.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use super::{PageText, RichDocumentWriter};
use crate::error::{PdfWorksError, Result};

const WORD_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/><w:sz w:val="24"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
</w:styles>"#;

/// [`RichDocumentWriter`] producing `.docx` packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxWriter;

impl DocxWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self
    }
}

fn write(xml: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    xml.write_event(event)
        .map_err(|e| PdfWorksError::write_error(format!("word/document.xml: {e}")))
}

/// One paragraph holding a single run of `text`.
fn paragraph(xml: &mut Writer<Vec<u8>>, text: &str, style: Option<&str>) -> Result<()> {
    write(xml, Event::Start(BytesStart::new("w:p")))?;
    if let Some(style) = style {
        write(xml, Event::Start(BytesStart::new("w:pPr")))?;
        let style = BytesStart::new("w:pStyle").with_attributes([("w:val", style)]);
        write(xml, Event::Empty(style))?;
        write(xml, Event::End(BytesEnd::new("w:pPr")))?;
    }

    // Control characters are not allowed in XML 1.0.
    let text: String = text
        .chars()
        .filter(|&c| !c.is_control() || c == '\t')
        .collect();
    write(xml, Event::Start(BytesStart::new("w:r")))?;
    let run = BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]);
    write(xml, Event::Start(run))?;
    write(xml, Event::Text(BytesText::new(&text)))?;
    write(xml, Event::End(BytesEnd::new("w:t")))?;
    write(xml, Event::End(BytesEnd::new("w:r")))?;
    write(xml, Event::End(BytesEnd::new("w:p")))
}

fn document_xml(pages: &[PageText]) -> Result<Vec<u8>> {
    let mut xml = Writer::new(Vec::new());
    write(
        &mut xml,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
    )?;
    let root = BytesStart::new("w:document").with_attributes([("xmlns:w", WORD_NAMESPACE)]);
    write(&mut xml, Event::Start(root))?;
    write(&mut xml, Event::Start(BytesStart::new("w:body")))?;

    for page in pages {
        paragraph(&mut xml, &format!("Page {}", page.number), Some("Heading2"))?;
        for line in page.text.lines() {
            paragraph(&mut xml, line, None)?;
        }
    }

    write(&mut xml, Event::Empty(BytesStart::new("w:sectPr")))?;
    write(&mut xml, Event::End(BytesEnd::new("w:body")))?;
    write(&mut xml, Event::End(BytesEnd::new("w:document")))?;
    Ok(xml.into_inner())
}

impl RichDocumentWriter for DocxWriter {
    fn write_document(&self, pages: &[PageText]) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

            let document = document_xml(pages)?;
            let parts: [(&str, &[u8]); 5] = [
                ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
                ("_rels/.rels", PACKAGE_RELS.as_bytes()),
                ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
                ("word/styles.xml", STYLES.as_bytes()),
                ("word/document.xml", &document),
            ];

            for (name, content) in parts {
                zip.start_file(name, options)?;
                zip.write_all(content)?;
            }

            zip.finish()?;
        }
        Ok(buffer)
    }
}
