//! Helpers shared by the integration tests.
//!
//! Documents are generated in memory with lopdf so the tests need no
//! fixture files.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pdfworks::backend::{DocumentReader, LopdfReader, ParsedDocument};
use pdfworks::document::DocumentHandle;

/// Build a PDF whose page `n` is `200 + n` points wide and 300 high,
/// showing the line "Page n".
pub fn sample_pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 200.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {n}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("Failed to encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (200 + n as i64).into(), 300.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save sample PDF");
    bytes
}

/// Build a two-page PDF whose text only decodes through font encodings.
///
/// Page 1 shows "Café “quoted”" through a WinAnsi font. Page 2 draws a
/// form that shows "Øl" through an Identity-H font with a ToUnicode map.
/// Both pages inherit their resources from the page tree root.
pub fn typeset_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let win_ansi = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "TrueType",
        "BaseFont" => "Georgia",
        "Encoding" => "WinAnsiEncoding",
    });
    let cmap = doc.add_object(Stream::new(dictionary! {}, TO_UNICODE.to_vec()));
    let identity = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "ABCDEF+NotoSans",
        "Encoding" => "Identity-H",
        "ToUnicode" => cmap,
    });
    let form = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
        },
        b"BT /F2 10 Tf 20 40 Td <00010002> Tj ET".to_vec(),
    ));

    let first = doc.add_object(Stream::new(
        dictionary! {},
        b"BT /F1 11 Tf 72 700 Td [<436166E9> -300 <9371756F74656494>] TJ ET".to_vec(),
    ));
    let second = doc.add_object(Stream::new(
        dictionary! {},
        b"q 2 0 0 2 0 0 cm /Fm0 Do Q".to_vec(),
    ));

    let mut kids = Vec::new();
    for content in [first, second] {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => win_ansi, "F2" => identity },
                "XObject" => dictionary! { "Fm0" => form },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save typeset PDF");
    bytes
}

const TO_UNICODE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0001> <00D8>
<0002> <006C>
endbfchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

/// Open a generated document under `name`.
pub fn open_sample(pages: u32, name: &str) -> DocumentHandle {
    DocumentHandle::open(&LopdfReader::new(), sample_pdf(pages), name)
        .expect("Failed to open sample PDF")
}

/// Page widths of serialized output, in page order.
///
/// The widths identify which source pages were copied, and swap with
/// the height on quarter-turn rotations.
pub fn page_widths(bytes: &[u8]) -> Vec<f32> {
    let parsed = LopdfReader::new()
        .parse(bytes, "output.pdf")
        .expect("Output is not a readable PDF");
    (0..parsed.page_count())
        .map(|index| parsed.page_size(index).expect("Missing page size").width)
        .collect()
}

/// Write a generated PDF into `dir`.
pub fn write_sample(dir: &Path, name: &str, pages: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, sample_pdf(pages)).expect("Failed to write sample PDF");
    path
}
