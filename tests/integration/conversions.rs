//! Conversions between PDF, images, HTML and text.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::{ImageFormat as Encoding, Rgba, RgbaImage};
use pdfworks::backend::{LopdfReader, LopdfWriter, PageRasterizer};
use pdfworks::config::{
    EngineConfig, ExportQuality, FitPolicy, HtmlPageSize, ImageFormat, PageSizePolicy,
    RasterQuality, TextFormat, TextOptions,
};
use pdfworks::document::DocumentHandle;
use pdfworks::engine::{
    HtmlSnapshotter, HtmlSource, Operation, PageScope, RasterInput, TransformEngine,
};
use pdfworks::progress::NoProgress;
use pdfworks::{PdfWorksError, Result};

use crate::common::{page_widths, sample_pdf, typeset_pdf};

/// Renders page `i` as a gray image `(100 + i) * scale` pixels wide.
struct GrayRasterizer;

impl PageRasterizer for GrayRasterizer {
    fn render(&self, _bytes: &[u8], index: u32, scale: f32) -> Result<RgbaImage> {
        let width = ((100 + index) as f32 * scale).round() as u32;
        let height = (150.0 * scale).round() as u32;
        Ok(RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255])))
    }
}

fn rendering_engine() -> TransformEngine {
    TransformEngine::with_backends(
        LopdfReader::with_rasterizer(Arc::new(GrayRasterizer)),
        LopdfWriter::new(),
        EngineConfig::default(),
    )
}

fn open(engine: &TransformEngine, pages: u32, name: &str) -> DocumentHandle {
    DocumentHandle::open(engine.reader(), sample_pdf(pages), name).expect("Failed to open sample")
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(width, height, Rgba([20, 40, 60, 255]))
        .write_to(&mut Cursor::new(&mut bytes), Encoding::Png)
        .expect("Failed to encode PNG");
    bytes
}

#[tokio::test]
async fn test_compress_keeps_page_geometry() {
    let engine = rendering_engine();
    let document = open(&engine, 3, "brochure.pdf");

    let result = engine
        .execute(
            Operation::Compress {
                document: &document,
                quality: RasterQuality::Low,
            },
            &NoProgress,
        )
        .await
        .expect("Compress failed");

    assert_eq!(result.suggested_file_name, "brochure_compressed.pdf");
    assert_eq!(page_widths(&result.bytes), vec![201.0, 202.0, 203.0]);
    assert_eq!(result.summary.original_size, Some(document.size()));
}

#[tokio::test]
async fn test_compress_without_renderer_is_unsupported() {
    let engine = TransformEngine::default();
    let document = open(&engine, 1, "brochure.pdf");

    let err = engine
        .execute(
            Operation::Compress {
                document: &document,
                quality: RasterQuality::Medium,
            },
            &NoProgress,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PdfWorksError::Unsupported { .. }));
}

#[tokio::test]
async fn test_images_to_pdf_on_a4() {
    let images = vec![
        RasterInput::new("wide.png", png(400, 100)),
        RasterInput::new("tall.png", png(100, 400)),
    ];

    let result = TransformEngine::default()
        .execute(
            Operation::ImagesToPdf {
                images: &images,
                page_size: PageSizePolicy::A4,
                fit: FitPolicy::Contain,
            },
            &NoProgress,
        )
        .await
        .expect("Images to PDF failed");

    assert_eq!(result.suggested_file_name, "images_combined.pdf");
    let widths = page_widths(&result.bytes);
    assert_eq!(widths.len(), 2);
    assert!(widths.iter().all(|w| (w - 595.28).abs() < 0.01));
}

#[tokio::test]
async fn test_export_all_pages_as_zip() {
    let engine = rendering_engine();
    let document = open(&engine, 2, "deck.pdf");

    let result = engine
        .execute(
            Operation::PdfToImages {
                document: &document,
                scope: &PageScope::All,
                format: ImageFormat::Png,
                quality: ExportQuality::Standard,
            },
            &NoProgress,
        )
        .await
        .expect("Export failed");

    assert_eq!(result.suggested_file_name, "deck_images.zip");
    assert_eq!(result.media_type, "application/zip");

    let mut archive = zip::ZipArchive::new(Cursor::new(result.bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["images/", "images/page_1.png", "images/page_2.png"]
    );

    let mut entry = archive.by_name("images/page_2.png").unwrap();
    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut entry, &mut bytes).unwrap();
    assert_eq!(image::load_from_memory(&bytes).unwrap().width(), 101);
}

#[tokio::test]
async fn test_text_without_markers_or_line_breaks() {
    let engine = TransformEngine::default();
    let document = open(&engine, 2, "minutes.pdf");

    let result = engine
        .execute(
            Operation::PdfToText {
                document: &document,
                options: TextOptions {
                    format: TextFormat::Plain,
                    preserve_line_breaks: false,
                    include_page_numbers: false,
                },
            },
            &NoProgress,
        )
        .await
        .expect("Text extraction failed");

    assert_eq!(result.suggested_file_name, "minutes.txt");
    assert_eq!(String::from_utf8(result.bytes).unwrap(), "Page 1\n\nPage 2");
    assert_eq!(result.summary.word_count, Some(4));
}

#[tokio::test]
async fn test_text_decodes_font_encodings_and_forms() {
    let engine = TransformEngine::default();
    let document = DocumentHandle::open(engine.reader(), typeset_pdf(), "menu.pdf")
        .expect("Failed to open typeset PDF");

    let result = engine
        .execute(
            Operation::PdfToText {
                document: &document,
                options: TextOptions::default(),
            },
            &NoProgress,
        )
        .await
        .expect("Text extraction failed");

    assert_eq!(
        String::from_utf8(result.bytes).unwrap(),
        "--- Page 1 ---\n\nCafé “quoted”\n\n--- Page 2 ---\n\nØl"
    );
}

#[tokio::test]
async fn test_docx_keeps_decoded_text() {
    let engine = TransformEngine::default();
    let document = DocumentHandle::open(engine.reader(), typeset_pdf(), "menu.pdf")
        .expect("Failed to open typeset PDF");

    let result = engine
        .execute(
            Operation::PdfToText {
                document: &document,
                options: TextOptions {
                    format: TextFormat::Docx,
                    ..Default::default()
                },
            },
            &NoProgress,
        )
        .await
        .expect("Text extraction failed");

    let mut archive = zip::ZipArchive::new(Cursor::new(result.bytes)).unwrap();
    let mut part = archive.by_name("word/document.xml").unwrap();
    let mut xml = String::new();
    std::io::Read::read_to_string(&mut part, &mut xml).unwrap();
    assert!(xml.contains("Café “quoted”"));
    assert!(xml.contains("Øl"));
}

#[tokio::test]
async fn test_docx_without_writer_falls_back_to_rtf() {
    let engine = TransformEngine::default().with_rich_writer(None);
    let document = open(&engine, 1, "minutes.pdf");

    let result = engine
        .execute(
            Operation::PdfToText {
                document: &document,
                options: TextOptions {
                    format: TextFormat::Docx,
                    ..Default::default()
                },
            },
            &NoProgress,
        )
        .await
        .expect("Text extraction failed");

    assert_eq!(result.suggested_file_name, "minutes.rtf");
    assert!(result.summary.rtf_fallback);
    assert!(result.bytes.starts_with(b"{\\rtf1"));
}

struct PlainSnapshot;

#[async_trait]
impl HtmlSnapshotter for PlainSnapshot {
    async fn snapshot(&self, _: &HtmlSource, width_px: u32, oversample: f32) -> Result<RgbaImage> {
        let width = (width_px as f32 * oversample) as u32;
        let height = (400.0 * oversample) as u32;
        Ok(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }
}

#[tokio::test]
async fn test_html_auto_page() {
    let engine = TransformEngine::default().with_html_snapshotter(Box::new(PlainSnapshot));
    let source = HtmlSource::Markup("<h1>Invoice</h1>".into());

    let result = engine
        .execute(
            Operation::HtmlToPdf {
                source: &source,
                page_size: HtmlPageSize::Auto,
            },
            &NoProgress,
        )
        .await
        .expect("HTML conversion failed");

    assert_eq!(result.suggested_file_name, "html_export.pdf");
    let widths = page_widths(&result.bytes);
    assert_eq!(widths.len(), 1);
    assert!((widths[0] - 595.28).abs() < 0.01);
}
