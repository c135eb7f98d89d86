//! PDF-to-images export.

use std::io::{Cursor, Write};
use tracing::{debug, instrument};
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use super::pages::{check_selection, plural};
use super::{PageScope, TransformEngine, TransformResult, TransformSummary, ZIP_MEDIA_TYPE};
use crate::backend::raster::{encode_jpeg, encode_png};
use crate::backend::{DocumentReader, DocumentWriter, ParsedDocument};
use crate::config::{ExportQuality, ImageFormat};
use crate::document::DocumentHandle;
use crate::error::{PdfWorksError, Result};
use crate::progress::Progress;

/// One rendered page.
struct PageImage {
    number: u32,
    bytes: Vec<u8>,
}

fn zip_images(images: &[PageImage], extension: &str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);

        zip.add_directory("images/", options)?;
        for image in images {
            zip.start_file(format!("images/page_{}.{extension}", image.number), options)?;
            zip.write_all(&image.bytes)?;
        }
        zip.finish()?;
    }
    Ok(buffer)
}

impl<R, W> TransformEngine<R, W>
where
    R: DocumentReader,
    W: DocumentWriter,
{
    #[instrument(skip(self, document, scope, progress), fields(document = document.display_name()))]
    pub(super) async fn pdf_to_images(
        &self,
        document: &DocumentHandle,
        scope: &PageScope,
        format: ImageFormat,
        quality: ExportQuality,
        progress: &Progress<'_>,
    ) -> Result<TransformResult> {
        let pages: Vec<u32> = match scope {
            PageScope::All => (1..=document.page_count()).collect(),
            PageScope::Selection(selection) => {
                check_selection(document, selection)?;
                if selection.is_empty() {
                    return Err(PdfWorksError::EmptySelection);
                }
                selection.iter().collect()
            }
        };

        let parsed = self.reader.parse(document.bytes(), document.display_name())?;
        let mut images = Vec::with_capacity(pages.len());

        for (i, &number) in pages.iter().enumerate() {
            let rendered = parsed.render_page(number - 1, quality.render_scale())?;
            let bytes = match format {
                ImageFormat::Png => encode_png(&rendered)?,
                ImageFormat::Jpeg => encode_jpeg(&rendered, self.config.jpeg_export_quality)?,
            };
            debug!(page = number, bytes = bytes.len(), "page rendered");
            images.push(PageImage { number, bytes });

            progress.report_fraction(0, 90, i + 1, pages.len());
            tokio::task::yield_now().await;
        }

        let base = document.base_name();
        let extension = format.extension();
        let count = images.len();
        let summary = TransformSummary {
            label: format!(
                "{count} image{} ({} format)",
                plural(count),
                extension.to_uppercase()
            ),
            page_count: count as u32,
            image_count: Some(count),
            ..Default::default()
        };

        match images.as_slice() {
            [single] => Ok(TransformResult::new(
                single.bytes.clone(),
                format!("{base}_page_{}.{extension}", single.number),
                format.media_type(),
                summary,
            )),
            _ => Ok(TransformResult::new(
                zip_images(&images, extension)?,
                format!("{base}_images.zip"),
                ZIP_MEDIA_TYPE,
                TransformSummary {
                    file_count: Some(count),
                    ..summary
                },
            )),
        }
    }
}
