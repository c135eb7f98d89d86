//! Rasterize-compress: every page is replaced by a JPEG of itself.

use tracing::{debug, instrument};

use super::{PDF_MEDIA_TYPE, TransformEngine, TransformResult, TransformSummary};
use crate::backend::raster::encode_jpeg;
use crate::backend::{
    DocumentReader, DocumentWriter, ParsedDocument, RasterFormat, Rect, SaveOptions,
};
use crate::config::RasterQuality;
use crate::document::DocumentHandle;
use crate::error::Result;
use crate::progress::Progress;
use crate::utils::{format_file_size, suffixed_name};

/// `round((1 - new / original) * 100)`; negative when the output grew.
pub fn reduction_percent(original: u64, new: u64) -> i64 {
    if original == 0 {
        return 0;
    }
    ((1.0 - new as f64 / original as f64) * 100.0).round() as i64
}

impl<R, W> TransformEngine<R, W>
where
    R: DocumentReader,
    W: DocumentWriter,
{
    #[instrument(skip(self, document, progress), fields(document = document.display_name()))]
    pub(super) async fn compress(
        &self,
        document: &DocumentHandle,
        quality: RasterQuality,
        progress: &Progress<'_>,
    ) -> Result<TransformResult> {
        let parsed = self.reader.parse(document.bytes(), document.display_name())?;
        let page_count = parsed.page_count();
        let mut target = self.writer.create();

        for index in 0..page_count {
            let size = parsed.page_size(index)?;
            let image = parsed.render_page(index, quality.render_scale())?;
            let jpeg = encode_jpeg(&image, quality.encode_quality())?;

            let page = self.writer.add_blank_page(&mut target, size)?;
            let embedded = self.writer.embed_raster(&mut target, &jpeg, RasterFormat::Jpeg)?;
            self.writer
                .draw_image(&mut target, page, embedded.id, Rect::full_page(size))?;
            debug!(page = index + 1, jpeg_bytes = jpeg.len(), "page re-encoded");

            progress.report_fraction(0, 90, index as usize + 1, page_count as usize);
            tokio::task::yield_now().await;
        }

        let bytes = self.writer.save(&mut target, SaveOptions::default())?;

        let original = document.size();
        let output_size = bytes.len() as u64;
        let raw = reduction_percent(original, output_size);
        let display = raw.clamp(0, 100) as u8;

        Ok(TransformResult::new(
            bytes,
            suffixed_name(&document.base_name(), "_compressed", "pdf"),
            PDF_MEDIA_TYPE,
            TransformSummary {
                label: format!(
                    "{} → {} ({display}% smaller)",
                    format_file_size(original),
                    format_file_size(output_size)
                ),
                page_count,
                original_size: Some(original),
                reduction_percent: Some(display),
                raw_reduction_percent: Some(raw),
                ..Default::default()
            },
        ))
    }
}
