//! Images-to-PDF: one page per image.

use std::borrow::Cow;
use tracing::{debug, instrument};

use super::pages::plural;
use super::{IMAGES_FILE_NAME, PDF_MEDIA_TYPE, TransformEngine, TransformResult, TransformSummary};
use crate::backend::raster::{normalize_for_embedding, sniff_format};
use crate::backend::{DocumentReader, DocumentWriter, PageSize, RasterFormat, Rect, SaveOptions};
use crate::config::{FitPolicy, PageSizePolicy};
use crate::error::{PdfWorksError, Result};
use crate::progress::Progress;
use crate::validation::InputKind;

/// An encoded image waiting to become a page.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInput {
    name: String,
    bytes: Vec<u8>,
    format: Option<RasterFormat>,
}

impl RasterInput {
    /// Wrap encoded image bytes. PNG and JPEG are recognized up front;
    /// other formats are converted when embedded.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let format = sniff_format(&bytes);
        Self {
            name: name.into(),
            bytes,
            format,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Directly embeddable format, if any.
    pub fn format(&self) -> Option<RasterFormat> {
        self.format
    }
}

/// Where an `image_width` × `image_height` image lands on `page`.
///
/// Contain and cover keep the aspect ratio and center the image; cover may
/// overflow the page, which clips it.
pub fn place_image(image_width: f32, image_height: f32, page: PageSize, fit: FitPolicy) -> Rect {
    let image_ratio = image_width / image_height;
    let page_ratio = page.aspect_ratio();

    let (width, height) = match fit {
        FitPolicy::Stretch => return Rect::full_page(page),
        FitPolicy::Contain if image_ratio > page_ratio => {
            (page.width, page.width / image_ratio)
        }
        FitPolicy::Contain => (page.height * image_ratio, page.height),
        FitPolicy::Cover if image_ratio > page_ratio => (page.height * image_ratio, page.height),
        FitPolicy::Cover => (page.width, page.width / image_ratio),
    };

    Rect::new(
        (page.width - width) / 2.0,
        (page.height - height) / 2.0,
        width,
        height,
    )
}

impl<R, W> TransformEngine<R, W>
where
    R: DocumentReader,
    W: DocumentWriter,
{
    #[instrument(skip(self, images, progress), fields(images = images.len()))]
    pub(super) async fn images_to_pdf(
        &self,
        images: &[RasterInput],
        page_size: PageSizePolicy,
        fit: FitPolicy,
        progress: &Progress<'_>,
    ) -> Result<TransformResult> {
        if images.is_empty() {
            return Err(PdfWorksError::InsufficientInputs {
                required: 1,
                actual: 0,
            });
        }
        for image in images {
            self.validator.validate_upload(
                image.name(),
                image.bytes().len() as u64,
                None,
                InputKind::Image,
            )?;
        }

        let mut target = self.writer.create();

        for (i, image) in images.iter().enumerate() {
            let (bytes, format) = match image.format() {
                Some(format) => (Cow::Borrowed(image.bytes()), format),
                None => normalize_for_embedding(image.bytes()).map_err(|e| {
                    PdfWorksError::encode_error(format!("{}: {e}", image.name()))
                })?,
            };
            let embedded = self.writer.embed_raster(&mut target, &bytes, format)?;

            let (size, rect) = match page_size.fixed_size() {
                Some(size) => (
                    size,
                    place_image(embedded.width as f32, embedded.height as f32, size, fit),
                ),
                None => {
                    let size = PageSize::new(embedded.width as f32, embedded.height as f32);
                    (size, Rect::full_page(size))
                }
            };

            let page = self.writer.add_blank_page(&mut target, size)?;
            self.writer.draw_image(&mut target, page, embedded.id, rect)?;
            debug!(
                name = image.name(),
                width = embedded.width,
                height = embedded.height,
                "image placed"
            );

            progress.report_fraction(0, 90, i + 1, images.len());
            tokio::task::yield_now().await;
        }

        let bytes = self.writer.save(&mut target, SaveOptions::default())?;

        let count = images.len();
        Ok(TransformResult::new(
            bytes,
            IMAGES_FILE_NAME.to_string(),
            PDF_MEDIA_TYPE,
            TransformSummary {
                label: format!("{count} image{} converted to PDF", plural(count)),
                page_count: count as u32,
                image_count: Some(count),
                ..Default::default()
            },
        ))
    }
}
