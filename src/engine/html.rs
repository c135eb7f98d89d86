//! HTML-to-PDF through an injected renderer.
//!
//! The renderer produces one tall snapshot of the laid-out content. Fixed
//! page sizes slice that snapshot into contiguous pixel bands, one per
//! page; the auto size puts it on a single page sized to the content.

use async_trait::async_trait;
use image::RgbaImage;
use image::imageops::crop_imm;
use tracing::{debug, instrument};

use super::{HTML_FILE_NAME, PDF_MEDIA_TYPE, TransformEngine, TransformResult, TransformSummary};
use crate::backend::raster::encode_png;
use crate::backend::{DocumentReader, DocumentWriter, PageSize, RasterFormat, Rect, SaveOptions};
use crate::config::HtmlPageSize;
use crate::error::{PdfWorksError, Result};
use crate::progress::Progress;

/// Width in points of content-sized pages.
const AUTO_PAGE_WIDTH: f32 = 595.28;

/// What to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlSource {
    /// Inline markup.
    Markup(String),
    /// Address of a page sharing the document's origin.
    Url(String),
}

/// Renders HTML into pixels.
#[async_trait]
pub trait HtmlSnapshotter: Send + Sync {
    /// Lay out `source` in a container `width_px` CSS pixels wide and
    /// render it at `oversample` device pixels per CSS pixel, on white.
    ///
    /// Implementations report `CrossOriginBlocked` when a URL cannot be
    /// read and `ParseError` for content that cannot be loaded.
    async fn snapshot(&self, source: &HtmlSource, width_px: u32, oversample: f32)
    -> Result<RgbaImage>;
}

/// `scheme://host[:port]` of an absolute URL, lowercased. `None` for
/// relative URLs.
pub fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
        return None;
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if host.is_empty() {
        return None;
    }

    Some(format!("{}://{}", scheme.to_lowercase(), host.to_lowercase()))
}

fn check_origin(url: &str, document_origin: Option<&str>) -> Result<()> {
    let (Some(expected), Some(actual)) = (document_origin, origin_of(url)) else {
        return Ok(());
    };

    let expected = origin_of(expected).unwrap_or_else(|| expected.to_lowercase());
    if actual != expected {
        return Err(PdfWorksError::CrossOriginBlocked {
            url: url.to_string(),
        });
    }
    Ok(())
}

/// Row bands `[start, end)` of an `image_width` × `image_height` snapshot,
/// one per page when drawn at `page.width`.
///
/// Band `k` covers `round(k × h) .. round((k + 1) × h)` where `h` is the
/// page height in snapshot pixels, clamped to the image, so consecutive
/// bands neither overlap nor leave gaps.
pub fn paginate_bands(image_width: u32, image_height: u32, page: PageSize) -> Vec<(u32, u32)> {
    if image_width == 0 || image_height == 0 {
        return Vec::new();
    }

    let scale = f64::from(page.width) / f64::from(image_width);
    let page_height_px = f64::from(page.height) / scale;
    let pages = ((f64::from(image_height) * scale) / f64::from(page.height)).ceil().max(1.0) as u32;

    (0..pages)
        .map(|k| {
            let start = (f64::from(k) * page_height_px).round() as u32;
            let end = (f64::from(k + 1) * page_height_px).round() as u32;
            (start.min(image_height), end.min(image_height))
        })
        .filter(|(start, end)| start < end)
        .collect()
}

impl<R, W> TransformEngine<R, W>
where
    R: DocumentReader,
    W: DocumentWriter,
{
    async fn snapshot(&self, source: &HtmlSource, width_px: u32) -> Result<RgbaImage> {
        let snapshotter = self.snapshotter.as_deref().ok_or_else(|| {
            PdfWorksError::unsupported(
                "HTML conversion",
                "no HTML renderer is installed on this engine",
            )
        })?;

        if let HtmlSource::Url(url) = source {
            check_origin(url, self.config.document_origin.as_deref())?;
        }

        let limit = self.config.html_load_timeout;
        let image = tokio::time::timeout(
            limit,
            snapshotter.snapshot(source, width_px, self.config.html_oversampling),
        )
        .await
        .map_err(|_| PdfWorksError::Timeout {
            what: "HTML load".to_string(),
            seconds: limit.as_secs_f64(),
        })??;

        if image.width() == 0 || image.height() == 0 {
            return Err(PdfWorksError::encode_error("HTML snapshot is empty"));
        }
        Ok(image)
    }

    #[instrument(skip(self, source, progress))]
    pub(super) async fn html_to_pdf(
        &self,
        source: &HtmlSource,
        page_size: HtmlPageSize,
        progress: &Progress<'_>,
    ) -> Result<TransformResult> {
        progress.report(10);
        let image = self.snapshot(source, page_size.container_width()).await?;
        progress.report(50);
        debug!(width = image.width(), height = image.height(), "snapshot taken");

        let mut target = self.writer.create();

        match page_size.page_size() {
            None => {
                let drawn_height = image.height() as f32 / image.width() as f32 * AUTO_PAGE_WIDTH;
                let size = PageSize::new(
                    AUTO_PAGE_WIDTH,
                    drawn_height.min(self.config.auto_page_max_height),
                );

                let png = encode_png(&image)?;
                let embedded = self.writer.embed_raster(&mut target, &png, RasterFormat::Png)?;
                let page = self.writer.add_blank_page(&mut target, size)?;
                // Top aligned; anything past the height cap falls off the bottom.
                let rect = Rect::new(0.0, size.height - drawn_height, AUTO_PAGE_WIDTH, drawn_height);
                self.writer.draw_image(&mut target, page, embedded.id, rect)?;
                progress.report(90);
            }
            Some(size) => {
                let scale = size.width / image.width() as f32;
                let bands = paginate_bands(image.width(), image.height(), size);

                for (k, &(start, end)) in bands.iter().enumerate() {
                    let band = crop_imm(&image, 0, start, image.width(), end - start).to_image();
                    let png = encode_png(&band)?;
                    let embedded = self.writer.embed_raster(&mut target, &png, RasterFormat::Png)?;

                    let page = self.writer.add_blank_page(&mut target, size)?;
                    let band_height = (end - start) as f32 * scale;
                    let rect = Rect::new(0.0, size.height - band_height, size.width, band_height);
                    self.writer.draw_image(&mut target, page, embedded.id, rect)?;

                    progress.report_fraction(50, 40, k + 1, bands.len());
                    tokio::task::yield_now().await;
                }
            }
        }

        let bytes = self.writer.save(&mut target, SaveOptions::default())?;
        let page_count = self.writer.pages(&target).len() as u32;

        Ok(TransformResult::new(
            bytes,
            HTML_FILE_NAME.to_string(),
            PDF_MEDIA_TYPE,
            TransformSummary {
                label: format!("{page_count} page(s)"),
                page_count,
                ..Default::default()
            },
        ))
    }
}
