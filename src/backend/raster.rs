//! Raster encoding helpers shared by the writer and the engine.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use std::borrow::Cow;
use std::io::Cursor;

use super::RasterFormat;
use crate::error::{PdfWorksError, Result};

/// Composite an RGBA image onto a white background.
pub fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode as JPEG at `quality` in `0.0..=1.0`, over a white background.
pub fn encode_jpeg(image: &RgbaImage, quality: f32) -> Result<Vec<u8>> {
    let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
    let rgb = flatten_on_white(image);

    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.encode_image(&rgb)?;
    Ok(buffer)
}

/// Encode as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, ImageFormat::Png)?;
    Ok(cursor.into_inner())
}

/// Detect PNG or JPEG from the leading bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<RasterFormat> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some(RasterFormat::Png),
        ImageFormat::Jpeg => Some(RasterFormat::Jpeg),
        _ => None,
    }
}

/// Bring any decodable image into an embeddable format.
///
/// PNG and JPEG pass through untouched; everything else is decoded and
/// re-encoded as PNG.
///
/// # Errors
///
/// Returns `EncodeError` if the bytes are not a decodable image.
pub fn normalize_for_embedding(bytes: &[u8]) -> Result<(Cow<'_, [u8]>, RasterFormat)> {
    if let Some(format) = sniff_format(bytes) {
        return Ok((Cow::Borrowed(bytes), format));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| PdfWorksError::encode_error(format!("unsupported image data: {e}")))?;
    let png = encode_png(&decoded.to_rgba8())?;
    Ok((Cow::Owned(png), RasterFormat::Png))
}

/// Decode any supported image to RGBA.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(DynamicImage::into_rgba8)
        .map_err(|e| PdfWorksError::encode_error(format!("cannot decode image: {e}")))
}
