//! Page rasterization through a PDFium shared library.
//!
//! PDFium is bound once, on a dedicated worker thread that owns the library
//! for the rasterizer's lifetime. The worker keeps the most recently loaded
//! document, so rendering every page of one file parses it once.

use image::RgbaImage;
use pdfium_render::prelude::*;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::debug;

use super::PageRasterizer;
use crate::error::{PdfWorksError, Result};

/// Identifies document bytes without keeping them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DocumentKey {
    len: usize,
    digest: u64,
}

impl DocumentKey {
    fn of(bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self {
            len: bytes.len(),
            digest: hasher.finish(),
        }
    }
}

struct RenderJob {
    key: DocumentKey,
    /// Present when the worker does not hold this document yet.
    document: Option<Vec<u8>>,
    index: u32,
    scale: f32,
    reply: Sender<Result<RgbaImage>>,
}

#[derive(Debug)]
struct Worker {
    jobs: Sender<RenderJob>,
    loaded: Option<DocumentKey>,
}

/// [`PageRasterizer`] backed by PDFium.
///
/// The library is looked up in the given directory first (the working
/// directory by default), then on the system search path. Renders are
/// serialized through one worker thread.
#[derive(Debug)]
pub struct PdfiumRasterizer {
    worker: Mutex<Worker>,
}

impl PdfiumRasterizer {
    /// Locate PDFium and bind it.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` if no PDFium library can be loaded.
    pub fn new() -> Result<Self> {
        Self::with_library_dir(PathBuf::from("./"))
    }

    /// Look for PDFium in `library_dir` before the system search path.
    pub fn with_library_dir(library_dir: PathBuf) -> Result<Self> {
        let (jobs, queue) = mpsc::channel();
        let (ready, bound) = mpsc::channel();

        thread::Builder::new()
            .name("pdfium".into())
            .spawn(move || match bind(&library_dir) {
                Ok(pdfium) => {
                    let _ = ready.send(Ok(()));
                    serve(&pdfium, queue);
                }
                Err(e) => {
                    let _ = ready.send(Err(e));
                }
            })
            .map_err(|e| {
                PdfWorksError::unsupported("Page rendering", format!("worker thread failed ({e})"))
            })?;

        bound.recv().map_err(|_| worker_stopped())??;
        debug!("PDFium bound");

        Ok(Self {
            worker: Mutex::new(Worker {
                jobs,
                loaded: None,
            }),
        })
    }
}

fn bind(library_dir: &Path) -> Result<Pdfium> {
    let bindings =
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(library_dir))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| {
                PdfWorksError::unsupported(
                    "Page rendering",
                    format!("PDFium library could not be loaded ({e})"),
                )
            })?;
    Ok(Pdfium::new(bindings))
}

fn worker_stopped() -> PdfWorksError {
    PdfWorksError::unsupported("Page rendering", "PDFium worker stopped")
}

fn serve(pdfium: &Pdfium, queue: Receiver<RenderJob>) {
    let mut current: Option<(DocumentKey, PdfDocument<'_>)> = None;

    for job in queue {
        if let Some(bytes) = job.document {
            current = None;
            match pdfium.load_pdf_from_byte_vec(bytes, None) {
                Ok(document) => {
                    debug!(bytes = job.key.len, "document loaded into PDFium");
                    current = Some((job.key, document));
                }
                Err(e) => {
                    let _ = job
                        .reply
                        .send(Err(PdfWorksError::parse_error("document", e.to_string())));
                    continue;
                }
            }
        }

        let result = match &current {
            Some((key, document)) if *key == job.key => render_page(document, job.index, job.scale),
            _ => Err(PdfWorksError::parse_error("document", "not loaded into PDFium")),
        };
        let _ = job.reply.send(result);
    }
}

fn render_page(document: &PdfDocument<'_>, index: u32, scale: f32) -> Result<RgbaImage> {
    let page = document
        .pages()
        .iter()
        .nth(index as usize)
        .ok_or_else(|| {
            PdfWorksError::parse_error("document", format!("page {} out of range", index + 1))
        })?;

    let config = PdfRenderConfig::new().scale_page_by_factor(scale);
    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| PdfWorksError::encode_error(format!("render failed: {e}")))?;

    let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
    let image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
        .ok_or_else(|| PdfWorksError::encode_error("rendered bitmap has an unexpected size"))?;
    debug!(index, scale, width = image.width(), height = image.height(), "rendered page");
    Ok(image)
}

impl PageRasterizer for PdfiumRasterizer {
    fn render(&self, bytes: &[u8], index: u32, scale: f32) -> Result<RgbaImage> {
        let key = DocumentKey::of(bytes);
        let mut worker = self.worker.lock().map_err(|_| worker_stopped())?;

        let (reply, response) = mpsc::channel();
        let document = (worker.loaded != Some(key)).then(|| bytes.to_vec());
        worker
            .jobs
            .send(RenderJob {
                key,
                document,
                index,
                scale,
                reply,
            })
            .map_err(|_| worker_stopped())?;

        let result = response.recv().map_err(|_| worker_stopped())?;
        // A failed load leaves the worker empty; page errors keep the document.
        worker.loaded = match &result {
            Err(PdfWorksError::ParseError { .. }) if worker.loaded != Some(key) => None,
            _ => Some(key),
        };
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_key_follows_content() {
        let first = b"%PDF-1.5 one".to_vec();
        let copy = first.clone();
        assert_eq!(DocumentKey::of(&first), DocumentKey::of(&copy));
        assert_ne!(DocumentKey::of(&first), DocumentKey::of(b"%PDF-1.5 two"));
        assert_ne!(DocumentKey::of(b""), DocumentKey::of(b"\0"));
    }

    #[test]
    fn test_rasterizer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PdfiumRasterizer>();
    }
}
