//! Loading inputs from disk.
//!
//! Files are checked against the size limit before they are read, their
//! media type is detected from the bytes, and PDFs are parsed into
//! [`DocumentHandle`]s. Batches are read concurrently but always come back
//! in input order, which is the order merges and image conversions use.
//!
//! # Examples
//!
//! ```no_run
//! use pdfworks::backend::LopdfReader;
//! use pdfworks::io::InputLoader;
//! use std::path::PathBuf;
//!
//! # async fn example() -> pdfworks::Result<()> {
//! let loader = InputLoader::default();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let (documents, stats) = loader.load_documents(&LopdfReader::new(), &paths, 4).await;
//! println!("Loaded {} of {} files", stats.success_count, paths.len());
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::backend::DocumentReader;
use crate::document::DocumentHandle;
use crate::engine::RasterInput;
use crate::error::{PdfWorksError, Result};
use crate::utils::format_file_size;
use crate::validation::{InputKind, Validator, detect_media_type};

/// Raw bytes of an input that passed validation.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    /// Source path.
    pub path: PathBuf,
    /// File contents.
    pub bytes: Vec<u8>,
    /// Detected media type.
    pub media_type: &'static str,
    /// Time spent reading the file.
    pub load_time: Duration,
}

impl LoadedInput {
    /// File name used in messages and output names.
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Statistics for a batch load.
#[derive(Debug, Clone, Default)]
pub struct LoadStatistics {
    /// Inputs loaded.
    pub success_count: usize,
    /// Inputs that failed.
    pub failure_count: usize,
    /// Wall time for the batch.
    pub total_time: Duration,
    /// Bytes loaded.
    pub total_size: u64,
    /// Pages across loaded documents.
    pub total_pages: u32,
}

impl LoadStatistics {
    fn from_results(results: &[Result<DocumentHandle>], total_time: Duration) -> Self {
        let mut stats = Self {
            total_time,
            ..Default::default()
        };

        for result in results {
            match result {
                Ok(document) => {
                    stats.success_count += 1;
                    stats.total_size += document.size();
                    stats.total_pages += document.page_count();
                }
                Err(_) => stats.failure_count += 1,
            }
        }

        stats
    }

    /// Total size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Reads and validates input files.
#[derive(Debug, Clone, Default)]
pub struct InputLoader {
    validator: Validator,
}

impl InputLoader {
    /// Create a loader enforcing the validator's limits.
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    /// Read one file and check it against `kind`.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file cannot be read, `FileTooLarge` before
    /// reading an oversized file and `UnsupportedType` when the content is
    /// not of the expected kind.
    pub async fn read(&self, path: &Path, kind: InputKind) -> Result<LoadedInput> {
        let name = display_name(path);
        let start = Instant::now();

        let size = tokio::fs::metadata(path).await?.len();
        self.validator.validate_upload(&name, size, None, kind)?;

        let bytes = tokio::fs::read(path).await?;
        let media_type = detect_media_type(&name, &bytes);
        self.validator
            .validate_bytes(&name, &bytes, Some(media_type), kind)?;

        debug!(path = %path.display(), size = bytes.len(), media_type, "input read");
        Ok(LoadedInput {
            path: path.to_path_buf(),
            bytes,
            media_type,
            load_time: start.elapsed(),
        })
    }

    /// Read and parse one PDF.
    ///
    /// # Errors
    ///
    /// The [`InputLoader::read`] errors, plus `ParseError` for unreadable
    /// documents.
    pub async fn load_document<R: DocumentReader>(
        &self,
        reader: &R,
        path: &Path,
    ) -> Result<DocumentHandle> {
        let input = self.read(path, InputKind::Pdf).await?;
        let name = input.display_name();
        DocumentHandle::open(reader, input.bytes, name)
    }

    /// Read and parse several PDFs with up to `jobs` reads in flight.
    ///
    /// One result per path, in path order.
    pub async fn load_documents<R: DocumentReader>(
        &self,
        reader: &R,
        paths: &[PathBuf],
        jobs: usize,
    ) -> (Vec<Result<DocumentHandle>>, LoadStatistics) {
        let start = Instant::now();

        let inputs: Vec<Result<LoadedInput>> = stream::iter(paths)
            .map(|path| self.read(path, InputKind::Pdf))
            .buffered(jobs.max(1))
            .collect()
            .await;

        let results: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                input.and_then(|input| {
                    let name = input.display_name();
                    DocumentHandle::open(reader, input.bytes, name)
                })
            })
            .collect();

        let stats = LoadStatistics::from_results(&results, start.elapsed());
        (results, stats)
    }

    /// Read images for conversion, in path order.
    ///
    /// # Errors
    ///
    /// Stops at the first file that cannot be read or is not an image.
    pub async fn load_images(&self, paths: &[PathBuf], jobs: usize) -> Result<Vec<RasterInput>> {
        if paths.is_empty() {
            return Err(PdfWorksError::InsufficientInputs {
                required: 1,
                actual: 0,
            });
        }

        stream::iter(paths)
            .map(|path| self.read(path, InputKind::Image))
            .buffered(jobs.max(1))
            .map(|input| input.map(|input| RasterInput::new(input.display_name(), input.bytes)))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect()
    }
}
