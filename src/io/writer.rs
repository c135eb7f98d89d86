//! Writing transform outputs to disk.
//!
//! Writes go to a temporary sibling file that is renamed over the target
//! once complete, so a failed write never leaves a truncated output.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;
use tracing::debug;

use crate::error::{PdfWorksError, Result};
use crate::utils::format_file_size;

/// Options for writing output files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write to a temporary file, then rename.
    pub atomic: bool,
    /// Buffer size in bytes.
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            buffer_size: 64 * 1024,
        }
    }
}

/// Statistics about a write.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken.
    pub write_time: Duration,
    /// Bytes written.
    pub file_size: u64,
    /// Final path.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// File size as a human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Writes output bytes to files.
#[derive(Debug, Clone, Default)]
pub struct OutputWriter {
    options: WriteOptions,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

fn write_file(bytes: &[u8], path: &Path, buffer_size: usize) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

impl OutputWriter {
    /// Create a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Write `bytes` to `path`.
    ///
    /// # Errors
    ///
    /// Returns `WriteError` naming the path when the file cannot be
    /// created, written or moved into place.
    pub async fn write(&self, bytes: Vec<u8>, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        let stats = task::spawn_blocking(move || {
            let start = Instant::now();
            let write_path = if options.atomic {
                temp_path(&path_buf)
            } else {
                path_buf.clone()
            };

            if let Err(e) = write_file(&bytes, &write_path, options.buffer_size) {
                if options.atomic {
                    let _ = std::fs::remove_file(&write_path);
                }
                return Err(PdfWorksError::write_error_at(path_buf, e.to_string()));
            }

            if options.atomic {
                std::fs::rename(&write_path, &path_buf).map_err(|e| {
                    let _ = std::fs::remove_file(&write_path);
                    PdfWorksError::write_error_at(path_buf.clone(), e.to_string())
                })?;
            }

            Ok::<_, PdfWorksError>(WriteStatistics {
                write_time: start.elapsed(),
                file_size: bytes.len() as u64,
                output_path: path_buf,
            })
        })
        .await
        .map_err(|e| PdfWorksError::write_error(format!("write task failed: {e}")))??;

        debug!(
            path = %stats.output_path.display(),
            size = %stats.format_file_size(),
            "output written"
        );
        Ok(stats)
    }
}
