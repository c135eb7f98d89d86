//! Loaded input documents and the merge queue.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::backend::{DocumentReader, ParsedDocument};
use crate::error::{PdfWorksError, Result};
use crate::utils::base_file_name;

/// A parsed input document: raw bytes, page count and display name.
///
/// Handles exist only for documents that parsed successfully and have at
/// least one page. Cloning shares the underlying buffer.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHandle {
    #[serde(skip)]
    bytes: Arc<[u8]>,
    page_count: u32,
    display_name: String,
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("display_name", &self.display_name)
            .field("page_count", &self.page_count)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl DocumentHandle {
    /// Parse `bytes` with `reader` and wrap them in a handle.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the document cannot be parsed or has no
    /// pages.
    pub fn open<R: DocumentReader>(
        reader: &R,
        bytes: impl Into<Arc<[u8]>>,
        display_name: impl Into<String>,
    ) -> Result<Self> {
        let bytes = bytes.into();
        let display_name = display_name.into();

        let page_count = reader.parse(&bytes, &display_name)?.page_count();
        if page_count == 0 {
            return Err(PdfWorksError::parse_error(display_name, "document has no pages"));
        }

        Ok(Self {
            bytes,
            page_count,
            display_name,
        })
    }

    /// Raw document bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the raw bytes.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Name shown to the user, usually the file name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Size of the document in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Display name without a trailing `.pdf`, used to derive output names.
    pub fn base_name(&self) -> String {
        base_file_name(&self.display_name)
    }
}

/// One input of a merge. Same shape as a [`DocumentHandle`].
pub type MergeFileEntry = DocumentHandle;

/// Ordered list of documents waiting to be merged.
#[derive(Debug, Clone, Default)]
pub struct MergeQueue {
    entries: Vec<MergeFileEntry>,
}

impl MergeQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end.
    pub fn push(&mut self, entry: MergeFileEntry) {
        self.entries.push(entry);
    }

    /// Remove and return the entry at `index`.
    pub fn remove(&mut self, index: usize) -> Option<MergeFileEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Move the entry at `from` so it ends up at position `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if either position is out of bounds.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.entries.len();
        if from >= len || to >= len {
            return Err(PdfWorksError::invalid_config(format!(
                "Cannot move item {from} to {to} in a queue of {len}"
            )));
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        Ok(())
    }

    /// Entries in merge order.
    pub fn entries(&self) -> &[MergeFileEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the page counts of every entry.
    pub fn total_pages(&self) -> u32 {
        self.entries.iter().map(DocumentHandle::page_count).sum()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl FromIterator<MergeFileEntry> for MergeQueue {
    fn from_iter<T: IntoIterator<Item = MergeFileEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
