//! Page selection over a loaded document.
//!
//! A [`PageSelection`] is a set of 1-based page numbers bounded by the page
//! count of the document it belongs to. Materialization is always in
//! ascending (document) order, whatever order pages were toggled in.
//!
//! # Examples
//!
//! ```
//! use pdfworks::selection::PageSelection;
//!
//! let mut selection = PageSelection::new(5);
//! selection.toggle(4).unwrap();
//! selection.toggle(2).unwrap();
//!
//! assert_eq!(selection.to_ascending_indices(), vec![1, 3]);
//! assert_eq!(selection.complement().into_iter().collect::<Vec<_>>(), vec![1, 3, 5]);
//! ```

use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{PdfWorksError, Result};

/// Set of selected 1-based page numbers within `[1, total]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSelection {
    total: u32,
    pages: BTreeSet<u32>,
}

impl PageSelection {
    /// Create an empty selection for a document with `total` pages.
    pub fn new(total: u32) -> Self {
        Self {
            total,
            pages: BTreeSet::new(),
        }
    }

    /// Create a selection containing every page.
    pub fn all(total: u32) -> Self {
        let mut selection = Self::new(total);
        selection.select_all();
        selection
    }

    /// Create a selection from explicit page numbers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` if any page is outside `[1, total]`.
    pub fn from_pages(total: u32, pages: impl IntoIterator<Item = u32>) -> Result<Self> {
        let mut selection = Self::new(total);
        for page in pages {
            selection.check_bounds(page)?;
            selection.pages.insert(page);
        }
        Ok(selection)
    }

    /// Parse a range expression such as `"1-3,5"`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` for reversed ranges or pages outside
    /// `[1, total]`, and `InvalidSelection` for malformed input.
    pub fn from_ranges(expr: &str, total: u32) -> Result<Self> {
        let mut selection = Self::new(total);

        for part in expr.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (from, to) = match part.split_once('-') {
                Some((start, end)) => (parse_page(start)?, parse_page(end)?),
                None => {
                    let page = parse_page(part)?;
                    (page, page)
                }
            };

            if from == 0 || from > to || to > total {
                return Err(PdfWorksError::InvalidRange { from, to, total });
            }

            selection.pages.extend(from..=to);
        }

        if selection.is_empty() {
            return Err(PdfWorksError::invalid_selection(format!(
                "'{expr}' does not name any page"
            )));
        }

        Ok(selection)
    }

    fn check_bounds(&self, page: u32) -> Result<()> {
        if page == 0 || page > self.total {
            return Err(PdfWorksError::invalid_selection(format!(
                "page {page} is outside 1-{}",
                self.total
            )));
        }
        Ok(())
    }

    /// Total pages of the associated document.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Add the page if absent, remove it if present.
    ///
    /// Returns whether the page is selected afterwards.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` if the page is outside `[1, total]`.
    pub fn toggle(&mut self, page: u32) -> Result<bool> {
        self.check_bounds(page)?;
        if self.pages.remove(&page) {
            Ok(false)
        } else {
            self.pages.insert(page);
            Ok(true)
        }
    }

    /// Select every page.
    pub fn select_all(&mut self) {
        self.pages = (1..=self.total).collect();
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        self.pages.clear();
    }

    /// Pages not in the selection: exactly `{1..total} \ selection`.
    pub fn complement(&self) -> BTreeSet<u32> {
        (1..=self.total)
            .filter(|page| !self.pages.contains(page))
            .collect()
    }

    /// Selected pages as ascending 0-based indices.
    pub fn to_ascending_indices(&self) -> Vec<u32> {
        self.pages.iter().map(|page| page - 1).collect()
    }

    /// Whether the page is selected.
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    /// Number of selected pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Whether every page is selected.
    pub fn covers_all(&self) -> bool {
        self.pages.len() >= self.total as usize
    }

    /// Selected pages in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().copied()
    }
}

fn parse_page(s: &str) -> Result<u32> {
    s.trim().parse().map_err(|_| {
        PdfWorksError::invalid_selection(format!("'{}' is not a page number", s.trim()))
    })
}
