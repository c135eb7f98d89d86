//! Page-structure operations: split, merge, delete, extract and rotate.
//!
//! All of them copy pages between documents without touching page content.

use tracing::{debug, instrument};

use super::{MERGED_FILE_NAME, PDF_MEDIA_TYPE, TransformEngine, TransformResult, TransformSummary};
use crate::backend::{DocumentReader, DocumentWriter, SaveOptions};
use crate::config::RotationDelta;
use crate::document::{DocumentHandle, MergeFileEntry};
use crate::error::{PdfWorksError, Result};
use crate::progress::Progress;
use crate::selection::PageSelection;
use crate::utils::suffixed_name;

pub(super) fn check_selection(document: &DocumentHandle, selection: &PageSelection) -> Result<()> {
    if selection.total() != document.page_count() {
        return Err(PdfWorksError::invalid_selection(format!(
            "selection was made for {} pages but '{}' has {}",
            selection.total(),
            document.display_name(),
            document.page_count()
        )));
    }
    Ok(())
}

pub(super) fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

impl<R, W> TransformEngine<R, W>
where
    R: DocumentReader,
    W: DocumentWriter,
{
    /// Copy `indices` (0-based) of `document` into a fresh document.
    ///
    /// Reports 0 before loading, 30 once the source is loaded and 70 once
    /// the pages are copied.
    async fn copy_into_new(
        &self,
        document: &DocumentHandle,
        indices: &[u32],
        progress: &Progress<'_>,
    ) -> Result<Vec<u8>> {
        progress.report(0);
        let source = self.writer.load(document.bytes(), document.display_name())?;
        progress.report(30);
        tokio::task::yield_now().await;

        let mut target = self.writer.create();
        for page in self.writer.copy_pages(&mut target, &source, indices)? {
            self.writer.add_page(&mut target, page)?;
        }
        progress.report(70);
        tokio::task::yield_now().await;

        self.writer.save(&mut target, SaveOptions::default())
    }

    #[instrument(skip(self, document, progress), fields(document = document.display_name()))]
    pub(super) async fn split(
        &self,
        document: &DocumentHandle,
        from: u32,
        to: u32,
        progress: &Progress<'_>,
    ) -> Result<TransformResult> {
        let total = document.page_count();
        if from < 1 || to > total || from > to {
            return Err(PdfWorksError::InvalidRange { from, to, total });
        }

        let indices: Vec<u32> = (from - 1..to).collect();
        let bytes = self.copy_into_new(document, &indices, progress).await?;

        let count = indices.len();
        Ok(TransformResult::new(
            bytes,
            suffixed_name(&document.base_name(), &format!("_pages_{from}-{to}"), "pdf"),
            PDF_MEDIA_TYPE,
            TransformSummary {
                label: format!("{count} page{} extracted (pages {from}-{to})", plural(count)),
                page_count: count as u32,
                ..Default::default()
            },
        ))
    }

    #[instrument(skip_all, fields(inputs = documents.len()))]
    pub(super) async fn merge(
        &self,
        documents: &[MergeFileEntry],
        progress: &Progress<'_>,
    ) -> Result<TransformResult> {
        if documents.len() < 2 {
            return Err(PdfWorksError::InsufficientInputs {
                required: 2,
                actual: documents.len(),
            });
        }

        let mut target = self.writer.create();
        let mut total_pages = 0;

        for (i, document) in documents.iter().enumerate() {
            let source = self.writer.load(document.bytes(), document.display_name())?;
            let indices: Vec<u32> = (0..document.page_count()).collect();

            for page in self.writer.copy_pages(&mut target, &source, &indices)? {
                self.writer.add_page(&mut target, page)?;
            }
            total_pages += document.page_count();
            debug!(name = document.display_name(), pages = document.page_count(), "appended");

            progress.report_fraction(0, 80, i + 1, documents.len());
            tokio::task::yield_now().await;
        }

        let bytes = self.writer.save(&mut target, SaveOptions::default())?;

        Ok(TransformResult::new(
            bytes,
            MERGED_FILE_NAME.to_string(),
            PDF_MEDIA_TYPE,
            TransformSummary {
                label: format!("{} files merged • {total_pages} pages", documents.len()),
                page_count: total_pages,
                file_count: Some(documents.len()),
                ..Default::default()
            },
        ))
    }

    #[instrument(skip(self, document, selection, progress), fields(document = document.display_name()))]
    pub(super) async fn delete(
        &self,
        document: &DocumentHandle,
        selection: &PageSelection,
        progress: &Progress<'_>,
    ) -> Result<TransformResult> {
        check_selection(document, selection)?;
        if selection.is_empty() {
            return Err(PdfWorksError::invalid_selection("no pages selected for deletion"));
        }
        if selection.covers_all() {
            return Err(PdfWorksError::invalid_selection(
                "cannot delete every page of a document",
            ));
        }

        let retained: Vec<u32> = selection.complement().into_iter().map(|page| page - 1).collect();
        let bytes = self.copy_into_new(document, &retained, progress).await?;

        let removed = selection.len();
        Ok(TransformResult::new(
            bytes,
            suffixed_name(&document.base_name(), "_edited", "pdf"),
            PDF_MEDIA_TYPE,
            TransformSummary {
                label: format!(
                    "{removed} page{} removed • {} remaining",
                    plural(removed),
                    retained.len()
                ),
                page_count: retained.len() as u32,
                pages_removed: Some(removed as u32),
                ..Default::default()
            },
        ))
    }

    #[instrument(skip(self, document, selection, progress), fields(document = document.display_name()))]
    pub(super) async fn extract(
        &self,
        document: &DocumentHandle,
        selection: &PageSelection,
        progress: &Progress<'_>,
    ) -> Result<TransformResult> {
        check_selection(document, selection)?;
        if selection.is_empty() {
            return Err(PdfWorksError::EmptySelection);
        }

        let indices = selection.to_ascending_indices();
        let bytes = self.copy_into_new(document, &indices, progress).await?;

        let count = indices.len();
        Ok(TransformResult::new(
            bytes,
            suffixed_name(&document.base_name(), "_extracted", "pdf"),
            PDF_MEDIA_TYPE,
            TransformSummary {
                label: format!("{count} page{} extracted", plural(count)),
                page_count: count as u32,
                ..Default::default()
            },
        ))
    }

    #[instrument(skip(self, document, selection, progress), fields(document = document.display_name()))]
    pub(super) async fn rotate(
        &self,
        document: &DocumentHandle,
        delta: RotationDelta,
        selection: &PageSelection,
        progress: &Progress<'_>,
    ) -> Result<TransformResult> {
        check_selection(document, selection)?;

        let mut doc = self.writer.load(document.bytes(), document.display_name())?;
        progress.report(30);

        let pages = self.writer.pages(&doc);
        let targets: Vec<u32> = if selection.is_empty() {
            (0..pages.len() as u32).collect()
        } else {
            selection.to_ascending_indices()
        };

        for (k, &index) in targets.iter().enumerate() {
            let page = *pages.get(index as usize).ok_or_else(|| {
                PdfWorksError::parse_error(
                    document.display_name(),
                    format!("page {} is missing from the page tree", index + 1),
                )
            })?;
            let current = self.writer.rotation(&doc, page)?;
            self.writer.set_rotation(&mut doc, page, delta.apply_to(current))?;

            progress.report_fraction(30, 50, k + 1, targets.len());
            tokio::task::yield_now().await;
        }

        let bytes = self.writer.save(&mut doc, SaveOptions::default())?;

        let count = targets.len();
        Ok(TransformResult::new(
            bytes,
            suffixed_name(&document.base_name(), "_rotated", "pdf"),
            PDF_MEDIA_TYPE,
            TransformSummary {
                label: format!("{count} page{} rotated • {}°", plural(count), delta.as_degrees()),
                page_count: document.page_count(),
                rotation_degrees: Some(delta.as_degrees()),
                ..Default::default()
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LopdfReader;
    use crate::engine::Operation;
    use crate::test_support::{page_rotations, page_widths, sample_pdf, sample_pdf_with_base};
    use rstest::rstest;
    use std::sync::Mutex;

    fn handle(pages: u32, name: &str) -> DocumentHandle {
        DocumentHandle::open(&LopdfReader::new(), sample_pdf(pages), name).unwrap()
    }

    async fn run(operation: Operation<'_>) -> (Result<TransformResult>, Vec<u8>) {
        let seen = Mutex::new(Vec::new());
        let sink = |percent: u8| seen.lock().unwrap().push(percent);
        let result = TransformEngine::default().execute(operation, &sink).await;
        (result, seen.into_inner().unwrap())
    }

    #[tokio::test]
    async fn test_split_middle_range() {
        let document = handle(10, "report.pdf");
        let (result, progress) = run(Operation::Split {
            document: &document,
            from: 3,
            to: 5,
        })
        .await;

        let result = result.unwrap();
        assert_eq!(result.suggested_file_name, "report_pages_3-5.pdf");
        assert_eq!(page_widths(&result.bytes), vec![203.0, 204.0, 205.0]);
        assert_eq!(result.summary.page_count, 3);
        assert_eq!(result.summary.output_size, result.bytes.len() as u64);
        assert_eq!(progress, vec![0, 30, 70, 100]);
    }

    #[rstest]
    #[case(0, 2)]
    #[case(3, 11)]
    #[case(5, 4)]
    #[tokio::test]
    async fn test_split_invalid_range(#[case] from: u32, #[case] to: u32) {
        let document = handle(10, "report.pdf");
        let (result, progress) = run(Operation::Split {
            document: &document,
            from,
            to,
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            PdfWorksError::InvalidRange { total: 10, .. }
        ));
        assert!(progress.is_empty());
    }

    #[tokio::test]
    async fn test_merge_preserves_order() {
        let first = DocumentHandle::open(&LopdfReader::new(), sample_pdf_with_base(2, 100), "a.pdf")
            .unwrap();
        let second =
            DocumentHandle::open(&LopdfReader::new(), sample_pdf_with_base(3, 500), "b.pdf")
                .unwrap();
        let documents = vec![first, second];

        let (result, progress) = run(Operation::Merge {
            documents: &documents,
        })
        .await;

        let result = result.unwrap();
        assert_eq!(result.suggested_file_name, "merged.pdf");
        assert_eq!(
            page_widths(&result.bytes),
            vec![101.0, 102.0, 501.0, 502.0, 503.0]
        );
        assert_eq!(result.summary.file_count, Some(2));
        assert_eq!(result.summary.page_count, 5);
        assert_eq!(progress, vec![40, 80, 100]);
    }

    #[tokio::test]
    async fn test_merge_needs_two_inputs() {
        let documents = vec![handle(2, "a.pdf")];
        let (result, _) = run(Operation::Merge {
            documents: &documents,
        })
        .await;
        assert!(matches!(
            result.unwrap_err(),
            PdfWorksError::InsufficientInputs {
                required: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_delete_keeps_complement() {
        let document = handle(5, "doc.pdf");
        let selection = PageSelection::from_pages(5, [4, 2]).unwrap();
        let (result, progress) = run(Operation::Delete {
            document: &document,
            selection: &selection,
        })
        .await;

        let result = result.unwrap();
        assert_eq!(result.suggested_file_name, "doc_edited.pdf");
        assert_eq!(page_widths(&result.bytes), vec![201.0, 203.0, 205.0]);
        assert_eq!(result.summary.pages_removed, Some(2));
        assert_eq!(progress, vec![0, 30, 70, 100]);
    }

    #[tokio::test]
    async fn test_delete_rejects_empty_and_full() {
        let document = handle(3, "doc.pdf");

        let empty = PageSelection::new(3);
        let (result, _) = run(Operation::Delete {
            document: &document,
            selection: &empty,
        })
        .await;
        assert!(matches!(result.unwrap_err(), PdfWorksError::InvalidSelection { .. }));

        let all = PageSelection::all(3);
        let (result, _) = run(Operation::Delete {
            document: &document,
            selection: &all,
        })
        .await;
        assert!(matches!(result.unwrap_err(), PdfWorksError::InvalidSelection { .. }));
    }

    #[tokio::test]
    async fn test_extract_is_ascending() {
        let document = handle(5, "doc.pdf");
        let mut selection = PageSelection::new(5);
        for page in [4, 1, 3] {
            selection.toggle(page).unwrap();
        }

        let (result, _) = run(Operation::Extract {
            document: &document,
            selection: &selection,
        })
        .await;

        let result = result.unwrap();
        assert_eq!(result.suggested_file_name, "doc_extracted.pdf");
        assert_eq!(page_widths(&result.bytes), vec![201.0, 203.0, 204.0]);
    }

    #[tokio::test]
    async fn test_extract_empty_selection() {
        let document = handle(2, "doc.pdf");
        let selection = PageSelection::new(2);
        let (result, _) = run(Operation::Extract {
            document: &document,
            selection: &selection,
        })
        .await;
        assert!(matches!(result.unwrap_err(), PdfWorksError::EmptySelection));
    }

    #[tokio::test]
    async fn test_selection_for_other_document() {
        let document = handle(2, "doc.pdf");
        let selection = PageSelection::from_pages(5, [1]).unwrap();
        let (result, _) = run(Operation::Extract {
            document: &document,
            selection: &selection,
        })
        .await;
        assert!(matches!(result.unwrap_err(), PdfWorksError::InvalidSelection { .. }));
    }

    #[tokio::test]
    async fn test_rotate_selected_pages() {
        let document = handle(3, "scan.pdf");
        let selection = PageSelection::from_pages(3, [2]).unwrap();
        let (result, progress) = run(Operation::Rotate {
            document: &document,
            delta: RotationDelta::Clockwise90,
            selection: &selection,
        })
        .await;

        let result = result.unwrap();
        assert_eq!(result.suggested_file_name, "scan_rotated.pdf");
        assert_eq!(page_rotations(&result.bytes), vec![0, 90, 0]);
        assert_eq!(result.summary.rotation_degrees, Some(90));
        assert_eq!(progress, vec![30, 80, 100]);
    }

    #[tokio::test]
    async fn test_rotate_round_trip() {
        let document = handle(2, "scan.pdf");
        let everything = PageSelection::new(2);

        let (rotated, _) = run(Operation::Rotate {
            document: &document,
            delta: RotationDelta::Clockwise90,
            selection: &everything,
        })
        .await;
        let rotated =
            DocumentHandle::open(&LopdfReader::new(), rotated.unwrap().bytes, "scan.pdf").unwrap();

        let (restored, _) = run(Operation::Rotate {
            document: &rotated,
            delta: RotationDelta::CounterClockwise90,
            selection: &everything,
        })
        .await;
        assert_eq!(page_rotations(&restored.unwrap().bytes), vec![0, 0]);
    }
}
