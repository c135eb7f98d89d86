//! Page-level transforms on generated documents.

use std::sync::Mutex;

use pdfworks::config::RotationDelta;
use pdfworks::document::DocumentHandle;
use pdfworks::engine::{Operation, TransformEngine, TransformResult};
use pdfworks::progress::NoProgress;
use pdfworks::selection::PageSelection;

use crate::common::{open_sample, page_widths};

async fn execute(operation: Operation<'_>) -> TransformResult {
    TransformEngine::default()
        .execute(operation, &NoProgress)
        .await
        .expect("Transform failed")
}

#[tokio::test]
async fn test_split_copies_inclusive_range() {
    let document = open_sample(6, "handbook.pdf");

    let seen = Mutex::new(Vec::new());
    let progress = |percent: u8| seen.lock().unwrap().push(percent);
    let result = TransformEngine::default()
        .execute(
            Operation::Split {
                document: &document,
                from: 2,
                to: 4,
            },
            &progress,
        )
        .await
        .expect("Split failed");

    assert_eq!(result.suggested_file_name, "handbook_pages_2-4.pdf");
    assert_eq!(result.media_type, "application/pdf");
    assert_eq!(page_widths(&result.bytes), vec![202.0, 203.0, 204.0]);
    assert_eq!(result.summary.page_count, 3);
    assert_eq!(seen.into_inner().unwrap(), vec![0, 30, 70, 100]);
}

#[tokio::test]
async fn test_merge_keeps_input_order() {
    let first = open_sample(2, "a.pdf");
    let second = open_sample(3, "b.pdf");
    let documents = vec![second, first];

    let result = execute(Operation::Merge {
        documents: &documents,
    })
    .await;

    assert_eq!(result.suggested_file_name, "merged.pdf");
    assert_eq!(
        page_widths(&result.bytes),
        vec![201.0, 202.0, 203.0, 201.0, 202.0]
    );
    assert_eq!(result.summary.file_count, Some(2));
    assert_eq!(result.summary.page_count, 5);
}

#[tokio::test]
async fn test_merged_output_can_be_reopened() {
    let documents = vec![open_sample(1, "a.pdf"), open_sample(1, "b.pdf")];
    let result = execute(Operation::Merge {
        documents: &documents,
    })
    .await;

    let reopened = DocumentHandle::open(
        &pdfworks::backend::LopdfReader::new(),
        result.bytes,
        "merged.pdf",
    )
    .expect("Merged output should parse");
    assert_eq!(reopened.page_count(), 2);
}

#[tokio::test]
async fn test_delete_retains_complement() {
    let document = open_sample(5, "slides.pdf");
    let selection = PageSelection::from_ranges("2,4", 5).unwrap();

    let result = execute(Operation::Delete {
        document: &document,
        selection: &selection,
    })
    .await;

    assert_eq!(result.suggested_file_name, "slides_edited.pdf");
    assert_eq!(page_widths(&result.bytes), vec![201.0, 203.0, 205.0]);
    assert_eq!(result.summary.pages_removed, Some(2));
}

#[tokio::test]
async fn test_extract_uses_ascending_order() {
    let document = open_sample(5, "scan.pdf");
    let selection = PageSelection::from_pages(5, [5, 1, 3]).unwrap();

    let result = execute(Operation::Extract {
        document: &document,
        selection: &selection,
    })
    .await;

    assert_eq!(result.suggested_file_name, "scan_extracted.pdf");
    assert_eq!(page_widths(&result.bytes), vec![201.0, 203.0, 205.0]);
}

#[tokio::test]
async fn test_rotate_selected_pages() {
    let document = open_sample(3, "photo.pdf");
    let selection = PageSelection::from_pages(3, [2]).unwrap();

    let result = execute(Operation::Rotate {
        document: &document,
        delta: RotationDelta::Clockwise90,
        selection: &selection,
    })
    .await;

    assert_eq!(result.suggested_file_name, "photo_rotated.pdf");
    // Quarter turns swap width and height.
    assert_eq!(page_widths(&result.bytes), vec![201.0, 300.0, 203.0]);
    assert_eq!(result.summary.rotation_degrees, Some(90));
}

#[tokio::test]
async fn test_rotate_empty_selection_rotates_all() {
    let document = open_sample(2, "photo.pdf");
    let selection = PageSelection::new(2);

    let result = execute(Operation::Rotate {
        document: &document,
        delta: RotationDelta::CounterClockwise90,
        selection: &selection,
    })
    .await;

    assert_eq!(page_widths(&result.bytes), vec![300.0, 300.0]);
    assert_eq!(result.summary.rotation_degrees, Some(-90));
}

#[tokio::test]
async fn test_rotate_twice_by_half_restores_pages() {
    let document = open_sample(2, "photo.pdf");
    let selection = PageSelection::new(2);

    let once = execute(Operation::Rotate {
        document: &document,
        delta: RotationDelta::Half,
        selection: &selection,
    })
    .await;
    let rotated = DocumentHandle::open(
        &pdfworks::backend::LopdfReader::new(),
        once.bytes,
        "photo.pdf",
    )
    .unwrap();
    let twice = execute(Operation::Rotate {
        document: &rotated,
        delta: RotationDelta::Half,
        selection: &selection,
    })
    .await;

    assert_eq!(page_widths(&twice.bytes), vec![201.0, 202.0]);
}
