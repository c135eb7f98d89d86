//! Integration tests for error handling and edge cases.

use clap::Parser;
use pdfworks::PdfWorksError;
use pdfworks::backend::{LopdfReader, LopdfWriter};
use pdfworks::cli::Cli;
use pdfworks::config::EngineConfig;
use pdfworks::document::DocumentHandle;
use pdfworks::engine::{Operation, TransformEngine};
use pdfworks::io::InputLoader;
use pdfworks::progress::NoProgress;
use pdfworks::selection::PageSelection;
use pdfworks::validation::{InputKind, Validator};
use rstest::rstest;
use tempfile::TempDir;

use crate::common::{open_sample, sample_pdf, write_sample};

#[rstest]
#[case(0, 2)]
#[case(3, 2)]
#[case(2, 5)]
#[tokio::test]
async fn test_split_rejects_bad_ranges(#[case] from: u32, #[case] to: u32) {
    let document = open_sample(4, "doc.pdf");
    let err = TransformEngine::default()
        .execute(
            Operation::Split {
                document: &document,
                from,
                to,
            },
            &NoProgress,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PdfWorksError::InvalidRange { total: 4, .. }));
}

#[tokio::test]
async fn test_merge_needs_two_documents() {
    let documents = vec![open_sample(2, "only.pdf")];
    let err = TransformEngine::default()
        .execute(
            Operation::Merge {
                documents: &documents,
            },
            &NoProgress,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PdfWorksError::InsufficientInputs {
            required: 2,
            actual: 1
        }
    ));
}

#[tokio::test]
async fn test_delete_every_page_is_rejected() {
    let document = open_sample(3, "doc.pdf");
    let selection = PageSelection::all(3);

    let err = TransformEngine::default()
        .execute(
            Operation::Delete {
                document: &document,
                selection: &selection,
            },
            &NoProgress,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PdfWorksError::InvalidSelection { .. }));
}

#[tokio::test]
async fn test_extract_empty_selection() {
    let document = open_sample(3, "doc.pdf");
    let selection = PageSelection::new(3);

    let err = TransformEngine::default()
        .execute(
            Operation::Extract {
                document: &document,
                selection: &selection,
            },
            &NoProgress,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PdfWorksError::EmptySelection));
}

#[tokio::test]
async fn test_engine_enforces_size_limit() {
    let document = open_sample(2, "doc.pdf");
    let config = EngineConfig {
        max_input_size: 64,
        ..Default::default()
    };
    let engine = TransformEngine::with_backends(LopdfReader::new(), LopdfWriter::new(), config);
    let selection = PageSelection::from_pages(2, [1]).unwrap();

    let err = engine
        .execute(
            Operation::Extract {
                document: &document,
                selection: &selection,
            },
            &NoProgress,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PdfWorksError::FileTooLarge { limit: 64, .. }));
}

#[test]
fn test_corrupt_document_fails_to_open() {
    let mut bytes = sample_pdf(1);
    bytes.truncate(40);

    let err = DocumentHandle::open(&LopdfReader::new(), bytes, "broken.pdf").unwrap_err();
    assert!(matches!(err, PdfWorksError::ParseError { .. }));
}

#[tokio::test]
async fn test_loader_rejects_image_as_pdf() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\n0000").unwrap();

    let err = InputLoader::default()
        .read(&path, InputKind::Pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, PdfWorksError::UnsupportedType { .. }));
}

#[tokio::test]
async fn test_loader_size_limit_comes_from_config() {
    let dir = TempDir::new().unwrap();
    let path = write_sample(dir.path(), "doc.pdf", 3);

    let cli = Cli::try_parse_from(["pdfworks", "info", "doc.pdf", "--max-input-size", "100"])
        .unwrap();
    let validator = Validator::from_config(&cli.engine_config().unwrap());
    let err = InputLoader::new(validator)
        .read(&path, InputKind::Pdf)
        .await
        .unwrap_err();

    assert!(matches!(err, PdfWorksError::FileTooLarge { limit: 100, .. }));
    assert_eq!(err.exit_code(), 2);
}
