//! Loading inputs from disk and writing results back.

use pdfworks::backend::LopdfReader;
use pdfworks::engine::{Operation, TransformEngine};
use pdfworks::io::{InputLoader, OutputWriter};
use pdfworks::progress::NoProgress;
use tempfile::TempDir;

use crate::common::{page_widths, write_sample};

#[tokio::test]
async fn test_load_merge_and_write() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        write_sample(dir.path(), "part1.pdf", 2),
        write_sample(dir.path(), "part2.pdf", 1),
        write_sample(dir.path(), "part3.pdf", 3),
    ];

    let loader = InputLoader::default();
    let (results, stats) = loader
        .load_documents(&LopdfReader::new(), &paths, 2)
        .await;
    assert_eq!(stats.success_count, 3);
    assert_eq!(stats.failure_count, 0);
    assert_eq!(stats.total_pages, 6);

    let documents: Vec<_> = results.into_iter().collect::<Result<_, _>>().unwrap();
    let names: Vec<_> = documents.iter().map(|d| d.display_name().to_string()).collect();
    assert_eq!(names, vec!["part1.pdf", "part2.pdf", "part3.pdf"]);

    let result = TransformEngine::default()
        .execute(
            Operation::Merge {
                documents: &documents,
            },
            &NoProgress,
        )
        .await
        .unwrap();

    let output = dir.path().join(&result.suggested_file_name);
    let written = OutputWriter::new().write(result.bytes, &output).await.unwrap();
    assert_eq!(written.output_path, output);

    let on_disk = std::fs::read(&output).unwrap();
    assert_eq!(written.file_size, on_disk.len() as u64);
    assert_eq!(
        page_widths(&on_disk),
        vec![201.0, 202.0, 201.0, 201.0, 202.0, 203.0]
    );
}

#[tokio::test]
async fn test_writer_replaces_existing_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.pdf");
    std::fs::write(&output, b"old").unwrap();

    OutputWriter::new()
        .write(b"new contents".to_vec(), &output)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&output).unwrap(), b"new contents");
    assert!(!dir.path().join("out.pdf.part").exists());
}
