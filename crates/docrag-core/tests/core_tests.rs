use std::fs;
use tempfile::TempDir;

use docrag_core::data_processor::{split_text, ChunkingConfig, DataProcessor};

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor incididunt ut labore. ";

fn lorem_2000() -> String { LOREM.repeat(20).chars().take(2000).collect() }

#[test]
fn lorem_file_splits_into_a_few_bounded_chunks() {
    let chunks = split_text(&lorem_2000(), 900, 150);
    assert_eq!(chunks.iter().map(|c| c.chars().count()).collect::<Vec<_>>(), vec![807, 958, 535]);
    assert!(chunks.iter().all(|c| c.chars().count() <= 900 + 150 + 1));
}

#[test]
fn every_later_chunk_starts_with_tail_of_previous() {
    let chunks = split_text(&lorem_2000(), 900, 150);
    for pair in chunks.windows(2) {
        let prev: Vec<char> = pair[0].chars().collect();
        let tail: String = prev[prev.len().saturating_sub(150)..].iter().collect();
        assert!(pair[1].starts_with(tail.trim_start()), "chunk does not carry previous tail");
    }
}

#[test]
fn single_short_text_is_one_chunk() {
    let processor = DataProcessor::new();
    let chunks = processor.chunk_text("a.txt", "Short text\n");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Short text");
    assert_eq!(chunks[0].metadata.total_chunks, 1);
}

#[test]
fn load_directory_picks_known_extensions_sorted() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path();
    fs::write(dir.join("b.txt"), "bravo").expect("write");
    fs::write(dir.join("a.md"), "alpha").expect("write");
    fs::write(dir.join("skip.bin"), [0u8, 1, 2]).expect("write");
    fs::create_dir(dir.join("nested")).expect("mkdir");
    fs::write(dir.join("nested").join("c.HTML"), "<p>charlie</p>").expect("write");

    let processor = DataProcessor::with_config(ChunkingConfig::default()).expect("processor");
    let docs = processor.load_directory(dir).expect("load");
    let names: Vec<_> = docs.iter().map(|d| d.filename.replace('\\', "/")).collect();
    assert_eq!(names, vec!["a.md", "b.txt", "nested/c.HTML"]);
    assert_eq!(docs[1].content, b"bravo");
}

#[test]
fn load_directory_missing_dir_is_not_found() {
    let tmp = TempDir::new().expect("tempdir");
    let err = DataProcessor::new().load_directory(&tmp.path().join("nope")).expect_err("missing");
    assert!(err.is_client_error());
}
