//! Output for the detailed verse dataset (pretty JSON) and console reports.

use crate::models::{juz_for_page, ChapterMap, JoinResult, OutputRecord};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write the chapter map as pretty JSON.
///
/// Two-space indentation, non-ASCII text written literally and no trailing
/// newline, the same bytes Python's `json.dump(..., ensure_ascii=False,
/// indent=2)` produces.
pub fn write_json<W: Write>(chapters: &ChapterMap, writer: &mut W) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(chapters)?;
    writer.write_all(json.as_bytes())?;
    Ok(())
}

/// Write the chapter map as pretty JSON to a file.
pub fn write_json_file(chapters: &ChapterMap, path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_json(chapters, &mut file)?;
    file.flush()?;
    Ok(())
}

/// Read a previously written dataset, keeping chapter order.
pub fn read_json_file(path: &Path) -> Result<ChapterMap, OutputError> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Format a record as a single line.
pub fn format_record(record: &OutputRecord) -> String {
    format!(
        "Verse {}:{} (Page {}): Hasanah = {}",
        record.chapter, record.verse, record.page, record.hasanah
    )
}

/// Write a summary report to stdout.
pub fn print_summary(result: &JoinResult) {
    let summary = &result.summary;

    println!("\n=== Build Summary ===");
    println!("Verse lines scanned: {}", summary.verse_lines);
    if summary.skipped_lines > 0 {
        println!("Verse lines without word ids: {}", summary.skipped_lines);
    }
    println!("Pages mapped: {}", summary.pages);
    println!("Chapters: {}", result.chapters.chapter_count());
    println!("Total verses: {}", summary.records);
    println!("Total hasanah: {}", result.chapters.total_hasanah());

    if summary.warning_count() > 0 {
        println!();
        println!("Warnings:");
        println!("  Missing chapters: {}", summary.missing_chapters);
        println!("  Missing verses: {}", summary.missing_verses);
    }
}

/// Print the first verses of the first chapters.
pub fn print_sample(chapters: &ChapterMap, chapter_limit: usize, verse_limit: usize) {
    println!("\nSample data:");
    for (chapter, records) in chapters.iter().take(chapter_limit) {
        println!("\nSurah {}:", chapter);
        for record in records.iter().take(verse_limit) {
            println!("  {}", format_record(record));
        }
    }
}

/// Print every verse placed on a page, with the page total.
pub fn print_page(chapters: &ChapterMap, page: u32) {
    let mut records = chapters.records_on_page(page);
    records.sort_by_key(|r| r.key());

    println!("=== Page {} (Juz {}) ===", page, juz_for_page(page));
    if records.is_empty() {
        println!("No verses found on this page");
        return;
    }

    for record in &records {
        println!("  {}", format_record(record));
        println!("    {}", record.text);
    }

    let total: u64 = records.iter().map(|r| r.hasanah).sum();
    println!("\nVerses: {}", records.len());
    println!("Page hasanah: {}", total);
}
