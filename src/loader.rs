//! JSON dataset loading: page layout, word-by-word index and verse texts.

use crate::models::{
    InputPaths, LineType, PageLine, RawData, VerseEntry, VerseTexts, WordRecord,
};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Number as it appears in the QPC datasets: an integer or a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Int(i64),
    Text(String),
}

/// Read an optional number. `null`, a missing field and `""` are all absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<LenientNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(LenientNumber::Int(n)) => Ok(Some(n)),
        Some(LenientNumber::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("expected a number, found {:?}", s)))
        }
    }
}

/// Read a line type. Anything other than a known name, `null` included, is `Other`.
fn lenient_line_type<'de, D>(deserializer: D) -> Result<LineType, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(name)) => Ok(LineType::from_name(&name)),
        _ => Ok(LineType::Other),
    }
}

fn to_u32(value: Option<i64>) -> Option<u32> {
    value.and_then(|n| u32::try_from(n).ok())
}

#[derive(Deserialize)]
struct RawLayout {
    pages: Vec<RawLayoutLine>,
}

#[derive(Deserialize)]
struct RawLayoutLine {
    #[serde(default, deserialize_with = "lenient_number")]
    page_number: Option<i64>,
    #[serde(default, deserialize_with = "lenient_line_type")]
    line_type: LineType,
    #[serde(default, deserialize_with = "lenient_number")]
    first_word_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    last_word_id: Option<i64>,
}

#[derive(Deserialize)]
struct RawWord {
    #[serde(default, deserialize_with = "lenient_number")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    surah: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    ayah: Option<i64>,
}

#[derive(Deserialize)]
struct RawVerseEntry {
    #[serde(default, deserialize_with = "lenient_number")]
    verse: Option<i64>,
    #[serde(default)]
    text: Option<String>,
}

/// Parse the 15-line layout document into page lines.
///
/// Lines without a usable page number are dropped. Negative word bounds are
/// treated as absent, which keeps the line out of the join.
pub fn parse_page_layout(bytes: &[u8]) -> Result<Vec<PageLine>, serde_json::Error> {
    let layout: RawLayout = serde_json::from_slice(bytes)?;
    let mut lines = Vec::with_capacity(layout.pages.len());
    let mut dropped = 0usize;

    for raw in layout.pages {
        let page_number = match to_u32(raw.page_number) {
            Some(page) if page > 0 => page,
            _ => {
                dropped += 1;
                continue;
            }
        };

        let first_word_id = to_u32(raw.first_word_id);
        let last_word_id = to_u32(raw.last_word_id);
        if raw.first_word_id.is_some() != first_word_id.is_some()
            || raw.last_word_id.is_some() != last_word_id.is_some()
        {
            warn!(page = page_number, "Negative word id in layout line, treating as absent");
        }

        lines.push(PageLine {
            page_number,
            line_type: raw.line_type,
            first_word_id,
            last_word_id,
        });
    }

    if dropped > 0 {
        warn!(dropped, "Layout lines without a valid page number were dropped");
    }

    Ok(lines)
}

/// Parse the word-by-word document into word records sorted by id.
///
/// Records missing `id`, `surah` or `ayah`, or carrying negative values, are
/// skipped with a warning.
pub fn parse_word_index(bytes: &[u8]) -> Result<Vec<WordRecord>, serde_json::Error> {
    let raw: BTreeMap<String, RawWord> = serde_json::from_slice(bytes)?;
    let mut words = Vec::with_capacity(raw.len());

    for (location, word) in raw {
        let fields = (to_u32(word.id), to_u32(word.surah), to_u32(word.ayah));
        match fields {
            (Some(id), Some(chapter), Some(verse)) => words.push(WordRecord {
                id,
                chapter,
                verse,
            }),
            _ => warn!(%location, "Skipping word record with missing or negative fields"),
        }
    }

    words.sort_by_key(|w| (w.id, w.chapter, w.verse));
    Ok(words)
}

/// Parse the verse-text document.
///
/// Verse numbers may be integers or numeric strings. Entries with a missing or
/// negative verse number, or without text, are skipped with a warning.
pub fn parse_verse_texts(bytes: &[u8]) -> Result<VerseTexts, serde_json::Error> {
    let raw: HashMap<String, Vec<RawVerseEntry>> = serde_json::from_slice(bytes)?;
    let mut verses = VerseTexts::new();

    for (chapter, entries) in raw {
        verses.ensure_chapter(chapter.clone());
        for entry in entries {
            match (to_u32(entry.verse), entry.text) {
                (Some(verse), Some(text)) => {
                    verses.push_entry(chapter.clone(), VerseEntry { verse, text })
                }
                _ => warn!(%chapter, "Skipping verse entry with missing or negative fields"),
            }
        }
    }

    Ok(verses)
}

fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_with<T, F>(path: &Path, parse: F) -> Result<T, LoadError>
where
    F: FnOnce(&[u8]) -> Result<T, serde_json::Error>,
{
    let bytes = read_file(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read dataset");
    parse(&bytes).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the page layout from `qpc-v2-15-lines.json`.
pub fn load_page_layout(path: &Path) -> Result<Vec<PageLine>, LoadError> {
    load_with(path, parse_page_layout)
}

/// Load the word index from `qpc-v2-word-by-word.json`.
pub fn load_word_index(path: &Path) -> Result<Vec<WordRecord>, LoadError> {
    load_with(path, parse_word_index)
}

/// Load the verse texts from `quran.json`.
pub fn load_verse_texts(path: &Path) -> Result<VerseTexts, LoadError> {
    load_with(path, parse_verse_texts)
}

/// Load all three datasets. Any failure aborts before anything is joined.
pub fn load_all(paths: &InputPaths) -> Result<RawData, LoadError> {
    info!("Loading data files...");

    let lines = load_page_layout(&paths.layout)?;
    info!(lines = lines.len(), "Loaded page layout");

    let words = load_word_index(&paths.words)?;
    info!(words = words.len(), "Loaded word index");

    let verses = load_verse_texts(&paths.verses)?;
    info!(
        chapters = verses.chapter_count(),
        verses = verses.verse_count(),
        "Loaded verse texts"
    );

    Ok(RawData {
        lines,
        words,
        verses,
    })
}
