//! Data structures for the page mapping pipeline.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Global word identifier from the word-by-word dataset
pub type WordId = u32;

/// Pages per juz in the 604-page mushaf
pub const PAGES_PER_JUZ: u32 = 20;

/// Number of juz; the last one absorbs the trailing pages
pub const JUZ_COUNT: u32 = 30;

/// Join key for a single verse.
///
/// Ordering is numeric: chapter first, then verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseKey {
    pub chapter: u32,
    pub verse: u32,
}

impl VerseKey {
    pub fn new(chapter: u32, verse: u32) -> Self {
        Self { chapter, verse }
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}

/// One word occurrence and the verse it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRecord {
    pub id: WordId,
    pub chapter: u32,
    pub verse: u32,
}

impl WordRecord {
    pub fn key(&self) -> VerseKey {
        VerseKey::new(self.chapter, self.verse)
    }
}

/// Classification of a layout line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
    /// Recitation text
    Ayah,
    /// Chapter header
    SurahName,
    /// Basmala line preceding a chapter
    Basmallah,
    #[default]
    #[serde(other)]
    Other,
}

impl LineType {
    /// Classify a `line_type` value; unknown names map to `Other`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ayah" => LineType::Ayah,
            "surah_name" => LineType::SurahName,
            "basmallah" => LineType::Basmallah,
            _ => LineType::Other,
        }
    }
}

/// A single line of the 15-line page layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLine {
    pub page_number: u32,
    pub line_type: LineType,
    pub first_word_id: Option<WordId>,
    pub last_word_id: Option<WordId>,
}

impl PageLine {
    pub fn is_verse_line(&self) -> bool {
        self.line_type == LineType::Ayah
    }

    /// Inclusive word range, present only for verse lines with both bounds set.
    pub fn word_range(&self) -> Option<(WordId, WordId)> {
        if !self.is_verse_line() {
            return None;
        }
        Some((self.first_word_id?, self.last_word_id?))
    }
}

/// One verse entry of the verse-text dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseEntry {
    pub verse: u32,
    pub text: String,
}

/// Result of looking a verse up in [`VerseTexts`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerseLookup<'a> {
    Found(&'a str),
    MissingChapter,
    MissingVerse,
}

/// Verse texts keyed by chapter number as written in the source document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerseTexts {
    chapters: HashMap<String, Vec<VerseEntry>>,
}

impl VerseTexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a verse to a chapter, creating the chapter if needed.
    pub fn insert(&mut self, chapter: u32, verse: u32, text: impl Into<String>) {
        self.push_entry(
            chapter.to_string(),
            VerseEntry {
                verse,
                text: text.into(),
            },
        );
    }

    /// Append an entry under a chapter key exactly as it appears in the document.
    pub fn push_entry(&mut self, chapter: String, entry: VerseEntry) {
        self.chapters.entry(chapter).or_default().push(entry);
    }

    /// Make sure a chapter key exists even when none of its entries survived.
    pub fn ensure_chapter(&mut self, chapter: String) {
        self.chapters.entry(chapter).or_default();
    }

    pub fn chapter(&self, chapter: u32) -> Option<&[VerseEntry]> {
        self.chapters
            .get(&chapter.to_string())
            .map(|verses| verses.as_slice())
    }

    /// Find the text for a verse. The first matching entry of a chapter wins.
    pub fn lookup(&self, key: VerseKey) -> VerseLookup<'_> {
        match self.chapter(key.chapter) {
            None => VerseLookup::MissingChapter,
            Some(verses) => verses
                .iter()
                .find(|v| v.verse == key.verse)
                .map(|v| VerseLookup::Found(v.text.as_str()))
                .unwrap_or(VerseLookup::MissingVerse),
        }
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn verse_count(&self) -> usize {
        self.chapters.values().map(|v| v.len()).sum()
    }
}

/// All three input datasets held in memory
#[derive(Debug, Clone, Default)]
pub struct RawData {
    pub lines: Vec<PageLine>,
    pub words: Vec<WordRecord>,
    pub verses: VerseTexts,
}

/// One verse on one page, as written to the output document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
    pub page: u32,
    pub hasanah: u64,
}

impl OutputRecord {
    pub fn key(&self) -> VerseKey {
        VerseKey::new(self.chapter, self.verse)
    }
}

/// Chapter -> records mapping that keeps chapters in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterMap {
    entries: Vec<(String, Vec<OutputRecord>)>,
    positions: HashMap<String, usize>,
}

impl ChapterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to its chapter's list.
    pub fn push(&mut self, record: OutputRecord) {
        let chapter = record.chapter.to_string();
        self.extend_chapter(chapter, std::iter::once(record));
    }

    fn extend_chapter<I>(&mut self, chapter: String, records: I)
    where
        I: IntoIterator<Item = OutputRecord>,
    {
        let idx = match self.positions.get(&chapter) {
            Some(&idx) => idx,
            None => {
                self.entries.push((chapter.clone(), Vec::new()));
                self.positions.insert(chapter, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[idx].1.extend(records);
    }

    pub fn get(&self, chapter: &str) -> Option<&[OutputRecord]> {
        self.positions
            .get(chapter)
            .map(|&idx| self.entries[idx].1.as_slice())
    }

    /// Chapters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[OutputRecord])> {
        self.entries
            .iter()
            .map(|(chapter, records)| (chapter.as_str(), records.as_slice()))
    }

    /// All records, chapter by chapter
    pub fn records(&self) -> impl Iterator<Item = &OutputRecord> {
        self.entries.iter().flat_map(|(_, records)| records.iter())
    }

    /// Records placed on a page, in document order
    pub fn records_on_page(&self, page: u32) -> Vec<&OutputRecord> {
        self.records().filter(|r| r.page == page).collect()
    }

    pub fn chapter_count(&self) -> usize {
        self.entries.len()
    }

    pub fn record_count(&self) -> usize {
        self.entries.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn total_hasanah(&self) -> u64 {
        self.records().map(|r| r.hasanah).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ChapterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (chapter, records) in &self.entries {
            map.serialize_entry(chapter, records)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChapterMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChapterMapVisitor;

        impl<'de> Visitor<'de> for ChapterMapVisitor {
            type Value = ChapterMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of chapter numbers to verse records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ChapterMap, A::Error> {
                let mut chapters = ChapterMap::new();
                while let Some((chapter, records)) =
                    access.next_entry::<String, Vec<OutputRecord>>()?
                {
                    chapters.extend_chapter(chapter, records);
                }
                Ok(chapters)
            }
        }

        deserializer.deserialize_map(ChapterMapVisitor)
    }
}

/// Order of verse keys within a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerseOrder {
    /// (chapter, verse) numeric order
    #[default]
    Numeric,
    /// `chapter:verse` string order, matching the legacy Python output
    Lexicographic,
}

impl VerseOrder {
    pub fn sort(self, keys: &mut [VerseKey]) {
        match self {
            VerseOrder::Numeric => keys.sort_unstable(),
            VerseOrder::Lexicographic => keys.sort_by_cached_key(|k| k.to_string()),
        }
    }
}

/// Join parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinParams {
    pub verse_order: VerseOrder,
    pub parallel: bool,      // Scan layout lines with rayon
    pub show_progress: bool, // Progress bar on stderr
}

impl Default for JoinParams {
    fn default() -> Self {
        Self {
            verse_order: VerseOrder::Numeric,
            parallel: true,
            show_progress: false,
        }
    }
}

/// Counters collected while joining
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinSummary {
    pub verse_lines: usize,      // Verse lines with both bounds present
    pub skipped_lines: usize,    // Verse lines missing a bound
    pub pages: usize,            // Pages with at least one verse
    pub records: usize,
    pub missing_chapters: usize, // (page, verse) pairs whose chapter has no texts
    pub missing_verses: usize,   // (page, verse) pairs whose verse has no text
}

impl JoinSummary {
    pub fn warning_count(&self) -> usize {
        self.missing_chapters + self.missing_verses
    }
}

/// Output of the join phase
#[derive(Debug, Clone, Default)]
pub struct JoinResult {
    pub chapters: ChapterMap,
    pub summary: JoinSummary,
}

/// Locations of the three input datasets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub layout: PathBuf,
    pub words: PathBuf,
    pub verses: PathBuf,
}

/// Directory holding the datasets in the project checkout
pub const RESOURCES_DIR: &str = "source/resources";

impl Default for InputPaths {
    fn default() -> Self {
        let dir = PathBuf::from(RESOURCES_DIR);
        Self {
            layout: dir.join("qpc-v2-15-lines.json"),
            words: dir.join("qpc-v2-word-by-word.json"),
            verses: dir.join("quran.json"),
        }
    }
}

/// Default location of the generated dataset
pub fn default_output_path() -> PathBuf {
    PathBuf::from(RESOURCES_DIR).join("detailed_quran.json")
}

/// Juz (1-30) containing a page
pub fn juz_for_page(page: u32) -> u32 {
    page.div_ceil(PAGES_PER_JUZ).min(JUZ_COUNT)
}
