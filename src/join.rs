//! Page/verse join orchestration.
//!
//! This module coordinates the full pipeline: loading the datasets, indexing
//! words by verse, mapping layout lines to the verses they overlap, and
//! building the per-chapter output records.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::index::{build_verse_index, VerseIndex, VerseInterval};
use crate::loader::{load_all, LoadError};
use crate::models::*;
use crate::score::calculate_hasanah;

/// Verse intervals sorted by lower bound for range queries.
#[derive(Debug, Clone)]
pub struct OverlapIndex {
    intervals: Vec<VerseInterval>,
}

impl OverlapIndex {
    pub fn new(index: &VerseIndex) -> Self {
        let mut intervals = index.intervals();
        intervals.sort_by_key(|iv| (iv.first_word, iv.key));
        Self { intervals }
    }

    /// Verses whose interval intersects `[first, last]`.
    ///
    /// Only intervals starting at or before `last` can match, so the scan
    /// stops at that prefix and checks the upper bound on each candidate.
    pub fn overlapping(&self, first: WordId, last: WordId) -> impl Iterator<Item = VerseKey> + '_ {
        let end = self.intervals.partition_point(|iv| iv.first_word <= last);
        self.intervals[..end]
            .iter()
            .filter(move |iv| iv.overlaps(first, last))
            .map(|iv| iv.key)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Verse keys accumulated per page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageVerseMap {
    pages: BTreeMap<u32, BTreeSet<VerseKey>>,
    pub verse_lines: usize,
    pub skipped_lines: usize,
}

impl PageVerseMap {
    pub fn insert(&mut self, page: u32, key: VerseKey) {
        self.pages.entry(page).or_default().insert(key);
    }

    pub fn verses_on(&self, page: u32) -> Option<&BTreeSet<VerseKey>> {
        self.pages.get(&page)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &BTreeSet<VerseKey>)> {
        self.pages.iter().map(|(&page, keys)| (page, keys))
    }
}

fn progress_bar(len: usize, show_progress: bool) -> Option<ProgressBar> {
    if !show_progress {
        return None;
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({per_sec})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );
    Some(pb)
}

/// Map every verse line of the layout to the verses overlapping its word range.
///
/// Lines that are not verse lines are ignored. Verse lines missing either
/// bound are counted as skipped. A page only appears once a verse overlaps
/// one of its lines.
pub fn map_pages_to_verses(
    lines: &[PageLine],
    index: &VerseIndex,
    params: &JoinParams,
) -> PageVerseMap {
    let overlap = OverlapIndex::new(index);
    let mut map = PageVerseMap::default();

    let mut ranges: Vec<(u32, WordId, WordId)> = Vec::new();
    for line in lines.iter().filter(|l| l.is_verse_line()) {
        match line.word_range() {
            Some((first, last)) => ranges.push((line.page_number, first, last)),
            None => map.skipped_lines += 1,
        }
    }
    map.verse_lines = ranges.len();

    if map.skipped_lines > 0 {
        debug!(skipped = map.skipped_lines, "Verse lines without word ids");
    }
    info!(
        lines = ranges.len(),
        verses = overlap.len(),
        "Mapping pages to verses..."
    );

    let progress = progress_bar(ranges.len(), params.show_progress);

    let scan = |&(page, first, last): &(u32, WordId, WordId)| -> (u32, Vec<VerseKey>) {
        let keys: Vec<VerseKey> = overlap.overlapping(first, last).collect();
        if let Some(ref pb) = progress {
            pb.inc(1);
        }
        (page, keys)
    };

    let per_line: Vec<(u32, Vec<VerseKey>)> = if params.parallel {
        ranges.par_iter().map(scan).collect()
    } else {
        ranges.iter().map(scan).collect()
    };

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    for (page, keys) in per_line {
        for key in keys {
            map.insert(page, key);
        }
    }

    info!(pages = map.page_count(), "Mapped pages");
    map
}

/// Build output records for every (page, verse) pair.
///
/// Pages are visited in ascending order and verses within a page in
/// `params.verse_order`. Pairs whose chapter or verse has no text are
/// reported and left out of the output.
pub fn build_records(page_map: &PageVerseMap, verses: &VerseTexts, params: &JoinParams) -> JoinResult {
    let mut chapters = ChapterMap::new();
    let mut summary = JoinSummary {
        verse_lines: page_map.verse_lines,
        skipped_lines: page_map.skipped_lines,
        pages: page_map.page_count(),
        ..Default::default()
    };

    for (page, keys) in page_map.iter() {
        let mut ordered: Vec<VerseKey> = keys.iter().copied().collect();
        params.verse_order.sort(&mut ordered);

        for key in ordered {
            match verses.lookup(key) {
                VerseLookup::Found(text) => {
                    chapters.push(OutputRecord {
                        chapter: key.chapter,
                        verse: key.verse,
                        text: text.to_string(),
                        page,
                        hasanah: calculate_hasanah(text),
                    });
                    summary.records += 1;
                }
                VerseLookup::MissingChapter => {
                    warn!(chapter = key.chapter, verse = key.verse, page, "Chapter not found in verse texts");
                    summary.missing_chapters += 1;
                }
                VerseLookup::MissingVerse => {
                    warn!(verse = %key, page, "Verse not found in verse texts");
                    summary.missing_verses += 1;
                }
            }
        }
    }

    info!(
        chapters = chapters.chapter_count(),
        records = summary.records,
        "Built verse records"
    );

    JoinResult { chapters, summary }
}

/// Join already-loaded datasets.
pub fn join(raw: &RawData, index: &VerseIndex, params: &JoinParams) -> JoinResult {
    let page_map = map_pages_to_verses(&raw.lines, index, params);
    build_records(&page_map, &raw.verses, params)
}

/// Load the three datasets from disk and join them.
pub fn build_from_files(paths: &InputPaths, params: &JoinParams) -> Result<JoinResult, LoadError> {
    let raw = load_all(paths)?;

    info!("Processing data...");
    let index = build_verse_index(&raw.words);

    Ok(join(&raw, &index, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_for(chapter: u32, verse: u32, ids: std::ops::RangeInclusive<WordId>) -> Vec<WordRecord> {
        ids.map(|id| WordRecord { id, chapter, verse }).collect()
    }

    fn ayah_line(page: u32, first: WordId, last: WordId) -> PageLine {
        PageLine {
            page_number: page,
            line_type: LineType::Ayah,
            first_word_id: Some(first),
            last_word_id: Some(last),
        }
    }

    fn sample_index() -> VerseIndex {
        let mut words = Vec::new();
        words.extend(words_for(1, 1, 1..=2));
        words.extend(words_for(1, 2, 3..=6));
        words.extend(words_for(1, 3, 7..=12));
        words.extend(words_for(2, 1, 13..=13));
        build_verse_index(&words)
    }

    fn sequential() -> JoinParams {
        JoinParams {
            parallel: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_overlap_index_matches_naive_scan() {
        let index = sample_index();
        let overlap = OverlapIndex::new(&index);

        for first in 0..15 {
            for last in first..15 {
                let mut fast: Vec<VerseKey> = overlap.overlapping(first, last).collect();
                fast.sort();
                let naive: Vec<VerseKey> = index
                    .intervals()
                    .into_iter()
                    .filter(|iv| iv.first_word <= last && iv.last_word >= first)
                    .map(|iv| iv.key)
                    .collect();
                assert_eq!(fast, naive, "range [{}, {}]", first, last);
            }
        }
    }

    #[test]
    fn test_partial_overlap_includes_verse() {
        // Line [1, 5] against verse 1:2 with ids {3..6}
        let index = sample_index();
        let map = map_pages_to_verses(&[ayah_line(1, 1, 5)], &index, &sequential());

        let keys = map.verses_on(1).unwrap();
        assert!(keys.contains(&VerseKey::new(1, 2)));
        assert!(keys.contains(&VerseKey::new(1, 1)));
        assert!(!keys.contains(&VerseKey::new(1, 3)));
    }

    #[test]
    fn test_single_word_line() {
        let index = sample_index();
        let map = map_pages_to_verses(&[ayah_line(4, 9, 9)], &index, &sequential());
        let keys: Vec<VerseKey> = map.verses_on(4).unwrap().iter().copied().collect();
        assert_eq!(keys, vec![VerseKey::new(1, 3)]);
    }

    #[test]
    fn test_non_verse_lines_and_missing_bounds_are_skipped() {
        let index = sample_index();
        let lines = vec![
            PageLine {
                page_number: 1,
                line_type: LineType::SurahName,
                first_word_id: Some(1),
                last_word_id: Some(2),
            },
            PageLine {
                page_number: 2,
                line_type: LineType::Ayah,
                first_word_id: Some(3),
                last_word_id: None,
            },
            ayah_line(3, 13, 13),
        ];

        let map = map_pages_to_verses(&lines, &index, &sequential());
        assert_eq!(map.page_count(), 1);
        assert_eq!(map.verse_lines, 1);
        assert_eq!(map.skipped_lines, 1);
        assert!(map.verses_on(1).is_none());
        assert!(map.verses_on(2).is_none());
    }

    #[test]
    fn test_zero_identifier_participates() {
        let words = vec![
            WordRecord { id: 0, chapter: 1, verse: 1 },
            WordRecord { id: 1, chapter: 1, verse: 1 },
        ];
        let index = build_verse_index(&words);
        let map = map_pages_to_verses(&[ayah_line(1, 0, 0)], &index, &sequential());
        assert!(map.verses_on(1).unwrap().contains(&VerseKey::new(1, 1)));
    }

    #[test]
    fn test_line_without_overlap_creates_no_page() {
        let index = sample_index();
        let map = map_pages_to_verses(&[ayah_line(9, 100, 200)], &index, &sequential());
        assert_eq!(map.page_count(), 0);
        assert_eq!(map.verse_lines, 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let index = sample_index();
        let lines: Vec<PageLine> = (1..=13).map(|id| ayah_line(id / 4 + 1, id, id)).collect();

        let seq = map_pages_to_verses(&lines, &index, &sequential());
        let par = map_pages_to_verses(&lines, &index, &JoinParams::default());
        assert_eq!(seq, par);
    }

    #[test]
    fn test_verse_spanning_pages_yields_record_per_page() {
        let index = sample_index();
        let raw = RawData {
            lines: vec![ayah_line(1, 1, 8), ayah_line(2, 9, 13)],
            words: Vec::new(),
            verses: {
                let mut v = VerseTexts::new();
                v.insert(1, 1, "\u{0628}");
                v.insert(1, 2, "\u{0628}\u{0628}");
                v.insert(1, 3, "\u{0628}\u{0628}\u{0628}");
                v.insert(2, 1, "\u{0628}\u{0628}\u{0628}\u{0628}");
                v
            },
        };

        let result = join(&raw, &index, &sequential());
        let pages: Vec<(u32, u32)> = result
            .chapters
            .get("1")
            .unwrap()
            .iter()
            .map(|r| (r.verse, r.page))
            .collect();
        assert_eq!(pages, vec![(1, 1), (2, 1), (3, 1), (3, 2)]);
        assert_eq!(result.chapters.get("2").unwrap()[0].hasanah, 40);
        assert_eq!(result.summary.records, 5);
        assert_eq!(result.summary.pages, 2);
    }

    #[test]
    fn test_missing_verse_is_skipped() {
        let words: Vec<WordRecord> = [(9, 4, 1), (9, 5, 2), (9, 6, 3)]
            .iter()
            .map(|&(chapter, verse, id)| WordRecord { id, chapter, verse })
            .collect();
        let index = build_verse_index(&words);

        let mut verses = VerseTexts::new();
        verses.insert(9, 4, "\u{0628}");
        verses.insert(9, 6, "\u{0628}");

        let raw = RawData {
            lines: vec![ayah_line(187, 1, 3)],
            words,
            verses,
        };

        let result = join(&raw, &index, &sequential());
        let verses: Vec<u32> = result.chapters.records().map(|r| r.verse).collect();
        assert_eq!(verses, vec![4, 6]);
        assert_eq!(result.summary.missing_verses, 1);
        assert_eq!(result.summary.missing_chapters, 0);
    }

    #[test]
    fn test_missing_chapter_is_skipped() {
        let words = vec![
            WordRecord { id: 1, chapter: 1, verse: 1 },
            WordRecord { id: 2, chapter: 2, verse: 1 },
        ];
        let index = build_verse_index(&words);
        let mut verses = VerseTexts::new();
        verses.insert(1, 1, "\u{0628}");

        let raw = RawData {
            lines: vec![ayah_line(1, 1, 2)],
            words,
            verses,
        };

        let result = join(&raw, &index, &sequential());
        assert_eq!(result.chapters.chapter_count(), 1);
        assert!(result.chapters.get("2").is_none());
        assert_eq!(result.summary.missing_chapters, 1);
        assert_eq!(result.summary.warning_count(), 1);
    }

    #[test]
    fn test_verse_order_within_page() {
        let words = vec![
            WordRecord { id: 1, chapter: 2, verse: 1 },
            WordRecord { id: 2, chapter: 10, verse: 1 },
        ];
        let index = build_verse_index(&words);
        let mut verses = VerseTexts::new();
        verses.insert(2, 1, "\u{0628}");
        verses.insert(10, 1, "\u{0628}");
        let raw = RawData {
            lines: vec![ayah_line(1, 1, 2)],
            words,
            verses,
        };

        let numeric = join(&raw, &index, &sequential());
        let order: Vec<&str> = numeric.chapters.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["2", "10"]);

        let legacy = JoinParams {
            verse_order: VerseOrder::Lexicographic,
            parallel: false,
            ..Default::default()
        };
        let lexicographic = join(&raw, &index, &legacy);
        let order: Vec<&str> = lexicographic.chapters.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["10", "2"]);
    }
}
