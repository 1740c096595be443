//! Verse -> word-id index built from the word-by-word dataset.

use crate::models::{VerseKey, WordId, WordRecord};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Word-id interval covered by one verse (inclusive on both ends)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseInterval {
    pub key: VerseKey,
    pub first_word: WordId,
    pub last_word: WordId,
}

impl VerseInterval {
    /// Closed-interval intersection with a line's `[first, last]` range.
    #[inline]
    pub fn overlaps(&self, first: WordId, last: WordId) -> bool {
        self.first_word <= last && self.last_word >= first
    }
}

/// Read-only mapping from verse key to the word ids of that verse.
#[derive(Debug, Clone, Default)]
pub struct VerseIndex {
    words: BTreeMap<VerseKey, Vec<WordId>>,
}

impl VerseIndex {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word_ids(&self, key: VerseKey) -> Option<&[WordId]> {
        self.words.get(&key).map(|ids| ids.as_slice())
    }

    pub fn interval(&self, key: VerseKey) -> Option<VerseInterval> {
        self.words.get(&key).and_then(|ids| interval_of(key, ids))
    }

    /// Intervals for every indexed verse, in key order.
    pub fn intervals(&self) -> Vec<VerseInterval> {
        self.words
            .iter()
            .filter_map(|(&key, ids)| interval_of(key, ids))
            .collect()
    }
}

fn interval_of(key: VerseKey, ids: &[WordId]) -> Option<VerseInterval> {
    let first_word = ids.iter().copied().min()?;
    let last_word = ids.iter().copied().max()?;
    Some(VerseInterval {
        key,
        first_word,
        last_word,
    })
}

/// Group word ids by verse.
///
/// Every record contributes its id, so a verse with N records holds N ids.
/// Duplicate ids inside one verse and zero ids are reported but kept.
pub fn build_verse_index(words: &[WordRecord]) -> VerseIndex {
    let mut index: BTreeMap<VerseKey, Vec<WordId>> = BTreeMap::new();
    let mut zero_ids = 0usize;

    for word in words {
        if word.id == 0 {
            zero_ids += 1;
        }
        index.entry(word.key()).or_default().push(word.id);
    }

    if zero_ids > 0 {
        warn!(count = zero_ids, "Word records with identifier 0 found");
    }

    for (key, ids) in &index {
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        if unique.len() != ids.len() {
            warn!(
                verse = %key,
                duplicates = ids.len() - unique.len(),
                "Duplicate word ids in verse"
            );
        }
    }

    info!(verses = index.len(), "Found unique verses");

    VerseIndex { words: index }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(id: WordId, chapter: u32, verse: u32) -> WordRecord {
        WordRecord { id, chapter, verse }
    }

    #[test]
    fn test_build_groups_by_verse() {
        let words = vec![
            word(1, 1, 1),
            word(2, 1, 1),
            word(3, 1, 2),
            word(4, 1, 2),
            word(5, 1, 2),
            word(6, 2, 1),
        ];

        let index = build_verse_index(&words);
        assert_eq!(index.len(), 3);
        assert_eq!(index.word_ids(VerseKey::new(1, 1)), Some(&[1, 2][..]));
        assert_eq!(index.word_ids(VerseKey::new(1, 2)).unwrap().len(), 3);
        assert_eq!(index.word_ids(VerseKey::new(3, 1)), None);
    }

    #[test]
    fn test_duplicates_are_preserved() {
        let words = vec![word(7, 1, 1), word(7, 1, 1), word(8, 1, 1)];
        let index = build_verse_index(&words);
        assert_eq!(index.word_ids(VerseKey::new(1, 1)), Some(&[7, 7, 8][..]));
    }

    #[test]
    fn test_interval_uses_min_and_max() {
        let words = vec![word(6, 1, 1), word(3, 1, 1), word(5, 1, 1), word(4, 1, 1)];
        let index = build_verse_index(&words);
        let interval = index.interval(VerseKey::new(1, 1)).unwrap();
        assert_eq!(interval.first_word, 3);
        assert_eq!(interval.last_word, 6);
    }

    #[test]
    fn test_intervals_in_key_order() {
        let words = vec![word(10, 10, 1), word(1, 2, 1), word(5, 2, 10)];
        let index = build_verse_index(&words);
        let keys: Vec<VerseKey> = index.intervals().iter().map(|iv| iv.key).collect();
        assert_eq!(
            keys,
            vec![VerseKey::new(2, 1), VerseKey::new(2, 10), VerseKey::new(10, 1)]
        );
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let interval = VerseInterval {
            key: VerseKey::new(1, 1),
            first_word: 3,
            last_word: 6,
        };
        assert!(interval.overlaps(1, 5));
        assert!(interval.overlaps(6, 9)); // touches upper bound
        assert!(interval.overlaps(1, 3)); // touches lower bound
        assert!(interval.overlaps(4, 4));
        assert!(!interval.overlaps(7, 9));
        assert!(!interval.overlaps(1, 2));
    }

    #[test]
    fn test_empty_index() {
        let index = build_verse_index(&[]);
        assert!(index.is_empty());
        assert!(index.intervals().is_empty());
    }
}
