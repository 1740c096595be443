//! Base-letter counting and hasanah scoring for Arabic verse text.
//!
//! Short vowels, tanween, shadda, sukun, tatweel, the small high dotless
//! head of khah (U+06E1) and the superscript alef (U+0670) are removed before
//! counting, so adding or removing tashkeel never changes a verse's score.

/// Hasanah awarded per counted letter
pub const HASANAH_PER_LETTER: u64 = 10;

/// Marks removed before counting.
#[inline]
pub fn is_stripped_mark(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{0652}' | '\u{0640}' | '\u{06E1}' | '\u{0670}')
}

/// Base letters that are counted: hamza through yeh, plus alef wasla.
#[inline]
pub fn is_base_letter(c: char) -> bool {
    matches!(c, '\u{0621}'..='\u{064A}' | '\u{0671}')
}

/// Remove the stripped marks and all whitespace from a text.
pub fn strip_diacritics(text: &str) -> String {
    text.chars()
        .filter(|&c| !is_stripped_mark(c) && !c.is_whitespace())
        .collect()
}

/// Count the base Arabic letters in a text.
///
/// Tatweel lies inside the base-letter block but is a stripped mark, so it
/// never counts. Digits, punctuation and other scripts contribute nothing.
pub fn count_arabic_characters(text: &str) -> usize {
    text.chars()
        .filter(|&c| !is_stripped_mark(c) && !c.is_whitespace() && is_base_letter(c))
        .count()
}

/// Hasanah for a verse text: ten per base letter.
pub fn calculate_hasanah(text: &str) -> u64 {
    count_arabic_characters(text) as u64 * HASANAH_PER_LETTER
}
