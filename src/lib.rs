//! Quran Page Mapping Library
//!
//! Builds the detailed verse dataset used by the Murajah viewer: every verse
//! annotated with the mushaf page it appears on and its hasanah score.
//!
//! Three datasets are joined: the 15-line page layout, the word-by-word index
//! and the verse texts. Each verse line's word-id range is matched against the
//! word-id interval of every verse; overlapping verses are placed on the line's
//! page.
//!
//! # Example
//!
//! ```no_run
//! use quran_pagemap::prelude::*;
//! use std::path::Path;
//!
//! let paths = InputPaths::default();
//! let params = JoinParams::default();
//!
//! // Load, index and join
//! let raw = load_all(&paths).unwrap();
//! let index = build_verse_index(&raw.words);
//! let result = join(&raw, &index, &params);
//!
//! write_json_file(&result.chapters, Path::new("detailed_quran.json")).unwrap();
//! println!("{} verses", result.summary.records);
//! ```
//!
//! # Scoring Example
//!
//! ```
//! use quran_pagemap::score::calculate_hasanah;
//!
//! // Diacritics are ignored: seven base letters
//! assert_eq!(calculate_hasanah("بِسْمِ اللَّهِ"), 70);
//! ```

pub mod index;
pub mod join;
pub mod loader;
pub mod models;
pub mod output;
pub mod score;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::index::{build_verse_index, VerseIndex, VerseInterval};
    pub use crate::join::{
        build_from_files, build_records, join, map_pages_to_verses, OverlapIndex, PageVerseMap,
    };
    pub use crate::loader::{
        load_all, load_page_layout, load_verse_texts, load_word_index, parse_page_layout,
        parse_verse_texts, parse_word_index, LoadError,
    };
    pub use crate::models::{
        default_output_path, juz_for_page, ChapterMap, InputPaths, JoinParams, JoinResult,
        JoinSummary, LineType, OutputRecord, PageLine, RawData, VerseEntry, VerseKey,
        VerseLookup, VerseOrder, VerseTexts, WordId, WordRecord,
    };
    pub use crate::output::{
        format_record, print_page, print_sample, print_summary, read_json_file, write_json,
        write_json_file, OutputError,
    };
    pub use crate::score::{
        calculate_hasanah, count_arabic_characters, strip_diacritics, HASANAH_PER_LETTER,
    };
}

// Re-export commonly used types at the crate root
pub use models::{ChapterMap, JoinParams, JoinResult, OutputRecord, VerseKey, VerseOrder};
