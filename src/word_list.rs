use smallvec::{smallvec, SmallVec};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fmt::Debug;
use std::fs;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::types::{GlyphId, WordId};
use crate::{MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// A struct representing a word in the word list.
#[derive(Debug, Clone)]
pub struct Word {
    /// The word as it would appear in a grid: uppercase, NFC-normalized, no whitespace.
    pub normalized_string: String,

    /// The glyph ids making up `normalized_string`.
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// The number of glyphs in the word, which is what gets compared against a slot's length.
    #[must_use]
    pub fn length(&self) -> usize {
        self.glyphs.len()
    }
}

/// Given a raw word string from a dictionary file, turn it into the normalized form we'll use in
/// the actual fill engine. This is the only place normalization happens; after loading, every
/// comparison is exact.
#[must_use]
pub fn normalize_word(raw: &str) -> String {
    raw.to_uppercase()
        .nfc() // Normalize Unicode combining forms
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WordListError {
    #[error("Can’t read file: “{0}”")]
    InvalidPath(String),

    #[error("Word list contains invalid word: “{0}”")]
    InvalidWord(String),
}

/// Configuration describing a source of wordlist entries.
pub enum WordListSourceConfig {
    Memory { id: String, words: Vec<String> },
    File { id: String, path: OsString },
    FileContents { id: String, contents: &'static str },
}

impl WordListSourceConfig {
    /// The unique, persistent id of this word list.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            WordListSourceConfig::Memory { id, .. }
            | WordListSourceConfig::FileContents { id, .. }
            | WordListSourceConfig::File { id, .. } => id.clone(),
        }
    }
}

#[derive(Debug)]
pub struct WordListSourceState {
    pub id: String,
    pub errors: Vec<WordListError>,
}

/// Parse dictionary text with one word per line. Anything after a `;` is ignored so that scored
/// lists ("word;50") can be used unchanged; blank lines are skipped.
fn parse_word_list_file_contents(
    file_contents: &str,
    errors: &mut Vec<WordListError>,
) -> Vec<String> {
    file_contents
        .lines()
        .filter_map(|line| {
            let raw = line.split(';').next().unwrap_or("").trim();
            if raw.is_empty() {
                return None;
            }

            let normalized = normalize_word(raw);
            if normalized.chars().any(char::is_control) {
                errors.push(WordListError::InvalidWord(raw.into()));
                return None;
            }

            Some(normalized)
        })
        .collect()
}

fn load_words_from_source(source: &WordListSourceConfig) -> (Vec<String>, WordListSourceState) {
    let id = source.id();
    let mut errors = vec![];

    let entries = match source {
        WordListSourceConfig::Memory { words, .. } => words
            .iter()
            .filter_map(|raw| {
                let normalized = normalize_word(raw);
                if normalized.is_empty() || normalized.chars().any(char::is_control) {
                    errors.push(WordListError::InvalidWord(raw.clone()));
                    return None;
                }
                Some(normalized)
            })
            .collect(),

        WordListSourceConfig::File { path, .. } => {
            if let Ok(contents) = fs::read_to_string(path) {
                parse_word_list_file_contents(&contents, &mut errors)
            } else {
                errors.push(WordListError::InvalidPath(path.to_string_lossy().into()));
                vec![]
            }
        }

        WordListSourceConfig::FileContents { contents, .. } => {
            parse_word_list_file_contents(contents, &mut errors)
        }
    };

    (entries, WordListSourceState { id, errors })
}

/// A struct representing the loaded word list(s). Words are deduplicated after normalization, and
/// `WordId`s are assigned in load order; that order is also the order in which every slot's
/// candidates are iterated, so it's part of what makes a fill reproducible.
pub struct WordList {
    /// A list of all characters that occur in any (normalized) word. `GlyphId`s used everywhere
    /// else are indices into this list.
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,

    /// The inverse of `glyphs`: a map from a character to the `GlyphId` representing it.
    pub glyph_id_by_char: HashMap<char, GlyphId>,

    /// All loaded words, indexed by `WordId`.
    pub words: Vec<Word>,

    /// `WordId`s bucketed by word length, so `word_ids_by_length[0]` is always empty.
    pub word_ids_by_length: Vec<Vec<WordId>>,

    /// A map from a normalized string to the id of the Word representing it.
    pub word_id_by_string: HashMap<String, WordId>,

    /// The maximum word length provided when configuring the WordList, if any.
    pub max_length: Option<usize>,

    /// The state of each word list source after loading, in source order.
    pub source_states: Vec<WordListSourceState>,
}

impl WordList {
    /// Construct a new `WordList` using the given sources, in priority order (omitting any entries
    /// that are longer than `max_length`).
    #[must_use]
    pub fn new(source_configs: &[WordListSourceConfig], max_length: Option<usize>) -> WordList {
        let mut instance = WordList {
            glyphs: smallvec![],
            glyph_id_by_char: HashMap::new(),
            words: vec![],
            word_ids_by_length: vec![vec![]],
            word_id_by_string: HashMap::new(),
            max_length,
            source_states: vec![],
        };

        for source in source_configs {
            let (entries, source_state) = load_words_from_source(source);

            for normalized in entries {
                if max_length.map_or(false, |max_length| normalized.chars().count() > max_length)
                {
                    continue;
                }
                instance.add_word(&normalized);
            }

            instance.source_states.push(source_state);
        }

        instance
    }

    /// Convenience constructor for a single in-memory list.
    #[must_use]
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> WordList {
        WordList::new(
            &[WordListSourceConfig::Memory {
                id: "0".into(),
                words: words.iter().map(|word| word.as_ref().to_string()).collect(),
            }],
            None,
        )
    }

    /// Add the given normalized word unless it's already present, returning its id either way.
    pub fn add_word(&mut self, normalized_word: &str) -> WordId {
        if let Some(&word_id) = self.word_id_by_string.get(normalized_word) {
            return word_id;
        }

        let glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]> = normalized_word
            .chars()
            .map(|c| self.glyph_id_for_char(c))
            .collect();

        let word_length = glyphs.len();
        while self.word_ids_by_length.len() < word_length + 1 {
            self.word_ids_by_length.push(vec![]);
        }

        let word_id = self.words.len();
        self.words.push(Word {
            normalized_string: normalized_word.to_string(),
            glyphs,
        });
        self.word_ids_by_length[word_length].push(word_id);
        self.word_id_by_string
            .insert(normalized_word.to_string(), word_id);

        word_id
    }

    /// What's the unique glyph id for the given char? We do this lazily, instead of just mapping
    /// every letter up front, because word list entries may also contain numbers, non-English
    /// letters, or punctuation.
    pub fn glyph_id_for_char(&mut self, ch: char) -> GlyphId {
        self.glyph_id_by_char.get(&ch).copied().unwrap_or_else(|| {
            self.glyphs.push(ch);
            let id = self.glyphs.len() - 1;
            self.glyph_id_by_char.insert(ch, id);
            id
        })
    }

    /// The ids of all words with exactly the given length, in load order.
    #[must_use]
    pub fn word_ids_of_length(&self, length: usize) -> &[WordId] {
        self.word_ids_by_length
            .get(length)
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// For each source provided at load time, return any errors it emitted.
    #[must_use]
    pub fn get_source_errors(&self) -> HashMap<String, Vec<WordListError>> {
        self.source_states
            .iter()
            .map(|state| (state.id.clone(), state.errors.clone()))
            .collect()
    }
}

impl Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field(
                "words_by_length",
                &self
                    .word_ids_by_length
                    .iter()
                    .map(Vec::len)
                    .collect::<Vec<_>>(),
            )
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}
