//! Crossword grid filling framed as a constraint-satisfaction problem: slots are variables, words
//! are values, and crossing cells are binary constraints. A fill runs node consistency and AC-3
//! over the slot domains, then a backtracking search ordered by MRV/degree and
//! least-constraining-value.

pub mod arc_consistency;
pub mod assignment;
pub mod backtracking_search;
pub mod domains;
pub mod grid_config;
pub mod render;
pub mod types;
pub mod util;
pub mod word_list;

pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum number of distinct characters/rebuses/whatever appearing in a word list.
pub const MAX_GLYPH_COUNT: usize = 256;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
