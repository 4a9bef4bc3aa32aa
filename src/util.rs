use smallvec::SmallVec;

use crate::types::WordId;
use crate::word_list::WordList;
use crate::MAX_GLYPH_COUNT;

/// Number of occurrences of each glyph, indexed by `GlyphId`, in one cell of a slot's options.
pub type GlyphCounts = SmallVec<[u32; MAX_GLYPH_COUNT]>;

/// Count, for a single cell index, how many of the given options have each glyph there. This is
/// what lets us answer "does any option of this slot have letter L at cell C?" in constant time.
#[must_use]
pub fn build_glyph_counts(word_list: &WordList, options: &[WordId], cell_idx: usize) -> GlyphCounts {
    let mut result: GlyphCounts = (0..word_list.glyphs.len()).map(|_| 0).collect();

    for &word_id in options {
        if let Some(&glyph) = word_list.words[word_id].glyphs.get(cell_idx) {
            result[glyph] += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use crate::util::build_glyph_counts;
    use crate::word_list::WordList;

    #[test]
    fn test_build_glyph_counts() {
        let word_list = WordList::from_words(&["cat", "cot", "dog", "at"]);
        let options: Vec<_> = (0..word_list.len()).collect();

        let counts = build_glyph_counts(&word_list, &options, 2);
        let t = word_list.glyph_id_by_char[&'T'];
        let g = word_list.glyph_id_by_char[&'G'];
        let c = word_list.glyph_id_by_char[&'C'];

        assert_eq!(counts.len(), word_list.glyphs.len());
        assert_eq!(counts[t], 2);
        assert_eq!(counts[g], 1);
        assert_eq!(counts[c], 0);
    }
}
