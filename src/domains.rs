//! The mutable side of a fill: each slot's current list of candidate words. Candidates are only
//! ever removed after initialization, and they stay in word-list order.

use std::fmt;
use std::fmt::{Debug, Formatter};

use crate::grid_config::GridConfig;
use crate::types::{SlotId, WordId};

#[derive(Clone, PartialEq, Eq)]
pub struct Domains {
    options: Vec<Vec<WordId>>,
}

impl Domains {
    /// Seed every slot with all words whose length matches the slot's length.
    #[must_use]
    pub fn new(config: &GridConfig) -> Domains {
        Domains {
            options: config
                .slot_configs
                .iter()
                .map(|slot_config| config.word_list.word_ids_of_length(slot_config.length).to_vec())
                .collect(),
        }
    }

    /// Seed every slot with every word in the list, regardless of length. Node consistency is then
    /// responsible for the length constraint.
    #[must_use]
    pub fn unfiltered(config: &GridConfig) -> Domains {
        let all_words: Vec<WordId> = (0..config.word_list.len()).collect();
        Domains {
            options: vec![all_words; config.slot_count()],
        }
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> &[WordId] {
        &self.options[slot_id]
    }

    pub fn set(&mut self, slot_id: SlotId, options: Vec<WordId>) {
        self.options[slot_id] = options;
    }

    /// Remove a single word from a slot's candidates, returning whether it was present.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        let options = &mut self.options[slot_id];
        match options.iter().position(|&id| id == word_id) {
            Some(idx) => {
                options.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Keep only the candidates for which `keep` returns true, returning how many were removed.
    pub fn retain<F: FnMut(WordId) -> bool>(&mut self, slot_id: SlotId, mut keep: F) -> usize {
        let options = &mut self.options[slot_id];
        let before = options.len();
        options.retain(|&word_id| keep(word_id));
        before - options.len()
    }

    #[must_use]
    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.options[slot_id].contains(&word_id)
    }

    /// How many candidates remain for the given slot?
    #[must_use]
    pub fn option_count(&self, slot_id: SlotId) -> usize {
        self.options[slot_id].len()
    }

    /// The first slot (by id) that has no candidates left, if any. Any such slot means the
    /// problem is unsatisfiable from this state.
    #[must_use]
    pub fn empty_slot(&self) -> Option<SlotId> {
        self.options.iter().position(Vec::is_empty)
    }

    #[must_use]
    pub fn total_option_count(&self) -> usize {
        self.options.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.options.len()
    }
}

impl Debug for Domains {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domains")
            .field(
                "option_counts",
                &self.options.iter().map(Vec::len).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::domains::Domains;
    use crate::grid_config::generate_grid_config_from_template_string;
    use crate::word_list::WordList;

    #[test]
    fn test_domains_are_seeded_by_length() {
        let config = generate_grid_config_from_template_string(
            WordList::from_words(&["cat", "door", "dog", "at"]),
            "
            ____
            _###
            _###
            ",
        )
        .unwrap();

        let domains = Domains::new(&config);

        // Slot 0 is the 4-letter across, slot 1 the 3-letter down.
        assert_eq!(domains.get(0), &[1]);
        assert_eq!(domains.get(1), &[0, 2]);
        assert_eq!(domains.total_option_count(), 3);
        assert_eq!(domains.empty_slot(), None);
    }

    #[test]
    fn test_removal() {
        let config = generate_grid_config_from_template_string(
            WordList::from_words(&["cat", "cot", "dog"]),
            "___",
        )
        .unwrap();

        let mut domains = Domains::new(&config);
        assert_eq!(domains.option_count(0), 3);

        assert!(domains.remove(0, 1));
        assert!(!domains.remove(0, 1));
        assert!(!domains.contains(0, 1));
        assert_eq!(domains.get(0), &[0, 2]);

        assert_eq!(domains.retain(0, |word_id| word_id != 0), 1);
        assert_eq!(domains.get(0), &[2]);

        domains.set(0, vec![]);
        assert_eq!(domains.empty_slot(), Some(0));
    }

    #[test]
    fn test_unfiltered_domains_include_every_word() {
        let config = generate_grid_config_from_template_string(
            WordList::from_words(&["cat", "door"]),
            "___",
        )
        .unwrap();

        assert_eq!(Domains::unfiltered(&config).get(0), &[0, 1]);
    }
}
