use std::collections::HashMap;

use crate::grid_config::GridConfig;
use crate::types::{SlotId, WordId};

/// A struct recording a slot assignment made during a fill process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A partial mapping from slot to word. It grows and shrinks while searching and is total once a
/// fill succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    /// An empty assignment for a grid with the given number of slots.
    #[must_use]
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            words: vec![None; slot_count],
            assigned_count: 0,
        }
    }

    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        if self.words[slot_id].replace(word_id).is_none() {
            self.assigned_count += 1;
        }
    }

    pub fn unassign(&mut self, slot_id: SlotId) {
        if self.words[slot_id].take().is_some() {
            self.assigned_count -= 1;
        }
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    #[must_use]
    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words[slot_id].is_some()
    }

    /// How many slots currently have a word?
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    /// Does every slot have a word?
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.words.len()
    }

    /// The assigned slots and their words, in slot order.
    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| Choice { slot_id, word_id }))
            .collect()
    }

    /// Would assigning `word_id` to `slot_id` keep an already-consistent assignment consistent?
    /// This only checks the new word against the slots that are already assigned, and ignores any
    /// word currently assigned to `slot_id` itself.
    #[must_use]
    pub fn is_consistent_choice(&self, config: &GridConfig, slot_id: SlotId, word_id: WordId) -> bool {
        let word_list = &config.word_list;
        let word = &word_list.words[word_id];

        if word.length() != config.slot_configs[slot_id].length {
            return false;
        }

        let is_dupe = self
            .words
            .iter()
            .enumerate()
            .any(|(other_id, other)| other_id != slot_id && *other == Some(word_id));
        if is_dupe {
            return false;
        }

        config.neighbors(slot_id).iter().all(|&other_id| {
            let (Some(other_word_id), Some((cell, other_cell))) =
                (self.words[other_id], config.overlap(slot_id, other_id))
            else {
                return true;
            };
            word.glyphs[cell] == word_list.words[other_word_id].glyphs[other_cell]
        })
    }

    /// Is the whole assignment consistent? Every word must fit its slot's length, no word may be
    /// used twice, and every pair of assigned crossing slots must agree on their shared cell.
    #[must_use]
    pub fn is_consistent(&self, config: &GridConfig) -> bool {
        let word_list = &config.word_list;
        let mut seen: HashMap<WordId, SlotId> = HashMap::with_capacity(self.assigned_count);

        for choice in self.choices() {
            if word_list.words[choice.word_id].length() != config.slot_configs[choice.slot_id].length
            {
                return false;
            }
            if seen.insert(choice.word_id, choice.slot_id).is_some() {
                return false;
            }
        }

        self.choices().iter().all(|choice| {
            let word = &word_list.words[choice.word_id];
            config.neighbors(choice.slot_id).iter().all(|&other_id| {
                match (self.words[other_id], config.overlap(choice.slot_id, other_id)) {
                    (Some(other_word_id), Some((cell, other_cell))) => {
                        word.glyphs[cell] == word_list.words[other_word_id].glyphs[other_cell]
                    }
                    _ => true,
                }
            })
        })
    }

    /// The assigned words as strings keyed by slot key, which is handy for logging and tests.
    #[must_use]
    pub fn to_word_map(&self, config: &GridConfig) -> HashMap<String, String> {
        self.choices()
            .into_iter()
            .map(|Choice { slot_id, word_id }| {
                (
                    config.slot_configs[slot_id].slot_key(),
                    config.word_list.words[word_id].normalized_string.clone(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::assignment::{Assignment, Choice};
    use crate::grid_config::{generate_grid_config_from_template_string, GridConfig};
    use crate::word_list::WordList;

    fn generate_config() -> GridConfig {
        generate_grid_config_from_template_string(
            WordList::from_words(&["cat", "cop", "dog", "at"]),
            "
            ___
            _##
            _##
            ",
        )
        .unwrap()
    }

    #[test]
    fn test_assign_and_unassign() {
        let mut assignment = Assignment::new(2);
        assert!(assignment.is_empty());

        assignment.assign(0, 1);
        assignment.assign(0, 2);
        assert_eq!(assignment.len(), 1);
        assert_eq!(assignment.get(0), Some(2));
        assert!(!assignment.is_complete());

        assignment.assign(1, 0);
        assert!(assignment.is_complete());
        assert_eq!(
            assignment.choices(),
            vec![
                Choice {
                    slot_id: 0,
                    word_id: 2
                },
                Choice {
                    slot_id: 1,
                    word_id: 0
                }
            ]
        );

        assignment.unassign(0);
        assignment.unassign(0);
        assert_eq!(assignment.len(), 1);
        assert!(!assignment.is_assigned(0));
    }

    #[test]
    fn test_consistency() {
        let config = generate_config();
        let cat = config.word_list.word_id_by_string["CAT"];
        let cop = config.word_list.word_id_by_string["COP"];
        let dog = config.word_list.word_id_by_string["DOG"];
        let at = config.word_list.word_id_by_string["AT"];

        let mut assignment = Assignment::new(2);
        assert!(assignment.is_consistent(&config));

        assignment.assign(0, cat);
        assert!(assignment.is_consistent(&config));
        assert!(assignment.is_consistent_choice(&config, 1, cop));
        assert!(!assignment.is_consistent_choice(&config, 1, cat), "dupe");
        assert!(!assignment.is_consistent_choice(&config, 1, dog), "crossing");
        assert!(!assignment.is_consistent_choice(&config, 1, at), "length");

        assignment.assign(1, cop);
        assert!(assignment.is_consistent(&config));
        assert_eq!(
            assignment.to_word_map(&config)["0,0,down,3"],
            "COP".to_string()
        );

        assignment.assign(1, cat);
        assert!(!assignment.is_consistent(&config));

        assignment.assign(1, dog);
        assert!(!assignment.is_consistent(&config));

        assignment.assign(1, at);
        assert!(!assignment.is_consistent(&config));
    }
}
