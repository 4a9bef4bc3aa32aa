//! This module implements the immutable description of a puzzle: which cells are fillable, the
//! slots derived from them, and the crossings between slots. It's independent of the specific
//! fill algorithm.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::Debug;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{GridCoord, SlotId};
use crate::word_list::{normalize_word, WordList};
use crate::MAX_SLOT_LENGTH;

/// Errors that make a structure or word list unusable before any filling starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Grid must have at least one row")]
    EmptyStructure,

    #[error("Rows in grid must all be the same length (row {row} has {found} cells, expected {expected})")]
    InconsistentRowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid character {found:?} at row {row}, column {col}")]
    InvalidCell { row: usize, col: usize, found: char },

    #[error("Fillable cell at row {row}, column {col} isn't part of any slot")]
    OrphanCell { row: usize, col: usize },

    #[error("Word list is empty")]
    EmptyWordList,
}

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

/// A single square of the structure.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Cell {
    Blocked,
    /// A fillable square, optionally prefilled with a (normalized) letter.
    Open(Option<char>),
}

impl Cell {
    #[must_use]
    pub fn is_fillable(self) -> bool {
        matches!(self, Cell::Open(_))
    }
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        self.slot_spec().cell_coords()
    }

    /// Generate a `SlotSpec` identifying this slot.
    #[must_use]
    pub fn slot_spec(&self) -> SlotSpec {
        SlotSpec {
            start_cell: self.start_cell,
            direction: self.direction,
            length: self.length,
        }
    }

    /// Generate a string key identifying this slot.
    #[must_use]
    pub fn slot_key(&self) -> String {
        self.slot_spec().to_key()
    }
}

/// A struct identifying a specific slot in the grid.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct SlotSpec {
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl SlotSpec {
    /// Parse a string like "1,2,down,5" (row, column, direction, length) into a `SlotSpec`.
    pub fn from_key(key: &str) -> Result<SlotSpec, String> {
        let key_parts: Vec<&str> = key.split(',').collect();
        if key_parts.len() != 4 {
            return Err(format!("invalid slot key: {key}"));
        }

        let row: Result<usize, _> = key_parts[0].parse();
        let col: Result<usize, _> = key_parts[1].parse();
        let direction: Option<Direction> = match key_parts[2] {
            "across" => Some(Direction::Across),
            "down" => Some(Direction::Down),
            _ => None,
        };
        let length: Result<usize, _> = key_parts[3].parse();

        if let (Ok(row), Ok(col), Some(direction), Ok(length)) = (row, col, direction, length) {
            Ok(SlotSpec {
                start_cell: (row, col),
                direction,
                length,
            })
        } else {
            Err(format!("invalid slot key: {key:?}"))
        }
    }

    /// Represent this slot as a string like "1,2,down,5".
    #[must_use]
    pub fn to_key(&self) -> String {
        let direction = match self.direction {
            Direction::Across => "across",
            Direction::Down => "down",
        };
        format!(
            "{},{},{},{}",
            self.start_cell.0, self.start_cell.1, direction, self.length,
        )
    }

    /// Generate the coords for each cell of this entry.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| match self.direction {
                Direction::Across => (self.start_cell.0, self.start_cell.1 + cell_idx),
                Direction::Down => (self.start_cell.0 + cell_idx, self.start_cell.1),
            })
            .collect()
    }
}

/// Serialize a `SlotSpec` into a string key.
#[cfg(feature = "serde")]
impl Serialize for SlotSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

/// Deserialize a `SlotSpec` from a string key.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SlotSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_string = String::deserialize(deserializer)?;
        SlotSpec::from_key(&raw_string).map_err(serde::de::Error::custom)
    }
}

/// A struct holding everything about a puzzle that stays fixed while we fill it: the word list,
/// the structure, the slots, and the overlap relation between them.
pub struct GridConfig {
    /// The word list used to fill the grid; see `word_list.rs`.
    pub word_list: WordList,

    /// A flat array of cells, in order of row and then column.
    pub cells: Vec<Cell>,

    /// Config representing all of the slots in the grid and their crossings.
    pub slot_configs: Vec<SlotConfig>,

    /// The width and height of the grid.
    pub width: usize,
    pub height: usize,

    /// For each slot, the ids of every other slot it crosses, ascending.
    neighbors: Vec<SmallVec<[SlotId; MAX_SLOT_LENGTH]>>,

    /// For each ordered pair of crossing slots `(x, y)`, the cell index within `x` and within `y`
    /// where they must agree.
    overlaps: HashMap<(SlotId, SlotId), (usize, usize)>,
}

impl GridConfig {
    /// Is the cell at the given coords part of a word?
    #[must_use]
    pub fn is_fillable(&self, (row, col): GridCoord) -> bool {
        row < self.height && col < self.width && self.cells[row * self.width + col].is_fillable()
    }

    /// The prefilled letter at the given coords, if any.
    #[must_use]
    pub fn prefilled_letter(&self, (row, col): GridCoord) -> Option<char> {
        match self.cells[row * self.width + col] {
            Cell::Open(letter) => letter,
            Cell::Blocked => None,
        }
    }

    /// Every slot that shares a cell with the given one, in ascending id order.
    #[must_use]
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.neighbors[slot_id]
    }

    /// The number of slots crossing the given one.
    #[must_use]
    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.neighbors[slot_id].len()
    }

    /// The cell indices `(within x, within y)` at which slots `x` and `y` must agree, or `None` if
    /// they don't constrain each other.
    #[must_use]
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<(usize, usize)> {
        self.overlaps.get(&(x, y)).copied()
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("slot_configs", &self.slot_configs)
            .field("word_list", &self.word_list)
            .finish_non_exhaustive()
    }
}

/// Given `SlotSpec`s specifying the positions of the slots in a grid, generate `SlotConfig`s
/// containing derived information about crossings.
#[must_use]
pub fn generate_slot_configs(entries: &[SlotSpec]) -> Vec<SlotConfig> {
    // Build a map from cell location to entries involved, which we can then use to calculate
    // crossings. Each entry is (entry index, cell index within entry).
    let mut entries_by_loc: HashMap<GridCoord, SmallVec<[(usize, usize); 2]>> = HashMap::new();

    for (entry_idx, entry) in entries.iter().enumerate() {
        for (cell_idx, loc) in entry.cell_coords().into_iter().enumerate() {
            entries_by_loc
                .entry(loc)
                .or_default()
                .push((entry_idx, cell_idx));
        }
    }

    entries
        .iter()
        .enumerate()
        .map(|(entry_idx, entry)| {
            let crossings = entry
                .cell_coords()
                .iter()
                .map(|loc| {
                    let mut others = entries_by_loc[loc]
                        .iter()
                        .filter(|&&(other_idx, _)| other_idx != entry_idx);

                    let crossing = others.next().map(|&(other_slot_id, other_slot_cell)| Crossing {
                        other_slot_id,
                        other_slot_cell,
                    });
                    assert!(
                        others.next().is_none(),
                        "More than two entries crossing in cell {loc:?}?"
                    );
                    crossing
                })
                .collect();

            SlotConfig {
                id: entry_idx,
                start_cell: entry.start_cell,
                direction: entry.direction,
                length: entry.length,
                crossings,
            }
        })
        .collect()
}

/// Derive the neighbor and overlap tables from the slots' crossings. A pair of slots gets an
/// overlap only if they share exactly one cell.
fn build_overlaps(
    slot_configs: &[SlotConfig],
) -> (
    Vec<SmallVec<[SlotId; MAX_SLOT_LENGTH]>>,
    HashMap<(SlotId, SlotId), (usize, usize)>,
) {
    let mut shared_cells: HashMap<(SlotId, SlotId), SmallVec<[(usize, usize); 1]>> =
        HashMap::new();

    for slot_config in slot_configs {
        for (cell_idx, crossing) in slot_config.crossings.iter().enumerate() {
            if let Some(crossing) = crossing {
                shared_cells
                    .entry((slot_config.id, crossing.other_slot_id))
                    .or_default()
                    .push((cell_idx, crossing.other_slot_cell));
            }
        }
    }

    let overlaps: HashMap<(SlotId, SlotId), (usize, usize)> = shared_cells
        .into_iter()
        .filter(|(_, cells)| cells.len() == 1)
        .map(|(pair, cells)| (pair, cells[0]))
        .collect();

    let neighbors = slot_configs
        .iter()
        .map(|slot_config| {
            (0..slot_configs.len())
                .filter(|&other_id| overlaps.contains_key(&(slot_config.id, other_id)))
                .collect()
        })
        .collect();

    (neighbors, overlaps)
}

/// Parse a template string into rows of cells. `_` and `.` are empty fillable cells, `#` and `█`
/// are blocks, and letters represent themselves.
pub fn parse_template(template: &str) -> Result<Vec<Vec<Cell>>, ConfigError> {
    let rows: Vec<Vec<Cell>> = template
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(row, line)| {
            line.chars()
                .enumerate()
                .map(|(col, c)| match c {
                    '_' | '.' => Ok(Cell::Open(None)),
                    '#' | '█' => Ok(Cell::Blocked),
                    // A letter whose normalized form isn't a single char (like ß -> SS) can't
                    // fit in one cell.
                    c if c.is_alphabetic() => {
                        let normalized = normalize_word(&c.to_string());
                        let mut chars = normalized.chars();
                        match (chars.next(), chars.next()) {
                            (Some(letter), None) => Ok(Cell::Open(Some(letter))),
                            _ => Err(ConfigError::InvalidCell { row, col, found: c }),
                        }
                    }
                    found => Err(ConfigError::InvalidCell { row, col, found }),
                })
                .collect::<Result<Vec<Cell>, ConfigError>>()
        })
        .collect::<Result<_, _>>()?;

    let Some(first_row) = rows.first() else {
        return Err(ConfigError::EmptyStructure);
    };

    let expected = first_row.len();
    if let Some((row, cells)) = rows
        .iter()
        .enumerate()
        .find(|(_, cells)| cells.len() != expected)
    {
        return Err(ConfigError::InconsistentRowLength {
            row,
            expected,
            found: cells.len(),
        });
    }

    Ok(rows)
}

/// Generate the list of `SlotSpec`s for a rectangular grid of cells: every maximal run of two or
/// more fillable cells, across slots first (row-major) and then down slots (column-major).
#[must_use]
pub fn generate_slots_from_cells(cells: &[Vec<Cell>]) -> Vec<SlotSpec> {
    fn build_words(lines: &[Vec<Cell>]) -> Vec<(usize, usize, usize)> {
        let mut result = vec![];

        for (line_idx, line) in lines.iter().enumerate() {
            let mut run_start: Option<usize> = None;

            for (idx, cell) in line.iter().enumerate() {
                match (cell.is_fillable(), run_start) {
                    (true, None) => run_start = Some(idx),
                    (false, Some(start)) => {
                        if idx - start > 1 {
                            result.push((line_idx, start, idx - start));
                        }
                        run_start = None;
                    }
                    _ => {}
                }
            }

            if let Some(start) = run_start {
                if line.len() - start > 1 {
                    result.push((line_idx, start, line.len() - start));
                }
            }
        }

        result
    }

    let mut slot_specs: Vec<SlotSpec> = build_words(cells)
        .into_iter()
        .map(|(row, col, length)| SlotSpec {
            start_cell: (row, col),
            direction: Direction::Across,
            length,
        })
        .collect();

    let width = cells.first().map_or(0, Vec::len);
    let transposed: Vec<Vec<Cell>> = (0..width)
        .map(|col| cells.iter().map(|line| line[col]).collect())
        .collect();

    slot_specs.extend(
        build_words(&transposed)
            .into_iter()
            .map(|(col, row, length)| SlotSpec {
                start_cell: (row, col),
                direction: Direction::Down,
                length,
            }),
    );

    slot_specs
}

/// Generate a `GridConfig` for a rectangular grid of cells.
pub fn generate_grid_config(
    word_list: WordList,
    cells: Vec<Vec<Cell>>,
) -> Result<GridConfig, ConfigError> {
    if word_list.is_empty() {
        return Err(ConfigError::EmptyWordList);
    }

    let height = cells.len();
    let width = cells.first().map_or(0, Vec::len);
    if height == 0 {
        return Err(ConfigError::EmptyStructure);
    }
    if let Some((row, line)) = cells
        .iter()
        .enumerate()
        .find(|(_, line)| line.len() != width)
    {
        return Err(ConfigError::InconsistentRowLength {
            row,
            expected: width,
            found: line.len(),
        });
    }

    let slot_specs = generate_slots_from_cells(&cells);

    let mut covered = vec![false; width * height];
    for spec in &slot_specs {
        for (row, col) in spec.cell_coords() {
            covered[row * width + col] = true;
        }
    }
    for (row, line) in cells.iter().enumerate() {
        for (col, cell) in line.iter().enumerate() {
            if cell.is_fillable() && !covered[row * width + col] {
                return Err(ConfigError::OrphanCell { row, col });
            }
        }
    }

    let slot_configs = generate_slot_configs(&slot_specs);
    let (neighbors, overlaps) = build_overlaps(&slot_configs);

    log::debug!(
        "Built {width}x{height} grid with {} slots and {} crossings",
        slot_configs.len(),
        overlaps.len() / 2
    );

    Ok(GridConfig {
        word_list,
        cells: cells.into_iter().flatten().collect(),
        slot_configs,
        width,
        height,
        neighbors,
        overlaps,
    })
}

/// Generate a `GridConfig` from a template string; see `parse_template` for the format.
pub fn generate_grid_config_from_template_string(
    word_list: WordList,
    template: &str,
) -> Result<GridConfig, ConfigError> {
    generate_grid_config(word_list, parse_template(template)?)
}

#[cfg(test)]
mod tests {
    use crate::grid_config::{
        generate_grid_config_from_template_string, parse_template, Cell, ConfigError, Direction,
        SlotSpec,
    };
    use crate::word_list::WordList;

    #[test]
    fn test_slots_and_overlaps() {
        let config = generate_grid_config_from_template_string(
            WordList::from_words(&["cat"]),
            "
            #___#
            #_##_
            #_##_
            #_#__
            ",
        )
        .unwrap();

        assert_eq!(config.width, 5);
        assert_eq!(config.height, 4);

        let keys: Vec<String> = config.slot_configs.iter().map(|s| s.slot_key()).collect();
        assert_eq!(
            keys,
            vec!["0,1,across,3", "3,3,across,2", "0,1,down,4", "1,4,down,3"]
        );

        // 0,1,across crosses 0,1,down in its first cell.
        assert_eq!(config.overlap(0, 2), Some((0, 0)));
        assert_eq!(config.overlap(2, 0), Some((0, 0)));
        // 3,3,across crosses 1,4,down at its second cell and the down's last cell.
        assert_eq!(config.overlap(1, 3), Some((1, 2)));
        assert_eq!(config.overlap(3, 1), Some((2, 1)));
        assert_eq!(config.overlap(0, 1), None);
        assert_eq!(config.overlap(0, 3), None);

        assert_eq!(config.neighbors(0), &[2]);
        assert_eq!(config.neighbors(2), &[0]);
        assert_eq!(config.degree(3), 1);

        assert!(config.is_fillable((0, 1)));
        assert!(!config.is_fillable((0, 0)));
        assert!(!config.is_fillable((9, 9)));
    }

    #[test]
    fn test_prefilled_letters() {
        let config = generate_grid_config_from_template_string(
            WordList::from_words(&["cat"]),
            "
            c._
            .##
            .##
            ",
        )
        .unwrap();

        assert_eq!(config.prefilled_letter((0, 0)), Some('C'));
        assert_eq!(config.prefilled_letter((0, 1)), None);
        assert_eq!(config.cells[3], Cell::Open(None));
    }

    #[test]
    fn test_inconsistent_row_lengths_are_rejected() {
        assert_eq!(
            parse_template("___\n__\n").unwrap_err(),
            ConfigError::InconsistentRowLength {
                row: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_invalid_cells_are_rejected() {
        assert_eq!(
            parse_template("_?_").unwrap_err(),
            ConfigError::InvalidCell {
                row: 0,
                col: 1,
                found: '?'
            }
        );

        // Uppercases to "SS", which doesn't fit in one cell.
        assert_eq!(
            parse_template("__ß").unwrap_err(),
            ConfigError::InvalidCell {
                row: 0,
                col: 2,
                found: 'ß'
            }
        );
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        assert_eq!(
            generate_grid_config_from_template_string(WordList::from_words(&["cat"]), "\n  \n")
                .unwrap_err(),
            ConfigError::EmptyStructure
        );

        let no_words: [&str; 0] = [];
        assert_eq!(
            generate_grid_config_from_template_string(WordList::from_words(&no_words), "___")
                .unwrap_err(),
            ConfigError::EmptyWordList
        );
    }

    #[test]
    fn test_orphan_cells_are_rejected() {
        assert_eq!(
            generate_grid_config_from_template_string(
                WordList::from_words(&["cat"]),
                "
                ___
                ###
                #_#
                "
            )
            .unwrap_err(),
            ConfigError::OrphanCell { row: 2, col: 1 }
        );
    }

    #[test]
    fn test_slot_key_round_trip() {
        let spec = SlotSpec::from_key("3,4,down,12").unwrap();
        assert_eq!(spec.start_cell, (3, 4));
        assert_eq!(spec.direction, Direction::Down);
        assert_eq!(spec.length, 12);
        assert_eq!(spec.to_key(), "3,4,down,12");

        assert!(SlotSpec::from_key("3,4,sideways,12").is_err());
        assert!(SlotSpec::from_key("3,4").is_err());
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use crate::grid_config::{Direction, SlotSpec};

    #[test]
    fn test_slot_spec_serialization() {
        let slot_spec = SlotSpec {
            start_cell: (1, 2),
            direction: Direction::Across,
            length: 5,
        };

        let slot_key = serde_json::to_string(&slot_spec).unwrap();

        assert_eq!(slot_key, "\"1,2,across,5\"");
    }

    #[test]
    fn test_slot_spec_deserialization() {
        let slot_spec: SlotSpec = serde_json::from_str("\"3,4,down,12\"").unwrap();

        assert_eq!(
            slot_spec,
            SlotSpec {
                start_cell: (3, 4),
                direction: Direction::Down,
                length: 12,
            }
        );
    }
}
