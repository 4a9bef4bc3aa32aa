//! Turning an assignment into letters on the grid. Everything downstream of the solver (printing,
//! saving, drawing) works from `letter_grid` or its string form.

use crate::assignment::{Assignment, Choice};
use crate::grid_config::GridConfig;

/// The letter in each cell, row by row. `None` for blocks and for fillable cells with no letter.
pub type LetterGrid = Vec<Vec<Option<char>>>;

/// Write the assigned words (and any prefilled letters) into a `height` x `width` grid.
#[must_use]
pub fn letter_grid(config: &GridConfig, assignment: &Assignment) -> LetterGrid {
    let mut grid: LetterGrid = (0..config.height)
        .map(|row| {
            (0..config.width)
                .map(|col| config.prefilled_letter((row, col)))
                .collect()
        })
        .collect();

    for Choice { slot_id, word_id } in assignment.choices() {
        let word = &config.word_list.words[word_id];
        let coords = config.slot_configs[slot_id].cell_coords();

        for (&(row, col), &glyph) in coords.iter().zip(&word.glyphs) {
            grid[row][col] = Some(config.word_list.glyphs[glyph]);
        }
    }

    grid
}

/// Turn the given grid config and assignment into a rendered string, with `#` for blocks and `.`
/// for fillable cells that are still empty.
#[must_use]
pub fn render_grid(config: &GridConfig, assignment: &Assignment) -> String {
    render_grid_with_block(config, assignment, '#')
}

/// Like `render_grid`, but drawing blocks with `block` (e.g. `█` for terminal output).
#[must_use]
pub fn render_grid_with_block(
    config: &GridConfig,
    assignment: &Assignment,
    block: char,
) -> String {
    letter_grid(config, assignment)
        .iter()
        .enumerate()
        .map(|(row, line)| {
            line.iter()
                .enumerate()
                .map(|(col, cell)| match cell {
                    Some(letter) => *letter,
                    None if config.is_fillable((row, col)) => '.',
                    None => block,
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
