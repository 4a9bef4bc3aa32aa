//! This module contains the constraint-propagation half of the solver: node consistency for the
//! unary constraints on each slot (its length and any prefilled letters) and an AC-3 variant for
//! the binary constraints between crossing slots. A grid is arc-consistent when, for every pair
//! of crossing slots `(x, y)`, every option left for `x` has at least one option left for `y` with
//! the same letter in their shared cell.
//!
//! The worklist is a LIFO stack, seeded in slot order and drained from the end, and an arc that's
//! already queued isn't pushed again. AC-3 reaches the same fixed point in any processing order, so
//! this only affects how much work gets done, never which options survive.

use std::collections::HashSet;
use std::fmt::Debug;

use crate::domains::Domains;
use crate::grid_config::GridConfig;
use crate::types::SlotId;
use crate::util::build_glyph_counts;

/// An ordered pair `(x, y)` meaning "make `x` consistent with `y`".
pub type SlotArc = (SlotId, SlotId);

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were popped from the worklist and checked.
    pub revisions: usize,

    /// How many options were removed in total.
    pub eliminations: usize,
}

/// Result from a failed call to `establish_arc_consistency`, identifying the slot whose domain was
/// wiped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
    pub revisions: usize,
    pub eliminations: usize,
}

/// Result from a call to `establish_arc_consistency`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Remove every option that violates a slot's unary constraints: it must be exactly as long as the
/// slot and it must agree with any letters already written into the slot's cells. Returns the
/// number of options removed. Running this more than once is harmless.
pub fn enforce_node_consistency(config: &GridConfig, domains: &mut Domains) -> usize {
    let word_list = &config.word_list;
    let mut eliminations = 0;

    for slot_config in &config.slot_configs {
        let prefilled: Vec<(usize, char)> = slot_config
            .cell_coords()
            .into_iter()
            .enumerate()
            .filter_map(|(cell_idx, loc)| {
                config
                    .prefilled_letter(loc)
                    .map(|letter| (cell_idx, letter))
            })
            .collect();

        eliminations += domains.retain(slot_config.id, |word_id| {
            let word = &word_list.words[word_id];
            word.length() == slot_config.length
                && prefilled
                    .iter()
                    .all(|&(cell_idx, letter)| word_list.glyphs[word.glyphs[cell_idx]] == letter)
        });
    }

    eliminations
}

/// Make `x` arc-consistent with `y`: remove every option of `x` whose letter at the shared cell
/// doesn't appear at the corresponding cell of any option of `y`. Returns the number of options
/// removed, which is zero if the two slots don't overlap.
pub fn revise(config: &GridConfig, domains: &mut Domains, x: SlotId, y: SlotId) -> usize {
    let Some((x_cell, y_cell)) = config.overlap(x, y) else {
        return 0;
    };

    // Snapshot what `y` can offer before touching `x`'s options.
    let y_counts = build_glyph_counts(&config.word_list, domains.get(y), y_cell);
    let words = &config.word_list.words;

    // An option too short to reach the shared cell has nothing to match, so it goes too.
    domains.retain(x, |word_id| {
        words[word_id]
            .glyphs
            .get(x_cell)
            .is_some_and(|&glyph| y_counts[glyph] > 0)
    })
}

/// Every ordered pair of crossing slots in the grid, in slot order.
#[must_use]
pub fn all_arcs(config: &GridConfig) -> Vec<SlotArc> {
    (0..config.slot_count())
        .flat_map(|x| config.neighbors(x).iter().map(move |&y| (x, y)))
        .collect()
}

/// The arcs that need rechecking after `slot_id`'s domain has shrunk: every neighbor made
/// consistent with it.
#[must_use]
pub fn arcs_into(config: &GridConfig, slot_id: SlotId) -> Vec<SlotArc> {
    config
        .neighbors(slot_id)
        .iter()
        .map(|&z| (z, slot_id))
        .collect()
}

/// Run AC-3 until the worklist is empty or a domain is wiped out. With `arcs` set to `None` the
/// worklist starts with every arc in the grid; otherwise it starts with just the given arcs, which
/// is enough if the grid was previously consistent and only the arcs' targets have changed since.
pub fn establish_arc_consistency(
    config: &GridConfig,
    domains: &mut Domains,
    arcs: Option<Vec<SlotArc>>,
) -> ArcConsistencyResult {
    let mut queue: Vec<SlotArc> = arcs.unwrap_or_else(|| all_arcs(config));
    let mut queued: HashSet<SlotArc> = queue.iter().copied().collect();
    let mut revisions = 0;
    let mut eliminations = 0;

    while let Some((x, y)) = queue.pop() {
        queued.remove(&(x, y));
        revisions += 1;

        let removed = revise(config, domains, x, y);
        if removed == 0 {
            continue;
        }
        eliminations += removed;

        if domains.option_count(x) == 0 {
            log::trace!(
                "Arc consistency wiped out slot {} after {revisions} revisions",
                config.slot_configs[x].slot_key()
            );
            return Err(ArcConsistencyFailure {
                slot_id: x,
                revisions,
                eliminations,
            });
        }

        // `x` lost options, so anything previously judged consistent with it needs another look.
        for &z in config.neighbors(x) {
            if z != y && queued.insert((z, x)) {
                queue.push((z, x));
            }
        }
    }

    Ok(ArcConsistencySuccess {
        revisions,
        eliminations,
    })
}
