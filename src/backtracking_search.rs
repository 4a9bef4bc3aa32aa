//! This module implements grid-filling using a depth-first backtracking search. Before searching we
//! enforce node consistency and run AC-3 over the whole grid; during the search we pick slots by
//! minimum remaining values (ties broken by higher degree, then lower slot id) and try each slot's
//! options in least-constraining-value order. Optionally, each choice can be followed by an
//! incremental AC-3 pass over a copy of the domains, which is thrown away when we backtrack.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::arc_consistency::{arcs_into, enforce_node_consistency, establish_arc_consistency};
use crate::assignment::Assignment;
use crate::domains::Domains;
use crate::grid_config::GridConfig;
use crate::types::{SlotId, WordId};
use crate::util::build_glyph_counts;
use crate::CHECK_INVARIANTS;

/// How many states should we visit between checks of the deadline and the abort flag?
pub const INTERRUPT_FREQUENCY: usize = 10;

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: usize,
    pub backtracks: usize,
    pub revisions: usize,
    pub eliminations: usize,
    pub total_time: Duration,
    pub initial_arc_consistency_time: Duration,
    pub search_time: Duration,
}

/// Knobs for a single fill operation. The defaults search until the space is exhausted.
#[derive(Debug, Default, Clone, Copy)]
pub struct FillOptions<'a> {
    /// Give up with `FillFailure::Timeout` once this much time has passed.
    pub timeout: Option<Duration>,

    /// Give up with `FillFailure::ExceededBacktrackLimit` after this many backtracks.
    pub max_backtracks: Option<usize>,

    /// Re-run arc consistency from each choice, on a copy of the domains.
    pub maintain_arc_consistency: bool,

    /// An optional flag that can be set from elsewhere to cancel the fill.
    pub abort: Option<&'a AtomicBool>,
}

/// A struct representing the results of a successful fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

/// Reasons a fill can end without an assignment. `HardFailure` means the grid has no solution at
/// all; the others mean we stopped looking before finding out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillFailure {
    #[error("No solution")]
    HardFailure,

    #[error("Timed out before finding a fill")]
    Timeout,

    #[error("Fill was aborted")]
    Abort,

    #[error("Gave up after {0} backtracks")]
    ExceededBacktrackLimit(usize),
}

/// Identify the next slot we should try to fill: the unassigned slot with the fewest remaining
/// options, preferring slots with more crossings and then lower ids.
#[must_use]
pub fn select_unassigned_slot(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<SlotId> {
    (0..config.slot_count())
        .filter(|&slot_id| !assignment.is_assigned(slot_id))
        .min_by_key(|&slot_id| {
            (
                domains.option_count(slot_id),
                Reverse(config.degree(slot_id)),
                slot_id,
            )
        })
}

/// Order a slot's options by how many options they'd rule out in unassigned crossing slots, fewest
/// first. Ties keep their word-list order.
#[must_use]
pub fn order_domain_values(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
    slot_id: SlotId,
) -> Vec<WordId> {
    let word_list = &config.word_list;

    // For each unassigned neighbor: our cell index, its option count, and its glyph counts at the
    // shared cell.
    let neighbor_counts: Vec<_> = config
        .neighbors(slot_id)
        .iter()
        .filter(|&&other_id| !assignment.is_assigned(other_id))
        .filter_map(|&other_id| {
            config.overlap(slot_id, other_id).map(|(cell, other_cell)| {
                (
                    cell,
                    domains.option_count(other_id),
                    build_glyph_counts(word_list, domains.get(other_id), other_cell),
                )
            })
        })
        .collect();

    let mut options = domains.get(slot_id).to_vec();
    options.sort_by_cached_key(|&word_id| {
        let glyphs = &word_list.words[word_id].glyphs;
        neighbor_counts
            .iter()
            .map(|(cell, option_count, counts)| {
                glyphs
                    .get(*cell)
                    .map_or(*option_count, |&glyph| option_count - counts[glyph] as usize)
            })
            .sum::<usize>()
    });
    options
}

/// The live state of one search: everything except the domains, which are passed down the
/// recursion so that each level can own a narrowed copy if it needs one.
struct Search<'a> {
    config: &'a GridConfig,
    options: &'a FillOptions<'a>,
    deadline: Option<Instant>,
    assignment: Assignment,
    statistics: Statistics,
}

impl<'a> Search<'a> {
    fn check_interrupts(&self) -> Result<(), FillFailure> {
        if self.statistics.states % INTERRUPT_FREQUENCY != 0 {
            return Ok(());
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(FillFailure::Timeout);
            }
        }
        if let Some(abort) = self.options.abort {
            if abort.load(Ordering::Relaxed) {
                return Err(FillFailure::Abort);
            }
        }
        Ok(())
    }

    /// Extend the current assignment to a complete one if possible. `Ok(true)` means the
    /// assignment is now complete, `Ok(false)` means this branch is a dead end and the assignment
    /// is back the way we found it.
    fn backtrack(&mut self, domains: &Domains) -> Result<bool, FillFailure> {
        self.statistics.states += 1;
        self.check_interrupts()?;

        let Some(slot_id) = select_unassigned_slot(self.config, domains, &self.assignment) else {
            return Ok(true);
        };

        for word_id in order_domain_values(self.config, domains, &self.assignment, slot_id) {
            if self.assignment.is_consistent_choice(self.config, slot_id, word_id) {
                self.assignment.assign(slot_id, word_id);

                if CHECK_INVARIANTS {
                    assert!(
                        self.assignment.is_consistent(self.config),
                        "Inconsistent assignment after accepted choice in slot {slot_id}"
                    );
                }

                log::trace!(
                    "Trying {} = {}",
                    self.config.slot_configs[slot_id].slot_key(),
                    self.config.word_list.words[word_id].normalized_string
                );

                if self.options.maintain_arc_consistency {
                    let mut branch_domains = domains.clone();
                    branch_domains.set(slot_id, vec![word_id]);

                    match establish_arc_consistency(
                        self.config,
                        &mut branch_domains,
                        Some(arcs_into(self.config, slot_id)),
                    ) {
                        Ok(success) => {
                            self.statistics.revisions += success.revisions;
                            self.statistics.eliminations += success.eliminations;
                            if self.backtrack(&branch_domains)? {
                                return Ok(true);
                            }
                        }
                        Err(failure) => {
                            self.statistics.revisions += failure.revisions;
                            self.statistics.eliminations += failure.eliminations;
                        }
                    }
                } else if self.backtrack(domains)? {
                    return Ok(true);
                }

                self.assignment.unassign(slot_id);
            }

            self.statistics.backtracks += 1;
            if let Some(max_backtracks) = self.options.max_backtracks {
                if self.statistics.backtracks > max_backtracks {
                    return Err(FillFailure::ExceededBacktrackLimit(self.statistics.backtracks));
                }
            }
        }

        Ok(false)
    }
}

/// Search for a valid fill for the given grid: enforce node and arc consistency, then backtrack.
pub fn find_fill(config: &GridConfig, options: &FillOptions) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    let deadline = options.timeout.map(|timeout| start + timeout);
    let mut statistics = Statistics::default();

    let mut domains = Domains::new(config);
    statistics.eliminations += enforce_node_consistency(config, &mut domains);

    if let Some(slot_id) = domains.empty_slot() {
        log::debug!(
            "No options for slot {} after node consistency",
            config.slot_configs[slot_id].slot_key()
        );
        return Err(FillFailure::HardFailure);
    }

    // If we can't even establish initial arc consistency, we're obviously not going to be able to
    // find a fill.
    match establish_arc_consistency(config, &mut domains, None) {
        Ok(success) => {
            statistics.revisions += success.revisions;
            statistics.eliminations += success.eliminations;
        }
        Err(failure) => {
            log::debug!(
                "Arc consistency wiped out slot {} after {} revisions",
                config.slot_configs[failure.slot_id].slot_key(),
                failure.revisions
            );
            return Err(FillFailure::HardFailure);
        }
    }
    statistics.initial_arc_consistency_time = start.elapsed();

    log::debug!(
        "Initial propagation left {} options across {} slots ({} eliminated)",
        domains.total_option_count(),
        domains.slot_count(),
        statistics.eliminations
    );

    let mut search = Search {
        config,
        options,
        deadline,
        assignment: Assignment::new(config.slot_count()),
        statistics,
    };

    let search_start = Instant::now();
    let found = search.backtrack(&domains);
    search.statistics.search_time = search_start.elapsed();
    search.statistics.total_time = start.elapsed();

    log::debug!("Search finished: {:?}", search.statistics);

    if found? {
        Ok(FillSuccess {
            statistics: search.statistics,
            assignment: search.assignment,
        })
    } else {
        Err(FillFailure::HardFailure)
    }
}

/// Search for a valid fill with default options, i.e. until the search space is exhausted.
pub fn solve(config: &GridConfig) -> Result<Assignment, FillFailure> {
    find_fill(config, &FillOptions::default()).map(|success| success.assignment)
}
