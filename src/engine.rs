//! Incremental binary-insertion ranking.
//!
//! The engine ranks items through pairwise comparisons that arrive one at a
//! time, possibly long after they were asked for. Each new item (the
//! *challenger*) is placed into the already-ranked list by binary search, and
//! every probe of that search is a suspension point: the engine exposes the
//! comparison it needs via [`EngineState::current_comparison`] and does
//! nothing until [`EngineState::resolve`] is called with the outcome.
//!
//! The whole state is plain data and serde-serialisable, so a session can be
//! persisted between comparisons and resumed after a restart.
//!
//! Placing the k-th item into a list of k-1 items never takes more than
//! `ceil(log2(k))` comparisons.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Item;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("At least one item is required to start a ranking session")]
    InsufficientItems,
}

/// In-progress binary search for the challenger's position.
///
/// The search window is the half-open range `low..end` of the ranked
/// sequence. It shrinks by at least one slot per comparison; once it is empty
/// the challenger belongs at index `low`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementCursor {
    pub challenger: Item,
    pub low: usize,
    pub end: usize,
}

impl PlacementCursor {
    fn new(challenger: Item, ranked_len: usize) -> Self {
        Self {
            challenger,
            low: 0,
            end: ranked_len,
        }
    }

    fn is_open(&self) -> bool {
        self.low < self.end
    }

    /// Pivot index: `floor((low + high) / 2)` with `high = end - 1`, so even
    /// windows probe the lower of the two middle slots.
    fn mid(&self) -> usize {
        self.low + (self.end - self.low - 1) / 2
    }
}

/// The comparison the engine is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison<'a> {
    pub challenger: &'a Item,
    pub pivot: &'a Item,
    /// Index of `pivot` in the ranked sequence.
    pub pivot_index: usize,
}

/// What a single [`EngineState::resolve`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// No comparison was outstanding; the state is unchanged.
    Idle,
    /// The search window shrank and another comparison is needed.
    Narrowed,
    /// The challenger was inserted at `index` of the ranked sequence.
    Placed { index: usize },
}

/// Full state of a ranking session.
///
/// Invariant after every public operation: either a comparison is outstanding
/// (`cursor` is set with a non-empty window), or the session is done (`cursor`
/// is unset and `pending` is empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    ranked: Vec<Item>,
    pending: VecDeque<Item>,
    cursor: Option<PlacementCursor>,
    #[serde(default)]
    comparisons: usize,
}

impl EngineState {
    /// Start a session. The first item seeds the ranked sequence; the rest are
    /// placed in load order.
    ///
    /// A single item yields a session that is already done.
    pub fn start(items: Vec<Item>) -> Result<Self, EngineError> {
        let mut pending: VecDeque<Item> = items.into();
        let first = pending.pop_front().ok_or(EngineError::InsufficientItems)?;

        let mut state = Self {
            ranked: vec![first],
            pending,
            cursor: None,
            comparisons: 0,
        };
        state.tick();
        Ok(state)
    }

    /// Advance without an outcome: pull the next challenger when none is being
    /// placed, and insert the current one when its window is already empty.
    ///
    /// Idempotent on a normalised state. Call it after deserialising a state
    /// that may have been written by hand or by an older build.
    pub fn tick(&mut self) -> Option<usize> {
        let mut placed = None;
        loop {
            match self.cursor.take() {
                None => {
                    let Some(challenger) = self.pending.pop_front() else {
                        return placed;
                    };
                    self.cursor = Some(PlacementCursor::new(challenger, self.ranked.len()));
                }
                Some(mut cursor) => {
                    // Stored windows may point past the ranked sequence
                    cursor.end = cursor.end.min(self.ranked.len());
                    cursor.low = cursor.low.min(cursor.end);
                    if cursor.is_open() {
                        self.cursor = Some(cursor);
                        return placed;
                    }
                    let index = cursor.low;
                    self.ranked.insert(index, cursor.challenger);
                    placed = Some(index);
                }
            }
        }
    }

    /// The comparison waiting for an outcome, or `None` once done.
    pub fn current_comparison(&self) -> Option<Comparison<'_>> {
        let cursor = self.cursor.as_ref().filter(|c| c.is_open())?;
        let pivot_index = cursor.mid();
        Some(Comparison {
            challenger: &cursor.challenger,
            pivot: self.ranked.get(pivot_index)?,
            pivot_index,
        })
    }

    /// Apply one comparison outcome. `challenger_won` means the challenger
    /// ranks above the pivot.
    pub fn resolve(&mut self, challenger_won: bool) -> Step {
        let Some(cursor) = self.cursor.as_mut().filter(|c| c.is_open()) else {
            return Step::Idle;
        };

        let mid = cursor.mid();
        if challenger_won {
            cursor.end = mid;
        } else {
            cursor.low = mid + 1;
        }
        self.comparisons += 1;

        match self.tick() {
            Some(index) => Step::Placed { index },
            None => Step::Narrowed,
        }
    }

    /// Like [`resolve`](Self::resolve), calling `on_placed` with the whole
    /// ranked sequence whenever the outcome completes a placement.
    pub fn resolve_with<F>(&mut self, challenger_won: bool, on_placed: F) -> Step
    where
        F: FnOnce(&[Item]),
    {
        let step = self.resolve(challenger_won);
        if let Step::Placed { .. } = step {
            on_placed(&self.ranked);
        }
        step
    }

    pub fn is_done(&self) -> bool {
        self.cursor.is_none() && self.pending.is_empty()
    }

    /// A session started from a single item: done without any comparison.
    pub fn is_trivial(&self) -> bool {
        self.is_done() && self.ranked.len() == 1 && self.comparisons == 0
    }

    /// Current ranked sequence, most preferred first.
    pub fn ranked_order(&self) -> &[Item] {
        &self.ranked
    }

    /// Items not yet placed, excluding the current challenger.
    pub fn pending(&self) -> impl Iterator<Item = &Item> {
        self.pending.iter()
    }

    /// Items still to be placed, including the current challenger.
    pub fn remaining(&self) -> usize {
        self.pending.len() + usize::from(self.cursor.is_some())
    }

    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    pub fn cursor(&self) -> Option<&PlacementCursor> {
        self.cursor.as_ref()
    }
}
