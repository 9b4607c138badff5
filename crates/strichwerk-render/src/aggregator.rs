// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch aggregator.
//
// Outcomes arrive in completion order, which is not slot order.  They are
// buffered in a fixed-size slot array and only read out, in ascending index
// order, once every slot is filled.  The commit happens exactly once per
// aggregator; a zero-sized batch commits on the first completion check.

use tracing::{debug, info, warn};

use strichwerk_core::error::Result;
use strichwerk_core::types::{FetchOutcome, FragmentBody, Generation};

use crate::container::{SlotView, compose_container};

/// Fill state of one batch.
#[derive(Debug, Clone)]
pub struct BatchState {
    expected: u32,
    slots: Vec<Option<FetchOutcome>>,
    received: u32,
}

impl BatchState {
    pub fn new(expected: u32) -> Self {
        Self {
            expected,
            slots: vec![None; expected as usize],
            received: 0,
        }
    }

    pub fn expected(&self) -> u32 {
        self.expected
    }

    pub fn received(&self) -> u32 {
        self.received
    }

    /// True exactly when every expected slot has an outcome.
    pub fn is_complete(&self) -> bool {
        self.received == self.expected
    }

    /// Store an outcome in its slot. Returns `false` if the index is out of
    /// range or the slot is already filled.
    fn insert(&mut self, outcome: FetchOutcome) -> bool {
        match self.slots.get_mut(outcome.index as usize) {
            Some(slot) if slot.is_none() => {
                *slot = Some(outcome);
                self.received += 1;
                true
            }
            _ => false,
        }
    }

    fn drain_ordered(&mut self) -> Vec<FetchOutcome> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}

/// The single completion event of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommit {
    pub generation: Generation,
    /// Outcomes in ascending slot order.
    pub outcomes: Vec<FetchOutcome>,
}

impl BatchCommit {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.body.is_failed()).count()
    }

    /// Container markup presenting every slot in index order.
    pub fn container_html(&self) -> Result<String> {
        let slots: Vec<SlotView<'_>> = self
            .outcomes
            .iter()
            .map(|o| match &o.body {
                FragmentBody::Rendered(markup) => SlotView::rendered(o.index, markup),
                FragmentBody::Failed { reason } => SlotView::failed(o.index, reason),
            })
            .collect();
        compose_container(&slots)
    }
}

/// Collects the outcomes of one render request.
#[derive(Debug)]
pub struct Aggregator {
    generation: Generation,
    state: BatchState,
    committed: bool,
}

impl Aggregator {
    pub fn new(generation: Generation, expected: u32) -> Self {
        Self {
            generation,
            state: BatchState::new(expected),
            committed: false,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Commit if the batch is full and has not committed yet.
    ///
    /// Call once right after construction so an empty batch completes without
    /// waiting for an arrival that will never come.
    pub fn check_complete(&mut self) -> Option<BatchCommit> {
        if self.committed || !self.state.is_complete() {
            return None;
        }
        self.committed = true;
        let outcomes = self.state.drain_ordered();
        info!(
            generation = %self.generation,
            slots = outcomes.len(),
            "batch complete"
        );
        Some(BatchCommit {
            generation: self.generation,
            outcomes,
        })
    }

    /// Record one settled fetch. Returns the commit when this outcome fills
    /// the last slot.
    pub fn on_fetch_settled(&mut self, outcome: FetchOutcome) -> Option<BatchCommit> {
        if outcome.generation != self.generation {
            debug!(
                expected = %self.generation,
                got = %outcome.generation,
                index = outcome.index,
                "discarding outcome from another batch"
            );
            return None;
        }
        if self.committed {
            warn!(index = outcome.index, "outcome after commit ignored");
            return None;
        }

        let index = outcome.index;
        if !self.state.insert(outcome) {
            warn!(
                index,
                expected = self.state.expected(),
                "outcome for unknown or filled slot ignored"
            );
            return None;
        }
        debug!(
            index,
            received = self.state.received(),
            expected = self.state.expected(),
            "slot filled"
        );
        self.check_complete()
    }
}
