//! Step completion tracking.
//!
//! [`CompletedSet`] records which steps currently hold a valid selection.
//! Invalidation always cuts a suffix of the catalog: a step and everything
//! after it, or only what comes after it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{StepCatalog, StepId};

/// Where a suffix invalidation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cut {
    /// The step itself and every later step.
    Inclusive,
    /// Only the steps strictly after it.
    Exclusive,
}

impl Cut {
    /// Returns the first catalog index removed by a cut at `index`.
    pub fn start(&self, index: usize) -> usize {
        match self {
            Self::Inclusive => index,
            Self::Exclusive => index + 1,
        }
    }
}

/// The set of completed steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSet {
    steps: BTreeSet<StepId>,
}

impl CompletedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a step complete.
    pub fn mark_complete(&mut self, step: StepId) {
        self.steps.insert(step);
    }

    /// Removes a single step. Returns true if it was complete.
    pub fn unmark(&mut self, step: StepId) -> bool {
        self.steps.remove(&step)
    }

    /// Returns true if the step is complete.
    pub fn is_complete(&self, step: StepId) -> bool {
        self.steps.contains(&step)
    }

    /// Returns the number of completed steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if no step is complete.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterates over completed steps in `StepId` order.
    pub fn iter(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps.iter().copied()
    }

    /// Clears all completions.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Removes `step` (when the cut is inclusive) and every later step.
    ///
    /// Returns the steps that were actually complete and got removed, in
    /// catalog order. A step not in the catalog removes nothing.
    pub fn invalidate_from(&mut self, catalog: &StepCatalog, step: StepId, cut: Cut) -> Vec<StepId> {
        match catalog.index_of(step) {
            Some(index) => self.invalidate_suffix(catalog, cut.start(index)),
            None => Vec::new(),
        }
    }

    /// Removes every step at catalog index `start` or later.
    pub(crate) fn invalidate_suffix(&mut self, catalog: &StepCatalog, start: usize) -> Vec<StepId> {
        catalog
            .steps()
            .iter()
            .skip(start)
            .filter(|s| self.steps.remove(&s.id))
            .map(|s| s.id)
            .collect()
    }
}
