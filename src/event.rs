//! Wizard events.
//!
//! This module provides [`WizardEvent`] for observing a wizard. Events are
//! broadcast through a channel that a presentation layer subscribes to in
//! order to recompute derived views.

use crate::{CardId, LoadKey, StepId};

/// An event emitted when wizard state changes.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum WizardEvent {
    /// The current step changed.
    StepEntered {
        /// The step that was left.
        from: StepId,
        /// The step that is now current.
        to: StepId,
    },

    /// A navigation request was refused.
    NavigationBlocked {
        /// The step that was current.
        current: StepId,
        /// The unreachable target.
        target: StepId,
    },

    /// A card was chosen for a step.
    CardSelected {
        /// The step.
        step: StepId,
        /// The chosen card.
        card: CardId,
        /// The card it replaced, if any.
        replaced: Option<CardId>,
    },

    /// A step's card was withdrawn.
    CardDeselected {
        /// The step.
        step: StepId,
        /// The withdrawn card.
        card: CardId,
    },

    /// Completion and selections were cleared for a run of steps.
    StepsInvalidated {
        /// The cleared steps, in catalog order.
        steps: Vec<StepId>,
    },

    /// A card list load was issued.
    LoadStarted {
        /// The load key.
        key: LoadKey,
    },

    /// A card list arrived.
    LoadCompleted {
        /// The load key.
        key: LoadKey,
        /// Number of cards loaded.
        count: usize,
    },

    /// A card list load failed.
    LoadFailed {
        /// The load key.
        key: LoadKey,
        /// Error message describing the failure.
        error: String,
    },

    /// A load result arrived for a key that is no longer wanted.
    LoadDiscarded {
        /// The stale key.
        key: LoadKey,
    },

    /// The wizard was reset to its initial state.
    Reset,
}

impl WizardEvent {
    /// Returns the step this event concerns, if it concerns exactly one.
    pub fn step(&self) -> Option<StepId> {
        match self {
            Self::StepEntered { to, .. } => Some(*to),
            Self::NavigationBlocked { target, .. } => Some(*target),
            Self::CardSelected { step, .. } | Self::CardDeselected { step, .. } => Some(*step),
            Self::LoadStarted { key }
            | Self::LoadCompleted { key, .. }
            | Self::LoadFailed { key, .. }
            | Self::LoadDiscarded { key } => Some(key.step),
            Self::StepsInvalidated { .. } | Self::Reset => None,
        }
    }

    /// Returns true if this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::LoadFailed { .. })
    }

    /// Returns true if this event concerns step data loading.
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            Self::LoadStarted { .. }
                | Self::LoadCompleted { .. }
                | Self::LoadFailed { .. }
                | Self::LoadDiscarded { .. }
        )
    }
}
