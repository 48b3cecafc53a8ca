//! Per-step card selections.
//!
//! [`SelectionMap`] holds at most one chosen [`Card`] per step and derives
//! the flattened [`SelectionSummary`] shown beside the wizard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Card, StepId};

/// Mapping from step to the single card chosen for it.
///
/// Selecting a card for a step that already has one replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionMap {
    selections: BTreeMap<StepId, Card>,
}

impl SelectionMap {
    /// Creates an empty selection map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `card` as the choice for `step`, returning the card it replaced.
    pub fn select(&mut self, step: StepId, card: Card) -> Option<Card> {
        self.selections.insert(step, card)
    }

    /// Removes the choice for `step`.
    pub fn deselect(&mut self, step: StepId) -> Option<Card> {
        self.selections.remove(&step)
    }

    /// Returns the card chosen for `step`.
    pub fn get(&self, step: StepId) -> Option<&Card> {
        self.selections.get(&step)
    }

    /// Returns true if a card is chosen for `step`.
    pub fn has(&self, step: StepId) -> bool {
        self.selections.contains_key(&step)
    }

    /// Returns true if `card` is the choice for any step.
    ///
    /// Matching is by card id alone, so a highlighted card stays
    /// highlighted wherever it is rendered.
    pub fn is_selected(&self, card: &Card) -> bool {
        self.selections.values().any(|c| c.id == card.id)
    }

    /// Returns the number of steps with a choice.
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Iterates over `(step, card)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (StepId, &Card)> {
        self.selections.iter().map(|(step, card)| (*step, card))
    }

    /// Keeps only the steps for which `keep` returns true.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(StepId) -> bool) {
        self.selections.retain(|step, _| keep(*step));
    }

    /// Removes all selections.
    pub fn clear(&mut self) {
        self.selections.clear();
    }

    /// Projects the chosen cards' names into a display summary.
    pub fn summary(&self) -> SelectionSummary {
        let name = |step| self.get(step).map(|c| c.name.clone());
        let domains = self
            .get(StepId::Subclass)
            .map(|c| c.domain_names())
            .filter(|names| !names.is_empty())
            .map(|names| names.join(" · "));

        SelectionSummary {
            class: name(StepId::Class),
            subclass: name(StepId::Subclass),
            domains,
            ancestry: name(StepId::Ancestry),
            community: name(StepId::Community),
            traits: name(StepId::Traits),
            starting_equipment: name(StepId::StartingEquipment),
            background: name(StepId::Background),
            experiences: name(StepId::Experiences),
            domain_cards: name(StepId::DomainCards),
            connections: name(StepId::Connections),
        }
    }
}

/// Read-only, display-ready projection of the current selections.
///
/// Unset fields are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSummary {
    /// Chosen class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Chosen subclass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
    /// Domains granted by the chosen subclass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains: Option<String>,
    /// Chosen ancestry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestry: Option<String>,
    /// Chosen community.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
    /// Traits choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<String>,
    /// Starting equipment choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_equipment: Option<String>,
    /// Background choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Experiences choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiences: Option<String>,
    /// Domain cards choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_cards: Option<String>,
    /// Connections choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<String>,
}

impl SelectionSummary {
    /// Returns true if any of the headline fields is set.
    ///
    /// Headline fields are class, subclass, domains, ancestry and community.
    pub fn has_selections(&self) -> bool {
        self.class.is_some()
            || self.subclass.is_some()
            || self.domains.is_some()
            || self.ancestry.is_some()
            || self.community.is_some()
    }
}
