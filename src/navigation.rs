//! Navigation view model.
//!
//! This module provides [`NavigationView`], a snapshot of everything a tab
//! trail and its previous/next buttons need. It is derived from a
//! [`Wizard`] on demand and never stored.

use std::fmt;

use crate::{StepId, Wizard};

/// One tab of the step trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTab {
    /// The step.
    pub id: StepId,
    /// Display label.
    pub label: String,
    /// The step cannot be navigated to.
    pub disabled: bool,
    /// The step has a valid selection.
    pub completed: bool,
    /// The step is current.
    pub active: bool,
}

impl StepTab {
    /// Returns a status indicator character.
    pub fn status_char(&self) -> char {
        if self.active {
            '▶'
        } else if self.completed {
            '✅'
        } else if self.disabled {
            '🔒'
        } else {
            '○'
        }
    }
}

/// The derived navigation state of a wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationView {
    /// The active step.
    pub current: StepId,
    /// The active step is the first one.
    pub is_first_step: bool,
    /// The active step is the last one.
    pub is_last_step: bool,
    /// The next button is unavailable.
    pub is_next_disabled: bool,
    /// Label of the active step.
    pub active_label: String,
    /// Label of the next step, empty on the last step.
    pub next_label: String,
    /// Label of the previous step, empty on the first step.
    pub prev_label: String,
    /// One tab per catalog step, in order.
    pub tabs: Vec<StepTab>,
}

impl NavigationView {
    /// Derives the view from the wizard's current state.
    pub fn from_wizard(wizard: &Wizard) -> Self {
        let catalog = wizard.catalog();
        let current = wizard.current_step();

        let tabs = catalog
            .steps()
            .iter()
            .map(|step| StepTab {
                id: step.id,
                label: step.label.clone(),
                disabled: !wizard.is_reachable(step.id),
                completed: wizard.is_complete(step.id),
                active: step.id == current,
            })
            .collect();

        let is_last_step = catalog.next(current).is_none();

        Self {
            current,
            is_first_step: catalog.previous(current).is_none(),
            is_last_step,
            is_next_disabled: is_last_step || !wizard.is_complete(current),
            active_label: catalog.label(current).to_string(),
            next_label: catalog.next(current).map(|s| s.label.clone()).unwrap_or_default(),
            prev_label: catalog
                .previous(current)
                .map(|s| s.label.clone())
                .unwrap_or_default(),
            tabs,
        }
    }

    /// Returns the tab for `step`.
    pub fn tab(&self, step: StepId) -> Option<&StepTab> {
        self.tabs.iter().find(|t| t.id == step)
    }

    /// Returns true if `step` cannot be navigated to.
    ///
    /// Steps outside the catalog are always disabled.
    pub fn is_step_disabled(&self, step: StepId) -> bool {
        self.tab(step).map_or(true, |t| t.disabled)
    }

    /// Returns true if `step` is complete.
    pub fn is_step_completed(&self, step: StepId) -> bool {
        self.tab(step).is_some_and(|t| t.completed)
    }

    /// Returns true if the previous button is unavailable.
    pub fn is_prev_disabled(&self) -> bool {
        self.is_first_step
    }

    /// Returns true if every step is complete.
    pub fn is_complete(&self) -> bool {
        self.tabs.iter().all(|t| t.completed)
    }

    /// Returns the share of completed steps as a percentage.
    pub fn progress_percent(&self) -> f32 {
        if self.tabs.is_empty() {
            return 100.0;
        }

        let completed = self.tabs.iter().filter(|t| t.completed).count();
        (completed as f32 / self.tabs.len() as f32) * 100.0
    }
}

impl fmt::Display for NavigationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tab in &self.tabs {
            writeln!(f, "  {} {}", tab.status_char(), tab.label)?;
        }

        writeln!(f)?;
        let prev = if self.is_prev_disabled() {
            "-"
        } else {
            self.prev_label.as_str()
        };
        let next = if self.is_next_disabled {
            "-"
        } else {
            self.next_label.as_str()
        };
        writeln!(f, "< {prev} | {} | {next} >", self.active_label)?;
        writeln!(f, "Progress: {:.0}%", self.progress_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Card, CardType, StepCatalog};

    fn wizard() -> Wizard {
        let catalog = StepCatalog::builder()
            .step(StepId::Class, "Class")
            .step(StepId::Subclass, "Subclass")
            .step(StepId::Ancestry, "Ancestry")
            .build()
            .unwrap();
        Wizard::new(catalog)
    }

    #[test]
    fn test_initial_view() {
        let view = wizard().navigation();

        assert!(view.is_first_step);
        assert!(!view.is_last_step);
        assert!(view.is_next_disabled);
        assert!(view.is_prev_disabled());
        assert_eq!(view.active_label, "Class");
        assert_eq!(view.next_label, "Subclass");
        assert_eq!(view.prev_label, "");

        assert!(!view.is_step_disabled(StepId::Class));
        assert!(view.is_step_disabled(StepId::Subclass));
        assert!(view.is_step_disabled(StepId::Ancestry));
    }

    #[test]
    fn test_view_after_selection() {
        let mut wizard = wizard();
        wizard.select_item(Card::new(1, "Warrior", CardType::Class));
        let view = wizard.navigation();

        assert!(!view.is_next_disabled);
        assert!(view.is_step_completed(StepId::Class));
        assert!(!view.is_step_disabled(StepId::Subclass));
        assert!(view.is_step_disabled(StepId::Ancestry));
    }

    #[test]
    fn test_view_on_last_step() {
        let mut wizard = wizard();
        wizard.select_item(Card::new(1, "Warrior", CardType::Class));
        wizard.go_next();
        wizard.select_item(Card::new(11, "Brave", CardType::Subclass));
        wizard.go_next();
        wizard.select_item(Card::new(21, "Elf", CardType::Ancestry));
        let view = wizard.navigation();

        assert!(view.is_last_step);
        assert!(view.is_next_disabled);
        assert_eq!(view.next_label, "");
        assert_eq!(view.prev_label, "Subclass");
        assert!(view.is_complete());
        assert_eq!(view.progress_percent(), 100.0);
    }

    #[test]
    fn test_active_tab() {
        let mut wizard = wizard();
        wizard.select_item(Card::new(1, "Warrior", CardType::Class));
        wizard.go_next();
        let view = wizard.navigation();

        let active: Vec<_> = view.tabs.iter().filter(|t| t.active).map(|t| t.id).collect();
        assert_eq!(active, vec![StepId::Subclass]);
        assert_eq!(view.tab(StepId::Subclass).unwrap().status_char(), '▶');
        assert_eq!(view.tab(StepId::Class).unwrap().status_char(), '✅');
        assert_eq!(view.tab(StepId::Ancestry).unwrap().status_char(), '🔒');
    }

    #[test]
    fn test_unknown_step_is_disabled() {
        let view = wizard().navigation();
        assert!(view.is_step_disabled(StepId::Connections));
        assert!(!view.is_step_completed(StepId::Connections));
    }

    #[test]
    fn test_display() {
        let mut wizard = wizard();
        wizard.select_item(Card::new(1, "Warrior", CardType::Class));
        let display = format!("{}", wizard.navigation());

        assert!(display.contains("Class"));
        assert!(display.contains("Ancestry"));
        assert!(display.contains("< - | Class | Subclass >"));
        assert!(display.contains("Progress: 33%"));
    }
}
