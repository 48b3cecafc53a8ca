//! The wizard controller.
//!
//! [`Wizard`] owns the current step, the per-step selections and the
//! completion set, and applies the gating policy to every navigation
//! request. Every operation returns an outcome describing what changed and
//! broadcasts matching [`WizardEvent`]s; misuse (unreachable targets, stale
//! clicks, late load results) degrades to a no-op outcome instead of an
//! error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::completion::Cut;
use crate::gating::is_reachable;
use crate::navigation::NavigationView;
use crate::{
    Card, CardId, CompletedSet, LoadError, LoadKey, Result, SelectionMap, SelectionSummary,
    StepCatalog, StepId, WaymarkError, WizardEvent,
};

/// Default channel capacity for wizard events.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// The serializable state of a wizard.
///
/// Invariant: every completed step has a selection, and every selection
/// belongs to a completed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    /// The active step.
    pub current: StepId,
    /// The chosen card per step.
    pub selections: SelectionMap,
    /// Steps with a valid selection.
    pub completed: CompletedSet,
}

impl WizardState {
    /// Creates a fresh state positioned on `first`.
    pub fn new(first: StepId) -> Self {
        Self {
            current: first,
            selections: SelectionMap::new(),
            completed: CompletedSet::new(),
        }
    }

    /// Clears completion and selection for a suffix of the catalog.
    ///
    /// With [`Cut::Inclusive`] the step at `index` is cleared too; with
    /// [`Cut::Exclusive`] only the steps after it. Returns the steps whose
    /// completion was removed, in catalog order.
    pub fn invalidate_suffix(&mut self, catalog: &StepCatalog, index: usize, cut: Cut) -> Vec<StepId> {
        let start = cut.start(index);
        let removed = self.completed.invalidate_suffix(catalog, start);

        let cleared: HashSet<StepId> = catalog.steps().iter().skip(start).map(|s| s.id).collect();
        self.selections.retain(|step| !cleared.contains(&step));

        removed
    }
}

/// A card list load the wizard wants performed.
///
/// The ticket distinguishes repeated loads of the same key; only the
/// result for the most recent ticket is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    /// What to load.
    pub key: LoadKey,
    /// Identifies this particular request.
    pub ticket: u64,
}

impl LoadRequest {
    /// The step the cards are for.
    pub fn step(&self) -> StepId {
        self.key.step
    }
}

/// Status of a step's selectable cards.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsStatus {
    /// Nothing has been requested for the step.
    Idle,
    /// A load is outstanding.
    Loading,
    /// The cards are available.
    Ready(Arc<[Card]>),
    /// The last load failed.
    Failed(LoadError),
}

/// The selectable cards of a step and how they were obtained.
#[derive(Debug, Clone)]
pub struct StepOptions {
    /// The key the cards were requested for.
    pub key: LoadKey,
    /// Ticket of the request that owns this entry.
    pub ticket: u64,
    /// Current status.
    pub status: OptionsStatus,
    /// When the load was issued.
    pub requested_at: DateTime<Utc>,
    /// When the load resolved.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Result of [`Wizard::select_item`].
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// The card became the current step's selection.
    Selected {
        /// The current step.
        step: StepId,
        /// The chosen card.
        card: CardId,
        /// The card it replaced.
        replaced: Option<CardId>,
        /// Later steps cleared because an upstream choice changed.
        invalidated: Vec<StepId>,
    },
    /// The card was already selected and has been withdrawn.
    Deselected {
        /// The current step.
        step: StepId,
        /// The withdrawn card.
        card: CardId,
        /// The steps cleared, starting with the current one.
        invalidated: Vec<StepId>,
    },
    /// The card is not one of the step's options; nothing changed.
    Ignored {
        /// The current step.
        step: StepId,
    },
}

impl SelectionOutcome {
    /// Returns true if wizard state changed.
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Ignored { .. })
    }

    /// Returns the steps whose completion was cleared.
    pub fn invalidated(&self) -> &[StepId] {
        match self {
            Self::Selected { invalidated, .. } | Self::Deselected { invalidated, .. } => invalidated,
            Self::Ignored { .. } => &[],
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// The current step changed.
    Moved {
        /// The step that was left.
        from: StepId,
        /// The new current step.
        to: StepId,
        /// A load the new step needs, if any.
        load: Option<LoadRequest>,
    },
    /// The target is already current, or there is no adjacent step.
    Stayed,
    /// The target is not reachable; nothing changed.
    Blocked {
        /// The refused target.
        target: StepId,
    },
}

impl NavigationOutcome {
    /// Returns true if the current step changed.
    pub fn changed(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    /// Returns the load the new step needs.
    pub fn load(&self) -> Option<LoadRequest> {
        match self {
            Self::Moved { load, .. } => *load,
            _ => None,
        }
    }
}

/// Result of [`Wizard::complete_load`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The cards are now the step's options.
    Applied {
        /// The load key.
        key: LoadKey,
        /// Number of cards.
        count: usize,
    },
    /// The load failed; the step shows an error.
    Failed {
        /// The load key.
        key: LoadKey,
        /// The failure.
        error: LoadError,
    },
    /// The result belongs to a superseded request and was dropped.
    Discarded {
        /// The stale key.
        key: LoadKey,
    },
}

impl LoadOutcome {
    /// Returns true if wizard state changed.
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Discarded { .. })
    }
}

/// The character-creation wizard controller.
///
/// # Example
///
/// ```
/// use waymark::{Card, CardType, NavigationOutcome, StepCatalog, StepId, Wizard};
///
/// let catalog = StepCatalog::builder()
///     .step(StepId::Class, "Class")
///     .step(StepId::Subclass, "Subclass")
///     .step(StepId::Ancestry, "Ancestry")
///     .build()?;
/// let mut wizard = Wizard::new(catalog);
///
/// // Ancestry is out of reach until class and subclass are complete.
/// let outcome = wizard.request_navigate(StepId::Ancestry);
/// assert!(matches!(outcome, NavigationOutcome::Blocked { .. }));
///
/// wizard.select_item(Card::new(1, "Warrior", CardType::Class));
/// assert!(wizard.request_navigate(StepId::Subclass).changed());
/// assert_eq!(wizard.summary().class.as_deref(), Some("Warrior"));
/// # Ok::<(), waymark::WaymarkError>(())
/// ```
pub struct Wizard {
    catalog: Arc<StepCatalog>,
    state: WizardState,
    options: HashMap<StepId, StepOptions>,
    next_ticket: u64,
    event_tx: broadcast::Sender<WizardEvent>,
}

impl Wizard {
    /// Creates a wizard positioned on the catalog's first step.
    pub fn new(catalog: impl Into<Arc<StepCatalog>>) -> Self {
        Self::with_event_capacity(catalog, DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    /// Creates a wizard with a custom event channel capacity.
    pub fn with_event_capacity(catalog: impl Into<Arc<StepCatalog>>, capacity: usize) -> Self {
        let catalog = catalog.into();
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            state: WizardState::new(catalog.first_id()),
            catalog,
            options: HashMap::new(),
            next_ticket: 0,
            event_tx,
        }
    }

    /// Rebuilds a wizard from a saved state.
    ///
    /// Completed steps without a selection, and selections without
    /// completion, are dropped so the state invariant holds.
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::StepNotFound`] if the saved current step is
    /// not in the catalog.
    pub fn from_state(catalog: impl Into<Arc<StepCatalog>>, mut state: WizardState) -> Result<Self> {
        let catalog = catalog.into();
        if !catalog.contains(state.current) {
            return Err(WaymarkError::StepNotFound(state.current.to_string()));
        }

        let orphaned: Vec<StepId> = state
            .completed
            .iter()
            .filter(|step| !state.selections.has(*step) || !catalog.contains(*step))
            .collect();
        for step in orphaned {
            state.completed.unmark(step);
        }
        let completed = state.completed.clone();
        state.selections.retain(|step| completed.is_complete(step));

        let mut wizard = Self::new(catalog);
        wizard.state = state;
        Ok(wizard)
    }

    /// Subscribes to wizard events.
    ///
    /// Events are not persisted; a receiver that falls too far behind
    /// misses events.
    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<WizardEvent> {
        self.event_tx.clone()
    }

    /// Ignores send errors (no subscribers).
    fn emit(&self, event: WizardEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Returns the step catalog.
    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    /// Returns the wizard state.
    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Returns the active step.
    pub fn current_step(&self) -> StepId {
        self.state.current
    }

    /// Returns the completed steps.
    pub fn completed(&self) -> &CompletedSet {
        &self.state.completed
    }

    /// Returns the selections.
    pub fn selections(&self) -> &SelectionMap {
        &self.state.selections
    }

    /// Returns the card chosen for `step`.
    pub fn selected(&self, step: StepId) -> Option<&Card> {
        self.state.selections.get(step)
    }

    /// Returns true if `card` is chosen on any step.
    pub fn is_selected(&self, card: &Card) -> bool {
        self.state.selections.is_selected(card)
    }

    /// Returns true if `step` is complete.
    pub fn is_complete(&self, step: StepId) -> bool {
        self.state.completed.is_complete(step)
    }

    /// Returns the selection summary.
    pub fn summary(&self) -> SelectionSummary {
        self.state.selections.summary()
    }

    /// Returns true if navigating to `target` is currently allowed.
    pub fn is_reachable(&self, target: StepId) -> bool {
        is_reachable(target, self.state.current, &self.state.completed, &self.catalog)
    }

    /// Derives the navigation view model.
    pub fn navigation(&self) -> NavigationView {
        NavigationView::from_wizard(self)
    }

    /// Returns the options entry for `step`.
    pub fn options(&self, step: StepId) -> Option<&StepOptions> {
        self.options.get(&step)
    }

    /// Returns the status of `step`'s selectable cards.
    pub fn options_status(&self, step: StepId) -> OptionsStatus {
        self.options
            .get(&step)
            .map(|o| o.status.clone())
            .unwrap_or(OptionsStatus::Idle)
    }

    /// Returns the loaded cards for `step`.
    pub fn cards(&self, step: StepId) -> Option<&[Card]> {
        match self.options.get(&step).map(|o| &o.status) {
            Some(OptionsStatus::Ready(cards)) => Some(cards),
            _ => None,
        }
    }

    /// Returns true if `card` is in `step`'s loaded list, and that list was
    /// loaded for the step's current upstream choice.
    fn is_offered(&self, step: StepId, card: CardId) -> bool {
        let Some(options) = self.options.get(&step) else {
            return false;
        };
        let OptionsStatus::Ready(cards) = &options.status else {
            return false;
        };

        self.load_key(step) == Some(options.key) && cards.iter().any(|c| c.id == card)
    }

    /// Returns true if a load for `step` is outstanding.
    pub fn is_loading(&self, step: StepId) -> bool {
        matches!(
            self.options.get(&step).map(|o| &o.status),
            Some(OptionsStatus::Loading)
        )
    }

    /// Returns true if the last load for `step` failed.
    pub fn has_load_error(&self, step: StepId) -> bool {
        matches!(
            self.options.get(&step).map(|o| &o.status),
            Some(OptionsStatus::Failed(_))
        )
    }

    /// Returns the key the cards of `step` should currently be loaded for.
    ///
    /// `None` if the step does not load cards, or depends on a step that has
    /// no selection yet.
    pub fn load_key(&self, step: StepId) -> Option<LoadKey> {
        if !self.catalog.loads_cards(step) {
            return None;
        }

        match self.catalog.upstream(step) {
            None => Some(LoadKey::root(step)),
            Some(upstream) => self
                .state
                .selections
                .get(upstream)
                .map(|card| LoadKey::dependent(step, card.id)),
        }
    }

    /// Enters the current step, returning the load it needs.
    ///
    /// Call once after construction so the first step's cards are loaded.
    pub fn start(&mut self) -> Option<LoadRequest> {
        self.enter_step(self.state.current)
    }

    /// Applies a card click on the current step.
    ///
    /// Clicking the current selection withdraws it and clears the current
    /// step and every later step. Clicking another card records it and
    /// marks the step complete; when the step constrains a later step's
    /// cards and the choice changed, every later step is cleared.
    ///
    /// On a step that loads its cards, only cards from the list loaded for
    /// the current upstream choice are accepted; any other click, including
    /// one made while the list is loading or after it failed, is ignored.
    pub fn select_item(&mut self, card: Card) -> SelectionOutcome {
        let step = self.state.current;
        let Some(index) = self.catalog.index_of(step) else {
            return SelectionOutcome::Ignored { step };
        };

        if self.catalog.loads_cards(step) && !self.is_offered(step, card.id) {
            debug!(step = %step, card = card.id, "ignoring card not offered on this step");
            return SelectionOutcome::Ignored { step };
        }

        let previous = self.state.selections.get(step).map(|c| c.id);

        if previous == Some(card.id) {
            let invalidated = self.state.invalidate_suffix(&self.catalog, index, Cut::Inclusive);
            info!(step = %step, card = card.id, invalidated = ?invalidated, "card deselected");

            self.emit(WizardEvent::CardDeselected {
                step,
                card: card.id,
            });
            self.emit(WizardEvent::StepsInvalidated {
                steps: invalidated.clone(),
            });

            return SelectionOutcome::Deselected {
                step,
                card: card.id,
                invalidated,
            };
        }

        let card_id = card.id;
        self.state.selections.select(step, card);
        self.state.completed.mark_complete(step);

        let invalidated = if previous.is_some() && self.catalog.has_dependents(step) {
            self.state.invalidate_suffix(&self.catalog, index, Cut::Exclusive)
        } else {
            Vec::new()
        };
        info!(
            step = %step,
            card = card_id,
            replaced = ?previous,
            invalidated = ?invalidated,
            "card selected"
        );

        self.emit(WizardEvent::CardSelected {
            step,
            card: card_id,
            replaced: previous,
        });
        if !invalidated.is_empty() {
            self.emit(WizardEvent::StepsInvalidated {
                steps: invalidated.clone(),
            });
        }

        SelectionOutcome::Selected {
            step,
            card: card_id,
            replaced: previous,
            invalidated,
        }
    }

    /// Moves to `target` if it is reachable.
    ///
    /// Unreachable targets are refused without changing state.
    pub fn request_navigate(&mut self, target: StepId) -> NavigationOutcome {
        let from = self.state.current;
        if target == from {
            return NavigationOutcome::Stayed;
        }

        if !self.is_reachable(target) {
            debug!(current = %from, target = %target, "navigation blocked");
            self.emit(WizardEvent::NavigationBlocked {
                current: from,
                target,
            });
            return NavigationOutcome::Blocked { target };
        }

        self.state.current = target;
        info!(from = %from, to = %target, "entered step");
        self.emit(WizardEvent::StepEntered { from, to: target });

        let load = self.enter_step(target);
        NavigationOutcome::Moved {
            from,
            to: target,
            load,
        }
    }

    /// Moves to the next step if the current step is complete.
    pub fn go_next(&mut self) -> NavigationOutcome {
        let current = self.state.current;
        let Some(next) = self.catalog.next(current).map(|s| s.id) else {
            return NavigationOutcome::Stayed;
        };

        if !self.state.completed.is_complete(current) {
            debug!(current = %current, "next blocked, current step incomplete");
            self.emit(WizardEvent::NavigationBlocked {
                current,
                target: next,
            });
            return NavigationOutcome::Blocked { target: next };
        }

        self.request_navigate(next)
    }

    /// Moves to the previous step.
    pub fn go_previous(&mut self) -> NavigationOutcome {
        match self.catalog.previous(self.state.current).map(|s| s.id) {
            Some(previous) => self.request_navigate(previous),
            None => NavigationOutcome::Stayed,
        }
    }

    /// Applies the result of a load issued by this wizard.
    ///
    /// The result is dropped if the request was superseded by a newer one,
    /// or if the upstream choice it was keyed on has changed since.
    pub fn complete_load(
        &mut self,
        request: LoadRequest,
        result: std::result::Result<Arc<[Card]>, LoadError>,
    ) -> LoadOutcome {
        let key = request.key;
        let pending = self.options.get(&key.step).is_some_and(|o| {
            o.ticket == request.ticket && o.key == key && o.status == OptionsStatus::Loading
        });

        if !pending {
            debug!(key = %key, ticket = request.ticket, "discarding stale load result");
            self.emit(WizardEvent::LoadDiscarded { key });
            return LoadOutcome::Discarded { key };
        }

        if self.load_key(key.step) != Some(key) {
            // The upstream choice changed while loading; the next visit reloads.
            self.options.remove(&key.step);
            debug!(key = %key, ticket = request.ticket, "discarding load for replaced upstream choice");
            self.emit(WizardEvent::LoadDiscarded { key });
            return LoadOutcome::Discarded { key };
        }

        let Some(entry) = self.options.get_mut(&key.step) else {
            return LoadOutcome::Discarded { key };
        };
        entry.resolved_at = Some(Utc::now());

        match result {
            Ok(cards) => {
                let count = cards.len();
                entry.status = OptionsStatus::Ready(cards);
                info!(key = %key, count, "cards loaded");
                self.emit(WizardEvent::LoadCompleted { key, count });
                LoadOutcome::Applied { key, count }
            }
            Err(error) => {
                entry.status = OptionsStatus::Failed(error.clone());
                warn!(key = %key, error = %error, "card load failed");
                self.emit(WizardEvent::LoadFailed {
                    key,
                    error: error.to_string(),
                });
                LoadOutcome::Failed { key, error }
            }
        }
    }

    /// Re-issues the current step's load after a failure.
    pub fn retry_load(&mut self) -> Option<LoadRequest> {
        let step = self.state.current;
        if !self.has_load_error(step) {
            return None;
        }
        let key = self.load_key(step)?;
        Some(self.issue_load(key))
    }

    /// Returns to the initial state, dropping selections and loaded cards.
    ///
    /// Returns the load the first step needs.
    pub fn reset(&mut self) -> Option<LoadRequest> {
        self.state = WizardState::new(self.catalog.first_id());
        self.options.clear();
        info!("wizard reset");
        self.emit(WizardEvent::Reset);
        self.start()
    }

    /// Hook run whenever a step becomes current.
    ///
    /// Issues a load unless the step already has (or is fetching) cards for
    /// exactly the key its upstream choice implies.
    fn enter_step(&mut self, step: StepId) -> Option<LoadRequest> {
        if !self.catalog.loads_cards(step) {
            return None;
        }

        let Some(key) = self.load_key(step) else {
            debug!(step = %step, "upstream choice missing, not loading");
            return None;
        };

        if let Some(existing) = self.options.get(&step) {
            if existing.key == key && !matches!(existing.status, OptionsStatus::Failed(_)) {
                debug!(key = %key, "cards already present");
                return None;
            }
        }

        Some(self.issue_load(key))
    }

    fn issue_load(&mut self, key: LoadKey) -> LoadRequest {
        self.next_ticket += 1;
        let request = LoadRequest {
            key,
            ticket: self.next_ticket,
        };

        self.options.insert(
            key.step,
            StepOptions {
                key,
                ticket: request.ticket,
                status: OptionsStatus::Loading,
                requested_at: Utc::now(),
                resolved_at: None,
            },
        );
        debug!(key = %key, ticket = request.ticket, "load issued");
        self.emit(WizardEvent::LoadStarted { key });

        request
    }
}

impl std::fmt::Debug for Wizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("current", &self.state.current)
            .field("completed", &self.state.completed)
            .field("option_steps", &self.options.keys().collect::<Vec<_>>())
            .finish()
    }
}
