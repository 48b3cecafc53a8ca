//! Step identifiers and the ordered step catalog.
//!
//! This module provides [`StepCatalog`] and [`StepCatalogBuilder`]. The
//! catalog fixes the linear order of the wizard and records which steps
//! draw their selectable cards from a choice made on an earlier step (the
//! subclass list depends on the chosen class). Those data dependencies are
//! kept in a petgraph DAG.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::{Result, WaymarkError};

/// Identifies one stage of the character-creation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    /// Choose a class.
    Class,
    /// Choose a subclass of the chosen class.
    Subclass,
    /// Choose an ancestry.
    Ancestry,
    /// Choose a community.
    Community,
    /// Assign traits.
    Traits,
    /// Pick starting equipment.
    StartingEquipment,
    /// Write a background.
    Background,
    /// Choose experiences.
    Experiences,
    /// Choose domain cards.
    DomainCards,
    /// Describe connections to other characters.
    Connections,
}

impl StepId {
    /// Every step id, in the default wizard order.
    pub const ALL: [StepId; 10] = [
        StepId::Class,
        StepId::Subclass,
        StepId::Ancestry,
        StepId::Community,
        StepId::Traits,
        StepId::StartingEquipment,
        StepId::Background,
        StepId::Experiences,
        StepId::DomainCards,
        StepId::Connections,
    ];

    /// Returns the kebab-case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Subclass => "subclass",
            Self::Ancestry => "ancestry",
            Self::Community => "community",
            Self::Traits => "traits",
            Self::StartingEquipment => "starting-equipment",
            Self::Background => "background",
            Self::Experiences => "experiences",
            Self::DomainCards => "domain-cards",
            Self::Connections => "connections",
        }
    }

    /// Returns the default human-readable label.
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::Class => "Class",
            Self::Subclass => "Subclass",
            Self::Ancestry => "Ancestry",
            Self::Community => "Community",
            Self::Traits => "Traits",
            Self::StartingEquipment => "Starting Equipment",
            Self::Background => "Background",
            Self::Experiences => "Experiences",
            Self::DomainCards => "Domain Cards",
            Self::Connections => "Connections",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = WaymarkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| WaymarkError::UnknownStepId(s.to_string()))
    }
}

/// One entry of the wizard's linear sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// The step's identifier.
    pub id: StepId,
    /// Label shown in the navigation trail.
    pub label: String,
    /// Whether the step's selectable cards come from a [`StepLoader`](crate::StepLoader).
    pub loads_cards: bool,
}

impl Step {
    /// Creates a step that does not load cards.
    pub fn new(id: StepId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            loads_cards: false,
        }
    }
}

/// The ordered list of wizard steps.
///
/// Order is fixed once built. Lookups for ids that are not part of the
/// catalog return `None` instead of panicking; callers guard before
/// indexing.
///
/// # Example
///
/// ```
/// use waymark::{StepCatalog, StepId};
///
/// let catalog = StepCatalog::builder()
///     .loading_step(StepId::Class, "Class")
///     .loading_step(StepId::Subclass, "Subclass")
///     .step(StepId::Ancestry, "Ancestry")
///     .dependency(StepId::Subclass, StepId::Class)
///     .build()?;
///
/// assert_eq!(catalog.index_of(StepId::Subclass), Some(1));
/// assert_eq!(catalog.dependents(StepId::Class), vec![StepId::Subclass]);
/// # Ok::<(), waymark::WaymarkError>(())
/// ```
#[derive(Clone)]
pub struct StepCatalog {
    steps: Vec<Step>,
    /// Data dependency graph; an edge `a -> b` means `b` draws its cards from `a`'s choice.
    graph: DiGraph<StepId, ()>,
    id_to_node: HashMap<StepId, NodeIndex>,
}

impl StepCatalog {
    /// Creates a new catalog builder.
    pub fn builder() -> StepCatalogBuilder {
        StepCatalogBuilder::new()
    }

    /// The default character-creation catalog.
    ///
    /// Class, subclass, ancestry, community and domain cards are loaded from
    /// a card source; subclass and domain cards depend on the chosen class.
    pub fn character_creation() -> Self {
        let mut builder = StepCatalog::builder();
        for id in StepId::ALL {
            builder = match id {
                StepId::Class
                | StepId::Subclass
                | StepId::Ancestry
                | StepId::Community
                | StepId::DomainCards => builder.loading_step(id, id.default_label()),
                _ => builder.step(id, id.default_label()),
            };
        }

        builder
            .dependency(StepId::Subclass, StepId::Class)
            .dependency(StepId::DomainCards, StepId::Class)
            .build()
            .unwrap_or_else(|e| unreachable!("default catalog is valid: {e}"))
    }

    /// Returns the steps in wizard order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the catalog has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns true if the step is part of this catalog.
    pub fn contains(&self, id: StepId) -> bool {
        self.id_to_node.contains_key(&id)
    }

    /// Returns the position of a step, or `None` if it is not in the catalog.
    pub fn index_of(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Returns the step at a position.
    pub fn step_at(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Returns the step with the given id.
    pub fn get(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Returns the id of the first step.
    ///
    /// A built catalog always has at least one step.
    pub fn first_id(&self) -> StepId {
        self.steps[0].id
    }

    /// Returns the first step.
    pub fn first(&self) -> Option<&Step> {
        self.steps.first()
    }

    /// Returns the last step.
    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Returns the step after `id`.
    pub fn next(&self, id: StepId) -> Option<&Step> {
        self.index_of(id).and_then(|i| self.step_at(i + 1))
    }

    /// Returns the step before `id`.
    pub fn previous(&self, id: StepId) -> Option<&Step> {
        self.index_of(id)
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.step_at(i))
    }

    /// Returns the label of a step, or an empty string if it is unknown.
    pub fn label(&self, id: StepId) -> &str {
        self.get(id).map(|s| s.label.as_str()).unwrap_or("")
    }

    /// Returns true if the step's cards come from a loader.
    pub fn loads_cards(&self, id: StepId) -> bool {
        self.get(id).map(|s| s.loads_cards).unwrap_or(false)
    }

    /// Returns the steps whose choice constrains this step's cards.
    pub fn dependencies(&self, id: StepId) -> Vec<StepId> {
        self.neighbors(id, petgraph::Direction::Incoming)
    }

    /// Returns the steps whose cards are constrained by this step's choice.
    pub fn dependents(&self, id: StepId) -> Vec<StepId> {
        self.neighbors(id, petgraph::Direction::Outgoing)
    }

    /// Returns true if another step's cards depend on this step's choice.
    pub fn has_dependents(&self, id: StepId) -> bool {
        !self.dependents(id).is_empty()
    }

    /// Returns the single step this step's card list is keyed on, if any.
    pub fn upstream(&self, id: StepId) -> Option<StepId> {
        self.dependencies(id).into_iter().next()
    }

    fn neighbors(&self, id: StepId, direction: petgraph::Direction) -> Vec<StepId> {
        let Some(node) = self.id_to_node.get(&id) else {
            return Vec::new();
        };

        let mut ids: Vec<StepId> = self
            .graph
            .neighbors_directed(*node, direction)
            .map(|idx| self.graph[idx])
            .collect();
        ids.sort_by_key(|id| self.index_of(*id));
        ids
    }
}

impl fmt::Debug for StepCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepCatalog")
            .field("steps", &self.steps.iter().map(|s| s.id).collect::<Vec<_>>())
            .field("dependency_count", &self.graph.edge_count())
            .finish()
    }
}

/// A deferred dependency specification.
struct DeferredDependency {
    step: StepId,
    depends_on: StepId,
}

/// Builder for constructing [`StepCatalog`] instances.
///
/// Steps are appended in the order they are added. Dependencies are
/// validated at build time: both ends must be in the catalog, the upstream
/// step must come earlier, and each step may be keyed on at most one
/// upstream step.
pub struct StepCatalogBuilder {
    steps: Vec<Step>,
    deferred_deps: Vec<DeferredDependency>,
}

impl StepCatalogBuilder {
    fn new() -> Self {
        Self {
            steps: Vec::new(),
            deferred_deps: Vec::new(),
        }
    }

    /// Appends a step whose cards are supplied by the caller.
    ///
    /// # Panics
    ///
    /// Panics if the step was already added. Use
    /// [`try_step`](Self::try_step) for a fallible version.
    pub fn step(self, id: StepId, label: impl Into<String>) -> Self {
        match self.try_push(Step::new(id, label)) {
            Ok(builder) => builder,
            Err(e) => panic!("{e}"),
        }
    }

    /// Appends a step whose cards come from a loader.
    ///
    /// # Panics
    ///
    /// Panics if the step was already added.
    pub fn loading_step(self, id: StepId, label: impl Into<String>) -> Self {
        let mut step = Step::new(id, label);
        step.loads_cards = true;
        match self.try_push(step) {
            Ok(builder) => builder,
            Err(e) => panic!("{e}"),
        }
    }

    /// Appends a step, returning an error on duplicate.
    pub fn try_step(self, step: Step) -> Result<Self> {
        self.try_push(step)
    }

    fn try_push(mut self, step: Step) -> Result<Self> {
        if self.steps.iter().any(|s| s.id == step.id) {
            return Err(WaymarkError::DuplicateStep(step.id.to_string()));
        }
        self.steps.push(step);
        Ok(self)
    }

    /// Declares that `step` draws its cards from the choice made on `depends_on`.
    pub fn dependency(mut self, step: StepId, depends_on: StepId) -> Self {
        self.deferred_deps.push(DeferredDependency { step, depends_on });
        self
    }

    /// Builds the catalog.
    ///
    /// # Errors
    ///
    /// - [`WaymarkError::EmptyCatalog`] if no steps were added
    /// - [`WaymarkError::StepNotFound`] if a dependency names a missing step
    /// - [`WaymarkError::DependencyCycle`] if dependencies form a cycle
    /// - [`WaymarkError::InvalidDependency`] if a dependency points forward
    ///   or a step is given a second upstream step
    pub fn build(self) -> Result<StepCatalog> {
        if self.steps.is_empty() {
            return Err(WaymarkError::EmptyCatalog);
        }

        let mut graph = DiGraph::new();
        let mut id_to_node = HashMap::new();
        for step in &self.steps {
            id_to_node.insert(step.id, graph.add_node(step.id));
        }

        for dep in &self.deferred_deps {
            let step_idx = id_to_node
                .get(&dep.step)
                .ok_or_else(|| WaymarkError::StepNotFound(dep.step.to_string()))?;
            let depends_on_idx = id_to_node
                .get(&dep.depends_on)
                .ok_or_else(|| WaymarkError::StepNotFound(dep.depends_on.to_string()))?;

            // Edge direction: upstream → dependent
            graph.add_edge(*depends_on_idx, *step_idx, ());
        }

        if petgraph::algo::is_cyclic_directed(&graph) {
            return Err(WaymarkError::DependencyCycle);
        }

        let position = |id: StepId| self.steps.iter().position(|s| s.id == id);
        for dep in &self.deferred_deps {
            if position(dep.depends_on) >= position(dep.step) {
                return Err(WaymarkError::InvalidDependency {
                    step: dep.step.to_string(),
                    depends_on: dep.depends_on.to_string(),
                });
            }
        }

        for step in &self.steps {
            let upstream_count = graph
                .neighbors_directed(id_to_node[&step.id], petgraph::Direction::Incoming)
                .count();
            if upstream_count > 1 {
                let extra = self
                    .deferred_deps
                    .iter()
                    .filter(|d| d.step == step.id)
                    .nth(1)
                    .map(|d| d.depends_on.to_string())
                    .unwrap_or_default();
                return Err(WaymarkError::InvalidDependency {
                    step: step.id.to_string(),
                    depends_on: extra,
                });
            }
        }

        Ok(StepCatalog {
            steps: self.steps,
            graph,
            id_to_node,
        })
    }
}

impl Default for StepCatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_steps() -> StepCatalog {
        StepCatalog::builder()
            .loading_step(StepId::Class, "Class")
            .loading_step(StepId::Subclass, "Subclass")
            .step(StepId::Ancestry, "Ancestry")
            .dependency(StepId::Subclass, StepId::Class)
            .build()
            .unwrap()
    }

    #[test]
    fn test_step_id_round_trips_through_str() {
        for id in StepId::ALL {
            assert_eq!(id.as_str().parse::<StepId>().unwrap(), id);
        }
        assert!(matches!(
            "heritage".parse::<StepId>(),
            Err(WaymarkError::UnknownStepId(_))
        ));
    }

    #[test]
    fn test_step_id_serializes_kebab_case() {
        let json = serde_json::to_string(&StepId::StartingEquipment).unwrap();
        assert_eq!(json, "\"starting-equipment\"");
        let id: StepId = serde_json::from_str("\"domain-cards\"").unwrap();
        assert_eq!(id, StepId::DomainCards);
    }

    #[test]
    fn test_index_and_lookup() {
        let catalog = three_steps();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.index_of(StepId::Class), Some(0));
        assert_eq!(catalog.index_of(StepId::Ancestry), Some(2));
        assert_eq!(catalog.index_of(StepId::Traits), None);
        assert_eq!(catalog.step_at(1).unwrap().id, StepId::Subclass);
        assert!(catalog.step_at(3).is_none());
        assert!(catalog.contains(StepId::Ancestry));
        assert!(!catalog.contains(StepId::Connections));
    }

    #[test]
    fn test_next_and_previous() {
        let catalog = three_steps();
        assert_eq!(catalog.next(StepId::Class).unwrap().id, StepId::Subclass);
        assert!(catalog.next(StepId::Ancestry).is_none());
        assert_eq!(
            catalog.previous(StepId::Ancestry).unwrap().id,
            StepId::Subclass
        );
        assert!(catalog.previous(StepId::Class).is_none());
        assert!(catalog.next(StepId::Traits).is_none());
        assert!(catalog.previous(StepId::Traits).is_none());
    }

    #[test]
    fn test_labels() {
        let catalog = three_steps();
        assert_eq!(catalog.label(StepId::Subclass), "Subclass");
        assert_eq!(catalog.label(StepId::Traits), "");
    }

    #[test]
    fn test_dependencies_and_dependents() {
        let catalog = three_steps();
        assert_eq!(catalog.dependencies(StepId::Subclass), vec![StepId::Class]);
        assert_eq!(catalog.dependents(StepId::Class), vec![StepId::Subclass]);
        assert!(catalog.has_dependents(StepId::Class));
        assert!(!catalog.has_dependents(StepId::Ancestry));
        assert_eq!(catalog.upstream(StepId::Subclass), Some(StepId::Class));
        assert_eq!(catalog.upstream(StepId::Class), None);
        assert!(catalog.dependents(StepId::Traits).is_empty());
    }

    #[test]
    fn test_character_creation_catalog() {
        let catalog = StepCatalog::character_creation();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.first().unwrap().id, StepId::Class);
        assert_eq!(catalog.last().unwrap().id, StepId::Connections);
        assert!(catalog.loads_cards(StepId::Class));
        assert!(catalog.loads_cards(StepId::Subclass));
        assert!(!catalog.loads_cards(StepId::Traits));
        assert_eq!(
            catalog.dependents(StepId::Class),
            vec![StepId::Subclass, StepId::DomainCards]
        );
        assert_eq!(catalog.label(StepId::StartingEquipment), "Starting Equipment");
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        assert!(matches!(
            StepCatalog::builder().build(),
            Err(WaymarkError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_duplicate_step_try() {
        let result = StepCatalog::builder()
            .step(StepId::Class, "Class")
            .try_step(Step::new(StepId::Class, "Again"));
        assert!(matches!(result, Err(WaymarkError::DuplicateStep(_))));
    }

    #[test]
    #[should_panic(expected = "Duplicate step: class")]
    fn test_duplicate_step_panics() {
        let _ = StepCatalog::builder()
            .step(StepId::Class, "Class")
            .step(StepId::Class, "Class");
    }

    #[test]
    fn test_dependency_on_missing_step() {
        let result = StepCatalog::builder()
            .step(StepId::Class, "Class")
            .dependency(StepId::Subclass, StepId::Class)
            .build();
        assert!(matches!(result, Err(WaymarkError::StepNotFound(_))));
    }

    #[test]
    fn test_forward_dependency_is_rejected() {
        let result = StepCatalog::builder()
            .step(StepId::Class, "Class")
            .step(StepId::Subclass, "Subclass")
            .dependency(StepId::Class, StepId::Subclass)
            .build();
        assert!(matches!(
            result,
            Err(WaymarkError::InvalidDependency { .. })
        ));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let result = StepCatalog::builder()
            .step(StepId::Class, "Class")
            .dependency(StepId::Class, StepId::Class)
            .build();
        assert!(matches!(result, Err(WaymarkError::DependencyCycle)));
    }

    #[test]
    fn test_mutual_dependency_is_a_cycle() {
        let result = StepCatalog::builder()
            .step(StepId::Class, "Class")
            .step(StepId::Subclass, "Subclass")
            .dependency(StepId::Subclass, StepId::Class)
            .dependency(StepId::Class, StepId::Subclass)
            .build();
        assert!(matches!(result, Err(WaymarkError::DependencyCycle)));
    }

    #[test]
    fn test_second_upstream_is_rejected() {
        let result = StepCatalog::builder()
            .step(StepId::Class, "Class")
            .step(StepId::Ancestry, "Ancestry")
            .step(StepId::Subclass, "Subclass")
            .dependency(StepId::Subclass, StepId::Class)
            .dependency(StepId::Subclass, StepId::Ancestry)
            .build();
        assert!(matches!(
            result,
            Err(WaymarkError::InvalidDependency { .. })
        ));
    }

    #[test]
    fn test_catalog_debug() {
        let debug_output = format!("{:?}", three_steps());
        assert!(debug_output.contains("StepCatalog"));
        assert!(debug_output.contains("dependency_count"));
    }
}
