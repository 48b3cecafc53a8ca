//! Error types for the Waymark wizard engine.
//!
//! Most wizard operations never fail: unreachable navigation targets and
//! stale clicks degrade to no-op outcomes. The errors here cover catalog
//! construction, the session actor's channel, payload decoding, and step
//! data loads.

use thiserror::Error;

use crate::loader::LoadKey;

/// The main error type for Waymark operations.
///
/// This enum uses `#[non_exhaustive]` so new variants can be added without
/// breaking downstream matches.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WaymarkError {
    /// A step was added to a catalog twice.
    #[error("Duplicate step: {0}")]
    DuplicateStep(String),

    /// A step referenced by a dependency is not in the catalog.
    #[error("Step not found: {0}")]
    StepNotFound(String),

    /// A step id could not be parsed.
    #[error("Unknown step id: {0}")]
    UnknownStepId(String),

    /// A data dependency does not point to an earlier step.
    #[error("Invalid dependency: {step} cannot depend on {depends_on}")]
    InvalidDependency {
        /// The dependent step.
        step: String,
        /// The step it was declared to depend on.
        depends_on: String,
    },

    /// Data dependencies between steps form a cycle.
    #[error("Cycle detected in step dependencies")]
    DependencyCycle,

    /// The catalog has no steps.
    #[error("Step catalog is empty")]
    EmptyCatalog,

    /// Loading step data failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The wizard session has shut down.
    #[error("Wizard session is closed")]
    SessionClosed,

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A failed attempt to load the selectable cards for a step.
///
/// Load errors are cloneable so they can travel inside outcomes and
/// broadcast events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The card source could not be reached or returned an error.
    #[error("Card source unavailable for {key}: {message}")]
    Unavailable {
        /// The key that was being loaded.
        key: LoadKey,
        /// Description of the failure.
        message: String,
    },

    /// The card source returned a payload that could not be decoded.
    #[error("Malformed card payload for {key}: {message}")]
    Malformed {
        /// The key that was being loaded.
        key: LoadKey,
        /// Description of the decoding failure.
        message: String,
    },

    /// No source knows how to load this key.
    #[error("No card source for {0}")]
    Unsupported(LoadKey),
}

impl LoadError {
    /// Returns the key this failure belongs to.
    pub fn key(&self) -> &LoadKey {
        match self {
            Self::Unavailable { key, .. } | Self::Malformed { key, .. } => key,
            Self::Unsupported(key) => key,
        }
    }
}

/// A specialized `Result` type for Waymark operations.
pub type Result<T> = std::result::Result<T, WaymarkError>;
