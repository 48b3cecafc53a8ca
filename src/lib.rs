//! # Waymark
//!
//! A step-gated wizard engine for tabletop character creation.
//!
//! A character is built by picking one card per step (class, subclass,
//! ancestry, community, and so on) in a fixed order. Waymark keeps track of
//! what has been chosen and which steps are complete, and enforces three
//! rules:
//!
//! - A step can be entered only when every earlier step is complete
//! - Going back is always allowed
//! - Withdrawing or changing an earlier choice clears the steps that relied
//!   on it
//!
//! Steps whose cards depend on an earlier choice (the subclasses of the
//! chosen class) are fed by a [`StepLoader`] that caches one card list per
//! [`LoadKey`].
//!
//! ## Quick Example
//!
//! ```rust
//! use waymark::{Card, CardType, StepCatalog, StepId, Wizard};
//!
//! let mut wizard = Wizard::new(StepCatalog::character_creation());
//!
//! // The class step's cards come from a loader; hand them over.
//! let request = wizard.start().unwrap();
//! let classes = vec![Card::new(1, "Warrior", CardType::Class)];
//! wizard.complete_load(request, Ok(classes.into()));
//!
//! wizard.select_item(Card::new(1, "Warrior", CardType::Class));
//! assert!(wizard.go_next().changed());
//! assert_eq!(wizard.current_step(), StepId::Subclass);
//!
//! // Ancestry is two steps away and subclass is not complete yet.
//! assert!(!wizard.request_navigate(StepId::Ancestry).changed());
//!
//! println!("{}", wizard.navigation());
//! ```
//!
//! For an async application, [`WizardSession::spawn`] runs the wizard in
//! its own task and performs loads in the background.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![forbid(unsafe_code)]

pub mod card;
pub mod completion;
pub mod error;
pub mod event;
pub mod gating;
pub mod loader;
pub mod mapper;
pub mod navigation;
pub mod selection;
pub mod session;
pub mod step;
pub mod wizard;

pub use card::{Card, CardFeature, CardId, CardType, SubclassLevel, SubclassPath};
pub use completion::{CompletedSet, Cut};
pub use error::{LoadError, Result, WaymarkError};
pub use event::WizardEvent;
pub use gating::is_reachable;
pub use loader::{CacheEntry, CachedLoader, CardSource, LoadKey, MemoryCardSource, StepLoader};
pub use navigation::{NavigationView, StepTab};
pub use selection::{SelectionMap, SelectionSummary};
pub use session::{SessionConfig, WizardHandle, WizardSession, WizardSnapshot};
pub use step::{Step, StepCatalog, StepCatalogBuilder, StepId};
pub use wizard::{
    LoadOutcome, LoadRequest, NavigationOutcome, OptionsStatus, SelectionOutcome, StepOptions,
    Wizard, WizardState,
};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
