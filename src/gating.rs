//! Step reachability.
//!
//! Navigation backwards is always allowed. Navigation forwards requires
//! every step before the target to be complete, not just the one right
//! before it. The check is a linear scan over the catalog; step counts are
//! small enough that nothing is cached.

use crate::{CompletedSet, StepCatalog, StepId};

/// Returns true if the wizard may move from `current` to `target`.
///
/// - A target at or before the current step is always reachable.
/// - A later target is reachable only if every step with a lower catalog
///   index is in `completed`.
/// - The first step is always reachable.
/// - A target or current step that is not in the catalog is unreachable.
///
/// The result depends only on the arguments.
pub fn is_reachable(
    target: StepId,
    current: StepId,
    completed: &CompletedSet,
    catalog: &StepCatalog,
) -> bool {
    let (Some(target_index), Some(current_index)) =
        (catalog.index_of(target), catalog.index_of(current))
    else {
        return false;
    };

    if target_index <= current_index {
        return true;
    }

    catalog.steps()[..target_index]
        .iter()
        .all(|step| completed.is_complete(step.id))
}
