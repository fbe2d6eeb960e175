//! History pseudostates and choice points.
//!
//! Both are transition targets that resolve immediately; neither is ever a
//! dwelling state. The resolver passes fill in the annotation fields before
//! lowering.

use serde::{Deserialize, Serialize};

use super::behavior::{ActionFn, GuardFn, TransitionTarget};
use super::state::StateId;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum HistoryKind {
    /// Restores the immediate child of the owner that was last exited; the
    /// child's own default descent re-runs.
    Shallow,

    /// Restores the full nested leaf that was last exited.
    Deep,
}

/// History pseudostate owned by a composite state.
///
/// The recorded slot is overwritten every time the owner is exited and read
/// only when a transition targets this pseudostate. Until the owner has been
/// exited once, restoration lands on the default target.
pub struct HistoryPseudostate {
    pub owner: StateId,
    pub kind: HistoryKind,
    /// Required; validated as a strict descendant of the owner.
    pub default: Option<StateId>,
    /// Annotation: legal restoration targets, default first. For shallow
    /// history these are the owner's immediate children; for deep history,
    /// every strict descendant.
    pub restorable: Vec<StateId>,
}

impl HistoryPseudostate {
    pub(crate) fn new(owner: StateId, kind: HistoryKind) -> Self {
        Self {
            owner,
            kind,
            default: None,
            restorable: Vec::new(),
        }
    }
}

/// One guarded branch of a choice point. A branch without a guard is a
/// default branch and always passes.
pub struct ChoiceBranch<C> {
    pub guard: Option<GuardFn<C>>,
    pub action: Option<ActionFn<C>>,
    pub target: TransitionTarget,
}

/// Choice point owned by a composite (or the root).
///
/// Branches are evaluated in declaration order; the first passing guard wins,
/// else the default branch. The validator rejects choice points with no
/// default branch, so evaluation is total.
pub struct ChoicePoint<C> {
    pub owner: StateId,
    pub branches: Vec<ChoiceBranch<C>>,
    /// Annotation: index of the first unguarded branch.
    pub default_index: Option<usize>,
}

impl<C> ChoicePoint<C> {
    pub(crate) fn new(owner: StateId) -> Self {
        Self {
            owner,
            branches: Vec::new(),
            default_index: None,
        }
    }
}
