//! Value builders for transitions and choice branches.

use crate::model::{
    ActionFn, ChoiceId, EventId, GuardFn, HistoryId, StateId, TransitionKind, TransitionTarget,
    Trigger,
};
use std::sync::Arc;

/// Fluent description of one behavior on a state: a trigger plus an optional
/// guard, action, and target.
///
/// Without a target this describes an internal action; with one, a
/// transition. Pass the finished spec to
/// [`ModelBuilder::transition`](super::ModelBuilder::transition).
///
/// # Example
///
/// ```
/// use strata::builder::{ModelBuilder, TransitionSpec};
///
/// let mut b = ModelBuilder::<u32>::new("counter");
/// let root = b.root();
/// let idle = b.state(root, "Idle");
/// let busy = b.state(root, "Busy");
/// b.initial(root, idle);
/// let go = b.event("GO");
/// b.transition(
///     idle,
///     TransitionSpec::on(go)
///         .guard(|n: &u32| *n < 10)
///         .action(|n: &mut u32| *n += 1)
///         .to(busy),
/// )
/// .unwrap();
/// ```
pub struct TransitionSpec<C> {
    pub(crate) trigger: Trigger,
    pub(crate) guard: Option<GuardFn<C>>,
    pub(crate) action: Option<ActionFn<C>>,
    pub(crate) target: Option<TransitionTarget>,
    pub(crate) kind: TransitionKind,
}

impl<C> TransitionSpec<C> {
    /// Behavior triggered by a specific event.
    pub fn on(event: EventId) -> Self {
        Self::with_trigger(Trigger::Event(event))
    }

    /// Behavior triggered by the reserved "do" event.
    pub fn on_do() -> Self {
        Self::with_trigger(Trigger::Do)
    }

    fn with_trigger(trigger: Trigger) -> Self {
        Self {
            trigger,
            guard: None,
            action: None,
            target: None,
            kind: TransitionKind::External,
        }
    }

    /// Guard predicate (optional). Must be pure.
    pub fn guard<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Arc::new(predicate));
        self
    }

    /// Action run when the branch fires (optional).
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Target state, making this a transition.
    pub fn to(mut self, state: StateId) -> Self {
        self.target = Some(TransitionTarget::State(state));
        self
    }

    /// Target a history pseudostate.
    pub fn to_history(mut self, history: HistoryId) -> Self {
        self.target = Some(TransitionTarget::History(history));
        self
    }

    /// Target a choice point.
    pub fn to_choice(mut self, choice: ChoiceId) -> Self {
        self.target = Some(TransitionTarget::Choice(choice));
        self
    }

    /// Mark the transition local: the common-ancestor boundary is neither
    /// exited nor re-entered. Requires a target on the same tree branch.
    pub fn local(mut self) -> Self {
        self.kind = TransitionKind::Local;
        self
    }
}

/// Fluent description of one choice-point branch.
///
/// A branch built with [`BranchSpec::otherwise`] has no guard and serves as
/// the default; every choice point must declare exactly one.
pub struct BranchSpec<C> {
    pub(crate) guard: Option<GuardFn<C>>,
    pub(crate) action: Option<ActionFn<C>>,
    pub(crate) target: Option<TransitionTarget>,
}

impl<C> BranchSpec<C> {
    /// Guarded branch.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            guard: Some(Arc::new(predicate)),
            action: None,
            target: None,
        }
    }

    /// Default (unguarded) branch.
    pub fn otherwise() -> Self {
        Self {
            guard: None,
            action: None,
            target: None,
        }
    }

    /// Action run when this branch is selected (optional).
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Target state (required).
    pub fn to(mut self, state: StateId) -> Self {
        self.target = Some(TransitionTarget::State(state));
        self
    }

    /// Chain into a history pseudostate.
    pub fn to_history(mut self, history: HistoryId) -> Self {
        self.target = Some(TransitionTarget::History(history));
        self
    }

    /// Chain into another choice point.
    pub fn to_choice(mut self, choice: ChoiceId) -> Self {
        self.target = Some(TransitionTarget::Choice(choice));
        self
    }
}
