//! Declared behavior: triggers, guarded branches, and transition targets.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::state::{ChoiceId, EventId, HistoryId, StateId};

/// Pure predicate over the embedding context.
///
/// Guards take a shared reference, so they cannot mutate the context; any
/// other side effect is out of contract. Evaluation order within a state is
/// declaration order, and the first passing guard wins.
pub type GuardFn<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;

/// Action run against the embedding context (entry, exit, "do", or
/// transition action).
pub type ActionFn<C> = Arc<dyn Fn(&mut C) + Send + Sync>;

/// What causes a behavior to be considered.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Trigger {
    /// The reserved "do" event (id 0). Does not consume by itself.
    Do,

    /// A specific dispatched event.
    Event(EventId),
}

impl Trigger {
    pub fn event_id(self) -> EventId {
        match self {
            Trigger::Do => super::state::DO_EVENT,
            Trigger::Event(id) => id,
        }
    }
}

/// External transitions always exit and re-enter the boundary state; local
/// transitions preserve it. Local transitions are only legal between states
/// on the same branch of the tree (ancestor/descendant pairs).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TransitionKind {
    External,
    Local,
}

/// Where a transition lands.
///
/// History and choice targets resolve further on arrival: a history target
/// restores its recorded slot, a choice target evaluates its branches and
/// chains into the selected branch's transition.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TransitionTarget {
    State(StateId),
    History(HistoryId),
    Choice(ChoiceId),
}

/// One guarded branch of a behavior.
///
/// A branch without a target is an internal action: it runs without changing
/// state. A branch with a target is a transition.
pub struct Branch<C> {
    pub guard: Option<GuardFn<C>>,
    pub action: Option<ActionFn<C>>,
    pub target: Option<TransitionTarget>,
    pub kind: TransitionKind,
}

impl<C> Branch<C> {
    /// Whether the branch fires for the current context.
    pub fn passes(&self, ctx: &C) -> bool {
        self.guard.as_ref().is_none_or(|g| g(ctx))
    }

    pub fn is_transition(&self) -> bool {
        self.target.is_some()
    }
}

/// All behavior a state declares for one trigger: an ordered branch list.
pub struct EventHandler<C> {
    pub trigger: Trigger,
    pub branches: Vec<Branch<C>>,
}
