//! State tree records and identifiers.
//!
//! States live in an arena owned by [`Model`](super::Model); parent and child
//! links are stored as integer ids rather than references, so the tree has a
//! single owner and no reference cycles.

use serde::{Deserialize, Serialize};

use super::behavior::{ActionFn, EventHandler};

/// Dense identifier of a state in the arena.
///
/// Id 0 is always the ROOT state. Ids are assigned in insertion order and are
/// stable across re-compilation as long as the model structure is unchanged,
/// which is what lets persisted snapshots keep referring to them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct StateId(pub u16);

/// Dense identifier of an event.
///
/// Id 0 is reserved for the "do" event (see [`DO_EVENT`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct EventId(pub u16);

/// Identifier of a history pseudostate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct HistoryId(pub u16);

/// Identifier of a choice point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ChoiceId(pub u16);

/// The reserved "do" event.
///
/// Unlike ordinary events, a state's "do" behavior does not consume the event:
/// every ancestor that declares "do" behavior runs it too, unless some level
/// takes a transition.
pub const DO_EVENT: EventId = EventId(0);

/// How a composite state picks a dwelling point when entered directly.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum InitialPolicy {
    /// No children; the state itself is the dwelling point.
    Leaf,

    /// Descend to this child (any strict descendant) and continue resolving.
    Initial(StateId),

    /// Restore the most recently exited immediate child.
    ShallowHistory(HistoryId),

    /// Restore the most recently exited nested leaf.
    DeepHistory(HistoryId),
}

/// One state record in the arena.
///
/// `C` is the embedding context type that guards read and actions mutate.
pub struct StateNode<C> {
    pub name: String,
    pub parent: Option<StateId>,
    pub children: Vec<StateId>,
    pub entry: Vec<ActionFn<C>>,
    pub exit: Vec<ActionFn<C>>,
    pub initial: InitialPolicy,
    /// Behavior declared directly on this state, in declaration order.
    pub handlers: Vec<EventHandler<C>>,
}

impl<C> StateNode<C> {
    pub(crate) fn new(name: impl Into<String>, parent: Option<StateId>) -> Self {
        Self {
            name: name.into(),
            parent,
            children: Vec::new(),
            entry: Vec::new(),
            exit: Vec::new(),
            initial: InitialPolicy::Leaf,
            handlers: Vec::new(),
        }
    }

    /// A state with children is a composite and never a dwelling point.
    pub fn is_composite(&self) -> bool {
        !self.children.is_empty()
    }
}
