//! Compiled dispatch tables.
//!
//! The table is plain data: ids, names, and per-state binding arrays. No
//! behavior closures live here — handler slots refer back to the model's
//! declared behavior by index, so the table serializes cleanly and two
//! lowerings of the same model compare equal.

use serde::{Deserialize, Serialize};

use crate::model::{EventId, HistoryKind, StateId};

/// Binding of one (state, event) pair.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum HandlerSlot {
    /// The state declares behavior for the event itself; `handler` indexes
    /// the state's declared handler list.
    Local { handler: u16 },

    /// No local behavior; `to` is the nearest ancestor that declares any,
    /// or `None` when nobody up the chain does and the event is a no-op.
    Delegate { to: Option<StateId> },
}

/// One state's row of the compiled table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateRow {
    pub name: String,
    /// Ancestor-handler reference: the parent whose row continues the walk.
    pub parent: Option<StateId>,
    /// Whether the state's exit handler has any actions. Every state has
    /// exactly one exit handler, possibly empty.
    pub has_exit: bool,
    /// Event bindings, indexed by `EventId`.
    pub handlers: Vec<HandlerSlot>,
}

/// Storage layout for one history slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistorySlot {
    pub owner: StateId,
    pub kind: HistoryKind,
    /// Initial slot value; restoring before the owner was ever exited lands
    /// here.
    pub default: StateId,
    /// Every state id the slot can legally hold, default first.
    pub restorable: Vec<StateId>,
}

/// Output of lowering: dense enumerations plus flat per-state tables.
///
/// Immutable once produced. State and event ids are input-order-derived and
/// identical across re-lowering of an unchanged model, which is what keeps
/// persisted snapshots and embedding code valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledTable {
    pub machine: String,
    pub states: Vec<StateRow>,
    pub events: Vec<String>,
    pub history_slots: Vec<HistorySlot>,
}

impl CompiledTable {
    /// Pure name lookup; reentrant and side-effect free.
    pub fn state_name(&self, id: StateId) -> &str {
        &self.states[id.0 as usize].name
    }

    /// Pure name lookup; reentrant and side-effect free.
    pub fn event_name(&self, id: EventId) -> &str {
        &self.events[id.0 as usize]
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn slot(&self, state: StateId, event: EventId) -> HandlerSlot {
        self.states[state.0 as usize].handlers[event.0 as usize]
    }
}
