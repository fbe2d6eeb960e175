//! Balanced lowering.
//!
//! Each state's handler set contains only the behavior declared directly on
//! it; everything else is a single delegate link to the nearest ancestor that
//! declares any. Every behavior therefore appears exactly once in the output
//! (no duplication down the tree), while a dispatch pays at most one
//! indirection per ancestor that actually handles the event — the balanced
//! point between copying every inherited handler into every descendant and
//! walking the full ancestor chain level by level.
//!
//! Lowering never changes observable behavior: propagation stays leaf to
//! root, guard order within a state stays declaration order, and every state
//! keeps exactly one (possibly empty) exit handler.

use tracing::debug;

use crate::model::{EventId, Model, StateId};

use super::tables::{CompiledTable, HandlerSlot, HistorySlot, StateRow};

/// Lower a validated, resolved model into its compiled table.
///
/// Ids are input-order-derived: state rows appear in arena order, events in
/// declaration order with "do" at 0. Re-lowering an unchanged model yields a
/// byte-identical table.
pub(crate) fn lower<C>(model: &Model<C>) -> CompiledTable {
    let event_count = model.event_count();
    let mut states = Vec::with_capacity(model.state_count());

    for id in (0..model.state_count() as u16).map(StateId) {
        let node = model.state(id);
        let mut handlers = Vec::with_capacity(event_count);
        for ev in (0..event_count as u16).map(EventId) {
            handlers.push(bind(model, id, ev));
        }
        states.push(StateRow {
            name: node.name.clone(),
            parent: node.parent,
            has_exit: !node.exit.is_empty(),
            handlers,
        });
    }

    let history_slots = model
        .histories()
        .iter()
        .map(|h| HistorySlot {
            owner: h.owner,
            kind: h.kind,
            default: h
                .default
                .expect("lowering runs on validated models; history defaults are present"),
            restorable: h.restorable.clone(),
        })
        .collect();

    debug!(
        machine = model.name(),
        states = model.state_count(),
        events = event_count,
        "lowered model"
    );

    CompiledTable {
        machine: model.name().to_string(),
        states,
        events: (0..event_count as u16)
            .map(|e| model.event_name(EventId(e)).to_string())
            .collect(),
        history_slots,
    }
}

/// Compute the binding for one (state, event) pair: a local handler index if
/// the state declares the trigger, else a delegate link to the nearest
/// declaring ancestor.
fn bind<C>(model: &Model<C>, state: StateId, event: EventId) -> HandlerSlot {
    if let Some(idx) = declared_index(model, state, event) {
        return HandlerSlot::Local {
            handler: idx as u16,
        };
    }
    let to = model
        .ancestors(state)
        .find(|anc| declared_index(model, *anc, event).is_some());
    HandlerSlot::Delegate { to }
}

fn declared_index<C>(model: &Model<C>, state: StateId, event: EventId) -> Option<usize> {
    model
        .state(state)
        .handlers
        .iter()
        .position(|h| h.trigger.event_id() == event)
}
