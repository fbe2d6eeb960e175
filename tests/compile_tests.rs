//! Integration tests for the compilation pipeline: rejection cases, id
//! stability, and the shape of lowered tables.

use strata::builder::{BranchSpec, ModelBuilder, TransitionSpec};
use strata::lower::HandlerSlot;
use strata::validate::Diagnostic;
use strata::{compile, EventId, Model, StateId};

fn nested_model() -> Model<()> {
    let mut b = ModelBuilder::<()>::new("nested");
    let root = b.root();
    let outer = b.state(root, "Outer");
    let inner = b.state(outer, "Inner");
    let leaf = b.state(inner, "Leaf");
    let side = b.state(root, "Side");
    b.initial(root, outer);
    b.initial(outer, inner);
    b.initial(inner, leaf);
    let shared = b.event("SHARED");
    let flip = b.event("FLIP");
    b.transition(outer, TransitionSpec::on(shared).to(side)).unwrap();
    b.transition(side, TransitionSpec::on(flip).to(outer)).unwrap();
    b.build()
}

#[test]
fn ids_are_stable_across_relowering() {
    let first = compile(nested_model()).unwrap();
    let second = compile(nested_model()).unwrap();
    assert_eq!(first.table(), second.table());
    // Input-order assignment: ROOT first, then declaration order.
    assert_eq!(first.table().state_name(StateId(0)), "ROOT");
    assert_eq!(first.table().state_name(StateId(1)), "Outer");
    assert_eq!(first.table().state_name(StateId(4)), "Side");
}

#[test]
fn do_event_is_reserved_id_zero() {
    let machine = compile(nested_model()).unwrap();
    assert_eq!(machine.table().event_name(EventId(0)), "do");
    assert_eq!(machine.table().event_name(EventId(1)), "SHARED");
    assert_eq!(machine.table().event_name(EventId(2)), "FLIP");
}

#[test]
fn descendants_delegate_instead_of_copying() {
    let machine = compile(nested_model()).unwrap();
    let table = machine.table();
    let shared = EventId(1);

    // Outer declares SHARED; Inner and Leaf reach it through one link.
    let outer = StateId(1);
    assert!(matches!(
        table.states[1].handlers[shared.0 as usize],
        HandlerSlot::Local { .. }
    ));
    for state in [2usize, 3] {
        assert_eq!(
            table.states[state].handlers[shared.0 as usize],
            HandlerSlot::Delegate { to: Some(outer) }
        );
    }

    // The behavior itself exists exactly once.
    let locals = table
        .states
        .iter()
        .filter(|row| matches!(row.handlers[shared.0 as usize], HandlerSlot::Local { .. }))
        .count();
    assert_eq!(locals, 1);
}

#[test]
fn unhandled_events_delegate_nowhere() {
    let machine = compile(nested_model()).unwrap();
    let flip = EventId(2);
    // FLIP is only declared on Side; the nested branch has no handler at all.
    assert_eq!(
        machine.table().states[3].handlers[flip.0 as usize],
        HandlerSlot::Delegate { to: None }
    );
}

#[test]
fn choice_without_default_fails_closed() {
    let mut b = ModelBuilder::<()>::new("bad-choice");
    let root = b.root();
    let a = b.state(root, "A");
    let z = b.state(root, "Z");
    b.initial(root, a);
    let c = b.choice(root);
    b.branch(c, BranchSpec::when(|_: &()| true).to(z)).unwrap();
    let pick = b.event("PICK");
    b.transition(a, TransitionSpec::on(pick).to_choice(c)).unwrap();

    let err = compile(b.build()).unwrap_err();
    assert!(err
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::ChoiceWithoutDefault { .. })));
}

#[test]
fn default_resolution_cycle_fails_closed() {
    let mut b = ModelBuilder::<()>::new("cycle");
    let root = b.root();
    let a = b.state(root, "A");
    b.initial(root, a);
    let c1 = b.choice(root);
    let c2 = b.choice(root);
    b.branch(c1, BranchSpec::otherwise().to_choice(c2)).unwrap();
    b.branch(c2, BranchSpec::otherwise().to_choice(c1)).unwrap();
    let spin = b.event("SPIN");
    b.transition(a, TransitionSpec::on(spin).to_choice(c1)).unwrap();

    let err = compile(b.build()).unwrap_err();
    assert!(err
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::DefaultResolutionCycle { .. })));
}

#[test]
fn every_problem_is_reported_together() {
    let mut b = ModelBuilder::<()>::new("many");
    let root = b.root();
    let p = b.state(root, "P");
    let x = b.state(p, "X");
    b.initial(root, p);
    b.initial(p, x);
    let _h = b.shallow_history(p); // missing default target
    let c = b.choice(root); // missing default branch
    b.branch(c, BranchSpec::when(|_: &()| false).to(x)).unwrap();
    let ev = b.event("EV");
    b.transition(x, TransitionSpec::on(ev).to_choice(c)).unwrap();
    let ev2 = b.event("EV2");
    b.transition(x, TransitionSpec::on(ev2).to(x)).unwrap();
    b.transition(x, TransitionSpec::on(ev2).to(p)).unwrap(); // ambiguous

    let err = compile(b.build()).unwrap_err();
    assert!(err.diagnostics.len() >= 3);
    assert!(err
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::HistoryWithoutDefault { .. })));
    assert!(err
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::ChoiceWithoutDefault { .. })));
    assert!(err
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::AmbiguousTransitions { .. })));
}

#[test]
fn history_slots_record_layout_and_legal_targets() {
    let mut b = ModelBuilder::<()>::new("hist");
    let root = b.root();
    let p = b.state(root, "P");
    let x = b.state(p, "X");
    let y = b.state(p, "Y");
    let nested = b.state(y, "Nested");
    b.initial(root, p);
    b.initial(p, x);
    b.initial(y, nested);
    let h = b.deep_history(p);
    b.history_default(h, x);
    let away = b.state(root, "Away");
    let go = b.event("GO");
    let back = b.event("BACK");
    b.transition(p, TransitionSpec::on(go).to(away)).unwrap();
    b.transition(away, TransitionSpec::on(back).to_history(h)).unwrap();

    let machine = compile(b.build()).unwrap();
    let slots = &machine.table().history_slots;
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].owner, p);
    assert_eq!(slots[0].default, x);
    // Default first, then the other strict descendants of P.
    assert_eq!(slots[0].restorable, vec![x, y, nested]);
}
