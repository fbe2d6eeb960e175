//! Static validation of machine models.
//!
//! Compilation fails closed: no table is produced while any diagnostic
//! exists. The checker does not stop at the first problem — it walks the
//! whole model and reports every diagnostic in one pass, so a model author
//! fixes them together instead of one at a time.
//!
//! Everything rejected here is exactly what would make the runtime partial:
//! dangling targets, choice points that can fail to select a branch,
//! histories with nowhere to restore to, and default-resolution cycles that
//! would never reach a leaf. Accepting a model therefore makes
//! `dispatch_event` total.

use thiserror::Error;
use tracing::debug;

use crate::model::{
    ChoiceId, InitialPolicy, Model, StateId, TransitionKind, TransitionTarget, Trigger,
};

/// One compile-time problem with a model.
///
/// Diagnostics carry state names rather than bare ids so the message is
/// readable without the model at hand.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Diagnostic {
    #[error("transition on `{from_state}` targets {target:?}, which does not exist")]
    DanglingTarget {
        from_state: String,
        target: TransitionTarget,
    },

    #[error("choice point {choice:?} owned by `{owner}` has no default branch")]
    ChoiceWithoutDefault { choice: ChoiceId, owner: String },

    #[error("choice point {choice:?} owned by `{owner}` has {count} unguarded branches; exactly one default is allowed")]
    ChoiceExtraDefaults {
        choice: ChoiceId,
        owner: String,
        count: usize,
    },

    #[error("history pseudostate of `{owner}` has no default target")]
    HistoryWithoutDefault { owner: String },

    #[error("history default of `{owner}` must be a strict descendant, got `{target}`")]
    HistoryDefaultOutsideOwner { owner: String, target: String },

    #[error("initial child of `{composite}` must be a strict descendant, got `{child}`")]
    InitialNotDescendant { composite: String, child: String },

    #[error("initial policy of `{composite}` references a history pseudostate it does not own")]
    InitialForeignHistory { composite: String },

    #[error("default resolution through `{at}` cycles and would never reach a leaf")]
    DefaultResolutionCycle { at: String },

    #[error("`{state}` declares {count} unguarded behaviors for `{trigger}`; the extras are ambiguous")]
    AmbiguousTransitions {
        state: String,
        trigger: String,
        count: usize,
    },

    #[error("local transition on `{from_state}` targets `{target}` outside its tree branch")]
    LocalTargetNotRelated { from_state: String, target: String },

    #[error("composite `{composite}` declares no initial child; it can never dwell")]
    CompositeWithoutInitial { composite: String },
}

/// Check a model, returning every diagnostic found.
///
/// `Ok(())` means the model is safe to resolve and lower.
pub fn validate<C>(model: &Model<C>) -> Result<(), Vec<Diagnostic>> {
    let mut diags = Vec::new();

    check_targets(model, &mut diags);
    check_choices(model, &mut diags);
    check_histories(model, &mut diags);
    check_initials(model, &mut diags);
    check_ambiguity(model, &mut diags);
    check_local_kinds(model, &mut diags);
    check_resolution_cycles(model, &mut diags);

    debug!(
        machine = model.name(),
        diagnostics = diags.len(),
        "validation finished"
    );

    if diags.is_empty() {
        Ok(())
    } else {
        Err(diags)
    }
}

fn target_exists<C>(model: &Model<C>, target: TransitionTarget) -> bool {
    match target {
        TransitionTarget::State(s) => model.contains_state(s),
        TransitionTarget::History(h) => (h.0 as usize) < model.histories().len(),
        TransitionTarget::Choice(c) => (c.0 as usize) < model.choices().len(),
    }
}

fn check_targets<C>(model: &Model<C>, diags: &mut Vec<Diagnostic>) {
    for id in state_ids(model) {
        let node = model.state(id);
        for handler in &node.handlers {
            for branch in &handler.branches {
                if let Some(target) = branch.target {
                    if !target_exists(model, target) {
                        diags.push(Diagnostic::DanglingTarget {
                            from_state: node.name.clone(),
                            target,
                        });
                    }
                }
            }
        }
    }
    for choice in model.choices() {
        for branch in &choice.branches {
            if !target_exists(model, branch.target) {
                diags.push(Diagnostic::DanglingTarget {
                    from_state: model.state(choice.owner).name.clone(),
                    target: branch.target,
                });
            }
        }
    }
}

fn check_choices<C>(model: &Model<C>, diags: &mut Vec<Diagnostic>) {
    for (i, choice) in model.choices().iter().enumerate() {
        let defaults = choice.branches.iter().filter(|b| b.guard.is_none()).count();
        let owner = model.state(choice.owner).name.clone();
        match defaults {
            0 => diags.push(Diagnostic::ChoiceWithoutDefault {
                choice: ChoiceId(i as u16),
                owner,
            }),
            1 => {}
            n => diags.push(Diagnostic::ChoiceExtraDefaults {
                choice: ChoiceId(i as u16),
                owner,
                count: n,
            }),
        }
    }
}

fn check_histories<C>(model: &Model<C>, diags: &mut Vec<Diagnostic>) {
    for history in model.histories() {
        let owner = model.state(history.owner).name.clone();
        match history.default {
            None => diags.push(Diagnostic::HistoryWithoutDefault { owner }),
            Some(target) => {
                if !model.contains_state(target)
                    || target == history.owner
                    || !model.is_ancestor_or_self(history.owner, target)
                {
                    let name = if model.contains_state(target) {
                        model.state(target).name.clone()
                    } else {
                        format!("{target:?}")
                    };
                    diags.push(Diagnostic::HistoryDefaultOutsideOwner {
                        owner,
                        target: name,
                    });
                }
            }
        }
    }
}

fn check_initials<C>(model: &Model<C>, diags: &mut Vec<Diagnostic>) {
    for id in state_ids(model) {
        let node = model.state(id);
        match node.initial {
            InitialPolicy::Leaf => {
                if node.is_composite() {
                    diags.push(Diagnostic::CompositeWithoutInitial {
                        composite: node.name.clone(),
                    });
                }
            }
            InitialPolicy::Initial(child) => {
                if !model.contains_state(child)
                    || child == id
                    || !model.is_ancestor_or_self(id, child)
                {
                    let name = if model.contains_state(child) {
                        model.state(child).name.clone()
                    } else {
                        format!("{child:?}")
                    };
                    diags.push(Diagnostic::InitialNotDescendant {
                        composite: node.name.clone(),
                        child: name,
                    });
                }
            }
            InitialPolicy::ShallowHistory(h) | InitialPolicy::DeepHistory(h) => {
                let owned = (h.0 as usize) < model.histories().len()
                    && model.history(h).owner == id;
                if !owned {
                    diags.push(Diagnostic::InitialForeignHistory {
                        composite: node.name.clone(),
                    });
                }
            }
        }
    }
}

fn check_ambiguity<C>(model: &Model<C>, diags: &mut Vec<Diagnostic>) {
    for id in state_ids(model) {
        let node = model.state(id);
        for handler in &node.handlers {
            let unguarded = handler.branches.iter().filter(|b| b.guard.is_none()).count();
            if unguarded > 1 {
                let trigger = match handler.trigger {
                    Trigger::Do => "do".to_string(),
                    Trigger::Event(ev) => model.event_name(ev).to_string(),
                };
                diags.push(Diagnostic::AmbiguousTransitions {
                    state: node.name.clone(),
                    trigger,
                    count: unguarded,
                });
            }
        }
    }
}

fn check_local_kinds<C>(model: &Model<C>, diags: &mut Vec<Diagnostic>) {
    for id in state_ids(model) {
        let node = model.state(id);
        for handler in &node.handlers {
            for branch in &handler.branches {
                let Some(target) = branch.target else { continue };
                if branch.kind != TransitionKind::Local || !target_exists(model, target) {
                    continue;
                }
                let scope = model.target_scope(target);
                if !model.same_branch(id, scope) {
                    diags.push(Diagnostic::LocalTargetNotRelated {
                        from_state: node.name.clone(),
                        target: model.state(scope).name.clone(),
                    });
                }
            }
        }
    }
}

/// Walk the arrival-resolution graph (initial policies, history defaults,
/// choice branches) looking for cycles. State-to-descendant edges strictly
/// descend, so any cycle has to pass through a choice point; still, the walk
/// covers every node so a diagnostic names the first state on the loop.
fn check_resolution_cycles<C>(model: &Model<C>, diags: &mut Vec<Diagnostic>) {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        White,
        Grey,
        Black,
    }

    // Node indexing: states, then histories, then choices.
    let s = model.state_count();
    let h = model.histories().len();
    let total = s + h + model.choices().len();
    let mut marks = vec![Mark::White; total];

    fn node_index<C>(model: &Model<C>, target: TransitionTarget) -> Option<usize> {
        let s = model.state_count();
        let h = model.histories().len();
        match target {
            TransitionTarget::State(id) => model.contains_state(id).then_some(id.0 as usize),
            TransitionTarget::History(id) => {
                ((id.0 as usize) < h).then_some(s + id.0 as usize)
            }
            TransitionTarget::Choice(id) => ((id.0 as usize) < model.choices().len())
                .then_some(s + h + id.0 as usize),
        }
    }

    fn edges<C>(model: &Model<C>, node: usize) -> Vec<TransitionTarget> {
        let s = model.state_count();
        let h = model.histories().len();
        if node < s {
            match model.state(StateId(node as u16)).initial {
                InitialPolicy::Leaf => Vec::new(),
                InitialPolicy::Initial(child) => vec![TransitionTarget::State(child)],
                InitialPolicy::ShallowHistory(hist) | InitialPolicy::DeepHistory(hist) => {
                    vec![TransitionTarget::History(hist)]
                }
            }
        } else if node < s + h {
            match model.histories()[node - s].default {
                Some(d) => vec![TransitionTarget::State(d)],
                None => Vec::new(),
            }
        } else {
            model.choices()[node - s - h]
                .branches
                .iter()
                .map(|b| b.target)
                .collect()
        }
    }

    fn visit<C>(
        model: &Model<C>,
        node: usize,
        marks: &mut [Mark],
        diags: &mut Vec<Diagnostic>,
    ) {
        marks[node] = Mark::Grey;
        for target in edges(model, node) {
            let Some(next) = node_index(model, target) else { continue };
            match marks[next] {
                Mark::Grey => {
                    let at = model.state(model.target_scope(target)).name.clone();
                    diags.push(Diagnostic::DefaultResolutionCycle { at });
                }
                Mark::White => visit(model, next, marks, diags),
                Mark::Black => {}
            }
        }
        marks[node] = Mark::Black;
    }

    for node in 0..total {
        if marks[node] == Mark::White {
            visit(model, node, &mut marks, diags);
        }
    }
}

fn state_ids<C>(model: &Model<C>) -> impl Iterator<Item = StateId> {
    (0..model.state_count() as u16).map(StateId)
}
