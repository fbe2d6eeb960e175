//! Builder API for assembling hierarchical state machine models.
//!
//! The builder hands out arena ids as states, events, and pseudostates are
//! declared, so later declarations can reference earlier ones. Declaration
//! order is significant: it fixes id assignment and guard evaluation order.
//!
//! # Example
//!
//! ```
//! use strata::builder::{ModelBuilder, TransitionSpec};
//!
//! let mut b = ModelBuilder::<()>::new("blinky");
//! let root = b.root();
//! let off = b.state(root, "Off");
//! let on = b.state(root, "On");
//! b.initial(root, off);
//! let toggle = b.event("TOGGLE");
//! b.transition(off, TransitionSpec::on(toggle).to(on)).unwrap();
//! b.transition(on, TransitionSpec::on(toggle).to(off)).unwrap();
//! let machine = strata::compile(b.build()).unwrap();
//! ```

pub mod error;
pub mod transition;

pub use error::BuildError;
pub use transition::{BranchSpec, TransitionSpec};

use crate::model::{
    Branch, ChoiceBranch, ChoiceId, ChoicePoint, EventId, HistoryId, HistoryKind,
    HistoryPseudostate, InitialPolicy, Model, StateId, StateNode, TransitionKind, Trigger,
    DO_EVENT,
};

/// Fluent builder for [`Model`]s.
///
/// The ROOT state (id 0) and the reserved "do" event (id 0) exist from the
/// start. `build` performs no semantic checks; run the result through
/// [`compile`](crate::compile) (or [`validate`](crate::validate::validate))
/// before executing it.
pub struct ModelBuilder<C> {
    model: Model<C>,
}

impl<C> ModelBuilder<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            model: Model {
                name: name.into(),
                states: vec![StateNode::new("ROOT", None)],
                events: vec!["do".to_string()],
                histories: Vec::new(),
                choices: Vec::new(),
            },
        }
    }

    /// The ROOT state id.
    pub fn root(&self) -> StateId {
        StateId(0)
    }

    /// Add a state under `parent` and return its id.
    pub fn state(&mut self, parent: StateId, name: impl Into<String>) -> StateId {
        let id = StateId(self.model.states.len() as u16);
        self.model.states.push(StateNode::new(name, Some(parent)));
        self.model.state_mut(parent).children.push(id);
        id
    }

    /// Register an event by name and return its id. Registering the same
    /// name twice returns the original id.
    pub fn event(&mut self, name: impl Into<String>) -> EventId {
        let name = name.into();
        if let Some(pos) = self.model.events.iter().position(|e| *e == name) {
            return EventId(pos as u16);
        }
        let id = EventId(self.model.events.len() as u16);
        self.model.events.push(name);
        id
    }

    /// Set the default child entered when `composite` is the transition
    /// target. The child may be any strict descendant.
    pub fn initial(&mut self, composite: StateId, child: StateId) {
        self.model.state_mut(composite).initial = InitialPolicy::Initial(child);
    }

    /// Add an entry action to a state.
    pub fn entry<F>(&mut self, state: StateId, action: F)
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.model
            .state_mut(state)
            .entry
            .push(std::sync::Arc::new(action));
    }

    /// Add an exit action to a state.
    pub fn exit<F>(&mut self, state: StateId, action: F)
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.model
            .state_mut(state)
            .exit
            .push(std::sync::Arc::new(action));
    }

    /// Add a shallow history pseudostate to `owner`.
    pub fn shallow_history(&mut self, owner: StateId) -> HistoryId {
        self.push_history(owner, HistoryKind::Shallow)
    }

    /// Add a deep history pseudostate to `owner`.
    pub fn deep_history(&mut self, owner: StateId) -> HistoryId {
        self.push_history(owner, HistoryKind::Deep)
    }

    fn push_history(&mut self, owner: StateId, kind: HistoryKind) -> HistoryId {
        let id = HistoryId(self.model.histories.len() as u16);
        self.model
            .histories
            .push(HistoryPseudostate::new(owner, kind));
        id
    }

    /// Set the default restoration target of a history pseudostate. Required;
    /// the validator rejects histories without one.
    pub fn history_default(&mut self, history: HistoryId, target: StateId) {
        self.model.histories[history.0 as usize].default = Some(target);
    }

    /// Make entering the history's owner restore through the history instead
    /// of a plain initial child.
    pub fn initial_history(&mut self, history: HistoryId) {
        let pseudo = &self.model.histories[history.0 as usize];
        let owner = pseudo.owner;
        let policy = match pseudo.kind {
            HistoryKind::Shallow => InitialPolicy::ShallowHistory(history),
            HistoryKind::Deep => InitialPolicy::DeepHistory(history),
        };
        self.model.state_mut(owner).initial = policy;
    }

    /// Add a choice point owned by `owner` (use the ROOT id for a top-level
    /// choice) and return its id. Populate it with [`ModelBuilder::branch`].
    pub fn choice(&mut self, owner: StateId) -> ChoiceId {
        let id = ChoiceId(self.model.choices.len() as u16);
        self.model.choices.push(ChoicePoint::new(owner));
        id
    }

    /// Append a branch to a choice point. Branches are evaluated in the
    /// order they are added.
    pub fn branch(&mut self, choice: ChoiceId, spec: BranchSpec<C>) -> Result<(), BuildError> {
        let target = spec.target.ok_or(BuildError::BranchWithoutTarget)?;
        self.model.choices[choice.0 as usize].branches.push(ChoiceBranch {
            guard: spec.guard,
            action: spec.action,
            target,
        });
        Ok(())
    }

    /// Declare behavior on a state. Behaviors for the same trigger merge
    /// into one ordered branch list, evaluated in declaration order.
    pub fn transition(&mut self, state: StateId, spec: TransitionSpec<C>) -> Result<(), BuildError> {
        if spec.action.is_none() && spec.target.is_none() {
            return Err(BuildError::EmptyBehavior {
                state: self.model.state(state).name.clone(),
            });
        }
        if spec.kind == TransitionKind::Local && spec.target.is_none() {
            return Err(BuildError::LocalWithoutTarget {
                state: self.model.state(state).name.clone(),
            });
        }

        let branch = Branch {
            guard: spec.guard,
            action: spec.action,
            target: spec.target,
            kind: spec.kind,
        };
        // Addressing the reserved id directly means the same thing as on_do;
        // normalize so one state never grows two handlers for event 0.
        let trigger = if spec.trigger == Trigger::Event(DO_EVENT) {
            Trigger::Do
        } else {
            spec.trigger
        };
        let node = self.model.state_mut(state);
        match node.handlers.iter_mut().find(|h| h.trigger == trigger) {
            Some(handler) => handler.branches.push(branch),
            None => node.handlers.push(crate::model::EventHandler {
                trigger,
                branches: vec![branch],
            }),
        }
        Ok(())
    }

    /// Finish construction and hand back the model.
    pub fn build(self) -> Model<C> {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Trigger;

    #[test]
    fn same_trigger_merges_into_one_handler() {
        let mut b = ModelBuilder::<u8>::new("m");
        let root = b.root();
        let a = b.state(root, "A");
        let x = b.state(root, "X");
        let y = b.state(root, "Y");
        b.initial(root, a);
        let ev = b.event("EV");
        b.transition(a, TransitionSpec::on(ev).guard(|n: &u8| *n > 0).to(x))
            .unwrap();
        b.transition(a, TransitionSpec::on(ev).to(y)).unwrap();

        let model = b.build();
        let handlers = &model.state(a).handlers;
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].trigger, Trigger::Event(ev));
        assert_eq!(handlers[0].branches.len(), 2);
    }

    #[test]
    fn addressing_event_zero_merges_with_on_do() {
        let mut b = ModelBuilder::<u8>::new("m");
        let root = b.root();
        let a = b.state(root, "A");
        b.initial(root, a);
        b.transition(a, TransitionSpec::on_do().action(|_| {})).unwrap();
        b.transition(a, TransitionSpec::on(EventId(0)).action(|_| {}))
            .unwrap();

        let model = b.build();
        let handlers = &model.state(a).handlers;
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].trigger, Trigger::Do);
        assert_eq!(handlers[0].branches.len(), 2);
    }

    #[test]
    fn duplicate_event_name_reuses_id() {
        let mut b = ModelBuilder::<()>::new("m");
        let first = b.event("TICK");
        let second = b.event("TICK");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_behavior_is_rejected() {
        let mut b = ModelBuilder::<()>::new("m");
        let root = b.root();
        let a = b.state(root, "A");
        let ev = b.event("EV");
        let err = b.transition(a, TransitionSpec::on(ev)).unwrap_err();
        assert!(matches!(err, BuildError::EmptyBehavior { .. }));
    }

    #[test]
    fn local_without_target_is_rejected() {
        let mut b = ModelBuilder::<()>::new("m");
        let root = b.root();
        let a = b.state(root, "A");
        let ev = b.event("EV");
        let err = b
            .transition(a, TransitionSpec::on(ev).action(|_| {}).local())
            .unwrap_err();
        assert!(matches!(err, BuildError::LocalWithoutTarget { .. }));
    }

    #[test]
    fn branch_without_target_is_rejected() {
        let mut b = ModelBuilder::<()>::new("m");
        let root = b.root();
        let c = b.choice(root);
        let err = b.branch(c, BranchSpec::otherwise()).unwrap_err();
        assert_eq!(err, BuildError::BranchWithoutTarget);
    }
}
