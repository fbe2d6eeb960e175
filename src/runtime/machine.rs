//! Reference interpreter for compiled machines.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::lower::{CompiledMachine, CompiledTable, HandlerSlot};
use crate::model::{
    ActionFn, ChoiceId, EventId, HistoryId, HistoryKind, InitialPolicy, StateId, TransitionKind,
    TransitionTarget, DO_EVENT,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Status {
    Constructed,
    Running,
}

/// Where a transition originates: a state that declared it, or a choice
/// pseudostate chaining one of its branches.
#[derive(Clone, Copy)]
enum Source {
    State(StateId),
    Pseudo { owner: StateId },
}

/// What happened at one ancestor level during dispatch.
enum LevelOutcome {
    /// A transition ran; the event is consumed and the walk stops.
    Transitioned,
    /// An internal action ran. Consumes ordinary events; "do" keeps walking.
    Acted,
    /// No branch guard passed at this level.
    NotHandled,
}

/// One running instance of a compiled machine.
///
/// Construction zero-initializes the instance without running any entry
/// actions; [`Machine::start`] performs the initial descent and must precede
/// any [`Machine::dispatch_event`]. Dispatch is synchronous and
/// non-reentrant: it mutates the current-state cursor and history slots in
/// place and completes all chained resolution before returning. Callers with
/// concurrent event sources must serialize externally; independent instances
/// share nothing and may run on separate threads.
///
/// Dispatch never fails. Every condition that could make it partial is
/// rejected at compile time, so there is no runtime error type to handle
/// inside an event loop.
pub struct Machine<C> {
    compiled: Arc<CompiledMachine<C>>,
    status: Status,
    current: StateId,
    /// One slot per history pseudostate, initialized to the resolved default.
    history: Vec<StateId>,
    ctx: C,
}

impl<C> Machine<C> {
    /// Construct an instance. Runs no actions; call [`Machine::start`] next.
    pub fn new(compiled: Arc<CompiledMachine<C>>, ctx: C) -> Self {
        let history = compiled
            .table
            .history_slots
            .iter()
            .map(|slot| slot.default)
            .collect();
        Self {
            compiled,
            status: Status::Constructed,
            current: StateId(0),
            history,
            ctx,
        }
    }

    /// The dispatch table backing this instance.
    pub fn table(&self) -> &CompiledTable {
        &self.compiled.table
    }

    /// Current state id. Meaningful only after `start`.
    pub fn current_state(&self) -> StateId {
        self.current
    }

    /// Name of the current state.
    pub fn current_state_name(&self) -> &str {
        self.compiled.table.state_name(self.current)
    }

    pub fn is_started(&self) -> bool {
        self.status == Status::Running
    }

    /// The embedding context: the machine's declared variables. This is the
    /// input/output surface for embedding code.
    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// Recorded history slots. Internal, read-only from outside the engine.
    pub fn history_slots(&self) -> &[StateId] {
        &self.history
    }

    pub(crate) fn restore_history_slots(&mut self, slots: Vec<StateId>) {
        self.history = slots;
    }

    pub(crate) fn restore_position(&mut self, current: StateId) {
        self.current = current;
        self.status = Status::Running;
    }

    /// Enter from ROOT down the default-child chain to the first leaf,
    /// resolving nested initials, histories, and choice points on the way.
    /// Calling `start` on a running machine is a no-op.
    pub fn start(&mut self) {
        if self.status == Status::Running {
            return;
        }
        self.status = Status::Running;

        let compiled = Arc::clone(&self.compiled);
        let root = compiled.model.root();
        for action in &compiled.model.state(root).entry {
            action(&mut self.ctx);
        }
        self.current = root;
        self.descend_defaults(&compiled, root);
        trace!(
            machine = compiled.name(),
            state = self.current_state_name(),
            "started"
        );
    }

    /// Dispatch one event.
    ///
    /// The current leaf state gets the first look; levels without local
    /// behavior are skipped via their delegate links. The first level whose
    /// guard passes consumes the event, and a transition stops the walk
    /// outright. The reserved "do" event (id 0) is the exception: action-only
    /// "do" behavior runs at every declaring level leaf to root, unless some
    /// level takes a transition.
    ///
    /// Dispatching before `start`, or an event id outside the table, has no
    /// effect.
    pub fn dispatch_event(&mut self, event: EventId) {
        if self.status != Status::Running {
            return;
        }
        if event.0 as usize >= self.compiled.table.event_count() {
            return;
        }

        let compiled = Arc::clone(&self.compiled);
        trace!(
            machine = compiled.name(),
            event = compiled.table.event_name(event),
            from = self.current_state_name(),
            "dispatch"
        );

        let is_do = event == DO_EVENT;
        let mut level = Some(self.current);
        while let Some(state) = level {
            match self.compiled.table.slot(state, event) {
                HandlerSlot::Delegate { to } => level = to,
                HandlerSlot::Local { handler } => {
                    match self.run_level(&compiled, state, handler as usize) {
                        LevelOutcome::Transitioned => break,
                        LevelOutcome::Acted if !is_do => break,
                        LevelOutcome::Acted | LevelOutcome::NotHandled => {
                            level = self.compiled.table.states[state.0 as usize].parent;
                        }
                    }
                }
            }
        }

        trace!(
            machine = compiled.name(),
            to = self.current_state_name(),
            "dispatch complete"
        );
    }

    /// Evaluate one state's declared branches for the dispatched trigger:
    /// declaration order, first passing guard wins.
    fn run_level(
        &mut self,
        compiled: &Arc<CompiledMachine<C>>,
        state: StateId,
        handler: usize,
    ) -> LevelOutcome {
        let branch_count = compiled.model.state(state).handlers[handler].branches.len();
        for i in 0..branch_count {
            let branch = &compiled.model.state(state).handlers[handler].branches[i];
            if !branch.passes(&self.ctx) {
                continue;
            }
            if let Some(target) = branch.target {
                let kind = branch.kind;
                let action = branch.action.clone();
                self.transition_step(compiled, Source::State(state), kind, target, action);
                return LevelOutcome::Transitioned;
            }
            if let Some(action) = &branch.action {
                action(&mut self.ctx);
            }
            return LevelOutcome::Acted;
        }
        LevelOutcome::NotHandled
    }

    /// Transition execution: exit to the LCA, run the action, enter towards
    /// the target, resolve the arrival point. Chained pseudostate targets
    /// recurse; the validator's cycle check bounds the depth.
    fn transition_step(
        &mut self,
        compiled: &Arc<CompiledMachine<C>>,
        source: Source,
        kind: TransitionKind,
        target: TransitionTarget,
        action: Option<ActionFn<C>>,
    ) {
        let model = &compiled.model;
        let scope = model.target_scope(target);
        let source_state = match source {
            Source::State(s) => s,
            Source::Pseudo { owner } => owner,
        };
        let mut lca = model.lca(source_state, scope);

        // External boundary transitions exit and re-enter the boundary
        // state. Pseudostates sit inside their owner like a child: an owner
        // is never a source boundary for a chained branch, and never a
        // target boundary to re-enter.
        let state_target = matches!(target, TransitionTarget::State(_));
        let source_boundary = matches!(source, Source::State(s) if lca == s);
        let boundary = source_boundary || (state_target && lca == scope);
        if kind == TransitionKind::External && boundary {
            if let Some(parent) = model.state(lca).parent {
                lca = parent;
            }
        }

        self.exit_to(compiled, lca);
        if let Some(action) = action {
            action(&mut self.ctx);
        }
        self.enter_path(compiled, lca, scope);
        self.finish_arrival(compiled, target);
    }

    /// Exit from the current position up to (exclusive of) `lca`, leaf to
    /// ancestor, recording history slots as their owners are exited.
    fn exit_to(&mut self, compiled: &Arc<CompiledMachine<C>>, lca: StateId) {
        let model = &compiled.model;
        let exited_leaf = self.current;
        let mut cursor = self.current;
        while cursor != lca {
            for (i, slot) in compiled.table.history_slots.iter().enumerate() {
                if slot.owner != cursor {
                    continue;
                }
                // A pseudostate hop can exit an owner the machine entered
                // without descending; there is no dwelled child to record.
                let recorded = match slot.kind {
                    HistoryKind::Deep => (exited_leaf != cursor).then_some(exited_leaf),
                    HistoryKind::Shallow => model.child_towards(cursor, exited_leaf),
                };
                if let Some(recorded) = recorded {
                    self.history[i] = recorded;
                }
            }
            for action in &model.state(cursor).exit {
                action(&mut self.ctx);
            }
            match model.state(cursor).parent {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
        self.current = lca;
    }

    /// Run entry actions from (exclusive of) `from` down to (inclusive of)
    /// `to`, ancestor to leaf.
    fn enter_path(&mut self, compiled: &Arc<CompiledMachine<C>>, from: StateId, to: StateId) {
        let model = &compiled.model;
        for state in model.path_down(from, to) {
            for action in &model.state(state).entry {
                action(&mut self.ctx);
            }
        }
        self.current = to;
    }

    /// Resolve the arrival point of a transition until a leaf is reached.
    fn finish_arrival(&mut self, compiled: &Arc<CompiledMachine<C>>, target: TransitionTarget) {
        match target {
            TransitionTarget::State(state) => self.descend_defaults(compiled, state),
            TransitionTarget::History(history) => self.restore_history(compiled, history),
            TransitionTarget::Choice(choice) => self.take_choice(compiled, choice),
        }
    }

    /// Descend a composite's default-child chain to a dwelling leaf.
    fn descend_defaults(&mut self, compiled: &Arc<CompiledMachine<C>>, state: StateId) {
        let mut cursor = state;
        loop {
            match compiled.model.state(cursor).initial {
                InitialPolicy::Leaf => break,
                InitialPolicy::Initial(child) => {
                    self.enter_path(compiled, cursor, child);
                    cursor = child;
                }
                InitialPolicy::ShallowHistory(h) | InitialPolicy::DeepHistory(h) => {
                    let slot = self.history[h.0 as usize];
                    self.enter_path(compiled, cursor, slot);
                    cursor = slot;
                }
            }
        }
        self.current = cursor;
    }

    /// Restore a history pseudostate: descend to the recorded slot (the
    /// default until the owner has been exited once) and continue resolving.
    fn restore_history(&mut self, compiled: &Arc<CompiledMachine<C>>, history: HistoryId) {
        let owner = self.compiled.table.history_slots[history.0 as usize].owner;
        let slot = self.history[history.0 as usize];
        self.enter_path(compiled, owner, slot);
        self.descend_defaults(compiled, slot);
    }

    /// Evaluate a choice point and chain into the selected branch's
    /// transition. Guards are evaluated in declaration order; the default
    /// branch is taken when none passes. Exactly one branch is always
    /// selected.
    fn take_choice(&mut self, compiled: &Arc<CompiledMachine<C>>, choice: ChoiceId) {
        let (target, action, owner) = {
            let point = compiled.model.choice(choice);
            let mut selected = None;
            for (i, branch) in point.branches.iter().enumerate() {
                if let Some(guard) = &branch.guard {
                    if guard(&self.ctx) {
                        selected = Some(i);
                        break;
                    }
                }
            }
            let idx = selected
                .or(point.default_index)
                .expect("validated choice points always carry a default branch");
            let branch = &point.branches[idx];
            (branch.target, branch.action.clone(), point.owner)
        };
        self.transition_step(
            compiled,
            Source::Pseudo { owner },
            TransitionKind::External,
            target,
            action,
        );
    }
}

// The context is arbitrary user data; Debug reports the engine-owned fields.
impl<C> fmt::Debug for Machine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("machine", &self.compiled.name())
            .field("status", &self.status)
            .field("current", &self.current)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ModelBuilder, TransitionSpec};
    use crate::compile;

    fn trace_push(label: &'static str) -> impl Fn(&mut Vec<&'static str>) + Send + Sync {
        move |log: &mut Vec<&'static str>| log.push(label)
    }

    #[test]
    fn ctor_runs_no_actions_and_start_descends() {
        let mut b = ModelBuilder::<Vec<&'static str>>::new("m");
        let root = b.root();
        let outer = b.state(root, "Outer");
        let leaf = b.state(outer, "Leaf");
        b.initial(root, outer);
        b.initial(outer, leaf);
        b.entry(outer, trace_push("enter Outer"));
        b.entry(leaf, trace_push("enter Leaf"));

        let compiled = Arc::new(compile(b.build()).unwrap());
        let mut machine = Machine::new(compiled, Vec::new());
        assert!(machine.context().is_empty());
        assert!(!machine.is_started());

        machine.start();
        assert_eq!(machine.context(), &vec!["enter Outer", "enter Leaf"]);
        assert_eq!(machine.current_state_name(), "Leaf");
    }

    #[test]
    fn start_twice_is_a_noop() {
        let mut b = ModelBuilder::<u32>::new("m");
        let root = b.root();
        let a = b.state(root, "A");
        b.initial(root, a);
        b.entry(a, |n: &mut u32| *n += 1);

        let compiled = Arc::new(compile(b.build()).unwrap());
        let mut machine = Machine::new(compiled, 0);
        machine.start();
        machine.start();
        assert_eq!(*machine.context(), 1);
    }

    #[test]
    fn dispatch_before_start_is_a_noop() {
        let mut b = ModelBuilder::<u32>::new("m");
        let root = b.root();
        let a = b.state(root, "A");
        let z = b.state(root, "Z");
        b.initial(root, a);
        let go = b.event("GO");
        b.transition(a, TransitionSpec::on(go).action(|n: &mut u32| *n += 1).to(z))
            .unwrap();

        let compiled = Arc::new(compile(b.build()).unwrap());
        let mut machine = Machine::new(compiled, 0);
        machine.dispatch_event(go);
        assert_eq!(*machine.context(), 0);
        assert!(!machine.is_started());
    }

    #[test]
    fn out_of_range_event_is_a_noop() {
        let mut b = ModelBuilder::<u32>::new("m");
        let root = b.root();
        let a = b.state(root, "A");
        b.initial(root, a);

        let compiled = Arc::new(compile(b.build()).unwrap());
        let mut machine = Machine::new(compiled, 0);
        machine.start();
        machine.dispatch_event(EventId(42));
        assert_eq!(machine.current_state_name(), "A");
    }

    #[test]
    fn machine_debug_reports_position_without_the_context() {
        let mut b = ModelBuilder::<Vec<&'static str>>::new("m");
        let root = b.root();
        let a = b.state(root, "A");
        b.initial(root, a);

        let compiled = Arc::new(compile(b.build()).unwrap());
        let mut machine = Machine::new(compiled, Vec::new());
        machine.start();

        let rendered = format!("{machine:?}");
        assert!(rendered.contains("Running"));
        assert!(rendered.contains("\"m\""));
    }

    #[test]
    fn guard_false_level_does_not_consume() {
        // Leaf declares the event with a false guard; the ancestor's
        // unguarded transition should still run.
        let mut b = ModelBuilder::<Vec<&'static str>>::new("m");
        let root = b.root();
        let outer = b.state(root, "Outer");
        let leaf = b.state(outer, "Leaf");
        let target = b.state(root, "Target");
        b.initial(root, outer);
        b.initial(outer, leaf);
        let go = b.event("GO");
        b.transition(
            leaf,
            TransitionSpec::on(go)
                .guard(|_: &Vec<&'static str>| false)
                .action(trace_push("leaf acted"))
                .to(target),
        )
        .unwrap();
        b.transition(outer, TransitionSpec::on(go).to(target)).unwrap();

        let compiled = Arc::new(compile(b.build()).unwrap());
        let mut machine = Machine::new(compiled, Vec::new());
        machine.start();
        machine.dispatch_event(go);
        assert_eq!(machine.current_state_name(), "Target");
        assert!(machine.context().is_empty());
    }
}
