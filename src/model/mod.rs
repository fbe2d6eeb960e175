//! In-memory hierarchical state machine definition.
//!
//! The model is an arena of state records rooted at a single ROOT state
//! (id 0), plus event names, history pseudostates, and choice points. It is
//! built with [`ModelBuilder`](crate::builder::ModelBuilder), checked by
//! [`validate`](crate::validate), annotated by [`resolve`](crate::resolve),
//! and lowered by [`lower`](crate::lower) into a
//! [`CompiledTable`](crate::lower::CompiledTable).

mod behavior;
mod pseudo;
mod state;

pub use behavior::{
    ActionFn, Branch, EventHandler, GuardFn, Trigger, TransitionKind, TransitionTarget,
};
pub use pseudo::{ChoiceBranch, ChoicePoint, HistoryKind, HistoryPseudostate};
pub use state::{ChoiceId, EventId, HistoryId, InitialPolicy, StateId, StateNode, DO_EVENT};

/// A complete (possibly not yet validated) machine definition.
///
/// `C` is the embedding context type shared by all guards and actions.
pub struct Model<C> {
    pub(crate) name: String,
    pub(crate) states: Vec<StateNode<C>>,
    pub(crate) events: Vec<String>,
    pub(crate) histories: Vec<HistoryPseudostate>,
    pub(crate) choices: Vec<ChoicePoint<C>>,
}

impl<C> Model<C> {
    /// The ROOT state id.
    pub fn root(&self) -> StateId {
        StateId(0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn state(&self, id: StateId) -> &StateNode<C> {
        &self.states[id.0 as usize]
    }

    pub(crate) fn state_mut(&mut self, id: StateId) -> &mut StateNode<C> {
        &mut self.states[id.0 as usize]
    }

    pub fn contains_state(&self, id: StateId) -> bool {
        (id.0 as usize) < self.states.len()
    }

    pub fn event_name(&self, id: EventId) -> &str {
        &self.events[id.0 as usize]
    }

    pub fn history(&self, id: HistoryId) -> &HistoryPseudostate {
        &self.histories[id.0 as usize]
    }

    pub fn choice(&self, id: ChoiceId) -> &ChoicePoint<C> {
        &self.choices[id.0 as usize]
    }

    pub fn histories(&self) -> &[HistoryPseudostate] {
        &self.histories
    }

    pub fn choices(&self) -> &[ChoicePoint<C>] {
        &self.choices
    }

    /// Ancestors of `id` from its parent up to ROOT.
    pub fn ancestors(&self, id: StateId) -> Ancestors<'_, C> {
        Ancestors {
            model: self,
            next: self.state(id).parent,
        }
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: StateId, id: StateId) -> bool {
        ancestor == id || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Whether two states sit on the same branch of the tree (one is an
    /// ancestor of the other, or they are equal). Local transitions are only
    /// legal between such pairs.
    pub fn same_branch(&self, a: StateId, b: StateId) -> bool {
        self.is_ancestor_or_self(a, b) || self.is_ancestor_or_self(b, a)
    }

    /// Least common ancestor of two states.
    ///
    /// Always defined because every state descends from ROOT.
    pub fn lca(&self, a: StateId, b: StateId) -> StateId {
        if self.is_ancestor_or_self(a, b) {
            return a;
        }
        for anc in self.ancestors(a) {
            if self.is_ancestor_or_self(anc, b) {
                return anc;
            }
        }
        self.root()
    }

    /// Path from (exclusive) `from` down to (inclusive) `to`, in
    /// ancestor-to-descendant order. `from` must be an ancestor of `to`.
    pub fn path_down(&self, from: StateId, to: StateId) -> Vec<StateId> {
        let mut path = Vec::new();
        let mut cursor = to;
        while cursor != from {
            path.push(cursor);
            match self.state(cursor).parent {
                Some(p) => cursor = p,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// The immediate child of `ancestor` on the path down to `descendant`.
    pub fn child_towards(&self, ancestor: StateId, descendant: StateId) -> Option<StateId> {
        let mut cursor = descendant;
        loop {
            let parent = self.state(cursor).parent?;
            if parent == ancestor {
                return Some(cursor);
            }
            cursor = parent;
        }
    }

    /// The state a transition target enters towards: the target state itself,
    /// or the owning composite of a history/choice pseudostate.
    pub fn target_scope(&self, target: TransitionTarget) -> StateId {
        match target {
            TransitionTarget::State(s) => s,
            TransitionTarget::History(h) => self.history(h).owner,
            TransitionTarget::Choice(c) => self.choice(c).owner,
        }
    }
}

/// Iterator over a state's ancestor chain, parent first.
pub struct Ancestors<'m, C> {
    model: &'m Model<C>,
    next: Option<StateId>,
}

impl<C> Iterator for Ancestors<'_, C> {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        let id = self.next?;
        self.next = self.model.state(id).parent;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::ModelBuilder;

    use super::*;

    fn three_level_model() -> (Model<()>, StateId, StateId, StateId, StateId) {
        let mut b = ModelBuilder::<()>::new("nav");
        let root = b.root();
        let outer = b.state(root, "Outer");
        let inner = b.state(outer, "Inner");
        let leaf = b.state(inner, "Leaf");
        let other = b.state(root, "Other");
        b.initial(root, outer);
        b.initial(outer, inner);
        b.initial(inner, leaf);
        (b.build(), outer, inner, leaf, other)
    }

    #[test]
    fn ancestors_walk_to_root() {
        let (m, outer, inner, leaf, _) = three_level_model();
        let chain: Vec<_> = m.ancestors(leaf).collect();
        assert_eq!(chain, vec![inner, outer, m.root()]);
    }

    #[test]
    fn lca_of_cousins_is_shared_ancestor() {
        let (m, _, _, leaf, other) = three_level_model();
        assert_eq!(m.lca(leaf, other), m.root());
    }

    #[test]
    fn lca_of_nested_pair_is_the_ancestor() {
        let (m, outer, _, leaf, _) = three_level_model();
        assert_eq!(m.lca(outer, leaf), outer);
        assert_eq!(m.lca(leaf, outer), outer);
    }

    #[test]
    fn path_down_is_ancestor_to_descendant() {
        let (m, outer, inner, leaf, _) = three_level_model();
        assert_eq!(m.path_down(m.root(), leaf), vec![outer, inner, leaf]);
        assert_eq!(m.path_down(outer, leaf), vec![inner, leaf]);
        assert!(m.path_down(leaf, leaf).is_empty());
    }

    #[test]
    fn child_towards_picks_the_branch_child() {
        let (m, outer, inner, leaf, other) = three_level_model();
        assert_eq!(m.child_towards(outer, leaf), Some(inner));
        assert_eq!(m.child_towards(m.root(), leaf), Some(outer));
        assert_eq!(m.child_towards(other, leaf), None);
    }

    #[test]
    fn same_branch_rejects_siblings() {
        let (m, outer, _, leaf, other) = three_level_model();
        assert!(m.same_branch(outer, leaf));
        assert!(!m.same_branch(leaf, other));
    }
}
