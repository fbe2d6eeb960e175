//! History pseudostate resolution.

use tracing::debug;

use crate::model::{HistoryKind, Model, StateId};

/// Annotate every history pseudostate with its legal restoration set.
///
/// The set always lists the default target first, mirroring how the slot is
/// initialized, followed by the remaining candidates in id order: the owner's
/// immediate children for shallow history, every strict descendant for deep
/// history. Anything the runtime ever writes into the slot is a member of
/// this set.
pub(crate) fn resolve_histories<C>(model: &mut Model<C>) {
    for i in 0..model.histories.len() {
        let owner = model.histories[i].owner;
        let kind = model.histories[i].kind;
        let Some(default) = model.histories[i].default else {
            // Flagged by validation; nothing to annotate.
            continue;
        };

        let mut restorable = vec![default];
        for id in (0..model.state_count() as u16).map(StateId) {
            if id == default || id == owner {
                continue;
            }
            let candidate = match kind {
                HistoryKind::Shallow => model.state(id).parent == Some(owner),
                HistoryKind::Deep => model.is_ancestor_or_self(owner, id),
            };
            if candidate {
                restorable.push(id);
            }
        }

        debug!(
            owner = model.state(owner).name.as_str(),
            candidates = restorable.len(),
            ?kind,
            "resolved history pseudostate"
        );
        model.histories[i].restorable = restorable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModelBuilder;

    #[test]
    fn shallow_history_lists_immediate_children_default_first() {
        let mut b = ModelBuilder::<()>::new("m");
        let root = b.root();
        let p = b.state(root, "P");
        let x = b.state(p, "X");
        let y = b.state(p, "Y");
        let deep = b.state(y, "Deep");
        b.initial(root, p);
        b.initial(p, x);
        b.initial(y, deep);
        let h = b.shallow_history(p);
        b.history_default(h, y);

        let mut model = b.build();
        resolve_histories(&mut model);

        // Default first, then the other immediate child. The nested leaf is
        // not a shallow candidate.
        assert_eq!(model.history(h).restorable, vec![y, x]);
    }

    #[test]
    fn deep_history_lists_all_strict_descendants() {
        let mut b = ModelBuilder::<()>::new("m");
        let root = b.root();
        let p = b.state(root, "P");
        let x = b.state(p, "X");
        let y = b.state(p, "Y");
        let deep = b.state(y, "Deep");
        b.initial(root, p);
        b.initial(p, x);
        b.initial(y, deep);
        let h = b.deep_history(p);
        b.history_default(h, x);

        let mut model = b.build();
        resolve_histories(&mut model);

        assert_eq!(model.history(h).restorable, vec![x, y, deep]);
    }
}
