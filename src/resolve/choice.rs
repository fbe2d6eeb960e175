//! Choice point resolution.

use tracing::debug;

use crate::model::Model;

/// Annotate every choice point with the index of its default branch.
///
/// Branch evaluation order is declaration order; selection is total once
/// validation has confirmed a default exists, so for any guard outcome
/// exactly one branch is chosen (first passing guard, else the default).
pub(crate) fn resolve_choices<C>(model: &mut Model<C>) {
    for i in 0..model.choices.len() {
        let default_index = model.choices[i]
            .branches
            .iter()
            .position(|b| b.guard.is_none());
        model.choices[i].default_index = default_index;
        debug!(
            owner = model.state(model.choices[i].owner).name.as_str(),
            branches = model.choices[i].branches.len(),
            ?default_index,
            "resolved choice point"
        );
    }
}
