//! Resolver passes run between validation and lowering.
//!
//! Both passes only annotate the model: history pseudostates gain their legal
//! restoration sets, choice points their default-branch index. Neither pass
//! changes observable machine behavior.

mod choice;
mod history;

use crate::model::Model;

/// Run all resolver passes over a validated model.
pub fn resolve<C>(model: &mut Model<C>) {
    history::resolve_histories(model);
    choice::resolve_choices(model);
}
