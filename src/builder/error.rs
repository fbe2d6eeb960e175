//! Build errors for model construction.

use thiserror::Error;

/// Errors that can occur while assembling a model.
///
/// These cover malformed builder usage only; semantic problems with a
/// well-formed model are reported by [`validate`](crate::validate) as
/// diagnostics instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("behavior on `{state}` has neither an action nor a target")]
    EmptyBehavior { state: String },

    #[error("local transition on `{state}` has no target. Call .to(...) or drop .local()")]
    LocalWithoutTarget { state: String },

    #[error("choice branch has no target. Call .to(...) before adding the branch")]
    BranchWithoutTarget,
}
