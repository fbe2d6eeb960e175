//! Reference runtime for compiled machines.
//!
//! [`Machine`] executes the dispatch contract the compiled tables encode:
//! hierarchical event bubbling, entry/exit ordering bounded by the least
//! common ancestor, history restoration, and synchronous choice-point
//! resolution. A code generator targeting another language must realize the
//! same contract; this interpreter is the executable reference for it.

mod machine;
mod vars;

pub use machine::Machine;
pub use vars::BitField;
