//! Strata: a hierarchical state machine compiler with a reference runtime.
//!
//! Strata turns a statechart-style model — nested states, transitions,
//! history pseudostates, choice points — into a compact dispatch table with a
//! fixed contract: construct, start, dispatch, introspect. Compilation is a
//! pure pipeline (validate, resolve, lower) that fails closed, so the runtime
//! never has an error path: every dispatch terminates on a leaf state.
//!
//! # Core Concepts
//!
//! - **Model**: an arena of nested states built with [`builder::ModelBuilder`]
//! - **Diagnostics**: all compile-time problems reported in one pass
//! - **Balanced lowering**: each behavior lives on exactly one state; deeper
//!   states reach inherited behavior through a single delegate link
//! - **Machine**: the reference interpreter realizing the dispatch contract
//!
//! # Example
//!
//! ```rust
//! use strata::builder::{ModelBuilder, TransitionSpec};
//! use strata::runtime::Machine;
//! use std::sync::Arc;
//!
//! let mut b = ModelBuilder::<u32>::new("press-counter");
//! let root = b.root();
//! let idle = b.state(root, "Idle");
//! let pressed = b.state(root, "Pressed");
//! b.initial(root, idle);
//! let press = b.event("PRESS");
//! let release = b.event("RELEASE");
//! b.transition(
//!     idle,
//!     TransitionSpec::on(press).action(|count| *count += 1).to(pressed),
//! )
//! .unwrap();
//! b.transition(pressed, TransitionSpec::on(release).to(idle)).unwrap();
//!
//! let compiled = Arc::new(strata::compile(b.build()).unwrap());
//! let mut machine = Machine::new(compiled, 0);
//! machine.start();
//! machine.dispatch_event(press);
//! assert_eq!(machine.current_state_name(), "Pressed");
//! assert_eq!(*machine.context(), 1);
//! ```

pub mod builder;
pub mod lower;
pub mod model;
pub mod resolve;
pub mod runtime;
pub mod snapshot;
pub mod validate;

// Re-export commonly used types
pub use builder::{BranchSpec, BuildError, ModelBuilder, TransitionSpec};
pub use lower::{compile, CompileError, CompiledMachine, CompiledTable};
pub use model::{EventId, Model, StateId, DO_EVENT};
pub use runtime::{BitField, Machine};
pub use snapshot::{Snapshot, SnapshotError};
pub use validate::Diagnostic;
