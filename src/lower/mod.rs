//! Compilation pipeline: validate, resolve, lower.
//!
//! The pipeline is a pure function over an owned model. Compilation fails
//! closed: if validation reports diagnostics, no table is produced.

mod balanced;
mod tables;

pub use tables::{CompiledTable, HandlerSlot, HistorySlot, StateRow};

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::model::Model;
use crate::resolve::resolve;
use crate::validate::{validate, Diagnostic};

/// Compilation failure: the full set of diagnostics found in the model.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("compilation of `{name}` failed with {} diagnostic(s)", .diagnostics.len())]
pub struct CompileError {
    pub name: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// A compiled machine: the annotated model (which owns the behavior
/// closures) plus the immutable dispatch table.
///
/// Instances are created from this via
/// [`Machine::new`](crate::runtime::Machine::new); the compiled machine
/// itself is immutable and can back any number of instances.
pub struct CompiledMachine<C> {
    pub(crate) model: Model<C>,
    pub(crate) table: CompiledTable,
}

impl<C> CompiledMachine<C> {
    pub fn name(&self) -> &str {
        &self.table.machine
    }

    pub fn table(&self) -> &CompiledTable {
        &self.table
    }

    pub fn model(&self) -> &Model<C> {
        &self.model
    }
}

// The model holds behavior closures, so Debug is implemented by hand over
// the table summary.
impl<C> fmt::Debug for CompiledMachine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledMachine")
            .field("name", &self.table.machine)
            .field("states", &self.table.state_count())
            .field("events", &self.table.event_count())
            .finish_non_exhaustive()
    }
}

/// Compile a model: validate it, annotate pseudostates, and lower it to a
/// dispatch table.
///
/// # Example
///
/// ```
/// use strata::builder::{ModelBuilder, TransitionSpec};
///
/// let mut b = ModelBuilder::<()>::new("two-state");
/// let root = b.root();
/// let a = b.state(root, "A");
/// let z = b.state(root, "Z");
/// b.initial(root, a);
/// let go = b.event("GO");
/// b.transition(a, TransitionSpec::on(go).to(z)).unwrap();
///
/// let machine = strata::compile(b.build()).unwrap();
/// assert_eq!(machine.table().state_count(), 3); // ROOT, A, Z
/// ```
pub fn compile<C>(mut model: Model<C>) -> Result<CompiledMachine<C>, CompileError> {
    validate(&model).map_err(|diagnostics| CompileError {
        name: model.name().to_string(),
        diagnostics,
    })?;
    resolve(&mut model);
    let table = balanced::lower(&model);
    debug!(machine = model.name(), "compilation succeeded");
    Ok(CompiledMachine { model, table })
}
