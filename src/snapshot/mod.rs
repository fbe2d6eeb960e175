//! Instance snapshot and restore.
//!
//! A snapshot captures the mutable part of a running instance — the current
//! state id and the recorded history slots — by id. Ids are only meaningful
//! against the very table they were lowered from, so snapshots embed the
//! machine's name and state-name list as a fingerprint and restoration fails
//! if the model changed shape. The embedding context is not captured: it may
//! hold arbitrary user data and is supplied again on restore.

pub mod error;

pub use error::SnapshotError;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::lower::CompiledMachine;
use crate::model::StateId;
use crate::runtime::Machine;

/// Version identifier for the snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable capture of one instance's mutable state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot format version
    pub version: u32,

    /// Machine name the snapshot was taken from
    pub machine: String,

    /// State names in id order; restoration fingerprint
    pub states: Vec<String>,

    /// Whether the instance had been started
    pub started: bool,

    /// Current state id at capture time
    pub current: StateId,

    /// Recorded history slots, one per history pseudostate
    pub history: Vec<StateId>,
}

impl Snapshot {
    /// Capture an instance.
    pub fn capture<C>(machine: &Machine<C>) -> Self {
        let table = machine.table();
        Self {
            version: SNAPSHOT_VERSION,
            machine: table.machine.clone(),
            states: table.states.iter().map(|s| s.name.clone()).collect(),
            started: machine.is_started(),
            current: machine.current_state(),
            history: machine.history_slots().to_vec(),
        }
    }

    /// Rebuild an instance from this snapshot against a compiled machine.
    ///
    /// Fails when the snapshot format is newer than this build, the machine
    /// name or state layout differs, or a recorded id falls outside what the
    /// table allows (including history values outside the slot's legal
    /// restoration set).
    pub fn restore<C>(
        self,
        compiled: Arc<CompiledMachine<C>>,
        ctx: C,
    ) -> Result<Machine<C>, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }

        let table = compiled.table();
        let names: Vec<&str> = table.states.iter().map(|s| s.name.as_str()).collect();
        if self.machine != table.machine
            || self.states.len() != names.len()
            || self.states.iter().zip(&names).any(|(a, b)| a != b)
        {
            return Err(SnapshotError::MachineMismatch {
                snapshot: self.machine,
                machine: table.machine.clone(),
            });
        }

        if (self.current.0 as usize) >= table.state_count() {
            return Err(SnapshotError::IllegalValue { field: "current" });
        }
        if self.history.len() != table.history_slots.len() {
            return Err(SnapshotError::IllegalValue { field: "history" });
        }
        for (slot, recorded) in table.history_slots.iter().zip(&self.history) {
            if !slot.restorable.contains(recorded) {
                return Err(SnapshotError::IllegalValue { field: "history" });
            }
        }

        let mut machine = Machine::new(compiled, ctx);
        machine.restore_history_slots(self.history);
        if self.started {
            machine.restore_position(self.current);
        }
        Ok(machine)
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))
    }

    /// Encode as compact binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Decode from compact binary.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BranchSpec, ModelBuilder, TransitionSpec};
    use crate::compile;

    fn history_machine() -> Arc<CompiledMachine<()>> {
        let mut b = ModelBuilder::<()>::new("snap");
        let root = b.root();
        let p = b.state(root, "P");
        let x = b.state(p, "X");
        let y = b.state(p, "Y");
        let away = b.state(root, "Away");
        b.initial(root, p);
        b.initial(p, x);
        let h = b.shallow_history(p);
        b.history_default(h, x);
        let leave = b.event("LEAVE");
        let back = b.event("BACK");
        let flip = b.event("FLIP");
        b.transition(x, TransitionSpec::on(flip).to(y)).unwrap();
        b.transition(p, TransitionSpec::on(leave).to(away)).unwrap();
        b.transition(away, TransitionSpec::on(back).to_history(h)).unwrap();
        Arc::new(compile(b.build()).unwrap())
    }

    #[test]
    fn snapshot_round_trips_through_json_and_binary() {
        let compiled = history_machine();
        let mut machine = Machine::new(Arc::clone(&compiled), ());
        machine.start();
        machine.dispatch_event(crate::model::EventId(3)); // FLIP
        machine.dispatch_event(crate::model::EventId(1)); // LEAVE

        let snapshot = Snapshot::capture(&machine);
        let json = snapshot.to_json().unwrap();
        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
        let bytes = snapshot.to_bytes().unwrap();
        assert_eq!(Snapshot::from_bytes(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn restore_resumes_with_recorded_history() {
        let compiled = history_machine();
        let mut machine = Machine::new(Arc::clone(&compiled), ());
        machine.start();
        machine.dispatch_event(crate::model::EventId(3)); // FLIP -> Y
        machine.dispatch_event(crate::model::EventId(1)); // LEAVE -> Away

        let snapshot = Snapshot::capture(&machine);
        let mut revived = snapshot.restore(Arc::clone(&compiled), ()).unwrap();
        assert_eq!(revived.current_state_name(), "Away");

        revived.dispatch_event(crate::model::EventId(2)); // BACK via history
        assert_eq!(revived.current_state_name(), "Y");
    }

    #[test]
    fn capture_stays_restorable_after_choice_hop_bounces_off_a_composite() {
        // HOP enters P only as far as its choice point, whose sole branch
        // leaves again. The deep history slot must keep holding a legal
        // descendant, not P itself.
        let mut b = ModelBuilder::<()>::new("bounce");
        let root = b.root();
        let p = b.state(root, "P");
        let x = b.state(p, "X");
        let out = b.state(root, "Out");
        b.initial(root, out);
        b.initial(p, x);
        let h = b.deep_history(p);
        b.history_default(h, x);
        let c = b.choice(p);
        b.branch(c, BranchSpec::otherwise().to(out)).unwrap();
        let hop = b.event("HOP");
        b.transition(out, TransitionSpec::on(hop).to_choice(c)).unwrap();
        let compiled = Arc::new(compile(b.build()).unwrap());

        let mut machine = Machine::new(Arc::clone(&compiled), ());
        machine.start();
        machine.dispatch_event(crate::model::EventId(1)); // HOP
        assert_eq!(machine.current_state_name(), "Out");
        assert_eq!(machine.history_slots(), &[x]);

        let snapshot = Snapshot::capture(&machine);
        let revived = snapshot.restore(compiled, ()).unwrap();
        assert_eq!(revived.current_state_name(), "Out");
        assert_eq!(revived.history_slots(), &[x]);
    }

    #[test]
    fn restore_rejects_other_machines() {
        let compiled = history_machine();
        let mut machine = Machine::new(Arc::clone(&compiled), ());
        machine.start();
        let mut snapshot = Snapshot::capture(&machine);
        snapshot.machine = "somebody-else".to_string();

        let err = snapshot.restore(compiled, ()).unwrap_err();
        assert!(matches!(err, SnapshotError::MachineMismatch { .. }));
    }

    #[test]
    fn restore_rejects_future_versions() {
        let compiled = history_machine();
        let machine = Machine::new(Arc::clone(&compiled), ());
        let mut snapshot = Snapshot::capture(&machine);
        snapshot.version = SNAPSHOT_VERSION + 1;

        let err = snapshot.restore(compiled, ()).unwrap_err();
        assert!(matches!(err, SnapshotError::UnsupportedVersion { .. }));
    }

    #[test]
    fn restore_rejects_illegal_history_values() {
        let compiled = history_machine();
        let machine = Machine::new(Arc::clone(&compiled), ());
        let mut snapshot = Snapshot::capture(&machine);
        // Away is not a child of P, so a shallow slot may never hold it.
        snapshot.history[0] = StateId(4);

        let err = snapshot.restore(compiled, ()).unwrap_err();
        assert_eq!(err, SnapshotError::IllegalValue { field: "history" });
    }
}
