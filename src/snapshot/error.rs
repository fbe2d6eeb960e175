//! Snapshot error types.

use thiserror::Error;

/// Errors that can occur while saving or restoring an instance snapshot.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SnapshotError {
    /// Encoding to JSON or binary format failed
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    /// Decoding from JSON or binary format failed
    #[error("deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Snapshot format version is not supported by this build
    #[error("unsupported snapshot version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The snapshot was taken from a different machine or a structurally
    /// changed model, so its ids are meaningless here
    #[error("snapshot of `{snapshot}` does not match machine `{machine}`")]
    MachineMismatch { snapshot: String, machine: String },

    /// A recorded value is outside what the target machine allows
    #[error("snapshot field `{field}` holds an illegal value")]
    IllegalValue { field: &'static str },
}
