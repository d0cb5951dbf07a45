//! Error types for design-graph operations.

use thiserror::Error;

use super::EntityId;

/// Errors raised by the design graph, the merge engine and connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// A keyed collection already holds an entry under this key.
    #[error("{kind} '{key}' already exists in {owner}")]
    AlreadyExists {
        kind: &'static str,
        key: String,
        owner: String,
    },

    /// Lookup, removal or address-map operation on an absent key.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A handle whose entity has been removed from the design.
    #[error("entity {0} is no longer part of the design")]
    StaleHandle(EntityId),

    /// An operation received the wrong concrete variant.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Two entities disagree on a field during a merge.
    #[error("merge conflict on {reference}: {field} differs ({ours} vs {theirs})")]
    MergeConflict {
        reference: String,
        field: &'static str,
        ours: String,
        theirs: String,
    },

    /// Connecting these signals would violate driver polarity.
    #[error("illegal connection between {from} and {to}: driver polarity mismatch")]
    WrongPolarity { from: String, to: String },

    /// Scalar ports carry exactly one signal.
    #[error("scalar port {port} already has a signal")]
    TooManySignals { port: String },

    /// A serialized reference that names no entity in the design.
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Explicitly unsupported operation.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl MetadataError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn type_mismatch(expected: &'static str, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.into(),
        }
    }

    pub fn conflict(
        reference: impl Into<String>,
        field: &'static str,
        ours: impl ToString,
        theirs: impl ToString,
    ) -> Self {
        Self::MergeConflict {
            reference: reference.into(),
            field,
            ours: ours.to_string(),
            theirs: theirs.to_string(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// True for merge conflicts, the dominant error of the merge engine.
    pub fn is_merge_conflict(&self) -> bool {
        matches!(self, Self::MergeConflict { .. })
    }
}
