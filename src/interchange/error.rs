//! Error types for interchange operations.

use thiserror::Error;

use crate::model::MetadataError;

/// Errors that can occur while reading or writing a design.
#[derive(Debug, Error)]
pub enum InterchangeError {
    /// XML parsing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing required element or attribute.
    #[error("Missing required {kind}: {name}")]
    Missing { kind: &'static str, name: String },

    /// Invalid element, attribute or field value.
    #[error("Invalid {kind}: {message}")]
    Invalid { kind: &'static str, message: String },

    /// Reference to a pin, port or instance that does not exist.
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Unsupported feature or format variant.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Structural error raised by the design graph while building.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

impl InterchangeError {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Create a JSON error.
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json(message.into())
    }

    /// Create a missing element error.
    pub fn missing_element(name: impl Into<String>) -> Self {
        Self::Missing {
            kind: "element",
            name: name.into(),
        }
    }

    /// Create a missing attribute error.
    pub fn missing_attribute(name: impl Into<String>) -> Self {
        Self::Missing {
            kind: "attribute",
            name: name.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::Missing {
            kind: "field",
            name: name.into(),
        }
    }

    /// Create an invalid attribute error.
    pub fn invalid_attribute(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "attribute",
            message: message.into(),
        }
    }

    /// Create an invalid field error.
    pub fn invalid_field(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "field",
            message: message.into(),
        }
    }

    pub fn unresolved(reference: impl Into<String>) -> Self {
        Self::UnresolvedReference(reference.into())
    }
}
