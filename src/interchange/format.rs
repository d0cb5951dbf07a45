//! Common trait for design interchange formats.

use super::InterchangeError;
use crate::model::Design;

/// Capabilities supported by a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatCapability {
    /// Can read/import designs.
    pub read: bool,
    /// Can write/export designs.
    pub write: bool,
    /// Preserves every non-derived field.
    pub lossless: bool,
}

impl FormatCapability {
    /// Full capability (read, write, lossless).
    pub const FULL: Self = Self {
        read: true,
        write: true,
        lossless: true,
    };

    /// Read-only capability.
    pub const READ_ONLY: Self = Self {
        read: true,
        write: false,
        lossless: true,
    };
}

/// Trait for design interchange formats.
///
/// Implementations convert between raw bytes and a refreshed [`Design`].
pub trait DesignFormat: Send + Sync {
    /// Human-readable name of the format.
    fn name(&self) -> &'static str;

    /// File extension(s) for this format.
    fn extensions(&self) -> &'static [&'static str];

    /// MIME type for this format.
    fn mime_type(&self) -> &'static str;

    fn capabilities(&self) -> FormatCapability;

    /// Read a design from bytes. The returned design has been refreshed.
    fn read(&self, input: &[u8]) -> Result<Design, InterchangeError>;

    /// Write a design to bytes.
    fn write(&self, design: &Design) -> Result<Vec<u8>, InterchangeError>;

    /// Cheap well-formedness check that does not build the design.
    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let _ = input;
        Ok(())
    }
}
