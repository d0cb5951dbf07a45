//! Ergonomic entry point for loading, querying and exporting a [`Design`].
//!
//! ```ignore
//! use hwmeta::interchange::DesignHost;
//!
//! let host = DesignHost::from_file(Path::new("overlay.hwh"))?;
//! let dma = host.design().lookup("dma0[block]")?;
//! std::fs::write("overlay.json", host.to_json()?)?;
//! ```

use std::path::Path;

use tracing::debug;

use super::format::DesignFormat;
use super::{Hwh, HwhOptions, InterchangeError, JsonSnapshot};
use crate::model::{Design, EntityId, MergeOptions};

/// Owns one refreshed [`Design`].
pub struct DesignHost {
    design: Design,
}

impl DesignHost {
    // ── Construction ─────────────────────────────────────────────────

    /// Build from HWH text with default reader options.
    pub fn from_hwh_str(xml: &str) -> Result<Self, InterchangeError> {
        Self::from_format(&Hwh::default(), xml.as_bytes())
    }

    /// Build from HWH text with explicit reader options.
    pub fn from_hwh_str_with(xml: &str, options: HwhOptions) -> Result<Self, InterchangeError> {
        Self::from_format(&Hwh::with_options(options), xml.as_bytes())
    }

    /// Build from a JSON snapshot.
    pub fn from_json_str(json: &str) -> Result<Self, InterchangeError> {
        Self::from_format(&JsonSnapshot, json.as_bytes())
    }

    /// Build from any supported format.
    pub fn from_format(fmt: &dyn DesignFormat, bytes: &[u8]) -> Result<Self, InterchangeError> {
        let design = fmt.read(bytes)?;
        debug!(format = fmt.name(), design = design.name(), "loaded design");
        Ok(Self { design })
    }

    /// Build from a file path; the format is chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self, InterchangeError> {
        let fmt = super::detect_format(path).ok_or_else(|| {
            InterchangeError::Unsupported(format!(
                "no reader for '{}'",
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("?")
            ))
        })?;
        let bytes = std::fs::read(path)?;
        Self::from_format(fmt.as_ref(), &bytes)
    }

    /// Wrap an already-built design.
    pub fn from_design(design: Design) -> Self {
        Self { design }
    }

    // ── Access ───────────────────────────────────────────────────────

    pub fn design(&self) -> &Design {
        &self.design
    }

    pub fn design_mut(&mut self) -> &mut Design {
        &mut self.design
    }

    pub fn into_design(self) -> Design {
        self.design
    }

    /// The root module.
    pub fn root(&self) -> EntityId {
        self.design.root()
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Merge another host's design into this one.
    pub fn merge(&mut self, other: DesignHost, options: MergeOptions) -> Result<(), InterchangeError> {
        self.design.merge(other.design, options)?;
        Ok(())
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Export as a pretty-printed JSON snapshot.
    pub fn to_json(&self) -> Result<String, InterchangeError> {
        let bytes = JsonSnapshot.write(&self.design)?;
        String::from_utf8(bytes).map_err(|e| InterchangeError::json(format!("Invalid UTF-8: {e}")))
    }

    /// Export to a file; the format is chosen by extension.
    pub fn write_file(&self, path: &Path) -> Result<(), InterchangeError> {
        let fmt = super::detect_format(path)
            .filter(|f| f.capabilities().write)
            .ok_or_else(|| {
                InterchangeError::Unsupported(format!("no writer for '{}'", path.display()))
            })?;
        std::fs::write(path, fmt.write(&self.design)?)?;
        Ok(())
    }
}

impl std::fmt::Debug for DesignHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignHost")
            .field("name", &self.design.name())
            .field("entities", &self.design.len())
            .field("modules", &self.design.modules().len())
            .finish()
    }
}
