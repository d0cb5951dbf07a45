//! Design interchange formats.
//!
//! - **HWH** - Vivado hardware handoff XML (read-only)
//! - **JSON** - recursive snapshot of a design (read and write)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐                          ┌──────────────┐
//! │   HWH File   │                          │  JSON File   │
//! └──────┬───────┘                          └──────┬───────┘
//!        │                                         │
//!        ▼                                         ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                   DesignFormat trait                      │
//! │  - read(&[u8]) -> Result<Design>                         │
//! │  - write(&Design) -> Result<Vec<u8>>                     │
//! └──────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                Design (refreshed arena)                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use hwmeta::interchange::{DesignFormat, Hwh, JsonSnapshot};
//!
//! let design = Hwh::default().read(&std::fs::read("overlay.hwh")?)?;
//! let json = JsonSnapshot.write(&design)?;
//! ```

mod error;
mod format;
pub mod host;
mod hwh;
mod json;

pub use error::InterchangeError;
pub use format::{DesignFormat, FormatCapability};
pub use host::DesignHost;
pub use hwh::{Hwh, HwhOptions};
pub use json::{JsonSnapshot, decode as decode_json, encode as encode_json};

/// Detect format from file extension.
pub fn detect_format(path: &std::path::Path) -> Option<Box<dyn DesignFormat>> {
    let ext = path.extension()?.to_str()?;
    match ext.to_lowercase().as_str() {
        "hwh" => Some(Box::new(Hwh::default())),
        "json" => Some(Box::new(JsonSnapshot)),
        _ => None,
    }
}
