//! Foundation types for the hwmeta library.
//!
//! - [`Vlnv`] - vendor:library:name:version identity tags
//! - [`path`] - reference-path segments and case-insensitive key candidates
//!
//! This module has NO dependencies on other hwmeta modules.

pub mod path;
mod vlnv;

pub use path::{PATH_SEPARATOR, child_key, split_path};
pub use vlnv::{Vlnv, VlnvParseError};
