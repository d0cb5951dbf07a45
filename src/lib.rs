//! # hwmeta-base
//!
//! Metadata model for FPGA hardware designs: cores, ports, signals,
//! registers and address maps, loaded from Vivado hardware handoff files
//! and exchanged as JSON snapshots.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! interchange → HWH reader, JSON snapshot codec, DesignHost
//!   ↓
//! model       → Entity arena, lookup, connectivity, merge, hierarchy
//!   ↓
//! base        → Primitives (Vlnv, reference paths)
//! ```

// ============================================================================
// MODULES (dependency order: base → model → interchange)
// ============================================================================

/// Foundation types: Vlnv, reference-path segments
pub mod base;

/// Design model: entity arena and everything derived from it
pub mod model;

/// Design interchange formats: HWH, JSON
#[cfg(feature = "interchange")]
pub mod interchange;

// Re-export foundation types
pub use base::{Vlnv, VlnvParseError};

// Re-export the model surface
pub use model::{
    Design, Entity, EntityData, EntityId, EntityKind, GenericType, MergeOptions, MetadataError,
};
