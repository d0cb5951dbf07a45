//! Typed design graph.
//!
//! This module holds the in-memory model of one hardware design:
//!
//! - **Entities** - modules, cores, ports, signals, parameters, registers
//!   and bit fields, stored in a handle-addressed arena ([`Design`])
//! - **Connectivity** - symmetric signal links and the bus-level
//!   connections derived from them ([`BusConnection`])
//! - **Address maps** - manager port → subordinate port windows
//! - **Hierarchy** - the design tool's grouping of cores ([`Hierarchy`])
//! - **Merge** - conflict-checked union of two designs ([`MergeOptions`])
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Design (arena)                        │
//! │  slots: Vec<Option<Entity>>   root: EntityId             │
//! └───────────┬──────────────────────────────┬───────────────┘
//!             │ insert / attach / remove     │ refresh()
//!             ▼                              ▼
//! ┌──────────────────────┐      ┌──────────────────────────────┐
//! │ Entity               │      │ 1. recompute reference paths │
//! │  name, owner, ref    │      │ 2. relink signals + addrmaps │
//! │  children (keyed)    │      │ 3. rebuild busses            │
//! │  data: EntityData    │      │ 4. rebuild hierarchies       │
//! └──────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! Derived state (bus connections, hierarchies) is rebuilt by
//! [`Design::refresh`] and never edited directly.

mod block;
mod connectivity;
mod design;
mod entity;
mod error;
mod extension;
mod hierarchy;
mod kind;
mod merge;
mod port;
mod signal;

pub use connectivity::{BusConnection, bus_key};
pub use design::Design;
pub use entity::{
    AddressWindow, BitFieldData, BlockData, BlockKind, CoreData, Entity, EntityData, EntityId,
    ModuleData, ParameterData, PortData, PortKind, RegisterData, ScalarPort, SignalData,
};
pub use error::MetadataError;
pub use extension::{BLOCK_DESIGN_TAG, Extension, Extensions};
pub use hierarchy::Hierarchy;
pub use kind::{CoreVariant, EntityKind, GenericType, PortClass, PsFamily, REGISTRY};
pub use merge::MergeOptions;
pub use port::{AddressMap, AddressMapEntry, MemoryType};
