//! Entity records stored in the design arena.
//!
//! Every node of the design graph is an [`Entity`]: a common record (name,
//! owner, keyed children, reference path, extensions, modification tick)
//! wrapping a tagged [`EntityData`] payload. Shared fields live in the
//! common record; variant behaviour dispatches on the payload tag.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use super::connectivity::BusConnection;
use super::extension::{Extension, Extensions};
use super::hierarchy::Hierarchy;
use super::kind::{CoreVariant, EntityKind, GenericType, PortClass};
use super::port::AddressMap;
use crate::base::{Vlnv, child_key};

/// Stable handle to an entity inside a [`Design`](super::Design).
///
/// Handles are never reused; a handle to a removed entity stays stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the design graph.
#[derive(Clone, Debug)]
pub struct Entity {
    name: String,
    data: EntityData,
    pub(crate) owner: Option<EntityId>,
    pub(crate) children: IndexMap<String, EntityId>,
    pub(crate) reference: String,
    pub(crate) ext: Extensions,
    pub(crate) modified: u64,
}

impl Entity {
    pub fn new(name: impl Into<String>, data: EntityData) -> Self {
        let name = name.into();
        Self {
            reference: name.clone(),
            name,
            data,
            owner: None,
            children: IndexMap::new(),
            ext: Extensions::new(),
            modified: 0,
        }
    }

    pub fn with_ext(mut self, tag: impl Into<String>, ext: Extension) -> Self {
        self.ext.insert(tag.into(), ext);
        self
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &EntityData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut EntityData {
        &mut self.data
    }

    pub fn kind(&self) -> EntityKind {
        self.data.kind()
    }

    /// Concrete type discriminator, e.g. `port-manager`.
    pub fn type_name(&self) -> &'static str {
        self.data.kind().type_name()
    }

    pub fn generic_type(&self) -> GenericType {
        self.data.kind().generic_type()
    }

    /// Key under which this entity sits in its owner's children.
    pub fn key(&self) -> String {
        child_key(&self.name, self.generic_type().as_str())
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// Full reference path from the design root.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, EntityId)> {
        self.children.iter().map(|(k, id)| (k.as_str(), *id))
    }

    pub fn ext(&self) -> &Extensions {
        &self.ext
    }

    /// Logical tick of the last mutation of this entity or a descendant.
    pub fn modified(&self) -> u64 {
        self.modified
    }
}

/// Variant payload of an entity.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityData {
    Block(BlockData),
    Port(PortData),
    Signal(SignalData),
    Parameter(ParameterData),
    Register(RegisterData),
    BitField(BitFieldData),
}

impl EntityData {
    /// Default payload for a discriminator.
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Module => Self::module(),
            EntityKind::Core(variant) => Self::core(variant, Vlnv::default()),
            EntityKind::Port(class) => Self::port(PortKind::for_class(class)),
            EntityKind::Signal => Self::signal(1, false),
            EntityKind::Parameter => Self::Parameter(ParameterData::default()),
            EntityKind::Register => Self::Register(RegisterData::default()),
            EntityKind::BitField => Self::BitField(BitFieldData::default()),
        }
    }

    pub fn module() -> Self {
        Self::Block(BlockData {
            hierarchy_name: None,
            kind: BlockKind::Module(ModuleData::default()),
        })
    }

    pub fn core(variant: CoreVariant, vlnv: Vlnv) -> Self {
        Self::Block(BlockData {
            hierarchy_name: None,
            kind: BlockKind::Core(CoreData {
                variant,
                vlnv,
                monitor: false,
            }),
        })
    }

    pub fn port(kind: PortKind) -> Self {
        Self::Port(PortData {
            kind,
            vlnv: None,
            external: false,
        })
    }

    pub fn signal(width: u32, driver: bool) -> Self {
        Self::Signal(SignalData::new(width, driver))
    }

    pub fn parameter(value: Option<String>) -> Self {
        Self::Parameter(ParameterData { value })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityData::Block(block) => match &block.kind {
                BlockKind::Core(core) => EntityKind::Core(core.variant),
                BlockKind::Module(_) => EntityKind::Module,
            },
            EntityData::Port(port) => EntityKind::Port(port.kind.class()),
            EntityData::Signal(_) => EntityKind::Signal,
            EntityData::Parameter(_) => EntityKind::Parameter,
            EntityData::Register(_) => EntityKind::Register,
            EntityData::BitField(_) => EntityKind::BitField,
        }
    }

    pub fn generic_type(&self) -> GenericType {
        self.kind().generic_type()
    }

    // ── Builders ────────────────────────────────────────────────────

    pub fn with_hierarchy(mut self, path: impl Into<String>) -> Self {
        if let EntityData::Block(block) = &mut self {
            block.hierarchy_name = Some(path.into());
        }
        self
    }

    pub fn with_vlnv(mut self, vlnv: Vlnv) -> Self {
        match &mut self {
            EntityData::Port(port) => port.vlnv = Some(vlnv),
            EntityData::Block(BlockData {
                kind: BlockKind::Core(core),
                ..
            }) => core.vlnv = vlnv,
            _ => {}
        }
        self
    }

    /// Marks a port or signal as crossing the design boundary.
    pub fn external(mut self) -> Self {
        match &mut self {
            EntityData::Port(port) => port.external = true,
            EntityData::Signal(signal) => signal.external = true,
            _ => {}
        }
        self
    }

    // ── Variant views ───────────────────────────────────────────────

    pub fn as_block(&self) -> Option<&BlockData> {
        match self {
            EntityData::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_core(&self) -> Option<&CoreData> {
        match self {
            EntityData::Block(BlockData {
                kind: BlockKind::Core(core),
                ..
            }) => Some(core),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleData> {
        match self {
            EntityData::Block(BlockData {
                kind: BlockKind::Module(module),
                ..
            }) => Some(module),
            _ => None,
        }
    }

    pub(crate) fn as_module_mut(&mut self) -> Option<&mut ModuleData> {
        match self {
            EntityData::Block(BlockData {
                kind: BlockKind::Module(module),
                ..
            }) => Some(module),
            _ => None,
        }
    }

    pub fn as_port(&self) -> Option<&PortData> {
        match self {
            EntityData::Port(port) => Some(port),
            _ => None,
        }
    }

    pub(crate) fn as_port_mut(&mut self) -> Option<&mut PortData> {
        match self {
            EntityData::Port(port) => Some(port),
            _ => None,
        }
    }

    pub fn as_signal(&self) -> Option<&SignalData> {
        match self {
            EntityData::Signal(signal) => Some(signal),
            _ => None,
        }
    }

    pub(crate) fn as_signal_mut(&mut self) -> Option<&mut SignalData> {
        match self {
            EntityData::Signal(signal) => Some(signal),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterData> {
        match self {
            EntityData::Parameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    pub fn as_register(&self) -> Option<&RegisterData> {
        match self {
            EntityData::Register(register) => Some(register),
            _ => None,
        }
    }

    pub fn as_bitfield(&self) -> Option<&BitFieldData> {
        match self {
            EntityData::BitField(field) => Some(field),
            _ => None,
        }
    }
}

// ============================================================================
// BLOCKS
// ============================================================================

/// Shared record of cores and modules.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockData {
    /// Slash-delimited design-tool hierarchy path.
    pub hierarchy_name: Option<String>,
    pub kind: BlockKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BlockKind {
    Core(CoreData),
    Module(ModuleData),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoreData {
    pub variant: CoreVariant,
    pub vlnv: Vlnv,
    /// Monitor cores (ILAs and the like) tap nets without driving them.
    pub monitor: bool,
}

/// Derived state of a module, rebuilt on every refresh.
#[derive(Clone, Debug, Default)]
pub struct ModuleData {
    pub(crate) busses: IndexMap<String, BusConnection>,
    pub(crate) hierarchy: Option<Hierarchy>,
}

impl ModuleData {
    pub fn busses(&self) -> &IndexMap<String, BusConnection> {
        &self.busses
    }

    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref()
    }
}

// Everything in ModuleData is regenerated, so it never distinguishes two modules.
impl PartialEq for ModuleData {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

// ============================================================================
// PORTS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct PortData {
    pub kind: PortKind,
    pub vlnv: Option<Vlnv>,
    /// Port crosses the design boundary.
    pub external: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PortKind {
    Generic,
    Manager(AddressMap),
    Subordinate(AddressWindow),
    Stream { driver: bool },
    Scalar(ScalarPort),
    Clock(ScalarPort),
    Reset(ScalarPort),
}

impl PortKind {
    pub fn for_class(class: PortClass) -> Self {
        match class {
            PortClass::Generic => PortKind::Generic,
            PortClass::Manager => PortKind::Manager(AddressMap::default()),
            PortClass::Subordinate => PortKind::Subordinate(AddressWindow::default()),
            PortClass::Stream => PortKind::Stream { driver: false },
            PortClass::Scalar => PortKind::Scalar(ScalarPort::default()),
            PortClass::Clock => PortKind::Clock(ScalarPort::default()),
            PortClass::Reset => PortKind::Reset(ScalarPort::default()),
        }
    }

    pub fn class(&self) -> PortClass {
        match self {
            PortKind::Generic => PortClass::Generic,
            PortKind::Manager(_) => PortClass::Manager,
            PortKind::Subordinate(_) => PortClass::Subordinate,
            PortKind::Stream { .. } => PortClass::Stream,
            PortKind::Scalar(_) => PortClass::Scalar,
            PortKind::Clock(_) => PortClass::Clock,
            PortKind::Reset(_) => PortClass::Reset,
        }
    }

    pub fn manager() -> Self {
        PortKind::Manager(AddressMap::default())
    }

    pub fn subordinate(base_address: u64, range: u64) -> Self {
        PortKind::Subordinate(AddressWindow {
            base_address,
            range,
        })
    }

    pub fn stream(driver: bool) -> Self {
        PortKind::Stream { driver }
    }

    pub fn scalar(width: u32, driver: bool) -> Self {
        PortKind::Scalar(ScalarPort { width, driver })
    }

    /// Scalar, clock and reset ports hold a single signal.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            PortKind::Scalar(_) | PortKind::Clock(_) | PortKind::Reset(_)
        )
    }

    /// Driver flag of stream and scalar ports.
    pub fn driver(&self) -> Option<bool> {
        match self {
            PortKind::Stream { driver } => Some(*driver),
            PortKind::Scalar(s) | PortKind::Clock(s) | PortKind::Reset(s) => Some(s.driver),
            _ => None,
        }
    }
}

/// Base address and size of a subordinate port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddressWindow {
    pub base_address: u64,
    pub range: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalarPort {
    pub width: u32,
    pub driver: bool,
}

impl Default for ScalarPort {
    fn default() -> Self {
        Self {
            width: 1,
            driver: false,
        }
    }
}

// ============================================================================
// SIGNALS, PARAMETERS, REGISTERS
// ============================================================================

/// Wire-level net segment owned by a port.
///
/// Connections are stored as `reference → live handle`; the handle is
/// `None` only between decoding and the next relink, so the serializable
/// and live views always have the same cardinality.
#[derive(Clone, Debug)]
pub struct SignalData {
    pub width: u32,
    pub driver: bool,
    pub external: bool,
    pub(crate) connections: IndexMap<String, Option<EntityId>>,
}

impl SignalData {
    pub fn new(width: u32, driver: bool) -> Self {
        Self {
            width,
            driver,
            external: false,
            connections: IndexMap::new(),
        }
    }

    /// Connection references as of the last relink.
    pub fn con_refs(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    pub fn is_linked_to(&self, other: EntityId) -> bool {
        self.connections.values().any(|link| *link == Some(other))
    }

    /// Records a connection by reference only; resolved on the next refresh.
    pub(crate) fn add_con_ref(&mut self, reference: impl Into<String>) {
        self.connections.entry(reference.into()).or_insert(None);
    }
}

impl PartialEq for SignalData {
    fn eq(&self, other: &Self) -> bool {
        let ours: FxHashSet<&str> = self.con_refs().collect();
        let theirs: FxHashSet<&str> = other.con_refs().collect();
        self.width == other.width
            && self.driver == other.driver
            && self.external == other.external
            && ours == theirs
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterData {
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterData {
    pub description: String,
    pub access: String,
    pub offset: u64,
    pub width: u32,
    pub enabled: bool,
}

impl Default for RegisterData {
    fn default() -> Self {
        Self {
            description: "A register".to_string(),
            access: "read-write".to_string(),
            offset: 0,
            width: 32,
            enabled: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitFieldData {
    pub lsb: u32,
    pub msb: u32,
    pub description: String,
    pub access: String,
}

impl Default for BitFieldData {
    fn default() -> Self {
        Self {
            lsb: 0,
            msb: 0,
            description: "A field in the register".to_string(),
            access: "read-write".to_string(),
        }
    }
}
