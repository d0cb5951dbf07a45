//! Type discriminators.
//!
//! Every entity carries a generic type (used in path segments) and a
//! concrete type discriminator (used by the snapshot codec). The
//! [`REGISTRY`] table maps discriminator strings to [`EntityKind`]s;
//! [`EntityKind::resolve`] adds the documented fallbacks for unknown
//! `core-*` and `port-*` strings.

use std::fmt;

/// Category tag that appears in reference-path segments (`name[tag]`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenericType {
    Block,
    Port,
    Signal,
    Parameter,
    Register,
    BitField,
}

impl GenericType {
    pub fn as_str(self) -> &'static str {
        match self {
            GenericType::Block => "block",
            GenericType::Port => "port",
            GenericType::Signal => "signal",
            GenericType::Parameter => "parameter",
            GenericType::Register => "register",
            GenericType::BitField => "bitfield",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "block" => Some(GenericType::Block),
            "port" => Some(GenericType::Port),
            "signal" => Some(GenericType::Signal),
            "parameter" => Some(GenericType::Parameter),
            "register" => Some(GenericType::Register),
            "bitfield" => Some(GenericType::BitField),
            _ => None,
        }
    }
}

impl fmt::Display for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing-system board family.
///
/// Families differ only in parameter naming and interrupt pin layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PsFamily {
    Generic,
    /// Zynq-7000 (`processing_system7`)
    Zynq,
    /// Zynq UltraScale+ (`zynq_ultra_ps_e`)
    ZynqUltrascale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoreVariant {
    Ip,
    ProcessingSystem(PsFamily),
    /// Placeholder for a reconfigurable region, filled in by a merge.
    Reconfigurable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortClass {
    Generic,
    Manager,
    Subordinate,
    Stream,
    Scalar,
    Clock,
    Reset,
}

/// Concrete entity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Module,
    Core(CoreVariant),
    Port(PortClass),
    Signal,
    Parameter,
    Register,
    BitField,
}

/// Discriminator string → kind, one row per concrete type.
pub const REGISTRY: &[(&str, EntityKind)] = &[
    ("module", EntityKind::Module),
    ("core-ip", EntityKind::Core(CoreVariant::Ip)),
    (
        "core-procsys",
        EntityKind::Core(CoreVariant::ProcessingSystem(PsFamily::Generic)),
    ),
    (
        "core-zynq_arm",
        EntityKind::Core(CoreVariant::ProcessingSystem(PsFamily::Zynq)),
    ),
    (
        "core-zynq_aarch64",
        EntityKind::Core(CoreVariant::ProcessingSystem(PsFamily::ZynqUltrascale)),
    ),
    ("core-dfx", EntityKind::Core(CoreVariant::Reconfigurable)),
    ("port", EntityKind::Port(PortClass::Generic)),
    ("port-manager", EntityKind::Port(PortClass::Manager)),
    ("port-subordinate", EntityKind::Port(PortClass::Subordinate)),
    ("port-stream", EntityKind::Port(PortClass::Stream)),
    ("port-scalar", EntityKind::Port(PortClass::Scalar)),
    ("port-clk", EntityKind::Port(PortClass::Clock)),
    ("port-rst", EntityKind::Port(PortClass::Reset)),
    ("signal", EntityKind::Signal),
    ("parameter", EntityKind::Parameter),
    ("register", EntityKind::Register),
    ("bitfield", EntityKind::BitField),
];

impl EntityKind {
    /// Exact registry lookup.
    pub fn from_type_name(name: &str) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|(type_name, _)| *type_name == name)
            .map(|(_, kind)| *kind)
    }

    /// Registry lookup with fallbacks: unknown `core*` strings become
    /// generic IP cores, unknown `port*` strings generic ports.
    pub fn resolve(name: &str) -> Option<Self> {
        Self::from_type_name(name).or_else(|| {
            if name.starts_with("core") {
                Some(EntityKind::Core(CoreVariant::Ip))
            } else if name.starts_with("port") {
                Some(EntityKind::Port(PortClass::Generic))
            } else {
                None
            }
        })
    }

    pub fn type_name(self) -> &'static str {
        match self {
            EntityKind::Module => "module",
            EntityKind::Core(CoreVariant::Ip) => "core-ip",
            EntityKind::Core(CoreVariant::ProcessingSystem(PsFamily::Generic)) => "core-procsys",
            EntityKind::Core(CoreVariant::ProcessingSystem(PsFamily::Zynq)) => "core-zynq_arm",
            EntityKind::Core(CoreVariant::ProcessingSystem(PsFamily::ZynqUltrascale)) => {
                "core-zynq_aarch64"
            }
            EntityKind::Core(CoreVariant::Reconfigurable) => "core-dfx",
            EntityKind::Port(PortClass::Generic) => "port",
            EntityKind::Port(PortClass::Manager) => "port-manager",
            EntityKind::Port(PortClass::Subordinate) => "port-subordinate",
            EntityKind::Port(PortClass::Stream) => "port-stream",
            EntityKind::Port(PortClass::Scalar) => "port-scalar",
            EntityKind::Port(PortClass::Clock) => "port-clk",
            EntityKind::Port(PortClass::Reset) => "port-rst",
            EntityKind::Signal => "signal",
            EntityKind::Parameter => "parameter",
            EntityKind::Register => "register",
            EntityKind::BitField => "bitfield",
        }
    }

    pub fn generic_type(self) -> GenericType {
        match self {
            EntityKind::Module | EntityKind::Core(_) => GenericType::Block,
            EntityKind::Port(_) => GenericType::Port,
            EntityKind::Signal => GenericType::Signal,
            EntityKind::Parameter => GenericType::Parameter,
            EntityKind::Register => GenericType::Register,
            EntityKind::BitField => GenericType::BitField,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
