//! Bus-level connections derived from signal wiring.

use indexmap::IndexMap;

use super::entity::EntityId;
use super::{Design, MetadataError};

/// Port-to-port edge synthesized from signal connections.
///
/// Never authored directly; every refresh discards and rebuilds them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusConnection {
    /// `"{src_ref}->{dst_ref}"`
    pub name: String,
    pub src_port: String,
    pub dst_port: String,
    pub(crate) src: EntityId,
    pub(crate) dst: EntityId,
}

impl BusConnection {
    pub fn src(&self) -> EntityId {
        self.src
    }

    pub fn dst(&self) -> EntityId {
        self.dst
    }
}

/// Key of the connection between two ports.
pub fn bus_key(src_ref: &str, dst_ref: &str) -> String {
    format!("{src_ref}->{dst_ref}")
}

/// Build the bus connections of `module` from scratch: one per
/// (source, destination) pair over the ports of its blocks and its own
/// boundary ports.
pub(crate) fn resolve_busses(
    design: &Design,
    module: EntityId,
) -> Result<IndexMap<String, BusConnection>, MetadataError> {
    let mut busses = IndexMap::new();
    let sources = design
        .blocks(module)
        .flat_map(|block| design.ports(block))
        .chain(design.ports(module));

    for src in sources {
        let src_ref = design.reference(src)?;
        for dst in design.destinations(src)? {
            let dst_ref = design.reference(dst)?;
            let name = bus_key(src_ref, dst_ref);
            busses.entry(name.clone()).or_insert_with(|| BusConnection {
                name,
                src_port: src_ref.to_string(),
                dst_port: dst_ref.to_string(),
                src,
                dst,
            });
        }
    }
    Ok(busses)
}
