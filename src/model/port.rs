//! Port queries and manager address maps.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use super::entity::{AddressWindow, EntityId, PortData, PortKind};
use super::{Design, MetadataError};

/// Classification of an address-map target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemoryType {
    Register,
    Memory,
}

impl MemoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryType::Register => "register",
            MemoryType::Memory => "memory",
        }
    }

    /// Case-insensitive parse; vendor files write `REGISTER`/`MEMORY`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("register") {
            Some(MemoryType::Register)
        } else if s.eq_ignore_ascii_case("memory") {
            Some(MemoryType::Memory)
        } else {
            None
        }
    }
}

/// Subordinate ports reachable from a manager port.
///
/// Keyed by the subordinate port's reference. Each entry carries both the
/// serializable record and the live handle so the two cannot drift apart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AddressMap {
    pub(crate) entries: IndexMap<String, AddressMapEntry>,
}

impl AddressMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(subordinate reference, entry)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AddressMapEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, subordinate_ref: &str) -> Option<&AddressMapEntry> {
        self.entries.get(subordinate_ref)
    }

    /// Records an entry by reference only; resolved on the next refresh.
    pub(crate) fn insert_unlinked(&mut self, subordinate_ref: String, entry: AddressMapEntry) {
        self.entries.insert(subordinate_ref, entry);
    }
}

#[derive(Clone, Debug)]
pub struct AddressMapEntry {
    /// Address block of the subordinate this entry came from.
    pub block: String,
    pub memtype: MemoryType,
    pub(crate) link: Option<EntityId>,
}

impl AddressMapEntry {
    pub fn new(block: impl Into<String>, memtype: MemoryType) -> Self {
        Self {
            block: block.into(),
            memtype,
            link: None,
        }
    }

    /// Live handle of the subordinate port.
    pub fn subordinate(&self) -> Option<EntityId> {
        self.link
    }
}

impl PartialEq for AddressMapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.block == other.block && self.memtype == other.memtype
    }
}

impl Design {
    pub(crate) fn port(&self, id: EntityId) -> Result<&PortData, MetadataError> {
        let entity = self.entity(id)?;
        entity
            .data()
            .as_port()
            .ok_or_else(|| MetadataError::type_mismatch("port", entity.type_name()))
    }

    /// Ports reached through any of this port's signals, one per peer port.
    pub fn destinations(&self, port: EntityId) -> Result<Vec<EntityId>, MetadataError> {
        self.port(port)?;
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for signal in self.signals(port) {
            for peer in self.connections(signal)? {
                let Some(peer_port) = self.get(peer).and_then(|e| e.owner()) else {
                    continue;
                };
                if peer_port != port && seen.insert(peer_port) {
                    out.push(peer_port);
                }
            }
        }
        Ok(out)
    }

    /// The only signal of a scalar, clock or reset port.
    pub fn sole_signal(&self, port: EntityId) -> Result<Option<EntityId>, MetadataError> {
        self.port(port)?;
        Ok(self.signals(port).next())
    }

    pub fn address_map(&self, manager: EntityId) -> Result<&AddressMap, MetadataError> {
        let entity = self.entity(manager)?;
        match entity.data().as_port().map(|p| &p.kind) {
            Some(PortKind::Manager(map)) => Ok(map),
            _ => Err(MetadataError::type_mismatch(
                "manager port",
                entity.type_name(),
            )),
        }
    }

    pub fn address_window(&self, subordinate: EntityId) -> Result<AddressWindow, MetadataError> {
        let entity = self.entity(subordinate)?;
        match entity.data().as_port().map(|p| &p.kind) {
            Some(PortKind::Subordinate(window)) => Ok(*window),
            _ => Err(MetadataError::type_mismatch(
                "subordinate port",
                entity.type_name(),
            )),
        }
    }

    fn address_map_mut(&mut self, manager: EntityId) -> Result<&mut AddressMap, MetadataError> {
        let entity = self.entity_mut(manager)?;
        let found = entity.type_name();
        match entity.data_mut().as_port_mut().map(|p| &mut p.kind) {
            Some(PortKind::Manager(map)) => Ok(map),
            _ => Err(MetadataError::type_mismatch("manager port", found)),
        }
    }

    /// Record that `manager` can reach `subordinate`.
    pub fn addrmap_add(
        &mut self,
        manager: EntityId,
        block: impl Into<String>,
        memtype: MemoryType,
        subordinate: EntityId,
    ) -> Result<(), MetadataError> {
        self.address_window(subordinate)?;
        let key = self.reference(subordinate)?.to_string();
        let owner = self.reference(manager)?.to_string();

        let map = self.address_map_mut(manager)?;
        if map.entries.contains_key(&key) || map.entries.values().any(|e| e.link == Some(subordinate)) {
            return Err(MetadataError::AlreadyExists {
                kind: "address map entry",
                key,
                owner,
            });
        }
        let mut entry = AddressMapEntry::new(block, memtype);
        entry.link = Some(subordinate);
        map.entries.insert(key, entry);
        self.touch(manager);
        Ok(())
    }

    /// Forget the entry for `subordinate`.
    pub fn addrmap_remove(
        &mut self,
        manager: EntityId,
        subordinate: EntityId,
    ) -> Result<(), MetadataError> {
        let key = self.reference(subordinate)?.to_string();
        let map = self.address_map_mut(manager)?;
        let before = map.entries.len();
        map.entries
            .retain(|k, e| *k != key && e.link != Some(subordinate));
        if map.entries.len() == before {
            return Err(MetadataError::not_found("address map entry", key));
        }
        self.touch(manager);
        Ok(())
    }
}
