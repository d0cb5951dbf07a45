//! The design arena.
//!
//! A [`Design`] owns every entity of one hardware design in a flat arena
//! addressed by [`EntityId`] handles. Ownership is expressed through handles
//! (owner back-reference plus a keyed children map), never through owning
//! pointers, so reparenting is a pair of map edits followed by one top-down
//! pass that recomputes reference paths.
//!
//! ```text
//! top                              (root module, ref = name)
//! ├── dma0[block]                  ref = top:dma0[block]
//! │   └── M_AXI[port]              ref = top:dma0[block]:M_AXI[port]
//! │       └── AWADDR[signal]       ref = top:dma0[block]:M_AXI[port]:AWADDR[signal]
//! └── mem0[block]
//!     └── S_AXI[port]
//!         └── r1[register]
//! ```

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use super::connectivity::{self, BusConnection};
use super::entity::{Entity, EntityData, EntityId, PortData, PortKind};
use super::extension::Extension;
use super::hierarchy;
use super::kind::{EntityKind, GenericType};
use super::MetadataError;
use crate::base::path::{case_candidates, child_key, join, split_path};

/// Arena holding one design graph.
#[derive(Clone, Debug)]
pub struct Design {
    slots: Vec<Option<Entity>>,
    root: EntityId,
    clock: u64,
}

impl Design {
    /// Create an empty design whose root module is called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            slots: vec![Some(Entity::new(name, EntityData::module()))],
            root: EntityId::from_index(0),
            clock: 0,
        }
    }

    /// Create a design around a decoded root entity, which must be a module.
    pub(crate) fn with_root(root: Entity) -> Result<Self, MetadataError> {
        if root.kind() != EntityKind::Module {
            return Err(MetadataError::type_mismatch("module", root.type_name()));
        }
        Ok(Self {
            slots: vec![Some(root)],
            root: EntityId::from_index(0),
            clock: 0,
        })
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    /// Name of the root module.
    pub fn name(&self) -> &str {
        self.get(self.root).map_or("", Entity::name)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Access ──────────────────────────────────────────────────────

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Like [`get`](Self::get) but reports stale handles as errors.
    pub fn entity(&self, id: EntityId) -> Result<&Entity, MetadataError> {
        self.get(id).ok_or(MetadataError::StaleHandle(id))
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, MetadataError> {
        self.get_mut(id).ok_or(MetadataError::StaleHandle(id))
    }

    pub fn reference(&self, id: EntityId) -> Result<&str, MetadataError> {
        self.entity(id).map(Entity::reference)
    }

    /// Iterate over every live entity in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|e| (EntityId::from_index(index), e)))
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Children of `owner` with the given generic type, in insertion order.
    pub fn children(
        &self,
        owner: EntityId,
        generic: GenericType,
    ) -> impl Iterator<Item = EntityId> + '_ {
        self.get(owner)
            .into_iter()
            .flat_map(|e| e.children.values().copied())
            .filter(move |id| self.get(*id).is_some_and(|c| c.generic_type() == generic))
    }

    /// Direct child by name and generic type.
    pub fn child(&self, owner: EntityId, name: &str, generic: GenericType) -> Option<EntityId> {
        self.get(owner)?
            .children
            .get(&child_key(name, generic.as_str()))
            .copied()
    }

    pub fn blocks(&self, module: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.children(module, GenericType::Block)
    }

    pub fn ports(&self, block: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.children(block, GenericType::Port)
    }

    pub fn signals(&self, port: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.children(port, GenericType::Signal)
    }

    pub fn parameters(&self, owner: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.children(owner, GenericType::Parameter)
    }

    pub fn registers(&self, port: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.children(port, GenericType::Register)
    }

    pub fn bitfields(&self, register: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.children(register, GenericType::BitField)
    }

    /// Value of a named parameter of a block or port.
    pub fn parameter_value(&self, owner: EntityId, name: &str) -> Option<&str> {
        let id = self.child(owner, name, GenericType::Parameter)?;
        self.get(id)?.data().as_parameter()?.value.as_deref()
    }

    /// Owners of `id`, nearest first.
    pub fn ancestors(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        std::iter::successors(self.get(id).and_then(Entity::owner), |a| {
            self.get(*a).and_then(Entity::owner)
        })
    }

    /// Nearest enclosing core or module.
    pub fn owning_block(&self, id: EntityId) -> Option<EntityId> {
        self.ancestors(id)
            .find(|a| self.get(*a).is_some_and(|e| e.data().as_block().is_some()))
    }

    /// `id` and everything it owns, parents before children.
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(entity) = self.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(entity.children.values().rev().copied());
        }
        out
    }

    /// Every module of the design, the root first.
    pub fn modules(&self) -> Vec<EntityId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(|e| e.kind() == EntityKind::Module))
            .collect()
    }

    /// Bus-level connections of a module as of the last refresh.
    pub fn busses(&self, module: EntityId) -> impl Iterator<Item = &BusConnection> {
        self.get(module)
            .and_then(|e| e.data().as_module())
            .into_iter()
            .flat_map(|m| m.busses().values())
    }

    // ── Construction ────────────────────────────────────────────────

    /// Add a new entity under `owner`.
    ///
    /// Rejects duplicate keys, incompatible owners and a second signal on a
    /// scalar port; nothing is allocated when the insert is rejected.
    pub fn insert(&mut self, owner: EntityId, entity: Entity) -> Result<EntityId, MetadataError> {
        self.check_attach(owner, &entity, None)?;
        let id = EntityId::from_index(self.slots.len());
        self.slots.push(Some(entity));
        self.link(id, owner)?;
        Ok(id)
    }

    /// Move an existing entity under a new owner.
    pub fn attach(&mut self, child: EntityId, owner: EntityId) -> Result<(), MetadataError> {
        if child == self.root {
            return Err(MetadataError::unsupported(
                "the design root cannot be reparented",
            ));
        }
        let entity = self.entity(child)?;
        self.check_attach(owner, entity, Some(child))?;
        let (previous, key) = (entity.owner, entity.key());

        if let Some(previous) = previous {
            if let Some(old) = self.get_mut(previous) {
                old.children.shift_remove(&key);
            }
            self.touch(previous);
        }
        self.link(child, owner)
    }

    fn link(&mut self, child: EntityId, owner: EntityId) -> Result<(), MetadataError> {
        let key = self.entity(child)?.key();
        self.entity_mut(owner)?.children.insert(key, child);
        self.entity_mut(child)?.owner = Some(owner);
        self.recompute_refs(child);
        self.touch(child);
        Ok(())
    }

    fn check_attach(
        &self,
        owner_id: EntityId,
        entity: &Entity,
        moving: Option<EntityId>,
    ) -> Result<(), MetadataError> {
        let owner = self.entity(owner_id)?;
        let data = owner.data();
        let (allowed, expected) = match entity.data() {
            EntityData::Block(_) => (data.as_module().is_some(), "module"),
            EntityData::Port(_) => (data.as_block().is_some(), "block"),
            EntityData::Signal(_) => (data.as_port().is_some(), "port"),
            EntityData::Parameter(_) => (
                matches!(data, EntityData::Block(_) | EntityData::Port(_)),
                "block or port",
            ),
            EntityData::Register(_) => (
                matches!(
                    data.as_port().map(|p| &p.kind),
                    Some(PortKind::Subordinate(_))
                ),
                "subordinate port",
            ),
            EntityData::BitField(_) => (data.as_register().is_some(), "register"),
        };
        if !allowed {
            return Err(MetadataError::type_mismatch(expected, owner.type_name()));
        }

        let key = entity.key();
        if let Some(existing) = owner.children.get(&key) {
            if Some(*existing) != moving {
                return Err(MetadataError::AlreadyExists {
                    kind: entity.generic_type().as_str(),
                    key,
                    owner: owner.reference.clone(),
                });
            }
        }

        if entity.generic_type() == GenericType::Signal
            && data.as_port().is_some_and(|p| p.kind.is_scalar())
            && self.signals(owner_id).any(|s| Some(s) != moving)
        {
            return Err(MetadataError::TooManySignals {
                port: owner.reference.clone(),
            });
        }

        if let Some(child) = moving {
            if owner_id == child || self.ancestors(owner_id).any(|a| a == child) {
                return Err(MetadataError::unsupported(format!(
                    "cannot attach {} beneath itself",
                    entity.reference
                )));
            }
        }
        Ok(())
    }

    /// Mutate an entity's payload in place. The concrete type may not change.
    pub fn update(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut EntityData),
    ) -> Result<(), MetadataError> {
        let entity = self.entity_mut(id)?;
        let before = entity.kind();
        let saved = entity.data().clone();
        f(entity.data_mut());
        let after = entity.kind();
        if after != before {
            *entity.data_mut() = saved;
            return Err(MetadataError::type_mismatch(
                before.type_name(),
                after.type_name(),
            ));
        }
        self.touch(id);
        Ok(())
    }

    /// Set an extension entry, returning the previous payload.
    pub fn set_ext(
        &mut self,
        id: EntityId,
        tag: impl Into<String>,
        ext: Extension,
    ) -> Result<Option<Extension>, MetadataError> {
        let previous = self.entity_mut(id)?.ext.insert(tag.into(), ext);
        self.touch(id);
        Ok(previous)
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// Resolve a reference path from the root.
    pub fn lookup(&self, path: &str) -> Result<EntityId, MetadataError> {
        self.lookup_from(self.root, path)
    }

    /// Resolve a reference path relative to `start`.
    ///
    /// A leading segment equal to the start entity's name is skipped, so
    /// both absolute references and paths relative to `start` resolve. Each
    /// segment is tried as written, then with its name upper-cased, then
    /// lower-cased.
    pub fn lookup_from(&self, start: EntityId, path: &str) -> Result<EntityId, MetadataError> {
        let start_entity = self.entity(start)?;
        let mut segments = split_path(path).peekable();
        if segments.peek() == Some(&start_entity.name()) {
            segments.next();
        }

        let mut current = start;
        for segment in segments {
            let entity = self.entity(current)?;
            current = case_candidates(segment)
                .iter()
                .find_map(|candidate| entity.children.get(candidate).copied())
                .ok_or_else(|| MetadataError::not_found("metadata object", path))?;
        }
        Ok(current)
    }

    /// Resolve a serialized reference from the modules enclosing `from`,
    /// nearest first, then the root.
    pub(crate) fn resolve_reference(
        &self,
        from: EntityId,
        reference: &str,
    ) -> Result<EntityId, MetadataError> {
        let mut scopes: Vec<EntityId> = std::iter::once(from)
            .chain(self.ancestors(from))
            .filter(|id| self.get(*id).is_some_and(|e| e.kind() == EntityKind::Module))
            .collect();
        if !scopes.contains(&self.root) {
            scopes.push(self.root);
        }
        scopes
            .into_iter()
            .find_map(|scope| self.lookup_from(scope, reference).ok())
            .ok_or_else(|| MetadataError::UnresolvedReference(reference.to_string()))
    }

    // ── Removal ─────────────────────────────────────────────────────

    /// Remove an entity and everything it owns, then refresh.
    pub fn remove(&mut self, id: EntityId) -> Result<(), MetadataError> {
        self.remove_with(id, true)
    }

    /// Remove an entity and everything it owns.
    ///
    /// Every surviving signal loses its connections to removed signals and
    /// every manager loses address-map entries naming removed ports. Pass
    /// `refresh = false` when batching removals and refresh once afterwards.
    pub fn remove_with(&mut self, id: EntityId, refresh: bool) -> Result<(), MetadataError> {
        if id == self.root {
            return Err(MetadataError::unsupported("the design root cannot be removed"));
        }
        let entity = self.entity(id)?;
        let (owner, key, reference) = (entity.owner, entity.key(), entity.reference.clone());

        let doomed = self.descendants(id);
        let doomed_ids: FxHashSet<EntityId> = doomed.iter().copied().collect();
        let doomed_refs: FxHashSet<String> = doomed
            .iter()
            .filter_map(|d| self.get(*d))
            .filter(|e| matches!(e.data(), EntityData::Signal(_) | EntityData::Port(_)))
            .map(|e| e.reference.clone())
            .collect();
        let is_doomed = |link: &Option<EntityId>, key: &str| match link {
            Some(target) => doomed_ids.contains(target),
            None => doomed_refs.contains(key),
        };

        let mut touched = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let survivor = EntityId::from_index(index);
            let Some(entity) = slot else {
                continue;
            };
            if doomed_ids.contains(&survivor) {
                continue;
            }
            let changed = match entity.data_mut() {
                EntityData::Signal(signal) => {
                    let before = signal.connections.len();
                    signal.connections.retain(|k, link| !is_doomed(&*link, k.as_str()));
                    before != signal.connections.len()
                }
                EntityData::Port(PortData {
                    kind: PortKind::Manager(map),
                    ..
                }) => {
                    let before = map.entries.len();
                    map.entries.retain(|k, entry| !is_doomed(&entry.link, k.as_str()));
                    before != map.entries.len()
                }
                _ => false,
            };
            if changed {
                touched.push(survivor);
            }
        }

        for d in &doomed {
            if let Some(slot) = self.slots.get_mut(d.index()) {
                *slot = None;
            }
        }
        if let Some(owner) = owner {
            if let Some(parent) = self.get_mut(owner) {
                parent.children.shift_remove(&key);
            }
            self.touch(owner);
        }
        for survivor in touched {
            self.touch(survivor);
        }
        debug!(%reference, removed = doomed.len(), "removed entity");

        if refresh {
            self.refresh()?;
        }
        Ok(())
    }

    // ── Refresh ─────────────────────────────────────────────────────

    /// Recompute every derived structure.
    ///
    /// Reference paths are recomputed top-down, serialized references are
    /// relinked to live handles, and each module's bus connections and
    /// hierarchy are rebuilt from scratch.
    pub fn refresh(&mut self) -> Result<(), MetadataError> {
        self.recompute_refs(self.root);
        self.relink()?;

        let modules = self.modules();
        for module in &modules {
            let busses = connectivity::resolve_busses(self, *module)?;
            let tree = hierarchy::build(self, *module)?;
            if let Some(data) = self.entity_mut(*module)?.data_mut().as_module_mut() {
                data.busses = busses;
                data.hierarchy = Some(tree);
            }
        }
        debug!(
            design = self.name(),
            entities = self.len(),
            modules = modules.len(),
            "refreshed design"
        );
        Ok(())
    }

    /// Re-derive live handles from references and references from handles.
    fn relink(&mut self) -> Result<(), MetadataError> {
        let ids: Vec<EntityId> = self.iter().map(|(id, _)| id).collect();
        for id in ids {
            let entity = self.entity(id)?;
            match entity.data() {
                EntityData::Signal(signal) => {
                    let mut links = IndexMap::with_capacity(signal.connections.len());
                    for (reference, link) in &signal.connections {
                        let target = match link {
                            Some(target) if self.get(*target).is_some() => *target,
                            Some(_) => continue,
                            None => self.resolve_reference(id, reference)?,
                        };
                        let peer = self.entity(target)?;
                        if peer.data().as_signal().is_none() {
                            return Err(MetadataError::type_mismatch("signal", peer.type_name()));
                        }
                        if link.is_none() {
                            trace!(%reference, "relinked connection");
                        }
                        links.insert(peer.reference.clone(), Some(target));
                    }
                    if let Some(signal) = self.entity_mut(id)?.data_mut().as_signal_mut() {
                        signal.connections = links;
                    }
                }
                EntityData::Port(PortData {
                    kind: PortKind::Manager(map),
                    ..
                }) => {
                    let mut entries = IndexMap::with_capacity(map.entries.len());
                    for (reference, entry) in &map.entries {
                        let target = match entry.link {
                            Some(target) if self.get(target).is_some() => target,
                            Some(_) => continue,
                            None => self.resolve_reference(id, reference)?,
                        };
                        let subordinate = self.entity(target)?;
                        if !matches!(
                            subordinate.data().as_port().map(|p| &p.kind),
                            Some(PortKind::Subordinate(_))
                        ) {
                            return Err(MetadataError::type_mismatch(
                                "subordinate port",
                                subordinate.type_name(),
                            ));
                        }
                        let mut entry = entry.clone();
                        entry.link = Some(target);
                        entries.insert(subordinate.reference.clone(), entry);
                    }
                    if let Some(PortData {
                        kind: PortKind::Manager(map),
                        ..
                    }) = self.entity_mut(id)?.data_mut().as_port_mut()
                    {
                        map.entries = entries;
                    }
                }
                _ => {}
            }
        }

        // Connections added one-sided (by a merge or a hand-written
        // snapshot) are mirrored onto their peer.
        let mut missing = Vec::new();
        for (id, entity) in self.iter() {
            let Some(signal) = entity.data().as_signal() else {
                continue;
            };
            for target in signal.connections.values().flatten() {
                let mirrored = self
                    .get(*target)
                    .and_then(|t| t.data().as_signal())
                    .is_none_or(|t| t.is_linked_to(id));
                if !mirrored {
                    missing.push((*target, id, entity.reference.clone()));
                }
            }
        }
        for (holder, peer, reference) in missing {
            if let Some(signal) = self.entity_mut(holder)?.data_mut().as_signal_mut() {
                signal.connections.insert(reference, Some(peer));
            }
        }
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Stamp `id` and all of its owners with the next tick.
    pub(crate) fn touch(&mut self, id: EntityId) {
        self.clock += 1;
        let tick = self.clock;
        let mut current = Some(id);
        while let Some(c) = current {
            let Some(entity) = self.get_mut(c) else {
                break;
            };
            entity.modified = tick;
            current = entity.owner;
        }
    }

    /// Recompute `ref` for `start` and every descendant, parents first.
    fn recompute_refs(&mut self, start: EntityId) {
        let base = match self.get(start) {
            Some(entity) => match entity.owner.and_then(|o| self.get(o)) {
                Some(owner) => join(&owner.reference, &entity.key()),
                None => entity.name().to_string(),
            },
            None => return,
        };

        let mut stack = vec![(start, base)];
        while let Some((id, reference)) = stack.pop() {
            let Some(entity) = self.get_mut(id) else {
                continue;
            };
            entity.reference = reference;
            let parent = &entity.reference;
            stack.extend(
                entity
                    .children
                    .iter()
                    .map(|(key, child)| (*child, join(parent, key))),
            );
        }
    }
}
