//! Conflict-checked structural merge.
//!
//! Two entities merge only when they share name and concrete type. Scalar
//! fields present on both sides must agree unless a [`MergeOptions`] flag
//! relaxes them; keyed children merge key by key, and children found only
//! in the source are copied into the target. The merge runs against a
//! scratch copy of the target design, which replaces the original only
//! after the merge and the following refresh both succeed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::entity::{BlockData, BlockKind, Entity, EntityData, EntityId, ModuleData, PortData, PortKind};
use super::extension::Extensions;
use super::kind::GenericType;
use super::{Design, MetadataError};

/// Flags relaxing the default strict-equality policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Adopt the source's `external` flag instead of comparing.
    pub skip_external: bool,
    /// Adopt the source's signal and scalar-port width instead of comparing.
    pub inherit_signal_width: bool,
    /// Adopt the source's base address and range instead of comparing.
    pub inherit_addr_info: bool,
    /// Skip base address, range and registers of subordinate ports entirely.
    pub ignore_addr_info: bool,
}

impl Design {
    /// Merge another design into this one, root into root.
    pub fn merge(&mut self, other: Design, options: MergeOptions) -> Result<(), MetadataError> {
        let (target, source) = (self.root(), other.root());
        self.merge_at(target, &other, source, options)
    }

    /// Merge `source_id` of `source` into `target` of this design.
    ///
    /// On error this design is left untouched.
    pub fn merge_at(
        &mut self,
        target: EntityId,
        source: &Design,
        source_id: EntityId,
        options: MergeOptions,
    ) -> Result<(), MetadataError> {
        let mut scratch = self.clone();
        let mut merger = Merger {
            target: &mut scratch,
            source,
            options,
            adopted: 0,
        };
        merger.merge_entity(target, source_id)?;
        let adopted = merger.adopted;
        scratch.refresh()?;
        debug!(design = scratch.name(), adopted, "merged design");
        *self = scratch;
        Ok(())
    }
}

struct Merger<'a> {
    target: &'a mut Design,
    source: &'a Design,
    options: MergeOptions,
    adopted: usize,
}

/// Compare one field, recording a conflict when both sides disagree.
fn same<T: PartialEq + std::fmt::Debug>(
    reference: &str,
    field: &'static str,
    ours: &T,
    theirs: &T,
) -> Result<(), MetadataError> {
    if ours == theirs {
        Ok(())
    } else {
        Err(MetadataError::conflict(
            reference,
            field,
            format!("{ours:?}"),
            format!("{theirs:?}"),
        ))
    }
}

/// Optional fields: absent on either side adopts the other.
fn either<T: PartialEq + Clone + std::fmt::Debug>(
    reference: &str,
    field: &'static str,
    ours: &Option<T>,
    theirs: &Option<T>,
) -> Result<Option<T>, MetadataError> {
    match (ours, theirs) {
        (Some(a), Some(b)) => {
            same(reference, field, a, b)?;
            Ok(Some(a.clone()))
        }
        (None, b) => Ok(b.clone()),
        (a, None) => Ok(a.clone()),
    }
}

impl Merger<'_> {
    fn merge_entity(&mut self, t: EntityId, s: EntityId) -> Result<(), MetadataError> {
        let source = self.source;
        let ours = self.target.entity(t)?;
        let theirs = source.entity(s)?;
        let reference = ours.reference().to_string();

        same(&reference, "name", &ours.name(), &theirs.name())?;
        same(&reference, "type", &ours.type_name(), &theirs.type_name())?;

        let data = self.merge_data(&reference, t, s, ours.data(), theirs.data())?;
        let ext = merge_ext(&reference, ours.ext(), theirs.ext())?;

        let skip_registers = self.options.ignore_addr_info
            && matches!(ours.data().as_port().map(|p| &p.kind), Some(PortKind::Subordinate(_)));
        let mut pairs = Vec::new();
        let mut adoptions = Vec::new();
        for (key, child) in theirs.children() {
            if skip_registers
                && source.get(child).map(Entity::generic_type) == Some(GenericType::Register)
            {
                continue;
            }
            match ours.children.get(key) {
                Some(existing) => pairs.push((*existing, child)),
                None => adoptions.push(child),
            }
        }

        let entity = self.target.entity_mut(t)?;
        *entity.data_mut() = data;
        entity.ext = ext;
        self.target.touch(t);

        for (ours, theirs) in pairs {
            self.merge_entity(ours, theirs)?;
        }
        for child in adoptions {
            self.graft(t, child)?;
        }
        Ok(())
    }

    fn merge_data(
        &self,
        reference: &str,
        t: EntityId,
        s: EntityId,
        ours: &EntityData,
        theirs: &EntityData,
    ) -> Result<EntityData, MetadataError> {
        let opts = self.options;
        let merged = match (ours, theirs) {
            (EntityData::Block(a), EntityData::Block(b)) => {
                let hierarchy_name =
                    either(reference, "hierarchy_name", &a.hierarchy_name, &b.hierarchy_name)?;
                if let (BlockKind::Core(x), BlockKind::Core(y)) = (&a.kind, &b.kind) {
                    same(reference, "vlnv", &x.vlnv, &y.vlnv)?;
                    same(reference, "monitor", &x.monitor, &y.monitor)?;
                }
                EntityData::Block(BlockData {
                    hierarchy_name,
                    kind: a.kind.clone(),
                })
            }
            (EntityData::Port(a), EntityData::Port(b)) => {
                EntityData::Port(merge_port(reference, a, b, opts)?)
            }
            (EntityData::Signal(a), EntityData::Signal(b)) => {
                let mut merged = a.clone();
                if opts.inherit_signal_width {
                    merged.width = b.width;
                } else {
                    same(reference, "width", &a.width, &b.width)?;
                }
                same(reference, "driver", &a.driver, &b.driver)?;
                if opts.skip_external {
                    merged.external = b.external;
                } else {
                    same(reference, "external", &a.external, &b.external)?;
                }
                let known = self.target.con_refs(t)?;
                for con in self.source.con_refs(s)? {
                    if !known.contains(&con) {
                        merged.add_con_ref(con);
                    }
                }
                EntityData::Signal(merged)
            }
            (EntityData::Parameter(a), EntityData::Parameter(b)) => {
                EntityData::parameter(either(reference, "value", &a.value, &b.value)?)
            }
            (EntityData::Register(a), EntityData::Register(b)) => {
                same(reference, "access", &a.access, &b.access)?;
                same(reference, "offset", &a.offset, &b.offset)?;
                same(reference, "width", &a.width, &b.width)?;
                same(reference, "enabled", &a.enabled, &b.enabled)?;
                same(reference, "description", &a.description, &b.description)?;
                EntityData::Register(a.clone())
            }
            (EntityData::BitField(a), EntityData::BitField(b)) => {
                same(reference, "lsb", &a.lsb, &b.lsb)?;
                same(reference, "msb", &a.msb, &b.msb)?;
                same(reference, "access", &a.access, &b.access)?;
                same(reference, "description", &a.description, &b.description)?;
                EntityData::BitField(a.clone())
            }
            _ => {
                return Err(MetadataError::type_mismatch(
                    ours.kind().type_name(),
                    theirs.kind().type_name(),
                ));
            }
        };
        Ok(merged)
    }

    /// Copy a source subtree under `owner`. Cross references are carried as
    /// strings and resolved by the refresh that closes the merge.
    fn graft(&mut self, owner: EntityId, s: EntityId) -> Result<EntityId, MetadataError> {
        let source = self.source;
        let theirs = source.entity(s)?;
        let mut data = theirs.data().clone();
        match &mut data {
            EntityData::Signal(signal) => {
                signal.connections.clear();
                for con in source.con_refs(s)? {
                    signal.add_con_ref(con);
                }
            }
            EntityData::Port(PortData {
                kind: PortKind::Manager(map),
                ..
            }) => {
                for entry in map.entries.values_mut() {
                    entry.link = None;
                }
            }
            EntityData::Block(BlockData {
                kind: BlockKind::Module(module),
                ..
            }) => *module = ModuleData::default(),
            _ => {}
        }

        let mut entity = Entity::new(theirs.name(), data);
        entity.ext = theirs.ext().clone();
        let id = self.target.insert(owner, entity)?;
        self.adopted += 1;

        let children: Vec<EntityId> = theirs.children().map(|(_, c)| c).collect();
        for child in children {
            self.graft(id, child)?;
        }
        Ok(id)
    }
}

fn merge_port(
    reference: &str,
    a: &PortData,
    b: &PortData,
    opts: MergeOptions,
) -> Result<PortData, MetadataError> {
    let vlnv = either(reference, "vlnv", &a.vlnv, &b.vlnv)?;
    let external = if opts.skip_external {
        b.external
    } else {
        same(reference, "external", &a.external, &b.external)?;
        a.external
    };

    let kind = match (&a.kind, &b.kind) {
        (PortKind::Manager(x), PortKind::Manager(y)) => {
            let mut map = x.clone();
            for (key, entry) in &y.entries {
                match x.entries.get(key) {
                    Some(existing) => same(reference, "addrmap", existing, entry)?,
                    None => {
                        let mut entry = entry.clone();
                        entry.link = None;
                        map.insert_unlinked(key.clone(), entry);
                    }
                }
            }
            PortKind::Manager(map)
        }
        (PortKind::Subordinate(x), PortKind::Subordinate(y)) => {
            if opts.ignore_addr_info {
                PortKind::Subordinate(*x)
            } else if opts.inherit_addr_info {
                PortKind::Subordinate(*y)
            } else {
                same(reference, "base_address", &x.base_address, &y.base_address)?;
                same(reference, "range", &x.range, &y.range)?;
                PortKind::Subordinate(*x)
            }
        }
        (PortKind::Stream { driver: x }, PortKind::Stream { driver: y }) => {
            same(reference, "driver", x, y)?;
            PortKind::Stream { driver: *x }
        }
        (PortKind::Scalar(x), PortKind::Scalar(y))
        | (PortKind::Clock(x), PortKind::Clock(y))
        | (PortKind::Reset(x), PortKind::Reset(y)) => {
            same(reference, "driver", &x.driver, &y.driver)?;
            let mut merged = *x;
            if opts.inherit_signal_width {
                merged.width = y.width;
            } else {
                same(reference, "width", &x.width, &y.width)?;
            }
            match a.kind {
                PortKind::Clock(_) => PortKind::Clock(merged),
                PortKind::Reset(_) => PortKind::Reset(merged),
                _ => PortKind::Scalar(merged),
            }
        }
        (kind, _) => kind.clone(),
    };

    Ok(PortData {
        kind,
        vlnv,
        external,
    })
}

fn merge_ext(
    reference: &str,
    ours: &Extensions,
    theirs: &Extensions,
) -> Result<Extensions, MetadataError> {
    let mut merged = ours.clone();
    for (tag, value) in theirs {
        match ours.get(tag) {
            Some(existing) => {
                if existing != value {
                    return Err(MetadataError::conflict(
                        format!("{reference} ext[{tag}]"),
                        "extension",
                        format!("{existing:?}"),
                        format!("{value:?}"),
                    ));
                }
            }
            None => {
                merged.insert(tag.clone(), value.clone());
            }
        }
    }
    Ok(merged)
}
