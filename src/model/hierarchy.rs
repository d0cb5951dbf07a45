//! Design-tool hierarchy index.
//!
//! Cores carry the slash-delimited hierarchy path their design tool gave
//! them (`a/b/c`). The hierarchy tree groups cores by that path and is
//! independent of ownership: it is rebuilt in full on every refresh.

use indexmap::IndexMap;

use super::entity::{BlockKind, EntityId};
use super::{Design, MetadataError};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub name: String,
    /// Slash-joined path from the top node, empty for the top node itself.
    pub path: String,
    /// Node stands for a nested block design (a reconfigurable region).
    pub pr_region: bool,
    children: IndexMap<String, Hierarchy>,
    cores: IndexMap<String, EntityId>,
}

impl Hierarchy {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn children(&self) -> impl Iterator<Item = &Hierarchy> {
        self.children.values()
    }

    pub fn child(&self, name: &str) -> Option<&Hierarchy> {
        self.children.get(name)
    }

    /// Leaf cores of this node by leaf name.
    pub fn cores(&self) -> impl Iterator<Item = (&str, EntityId)> {
        self.cores.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn core(&self, name: &str) -> Option<EntityId> {
        self.cores.get(name).copied()
    }

    /// Descend along a slash-delimited path.
    pub fn find(&self, path: &str) -> Option<&Hierarchy> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, segment| node.child(segment))
    }

    fn contains_core(&self, id: EntityId) -> bool {
        self.cores.values().any(|c| *c == id) || self.children.values().any(|h| h.contains_core(id))
    }

    fn child_or_insert(&mut self, name: &str, path: &str) -> &mut Hierarchy {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| Hierarchy::new(name, path))
    }

    fn add_core(&mut self, name: &str, id: EntityId) -> Result<(), MetadataError> {
        if self.cores.contains_key(name) || self.contains_core(id) {
            return Err(MetadataError::AlreadyExists {
                kind: "hierarchy core",
                key: name.to_string(),
                owner: self.name.clone(),
            });
        }
        self.cores.insert(name.to_string(), id);
        Ok(())
    }

    fn place(
        &mut self,
        leaf: &str,
        path: &str,
        block: EntityId,
        is_module: bool,
    ) -> Result<(), MetadataError> {
        if is_module {
            self.child_or_insert(leaf, path).pr_region = true;
            Ok(())
        } else {
            self.add_core(leaf, block)
        }
    }
}

fn extend_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}/{segment}")
    }
}

/// Group the blocks of `module` by their hierarchy paths.
pub(crate) fn build(design: &Design, module: EntityId) -> Result<Hierarchy, MetadataError> {
    let mut top = Hierarchy::new(format!("{}_hier", design.entity(module)?.name()), "");

    for block in design.blocks(module) {
        let entity = design.entity(block)?;
        let Some(data) = entity.data().as_block() else {
            continue;
        };
        let is_module = matches!(data.kind, BlockKind::Module(_));
        let segments: Vec<&str> = data
            .hierarchy_name
            .as_deref()
            .map(|h| h.split('/').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        match segments.split_last() {
            Some((leaf, chain)) if !chain.is_empty() => {
                let mut node = &mut top;
                let mut path = String::new();
                for segment in chain {
                    path = extend_path(&path, segment);
                    node = node.child_or_insert(segment, &path);
                }
                let leaf_path = extend_path(&path, leaf);
                node.place(leaf, &leaf_path, block, is_module)?;
            }
            Some((leaf, _)) => top.place(leaf, leaf, block, is_module)?,
            None => top.place(entity.name(), entity.name(), block, is_module)?,
        }
    }
    Ok(top)
}

impl Design {
    /// Top hierarchy node of a module as of the last refresh.
    pub fn hierarchy_root(&self, module: EntityId) -> Option<&Hierarchy> {
        self.get(module)?.data().as_module()?.hierarchy()
    }

    /// Hierarchy node of the root module at a slash-delimited path.
    pub fn hierarchy(&self, path: &str) -> Result<&Hierarchy, MetadataError> {
        self.hierarchy_root(self.root())
            .and_then(|top| top.find(path))
            .ok_or_else(|| MetadataError::not_found("hierarchy", path))
    }
}
