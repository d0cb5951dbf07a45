//! Extension side table.
//!
//! Optional passes attach typed side data to entities under a string tag.
//! Extensions travel with their entity through export and merge but take no
//! part in the structural invariants of the graph.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tag used by the HWH reader for nested block-design containers.
pub const BLOCK_DESIGN_TAG: &str = "bdc";

/// Tag → payload map carried by every entity.
pub type Extensions = IndexMap<String, Extension>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extension {
    /// Block-design container; names the `.bd` the nested module came from.
    BlockDesign { bd_name: String },
    Flag { value: bool },
    Integer { value: i64 },
    Text { value: String },
    Fields { values: IndexMap<String, String> },
}

impl Extension {
    pub fn text(value: impl Into<String>) -> Self {
        Extension::Text {
            value: value.into(),
        }
    }

    pub fn flag(value: bool) -> Self {
        Extension::Flag { value }
    }
}
