//! JSON snapshot format.
//!
//! A snapshot is the recursive export of a design: owned children are
//! nested inline under per-type sections, cross references (signal
//! connections, manager address maps) are written as reference strings.
//!
//! ```json
//! {
//!   "name": "top", "type": "module", "generic_type": "block", "ref": "top",
//!   "parameters": {}, "ports": {},
//!   "blocks": {
//!     "dma0": {
//!       "name": "dma0", "type": "core-ip", "ref": "top:dma0[block]",
//!       "vlnv": { "vendor": "xilinx.com", "library": "ip", "name": "axi_dma", "version": [7, 1] },
//!       "ports": {
//!         "M_AXI": {
//!           "type": "port-manager",
//!           "addrmap": { "top:mem0[block]:S_AXI[port]": { "block": "Mem0", "memtype": "memory", ... } },
//!           "signals": { "AWADDR": { "type": "signal", "width": 32, "con_refs": ["top:mem0[block]:S_AXI[port]:AWADDR[signal]"] } }
//!         }
//!       }
//!     }
//!   },
//!   "busses": { "top:dma0[block]:M_AXI[port]->top:mem0[block]:S_AXI[port]": { ... } }
//! }
//! ```
//!
//! Decoding rebuilds the tree with every cross reference unresolved, then
//! refreshes the design, which relinks references and regenerates busses
//! and hierarchies. `busses` and `ref` are written for readers but ignored
//! on decode.

use serde_json::{Map, Value, json};

use super::{DesignFormat, FormatCapability, InterchangeError};
use crate::base::Vlnv;
use crate::model::{
    AddressMapEntry, BlockKind, Design, Entity, EntityData, EntityId, EntityKind, Extension,
    GenericType, MemoryType, PortKind,
};

/// JSON snapshot format handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshot;

impl DesignFormat for JsonSnapshot {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn capabilities(&self) -> FormatCapability {
        FormatCapability::FULL
    }

    fn read(&self, input: &[u8]) -> Result<Design, InterchangeError> {
        let value: Value = serde_json::from_slice(input)
            .map_err(|e| InterchangeError::json(format!("Parse error: {e}")))?;
        decode(&value)
    }

    fn write(&self, design: &Design) -> Result<Vec<u8>, InterchangeError> {
        serde_json::to_vec_pretty(&encode(design)?)
            .map_err(|e| InterchangeError::json(format!("Serialization error: {e}")))
    }

    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let content = std::str::from_utf8(input)
            .map_err(|e| InterchangeError::json(format!("Invalid UTF-8: {e}")))?;
        if !content.trim_start().starts_with('{') {
            return Err(InterchangeError::json("Snapshot must be a JSON object"));
        }
        Ok(())
    }
}

/// Child sections in decode order; ports precede blocks so boundary
/// ports exist before the cores wired to them.
const SECTIONS: [(&str, GenericType); 6] = [
    ("parameters", GenericType::Parameter),
    ("ports", GenericType::Port),
    ("signals", GenericType::Signal),
    ("registers", GenericType::Register),
    ("bitfields", GenericType::BitField),
    ("blocks", GenericType::Block),
];

// ============================================================================
// ENCODE
// ============================================================================

/// Render a design as a snapshot value.
pub fn encode(design: &Design) -> Result<Value, InterchangeError> {
    encode_entity(design, design.root())
}

fn encode_entity(design: &Design, id: EntityId) -> Result<Value, InterchangeError> {
    let entity = design.entity(id)?;
    let mut obj = Map::new();
    obj.insert("name".to_string(), json!(entity.name()));
    obj.insert("type".to_string(), json!(entity.type_name()));
    obj.insert("generic_type".to_string(), json!(entity.generic_type().as_str()));
    obj.insert("ref".to_string(), json!(entity.reference()));

    match entity.data() {
        EntityData::Block(block) => {
            obj.insert("hierarchy_name".to_string(), json!(block.hierarchy_name));
            match &block.kind {
                BlockKind::Core(core) => {
                    obj.insert("vlnv".to_string(), vlnv_to_json(Some(&core.vlnv))?);
                    obj.insert("monitor".to_string(), json!(core.monitor));
                }
                BlockKind::Module(module) => {
                    let mut busses = Map::new();
                    for bus in module.busses().values() {
                        busses.insert(
                            bus.name.clone(),
                            json!({
                                "name": bus.name,
                                "src_port": bus.src_port,
                                "dst_port": bus.dst_port,
                            }),
                        );
                    }
                    obj.insert("busses".to_string(), Value::Object(busses));
                }
            }
        }
        EntityData::Port(port) => {
            obj.insert("vlnv".to_string(), vlnv_to_json(port.vlnv.as_ref())?);
            obj.insert("external".to_string(), json!(port.external));
            match &port.kind {
                PortKind::Manager(map) => {
                    let mut addrmap = Map::new();
                    for (key, entry) in map.iter() {
                        let reference = entry
                            .subordinate()
                            .and_then(|s| design.reference(s).ok())
                            .unwrap_or(key);
                        addrmap.insert(
                            reference.to_string(),
                            json!({
                                "block": entry.block,
                                "memtype": entry.memtype.as_str(),
                                "subord_port": reference,
                            }),
                        );
                    }
                    obj.insert("addrmap".to_string(), Value::Object(addrmap));
                }
                PortKind::Subordinate(window) => {
                    obj.insert("baseaddr".to_string(), json!(window.base_address));
                    obj.insert("range".to_string(), json!(window.range));
                }
                PortKind::Stream { driver } => {
                    obj.insert("driver".to_string(), json!(driver));
                }
                PortKind::Scalar(scalar) | PortKind::Clock(scalar) | PortKind::Reset(scalar) => {
                    obj.insert("driver".to_string(), json!(scalar.driver));
                    obj.insert("width".to_string(), json!(scalar.width));
                }
                PortKind::Generic => {}
            }
        }
        EntityData::Signal(signal) => {
            obj.insert("width".to_string(), json!(signal.width));
            obj.insert("driver".to_string(), json!(signal.driver));
            obj.insert("external".to_string(), json!(signal.external));
            obj.insert("con_refs".to_string(), json!(design.con_refs(id)?));
        }
        EntityData::Parameter(parameter) => {
            if let Some(value) = &parameter.value {
                obj.insert("value".to_string(), json!(value));
            }
        }
        EntityData::Register(register) => {
            obj.insert("description".to_string(), json!(register.description));
            obj.insert("access".to_string(), json!(register.access));
            obj.insert("offset".to_string(), json!(register.offset));
            obj.insert("width".to_string(), json!(register.width));
            obj.insert("enabled".to_string(), json!(register.enabled));
        }
        EntityData::BitField(field) => {
            obj.insert("LSB".to_string(), json!(field.lsb));
            obj.insert("MSB".to_string(), json!(field.msb));
            obj.insert("description".to_string(), json!(field.description));
            obj.insert("access".to_string(), json!(field.access));
        }
    }

    for (section, generic) in SECTIONS {
        if !owns(entity.data(), generic) {
            continue;
        }
        let mut children = Map::new();
        for child in design.children(id, generic) {
            let name = design.entity(child)?.name().to_string();
            children.insert(name, encode_entity(design, child)?);
        }
        obj.insert(section.to_string(), Value::Object(children));
    }

    if !entity.ext().is_empty() {
        let ext = serde_json::to_value(entity.ext())
            .map_err(|e| InterchangeError::json(format!("Extension error: {e}")))?;
        obj.insert("ext".to_string(), ext);
    }

    Ok(Value::Object(obj))
}

/// Whether entities of this payload have a `generic` section.
fn owns(data: &EntityData, generic: GenericType) -> bool {
    match (data, generic) {
        (EntityData::Block(_), GenericType::Parameter | GenericType::Port) => true,
        (EntityData::Block(block), GenericType::Block) => {
            matches!(block.kind, BlockKind::Module(_))
        }
        (EntityData::Port(_), GenericType::Parameter | GenericType::Signal) => true,
        (EntityData::Port(port), GenericType::Register) => {
            matches!(port.kind, PortKind::Subordinate(_))
        }
        (EntityData::Register(_), GenericType::BitField) => true,
        _ => false,
    }
}

fn vlnv_to_json(vlnv: Option<&Vlnv>) -> Result<Value, InterchangeError> {
    serde_json::to_value(vlnv).map_err(|e| InterchangeError::json(format!("VLNV error: {e}")))
}

// ============================================================================
// DECODE
// ============================================================================

/// Rebuild a design from a snapshot value and refresh it.
pub fn decode(value: &Value) -> Result<Design, InterchangeError> {
    let Value::Object(obj) = value else {
        return Err(InterchangeError::json("Snapshot must be a JSON object"));
    };
    let root = entity_from_json(obj)?;
    if root.kind() != EntityKind::Module {
        return Err(InterchangeError::Unsupported(format!(
            "snapshot root must be a module, found {}",
            root.type_name()
        )));
    }
    let mut design = Design::with_root(root)?;
    let root = design.root();
    decode_children(&mut design, root, obj)?;
    design.refresh()?;
    Ok(design)
}

fn decode_children(
    design: &mut Design,
    owner: EntityId,
    obj: &Map<String, Value>,
) -> Result<(), InterchangeError> {
    for (section, _) in SECTIONS {
        let Some(children) = object(obj, section)? else {
            continue;
        };
        for child in children.values() {
            let Value::Object(child) = child else {
                return Err(InterchangeError::invalid_field(format!(
                    "entries of '{section}' must be objects"
                )));
            };
            let id = design.insert(owner, entity_from_json(child)?)?;
            decode_children(design, id, child)?;
        }
    }
    Ok(())
}

fn entity_from_json(obj: &Map<String, Value>) -> Result<Entity, InterchangeError> {
    let name = string(obj, "name")?;
    let type_name = string(obj, "type")?;
    let kind = EntityKind::resolve(type_name).ok_or_else(|| {
        InterchangeError::invalid_field(format!("unknown type '{type_name}' for '{name}'"))
    })?;

    let mut data = EntityData::for_kind(kind);
    match &mut data {
        EntityData::Block(block) => {
            block.hierarchy_name = optional_string(obj, "hierarchy_name")?.map(str::to_string);
            if let BlockKind::Core(core) = &mut block.kind {
                if let Some(vlnv) = vlnv(obj)? {
                    core.vlnv = vlnv;
                }
                core.monitor = boolean(obj, "monitor", false)?;
            }
        }
        EntityData::Port(port) => {
            port.vlnv = vlnv(obj)?;
            port.external = boolean(obj, "external", false)?;
            match &mut port.kind {
                PortKind::Manager(map) => {
                    for (key, entry) in object(obj, "addrmap")?.into_iter().flatten() {
                        let Value::Object(entry) = entry else {
                            return Err(InterchangeError::invalid_field(format!(
                                "address map entry '{key}' of '{name}' must be an object"
                            )));
                        };
                        let memtype = string(entry, "memtype")?;
                        let memtype = MemoryType::parse(memtype).ok_or_else(|| {
                            InterchangeError::invalid_field(format!("unknown memtype '{memtype}'"))
                        })?;
                        let reference = optional_string(entry, "subord_port")?.unwrap_or(key.as_str());
                        map.insert_unlinked(
                            reference.to_string(),
                            AddressMapEntry::new(string(entry, "block")?, memtype),
                        );
                    }
                }
                PortKind::Subordinate(window) => {
                    window.base_address = unsigned(obj, "baseaddr", 0)?;
                    window.range = unsigned(obj, "range", 0)?;
                }
                PortKind::Stream { driver } => *driver = boolean(obj, "driver", false)?,
                PortKind::Scalar(scalar) | PortKind::Clock(scalar) | PortKind::Reset(scalar) => {
                    scalar.driver = boolean(obj, "driver", false)?;
                    scalar.width = narrow(obj, "width", 1)?;
                }
                PortKind::Generic => {}
            }
        }
        EntityData::Signal(signal) => {
            signal.width = narrow(obj, "width", 1)?;
            signal.driver = boolean(obj, "driver", false)?;
            signal.external = boolean(obj, "external", false)?;
            match obj.get("con_refs") {
                Some(Value::Array(refs)) => {
                    for reference in refs {
                        let Value::String(reference) = reference else {
                            return Err(InterchangeError::invalid_field(format!(
                                "con_refs of '{name}' must be strings"
                            )));
                        };
                        signal.add_con_ref(reference.as_str());
                    }
                }
                Some(Value::Null) | None => {}
                Some(_) => {
                    return Err(InterchangeError::invalid_field(format!(
                        "con_refs of '{name}' must be an array"
                    )));
                }
            }
        }
        EntityData::Parameter(parameter) => {
            parameter.value = optional_string(obj, "value")?.map(str::to_string);
        }
        EntityData::Register(register) => {
            if let Some(description) = optional_string(obj, "description")? {
                register.description = description.to_string();
            }
            if let Some(access) = optional_string(obj, "access")? {
                register.access = access.to_string();
            }
            register.offset = unsigned(obj, "offset", 0)?;
            register.width = narrow(obj, "width", 32)?;
            register.enabled = boolean(obj, "enabled", true)?;
        }
        EntityData::BitField(field) => {
            field.lsb = narrow(obj, "LSB", 0)?;
            field.msb = narrow(obj, "MSB", 0)?;
            if let Some(description) = optional_string(obj, "description")? {
                field.description = description.to_string();
            }
            if let Some(access) = optional_string(obj, "access")? {
                field.access = access.to_string();
            }
        }
    }

    let mut entity = Entity::new(name, data);
    for (tag, ext) in object(obj, "ext")?.into_iter().flatten() {
        let ext: Extension = serde_json::from_value(ext.clone())
            .map_err(|e| InterchangeError::json(format!("Extension '{tag}' of '{name}': {e}")))?;
        entity = entity.with_ext(tag.clone(), ext);
    }
    Ok(entity)
}

// ── Field access ────────────────────────────────────────────────────

fn string<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str, InterchangeError> {
    optional_string(obj, key)?.ok_or_else(|| InterchangeError::missing_field(key))
}

fn optional_string<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, InterchangeError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(InterchangeError::invalid_field(format!(
            "'{key}' must be a string, found {other}"
        ))),
    }
}

fn object<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, InterchangeError> {
    match obj.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(InterchangeError::invalid_field(format!(
            "'{key}' must be an object"
        ))),
    }
}

fn boolean(obj: &Map<String, Value>, key: &str, default: bool) -> Result<bool, InterchangeError> {
    match obj.get(key) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Null) | None => Ok(default),
        Some(other) => Err(InterchangeError::invalid_field(format!(
            "'{key}' must be a boolean, found {other}"
        ))),
    }
}

fn unsigned(obj: &Map<String, Value>, key: &str, default: u64) -> Result<u64, InterchangeError> {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
            InterchangeError::invalid_field(format!("'{key}' must be unsigned, found {n}"))
        }),
        Some(Value::Null) | None => Ok(default),
        Some(other) => Err(InterchangeError::invalid_field(format!(
            "'{key}' must be a number, found {other}"
        ))),
    }
}

fn narrow(obj: &Map<String, Value>, key: &str, default: u32) -> Result<u32, InterchangeError> {
    let value = unsigned(obj, key, u64::from(default))?;
    u32::try_from(value)
        .map_err(|_| InterchangeError::invalid_field(format!("'{key}' out of range: {value}")))
}

fn vlnv(obj: &Map<String, Value>) -> Result<Option<Vlnv>, InterchangeError> {
    match obj.get("vlnv") {
        Some(Value::Null) | None => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| InterchangeError::json(format!("VLNV error: {e}"))),
    }
}
