//! Vivado hardware handoff (HWH) reader.
//!
//! An HWH file is the XML description Vivado exports next to a bitstream.
//! The parts this reader consumes:
//!
//! ```xml
//! <EDKSYSTEM>
//!   <SYSTEMINFO NAME="top"/>
//!   <EXTERNALPORTS>
//!     <PORT NAME="clk" DIR="I" SIGIS="clk"/>
//!   </EXTERNALPORTS>
//!   <EXTERNALINTERFACES>
//!     <BUSINTERFACE NAME="S_AXIS" TYPE="TARGET">
//!       <PARAMETER NAME="HAS_TLAST" VALUE="1"/>
//!       <PORTMAPS><PORTMAP LOGICAL="TDATA" PHYSICAL="S_AXIS_tdata"/></PORTMAPS>
//!     </BUSINTERFACE>
//!   </EXTERNALINTERFACES>
//!   <MODULES>
//!     <MODULE INSTANCE="dma0" VLNV="xilinx.com:ip:axi_dma:7.1" FULLNAME="/dma0">
//!       <PARAMETERS><PARAMETER NAME="C_FAMILY" VALUE="zynq"/></PARAMETERS>
//!       <ADDRESSBLOCKS>...</ADDRESSBLOCKS>
//!       <MEMORYMAP><MEMRANGE MASTERBUSINTERFACE="M_AXI" INSTANCE="mem0" .../></MEMORYMAP>
//!       <PORTS><PORT NAME="m_axi_awaddr" DIR="O" LEFT="31" RIGHT="0">
//!         <CONNECTIONS><CONNECTION INSTANCE="mem0" PORT="s_axi_awaddr"/></CONNECTIONS>
//!       </PORT></PORTS>
//!       <BUSINTERFACES><BUSINTERFACE NAME="M_AXI" TYPE="MASTER" VLNV="...:aximm:1.0">
//!         <PORTMAPS><PORTMAP LOGICAL="AWADDR" PHYSICAL="m_axi_awaddr" LEFT="31" RIGHT="0"/></PORTMAPS>
//!       </BUSINTERFACE></BUSINTERFACES>
//!     </MODULE>
//!   </MODULES>
//! </EDKSYSTEM>
//! ```
//!
//! Wiring is expressed in physical pin names while the design graph is
//! addressed by bus interface and logical pin, so the reader first indexes
//! every portmap in both directions and then builds the design in strict
//! phases: cores, boundary ports, addressing, connections.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{DesignFormat, FormatCapability, InterchangeError};
use crate::base::Vlnv;
use crate::model::{
    BLOCK_DESIGN_TAG, BitFieldData, CoreVariant, Design, Entity, EntityData, EntityId, Extension,
    GenericType, MemoryType, MetadataError, PortData, PortKind, PsFamily, RegisterData,
    ScalarPort,
};

/// Reader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HwhOptions {
    /// Extra pseudo-instance names that stand for the design boundary.
    /// `{system}_imp` and `External_Ports` are always recognised.
    pub boundary_instances: Vec<String>,
    /// Refresh the design once it is built.
    pub refresh: bool,
}

impl Default for HwhOptions {
    fn default() -> Self {
        Self {
            boundary_instances: Vec::new(),
            refresh: true,
        }
    }
}

/// HWH format handler. Read-only.
#[derive(Debug, Clone, Default)]
pub struct Hwh {
    pub options: HwhOptions,
}

impl Hwh {
    pub fn with_options(options: HwhOptions) -> Self {
        Self { options }
    }
}

impl DesignFormat for Hwh {
    fn name(&self) -> &'static str {
        "HWH"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["hwh"]
    }

    fn mime_type(&self) -> &'static str {
        "application/xml"
    }

    fn capabilities(&self) -> FormatCapability {
        FormatCapability::READ_ONLY
    }

    fn read(&self, input: &[u8]) -> Result<Design, InterchangeError> {
        let document = parse_document(input)?;
        HwhBuilder::new(&document, &self.options)?.build()
    }

    fn write(&self, _design: &Design) -> Result<Vec<u8>, InterchangeError> {
        Err(InterchangeError::Unsupported(
            "HWH files are produced by Vivado and cannot be written".to_string(),
        ))
    }

    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let content = std::str::from_utf8(input)
            .map_err(|e| InterchangeError::xml(format!("Invalid UTF-8: {e}")))?;
        if !content.contains("EDKSYSTEM") && !content.contains("SYSTEMINFO") {
            return Err(InterchangeError::xml("Missing EDKSYSTEM root element"));
        }
        Ok(())
    }
}

// ============================================================================
// XML TREE
// ============================================================================

/// Minimal element tree; HWH files are small enough to hold in memory and
/// the build phases need random access across sections.
#[derive(Debug, Default)]
struct XmlNode {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, key: &str) -> Result<&str, InterchangeError> {
        self.attr(key)
            .ok_or_else(|| InterchangeError::missing_attribute(format!("{}/@{key}", self.tag)))
    }

    fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// All elements named `tag` at any depth below this one, document order.
    fn descendants<'a>(&'a self, tag: &str) -> Vec<&'a XmlNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&XmlNode> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.tag == tag {
                out.push(node);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

fn parse_document(input: &[u8]) -> Result<XmlNode, InterchangeError> {
    use quick_xml::Reader;
    use quick_xml::events::{BytesStart, Event};

    fn element(e: &BytesStart<'_>) -> Result<XmlNode, InterchangeError> {
        let tag = std::str::from_utf8(e.name().as_ref())
            .map_err(|e| InterchangeError::xml(format!("Invalid tag name: {e}")))?
            .to_string();
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| InterchangeError::xml(format!("Invalid attribute: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| InterchangeError::xml(format!("Invalid attribute value: {e}")))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(XmlNode {
            tag,
            attrs,
            children: Vec::new(),
        })
    }

    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut stack = vec![XmlNode::default()];
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(element(e)?),
            Ok(Event::Empty(ref e)) => {
                let node = element(e)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(InterchangeError::xml("Unbalanced closing tag"));
                }
                if let Some(node) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(InterchangeError::xml(format!(
                    "XML parse error at position {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(document), true) => Ok(document),
        _ => Err(InterchangeError::xml("Unclosed element at end of input")),
    }
}

// ============================================================================
// ATTRIBUTE VALUES
// ============================================================================

fn parse_int<T: std::str::FromStr>(node: &XmlNode, key: &str) -> Result<T, InterchangeError> {
    let value = node.require(key)?;
    value.trim().parse().map_err(|_| {
        InterchangeError::invalid_attribute(format!("{}/@{key} is not an integer: {value}", node.tag))
    })
}

/// `0x`-prefixed hex or plain decimal.
fn parse_number(value: &str) -> Option<u64> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Always hex, with or without prefix.
fn parse_hex(node: &XmlNode, key: &str) -> Result<u64, InterchangeError> {
    let value = node.require(key)?;
    let digits = value
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|_| {
        InterchangeError::invalid_attribute(format!("{}/@{key} is not hex: {value}", node.tag))
    })
}

/// Width of a `LEFT`/`RIGHT` bit range; 1 when absent.
fn bit_width(node: &XmlNode) -> Result<u32, InterchangeError> {
    if node.attr("LEFT").is_none() {
        return Ok(1);
    }
    let left: u32 = parse_int(node, "LEFT")?;
    let right: u32 = match node.attr("RIGHT") {
        Some(_) => parse_int(node, "RIGHT")?,
        None => 0,
    };
    Ok(left.abs_diff(right) + 1)
}

fn drives(node: &XmlNode) -> bool {
    node.attr("DIR") == Some("O")
}

fn parse_vlnv(node: &XmlNode) -> Result<Vlnv, InterchangeError> {
    node.require("VLNV")?
        .parse()
        .map_err(|e| InterchangeError::invalid_attribute(format!("{e}")))
}

/// Whether a bus interface `TYPE` initiates transactions.
fn bus_driver(kind: &str) -> bool {
    match kind {
        "MASTER" | "INITIATOR" => true,
        "SLAVE" | "TARGET" | "MONITOR" => false,
        other => {
            warn!(kind = other, "unexpected bus interface type, treating as non-driving");
            false
        }
    }
}

fn bus_port_kind(vlnv: &Vlnv, driver: bool) -> PortKind {
    match vlnv.name.as_str() {
        "aximm" | "lmb" if driver => PortKind::manager(),
        "aximm" | "lmb" => PortKind::Subordinate(Default::default()),
        "axis" => PortKind::stream(driver),
        _ => PortKind::Generic,
    }
}

fn scalar_port_kind(pin: &XmlNode, width: u32) -> PortKind {
    let scalar = ScalarPort {
        width,
        driver: drives(pin),
    };
    match pin.attr("SIGIS") {
        Some("clk") => PortKind::Clock(scalar),
        Some("rst") => PortKind::Reset(scalar),
        _ => PortKind::Scalar(scalar),
    }
}

/// Concrete block payload of a `MODULE` element.
fn classify_module(module: &XmlNode) -> Result<EntityData, InterchangeError> {
    let data = if module.attr("BDTYPE") == Some("BLOCK_CONTAINER") {
        EntityData::module()
    } else if module.attr("IS_PL") == Some("FALSE") {
        let family = match module.attr("MODTYPE") {
            Some("processing_system7") => PsFamily::Zynq,
            Some("zynq_ultra_ps_e") => PsFamily::ZynqUltrascale,
            _ => PsFamily::Generic,
        };
        EntityData::core(CoreVariant::ProcessingSystem(family), parse_vlnv(module)?)
    } else {
        EntityData::core(CoreVariant::Ip, parse_vlnv(module)?)
    };
    Ok(match module.attr("FULLNAME") {
        Some(full) => data.with_hierarchy(full.trim_start_matches('/')),
        None => data,
    })
}

// ============================================================================
// BUILDER
// ============================================================================

/// Bus interface and logical pin behind a physical pin.
type PinIndex<'x> = FxHashMap<&'x str, (&'x str, &'x str)>;

#[derive(Debug, Clone, Copy)]
struct BoundaryPin<'x> {
    bus: &'x str,
    logical: &'x str,
    width: u32,
    driver: bool,
}

struct HwhBuilder<'x> {
    document: &'x XmlNode,
    options: &'x HwhOptions,
    design: Design,
    modules: Vec<&'x XmlNode>,
    /// instance → physical pin → (bus interface, logical pin)
    physical: FxHashMap<&'x str, PinIndex<'x>>,
    /// instance → bus interface → logical pin → raw `PORT` element
    logical: FxHashMap<&'x str, FxHashMap<&'x str, FxHashMap<&'x str, &'x XmlNode>>>,
    boundary: FxHashMap<&'x str, BoundaryPin<'x>>,
}

impl<'x> HwhBuilder<'x> {
    fn new(document: &'x XmlNode, options: &'x HwhOptions) -> Result<Self, InterchangeError> {
        let info = document
            .descendants("SYSTEMINFO")
            .first()
            .copied()
            .ok_or_else(|| InterchangeError::missing_element("SYSTEMINFO"))?;
        let name = info.attr("NAME").unwrap_or_default().to_string();
        Ok(Self {
            document,
            options,
            design: Design::new(name),
            modules: document.descendants("MODULE"),
            physical: FxHashMap::default(),
            logical: FxHashMap::default(),
            boundary: FxHashMap::default(),
        })
    }

    fn build(mut self) -> Result<Design, InterchangeError> {
        self.index_portmaps()?;
        self.populate_cores()?;
        self.index_boundary()?;
        self.create_boundary_ports()?;
        self.resolve_subordinate_windows()?;
        self.populate_register_maps()?;
        self.resolve_manager_maps()?;
        self.connect_signals()?;

        if self.options.refresh {
            self.design.refresh()?;
        }
        debug!(
            design = self.design.name(),
            entities = self.design.len(),
            "built design from HWH"
        );
        Ok(self.design)
    }

    // ── Phase 1: portmap indices ────────────────────────────────────

    fn index_portmaps(&mut self) -> Result<(), InterchangeError> {
        for module in self.modules.clone() {
            let instance = module.require("INSTANCE")?;
            let pins = module.descendants("PORT");
            let by_logical = self.logical.entry(instance).or_default();
            let by_physical = self.physical.entry(instance).or_default();

            for bus in module.descendants("BUSINTERFACE") {
                let bus_name = bus.require("NAME")?;
                let logical = by_logical.entry(bus_name).or_default();
                for portmap in bus.descendants("PORTMAP") {
                    let logical_pin = portmap.require("LOGICAL")?;
                    let physical_pin = portmap.require("PHYSICAL")?;
                    let raw = pins
                        .iter()
                        .find(|p| p.attr("NAME") == Some(physical_pin))
                        .ok_or_else(|| InterchangeError::Missing {
                            kind: "physical pin",
                            name: format!("{instance}/{physical_pin} (logical {logical_pin})"),
                        })?;
                    logical.insert(logical_pin, *raw);
                    by_physical.insert(physical_pin, (bus_name, logical_pin));
                }
            }
        }
        debug!(modules = self.modules.len(), "indexed portmaps");
        Ok(())
    }

    // ── Phase 2: cores, bus ports, free ports ───────────────────────

    fn populate_cores(&mut self) -> Result<(), InterchangeError> {
        let root = self.design.root();
        for module in self.modules.clone() {
            let instance = module.require("INSTANCE")?;
            let mut entity = Entity::new(instance, classify_module(module)?);
            if module.attr("BDTYPE") == Some("BLOCK_CONTAINER") {
                let bd_name = module.attr("BD").unwrap_or_default().to_string();
                entity = entity.with_ext(BLOCK_DESIGN_TAG, Extension::BlockDesign { bd_name });
            }
            let core = self.design.insert(root, entity)?;

            for parameters in module.children_named("PARAMETERS") {
                for parameter in parameters.children_named("PARAMETER") {
                    self.add_parameter(core, parameter)?;
                }
            }

            for bus in module.descendants("BUSINTERFACE") {
                self.add_bus_port(core, instance, bus)?;
            }

            let claimed = self.physical.get(instance);
            for pin in module.descendants("PORT") {
                let name = pin.require("NAME")?;
                if claimed.is_some_and(|c| c.contains_key(name)) {
                    continue;
                }
                let width = bit_width(pin)?;
                let port = self
                    .design
                    .insert(core, Entity::new(name, EntityData::port(scalar_port_kind(pin, width))))?;
                self.design
                    .insert(port, Entity::new(name, EntityData::signal(width, drives(pin))))?;
            }
            trace!(instance, "populated core");
        }
        debug!(cores = self.modules.len(), "populated cores");
        Ok(())
    }

    fn add_parameter(&mut self, owner: EntityId, parameter: &XmlNode) -> Result<(), InterchangeError> {
        let name = parameter.require("NAME")?;
        if self.design.child(owner, name, GenericType::Parameter).is_some() {
            warn!(
                owner = self.design.reference(owner)?,
                parameter = name,
                "duplicate parameter skipped"
            );
            return Ok(());
        }
        let value = parameter.attr("VALUE").map(str::to_string);
        self.design
            .insert(owner, Entity::new(name, EntityData::parameter(value)))?;
        Ok(())
    }

    fn add_bus_port(
        &mut self,
        core: EntityId,
        instance: &'x str,
        bus: &'x XmlNode,
    ) -> Result<(), InterchangeError> {
        let name = bus.require("NAME")?;
        let vlnv = parse_vlnv(bus)?;
        let driver = bus_driver(bus.attr("TYPE").unwrap_or_default());
        let data = EntityData::port(bus_port_kind(&vlnv, driver)).with_vlnv(vlnv);
        let port = self.design.insert(core, Entity::new(name, data))?;

        for parameter in bus.descendants("PARAMETER") {
            self.add_parameter(port, parameter)?;
        }

        for portmap in bus.descendants("PORTMAP") {
            let logical = portmap.require("LOGICAL")?;
            let raw = self
                .logical
                .get(instance)
                .and_then(|buses| buses.get(name))
                .and_then(|pins| pins.get(logical))
                .ok_or_else(|| InterchangeError::unresolved(format!("{instance}/{name}/{logical}")))?;
            let signal = EntityData::signal(bit_width(portmap)?, drives(raw));
            self.design.insert(port, Entity::new(logical, signal))?;
        }
        Ok(())
    }

    // ── Phase 3: design boundary ────────────────────────────────────

    fn external_pins(&self) -> Vec<&'x XmlNode> {
        self.document
            .descendants("EXTERNALPORTS")
            .into_iter()
            .flat_map(|section| section.descendants("PORT"))
            .collect()
    }

    fn external_interfaces(&self) -> Vec<&'x XmlNode> {
        self.document
            .descendants("EXTERNALINTERFACES")
            .into_iter()
            .flat_map(|section| section.descendants("BUSINTERFACE"))
            .collect()
    }

    fn index_boundary(&mut self) -> Result<(), InterchangeError> {
        let pins = self.external_pins();
        for bus in self.external_interfaces() {
            let bus_name = bus.require("NAME")?;
            for portmap in bus.descendants("PORTMAP") {
                let physical = portmap.require("PHYSICAL")?;
                let raw = pins.iter().find(|p| p.attr("NAME") == Some(physical));
                let (width, driver) = match raw {
                    Some(raw) => (bit_width(raw)?, drives(raw)),
                    None => (1, false),
                };
                self.boundary.insert(
                    physical,
                    BoundaryPin {
                        bus: bus_name,
                        logical: portmap.require("LOGICAL")?,
                        width,
                        driver,
                    },
                );
            }
        }
        Ok(())
    }

    fn create_boundary_ports(&mut self) -> Result<(), InterchangeError> {
        let root = self.design.root();
        for bus in self.external_interfaces() {
            let name = bus.require("NAME")?;
            let driver = matches!(bus.attr("TYPE"), Some("INITIATOR" | "MASTER"));
            let mut kind = PortKind::Generic;
            for parameter in bus.descendants("PARAMETER") {
                match parameter.attr("NAME") {
                    Some("HAS_QOS") if driver => kind = PortKind::manager(),
                    Some("HAS_QOS") => kind = PortKind::Subordinate(Default::default()),
                    Some("HAS_TLAST") => kind = PortKind::stream(driver),
                    _ => {}
                }
            }
            let port = self
                .design
                .insert(root, Entity::new(name, EntityData::port(kind).external()))?;
            for parameter in bus.descendants("PARAMETER") {
                self.add_parameter(port, parameter)?;
            }
            for portmap in bus.descendants("PORTMAP") {
                let Some(pin) = self.boundary.get(portmap.require("PHYSICAL")?).copied() else {
                    continue;
                };
                let signal = EntityData::signal(pin.width, pin.driver).external();
                self.design.insert(port, Entity::new(pin.logical, signal))?;
            }
        }

        for pin in self.external_pins() {
            let name = pin.require("NAME")?;
            if self.boundary.contains_key(name) {
                continue;
            }
            let width = bit_width(pin)?;
            let port = self.design.insert(
                root,
                Entity::new(name, EntityData::port(scalar_port_kind(pin, width)).external()),
            )?;
            self.design.insert(
                port,
                Entity::new(name, EntityData::signal(width, drives(pin)).external()),
            )?;
        }
        debug!(pins = self.boundary.len(), "created boundary ports");
        Ok(())
    }

    // ── Phase 4: addressing ─────────────────────────────────────────

    fn block(&self, instance: &str) -> Option<EntityId> {
        self.design
            .child(self.design.root(), instance, GenericType::Block)
    }

    fn block_port(&self, instance: &str, port: &str) -> Option<EntityId> {
        self.block(instance)
            .and_then(|block| self.design.child(block, port, GenericType::Port))
    }

    fn resolve_subordinate_windows(&mut self) -> Result<(), InterchangeError> {
        let root = self.design.root();
        let document = self.document;
        for range in document.descendants("MEMRANGE") {
            if range.attr("MEMTYPE").and_then(MemoryType::parse).is_none() {
                continue;
            }
            let instance = range.require("INSTANCE")?;
            let port = match self.design.child(root, instance, GenericType::Port) {
                Some(port) => Some(port),
                None => range
                    .attr("SLAVEBUSINTERFACE")
                    .and_then(|bus| self.block_port(instance, bus)),
            };
            let Some(port) = port else {
                trace!(instance, "address range names an unloaded port, skipped");
                continue;
            };

            let base = parse_hex(range, "BASEVALUE")?;
            let high = parse_hex(range, "HIGHVALUE")?;
            let span = high.checked_sub(base).ok_or_else(|| {
                InterchangeError::invalid_attribute(format!(
                    "MEMRANGE {instance}: HIGHVALUE {high:#x} below BASEVALUE {base:#x}"
                ))
            })?;

            let entity = self.design.entity(port)?;
            match entity.data().as_port() {
                Some(PortData {
                    kind: PortKind::Subordinate(_),
                    ..
                }) => {
                    self.design.update(port, |data| {
                        if let EntityData::Port(port) = data {
                            port.kind = PortKind::subordinate(base, span + 1);
                        }
                    })?;
                }
                Some(PortData {
                    kind: PortKind::Manager(_),
                    external: true,
                    ..
                }) => {}
                _ => {
                    return Err(
                        MetadataError::type_mismatch("subordinate port", entity.type_name()).into(),
                    );
                }
            }
        }
        Ok(())
    }

    /// Subordinate port an `ADDRESSBLOCK` interface name refers to.
    fn register_port(&self, core: EntityId, interface: &str) -> Option<EntityId> {
        let candidates = [
            interface.to_string(),
            interface.to_lowercase(),
            interface.to_uppercase(),
        ];
        candidates
            .iter()
            .find_map(|name| self.design.child(core, name, GenericType::Port))
            .or_else(|| {
                (interface == "aximm")
                    .then(|| self.design.child(core, "AXI_FULL", GenericType::Port))
                    .flatten()
            })
    }

    fn populate_register_maps(&mut self) -> Result<(), InterchangeError> {
        let mut registers = 0usize;
        for module in self.modules.clone() {
            let instance = module.require("INSTANCE")?;
            let core = self
                .block(instance)
                .ok_or_else(|| InterchangeError::unresolved(instance))?;

            for block in module.descendants("ADDRESSBLOCK") {
                let usage = block.attr("USAGE").unwrap_or_default();
                if usage != "register" && usage != "memory" {
                    continue;
                }
                let interface = block.attr("INTERFACE").unwrap_or_default();
                let Some(port) = self.register_port(core, interface) else {
                    trace!(instance, interface, "address block without a matching port");
                    continue;
                };
                let entity = self.design.entity(port)?;
                if !matches!(
                    entity.data().as_port().map(|p| &p.kind),
                    Some(PortKind::Subordinate(_))
                ) {
                    return Err(
                        MetadataError::type_mismatch("subordinate port", entity.type_name()).into(),
                    );
                }

                for register in block.descendants("REGISTER") {
                    if self.add_register(port, register, usage == "memory")? {
                        registers += 1;
                    }
                }
            }
        }
        debug!(registers, "populated register maps");
        Ok(())
    }

    fn add_register(
        &mut self,
        port: EntityId,
        register: &XmlNode,
        memory: bool,
    ) -> Result<bool, InterchangeError> {
        let name = register.require("NAME")?;
        if self.design.child(port, name, GenericType::Register).is_some() {
            warn!(
                port = self.design.reference(port)?,
                register = name,
                "duplicate register skipped"
            );
            return Ok(false);
        }

        let mut data = RegisterData {
            description: String::new(),
            enabled: memory,
            ..RegisterData::default()
        };
        for property in register.children_named("PROPERTY") {
            let value = property.attr("VALUE").unwrap_or_default();
            match property.attr("NAME") {
                Some("DESCRIPTION") => data.description = value.to_string(),
                Some("ADDRESS_OFFSET") => {
                    data.offset = parse_number(value).ok_or_else(|| {
                        InterchangeError::invalid_attribute(format!(
                            "register {name}: ADDRESS_OFFSET {value}"
                        ))
                    })?;
                }
                Some("SIZE") => data.width = parse_int(property, "VALUE")?,
                Some("IS_ENABLED") if !memory => data.enabled = value == "true",
                Some("ACCESS") => data.access = value.to_string(),
                _ => {}
            }
        }
        let id = self
            .design
            .insert(port, Entity::new(name, EntityData::Register(data)))?;

        for field in register.descendants("FIELD") {
            let field_name = field.require("NAME")?;
            if self.design.child(id, field_name, GenericType::BitField).is_some() {
                warn!(register = name, field = field_name, "duplicate bit field skipped");
                continue;
            }
            let mut data = BitFieldData {
                description: String::new(),
                ..BitFieldData::default()
            };
            let mut bits = 1u32;
            for property in field.descendants("PROPERTY") {
                let value = property.attr("VALUE").unwrap_or_default();
                match property.attr("NAME") {
                    Some("DESCRIPTION") => data.description = value.to_string(),
                    Some("BIT_OFFSET") => data.lsb = parse_int(property, "VALUE")?,
                    Some("BIT_WIDTH") => bits = parse_int(property, "VALUE")?,
                    Some("ACCESS") => data.access = value.to_string(),
                    _ => {}
                }
            }
            data.msb = data.lsb + bits.saturating_sub(1);
            self.design
                .insert(id, Entity::new(field_name, EntityData::BitField(data)))?;
        }
        Ok(true)
    }

    fn resolve_manager_maps(&mut self) -> Result<(), InterchangeError> {
        let mut entries = 0usize;
        for module in self.modules.clone() {
            let instance = module.require("INSTANCE")?;
            for range in module.descendants("MEMRANGE") {
                let manager = range
                    .attr("MASTERBUSINTERFACE")
                    .and_then(|bus| self.block_port(instance, bus));
                let subordinate = range.attr("INSTANCE").zip(range.attr("SLAVEBUSINTERFACE"));
                let subordinate = subordinate.and_then(|(i, bus)| self.block_port(i, bus));
                let memtype = range.attr("MEMTYPE").and_then(MemoryType::parse);

                let (Some(manager), Some(subordinate), Some(memtype)) =
                    (manager, subordinate, memtype)
                else {
                    trace!(instance, "address range into an unloaded region, skipped");
                    continue;
                };
                let block = range.attr("ADDRESSBLOCK").unwrap_or_default();
                match self.design.addrmap_add(manager, block, memtype, subordinate) {
                    Ok(()) => entries += 1,
                    Err(e) => trace!(instance, error = %e, "address map entry skipped"),
                }
            }
        }
        debug!(entries, "resolved manager address maps");
        Ok(())
    }

    // ── Phase 5: connections ────────────────────────────────────────

    fn is_boundary(&self, instance: &str) -> bool {
        instance == "External_Ports"
            || instance
                .strip_suffix("_imp")
                .is_some_and(|system| system == self.design.name())
            || self.options.boundary_instances.iter().any(|b| b == instance)
    }

    fn core_signal(&self, instance: &str, pin: &str) -> Result<EntityId, InterchangeError> {
        let (bus, logical) = self
            .physical
            .get(instance)
            .and_then(|pins| pins.get(pin))
            .copied()
            .unwrap_or((pin, pin));
        self.block_port(instance, bus)
            .and_then(|port| self.design.child(port, logical, GenericType::Signal))
            .ok_or_else(|| InterchangeError::unresolved(format!("{instance}/{pin}")))
    }

    fn boundary_signal(&self, pin: &str) -> Result<EntityId, InterchangeError> {
        let (bus, logical) = self
            .boundary
            .get(pin)
            .map(|b| (b.bus, b.logical))
            .unwrap_or((pin, pin));
        self.design
            .child(self.design.root(), bus, GenericType::Port)
            .and_then(|port| self.design.child(port, logical, GenericType::Signal))
            .ok_or_else(|| InterchangeError::unresolved(format!("boundary/{pin}")))
    }

    fn connect_signals(&mut self) -> Result<(), InterchangeError> {
        let mut seen = FxHashSet::default();
        for module in self.modules.clone() {
            let instance = module.require("INSTANCE")?;
            for pin in module.descendants("PORT") {
                let connections = pin.descendants("CONNECTION");
                if connections.is_empty() {
                    continue;
                }
                let signal = self.core_signal(instance, pin.require("NAME")?)?;

                for connection in connections {
                    let target = connection.require("INSTANCE")?;
                    let target_pin = connection.require("PORT")?;
                    let peer = if self.is_boundary(target) {
                        let peer = self.boundary_signal(target_pin)?;
                        self.inherit_vlnv(signal, peer)?;
                        peer
                    } else {
                        self.core_signal(target, target_pin)?
                    };
                    self.design.connect(signal, peer)?;
                    seen.insert((signal.min(peer), signal.max(peer)));
                }
            }
        }
        debug!(connections = seen.len(), "connected signals");
        Ok(())
    }

    /// Boundary ports carry no VLNV of their own; they take the one of the
    /// internal port wired to them.
    fn inherit_vlnv(&mut self, internal: EntityId, boundary: EntityId) -> Result<(), InterchangeError> {
        let owner = |id| self.design.entity(id).map(|e| e.owner());
        let (Some(src), Some(dst)) = (owner(internal)?, owner(boundary)?) else {
            return Ok(());
        };
        let Some(vlnv) = self.design.entity(src)?.data().as_port().and_then(|p| p.vlnv.clone())
        else {
            return Ok(());
        };
        self.design.update(dst, |data| {
            if let EntityData::Port(port) = data {
                port.vlnv = Some(vlnv);
            }
        })?;
        Ok(())
    }
}
