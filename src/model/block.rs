//! Core and module queries, including processing-system clock and
//! interrupt conventions.

use super::entity::{CoreData, EntityId};
use super::kind::{CoreVariant, PsFamily};
use super::{Design, GenericType, MetadataError};

const ZYNQ_IRQ_F2P: &[(u32, u32)] = &[(61, 8), (84, 8)];
const ULTRASCALE_IRQ0: &[(u32, u32)] = &[(121, 8)];
const ULTRASCALE_IRQ1: &[(u32, u32)] = &[(136, 8)];

impl PsFamily {
    /// Parameter holding output divisor `div` of PL clock `clk`.
    pub fn clock_divisor_param(self, clk: u32, div: u32) -> String {
        match self {
            PsFamily::Zynq => format!("PCW_FCLK{clk}_PERIPHERAL_DIVISOR{div}"),
            _ => format!("PSU__CRL_APB__PL{clk}_REF_CTRL__DIVISOR{div}"),
        }
    }

    pub fn clock_enable_param(self, clk: u32) -> String {
        match self {
            PsFamily::Zynq => format!("PCW_FPGA_FCLK{clk}_ENABLE"),
            _ => format!("PSU__FPGA_PL{clk}_ENABLE"),
        }
    }

    pub fn clock_select_param(self, clk: u32) -> String {
        match self {
            PsFamily::Zynq => format!("PCW_FCLK{clk}_PERIPHERAL_CLKSRC"),
            _ => format!("PSU__CRL_APB__PL{clk}_REF_CTRL__SRCSEL"),
        }
    }

    /// Interrupt input pins and their `(first irq, count)` runs.
    pub fn irq_layout(self) -> &'static [(&'static str, &'static [(u32, u32)])] {
        match self {
            PsFamily::Zynq => &[("IRQ_F2P", ZYNQ_IRQ_F2P)],
            PsFamily::ZynqUltrascale => &[
                ("pl_ps_irq0", ULTRASCALE_IRQ0),
                ("pl_ps_irq1", ULTRASCALE_IRQ1),
            ],
            PsFamily::Generic => &[],
        }
    }

    /// EMIO GPIO bus interface name, where the family exposes one.
    pub fn gpio_port(self) -> Option<&'static str> {
        match self {
            PsFamily::Zynq => Some("GPIO_0"),
            _ => None,
        }
    }

    /// Flattened interrupt numbers in pin order.
    pub fn irq_map(self) -> Vec<u32> {
        self.irq_layout()
            .iter()
            .flat_map(|(_, runs)| runs.iter())
            .flat_map(|(base, count)| *base..*base + *count)
            .collect()
    }
}

impl Design {
    pub fn core(&self, id: EntityId) -> Result<&CoreData, MetadataError> {
        let entity = self.entity(id)?;
        entity
            .data()
            .as_core()
            .ok_or_else(|| MetadataError::type_mismatch("core", entity.type_name()))
    }

    fn ps_family(&self, id: EntityId) -> Result<PsFamily, MetadataError> {
        match self.core(id)?.variant {
            CoreVariant::ProcessingSystem(family) => Ok(family),
            _ => Err(MetadataError::type_mismatch(
                "processing system",
                self.entity(id)?.type_name(),
            )),
        }
    }

    fn required_parameter(&self, core: EntityId, name: &str) -> Result<&str, MetadataError> {
        self.parameter_value(core, name).ok_or_else(|| {
            MetadataError::not_found("parameter", format!("{} on {}", name, self.reference(core).unwrap_or("?")))
        })
    }

    pub fn clock_divisor(&self, ps: EntityId, clk: u32, div: u32) -> Result<u32, MetadataError> {
        let name = self.ps_family(ps)?.clock_divisor_param(clk, div);
        let value = self.required_parameter(ps, &name)?;
        value
            .trim()
            .parse()
            .map_err(|_| MetadataError::type_mismatch("integer divisor", value))
    }

    /// A missing value reads as disabled; a missing parameter is an error.
    pub fn clock_enabled(&self, ps: EntityId, clk: u32) -> Result<bool, MetadataError> {
        let name = self.ps_family(ps)?.clock_enable_param(clk);
        let param = self
            .child(ps, &name, GenericType::Parameter)
            .ok_or_else(|| MetadataError::not_found("parameter", name.clone()))?;
        Ok(self
            .entity(param)?
            .data()
            .as_parameter()
            .and_then(|p| p.value.as_deref())
            .and_then(|v| v.trim().parse::<i64>().ok())
            == Some(1))
    }

    /// Selected source PLL of a PL clock.
    pub fn clock_source(&self, ps: EntityId, clk: u32) -> Result<&str, MetadataError> {
        let name = self.ps_family(ps)?.clock_select_param(clk);
        self.required_parameter(ps, &name)
    }

    /// Interrupt pins of the layout that exist on the core, with their signal.
    pub fn irq_signals(&self, ps: EntityId) -> Result<Vec<(&'static str, EntityId)>, MetadataError> {
        let family = self.ps_family(ps)?;
        let mut out = Vec::new();
        for (pin, _) in family.irq_layout() {
            if let Some(port) = self.child(ps, pin, GenericType::Port) {
                if let Some(signal) = self.sole_signal(port)? {
                    out.push((*pin, signal));
                }
            }
        }
        Ok(out)
    }

    /// The EMIO GPIO port of a processing system, if the core carries one.
    pub fn gpio_port(&self, ps: EntityId) -> Result<Option<EntityId>, MetadataError> {
        Ok(self
            .ps_family(ps)?
            .gpio_port()
            .and_then(|name| self.child(ps, name, GenericType::Port)))
    }

    /// Processing-system cores directly inside `module`.
    pub fn processing_systems(&self, module: EntityId) -> Vec<EntityId> {
        self.blocks(module)
            .filter(|b| {
                self.core(*b)
                    .is_ok_and(|c| matches!(c.variant, CoreVariant::ProcessingSystem(_)))
            })
            .collect()
    }

    /// Blocks named `name` anywhere below `module`, descending into nested modules.
    pub fn block_instances(&self, module: EntityId, name: &str) -> Vec<EntityId> {
        let mut out = Vec::new();
        for block in self.blocks(module) {
            let Some(entity) = self.get(block) else {
                continue;
            };
            if entity.name() == name {
                out.push(block);
            }
            if entity.data().as_module().is_some() {
                out.extend(self.block_instances(block, name));
            }
        }
        out
    }
}
