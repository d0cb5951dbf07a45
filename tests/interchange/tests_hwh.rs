//! Building designs from hardware handoff files.

#[cfg(feature = "interchange")]
mod hwh {
    use hwmeta::model::{EntityData, GenericType, MemoryType, PortKind, bus_key};
    use hwmeta::interchange::{DesignFormat, DesignHost, Hwh, HwhOptions, InterchangeError};
    use hwmeta::{Design, MetadataError};
    use rstest::rstest;

    use crate::helpers::fixtures::{DMA_GPIO_HWH, NESTED_HIERARCHY_HWH, OPPOSED_DRIVERS_HWH};

    fn design() -> Design {
        Hwh::default().read(DMA_GPIO_HWH.as_bytes()).unwrap()
    }

    #[test]
    fn system_name_becomes_the_root() {
        let design = design();
        assert_eq!(design.name(), "top");
        let blocks: Vec<&str> = design
            .blocks(design.root())
            .map(|b| design.get(b).unwrap().name())
            .collect();
        assert_eq!(blocks, vec!["dma0", "mem0", "ps7"]);
    }

    #[test]
    fn manager_and_subordinate_form_one_bus_each_way() {
        let design = design();
        let forward = bus_key("top:dma0[block]:M_AXI[port]", "top:mem0[block]:S_AXI[port]");
        let backward = bus_key("top:mem0[block]:S_AXI[port]", "top:dma0[block]:M_AXI[port]");
        let names: Vec<&str> = design.busses(design.root()).map(|b| b.name.as_str()).collect();
        assert_eq!(names.iter().filter(|n| **n == forward).count(), 1);
        assert_eq!(names.iter().filter(|n| **n == backward).count(), 1);
    }

    #[test]
    fn memory_range_sets_the_window_and_the_map() {
        let design = design();
        let subordinate = design.lookup("mem0[block]:S_AXI[port]").unwrap();
        let window = design.address_window(subordinate).unwrap();
        assert_eq!(window.base_address, 0x4000_0000);
        assert_eq!(window.range, 0x1_0000);

        let manager = design.lookup("dma0[block]:M_AXI[port]").unwrap();
        let map = design.address_map(manager).unwrap();
        assert_eq!(map.len(), 1);
        let entry = map.get("top:mem0[block]:S_AXI[port]").unwrap();
        assert_eq!(entry.block, "Reg");
        assert_eq!(entry.memtype, MemoryType::Register);
        assert_eq!(entry.subordinate(), Some(subordinate));
    }

    #[test]
    fn portmaps_name_signals_by_logical_pin() {
        let design = design();
        let awaddr = design
            .lookup("dma0[block]:M_AXI[port]:AWADDR[signal]")
            .unwrap();
        let signal = design.get(awaddr).unwrap().data().as_signal().unwrap();
        assert_eq!(signal.width, 32);
        assert!(signal.driver);

        let peer = design
            .lookup("mem0[block]:S_AXI[port]:AWADDR[signal]")
            .unwrap();
        assert_eq!(design.connections(awaddr).unwrap(), vec![peer]);
        assert_eq!(design.connections(peer).unwrap(), vec![awaddr]);
        assert!(design.lookup("dma0[block]:m_axi_awaddr[port]").is_err());
    }

    #[test]
    fn free_pins_become_scalar_ports() {
        let design = design();
        let intr = design.lookup("dma0[block]:introut[port]").unwrap();
        assert!(matches!(
            design.get(intr).unwrap().data().as_port().map(|p| &p.kind),
            Some(PortKind::Scalar(s)) if s.driver
        ));
        let clk = design.lookup("dma0[block]:m_axi_aclk[port]").unwrap();
        assert!(matches!(
            design.get(clk).unwrap().data().as_port().map(|p| &p.kind),
            Some(PortKind::Clock(_))
        ));
    }

    #[test]
    fn boundary_pins_are_external_and_shared() {
        let design = design();
        let sys_clk = design.lookup("sys_clk[port]:sys_clk[signal]").unwrap();
        let signal = design.get(sys_clk).unwrap().data().as_signal().unwrap();
        assert!(signal.external);
        let peers = design.con_refs(sys_clk).unwrap();
        assert_eq!(peers.len(), 2);
        assert!(peers.contains(&"top:dma0[block]:m_axi_aclk[port]:m_axi_aclk[signal]".to_string()));
        assert!(peers.contains(&"top:mem0[block]:s_axi_aclk[port]:s_axi_aclk[signal]".to_string()));
    }

    #[test]
    fn boundary_interfaces_inherit_the_internal_vlnv() {
        let design = design();
        let leds = design.lookup("leds_gpio[port]").unwrap();
        let port = design.get(leds).unwrap().data().as_port().unwrap();
        assert!(port.external);
        assert_eq!(port.vlnv.as_ref().map(|v| v.name.as_str()), Some("gpio"));

        let tri_o = design.lookup("leds_gpio[port]:TRI_O[signal]").unwrap();
        let width = design.get(tri_o).unwrap().data().as_signal().unwrap().width;
        assert_eq!(width, 8);
    }

    #[test]
    fn registers_and_fields_are_read() {
        let design = design();
        let data = design
            .lookup("mem0[block]:S_AXI[port]:GPIO_DATA[register]")
            .unwrap();
        match design.get(data).unwrap().data() {
            EntityData::Register(r) => {
                assert_eq!(r.offset, 0);
                assert_eq!(r.width, 32);
                assert!(r.enabled);
                assert_eq!(r.description, "Channel 1 AXI GPIO Data Register.");
            }
            other => panic!("expected register, got {}", other.kind()),
        }
        let tri = design
            .lookup("mem0[block]:S_AXI[port]:gpio_tri[register]")
            .unwrap();
        match design.get(tri).unwrap().data() {
            EntityData::Register(r) => {
                assert_eq!(r.offset, 4);
                assert!(!r.enabled);
            }
            other => panic!("expected register, got {}", other.kind()),
        }

        let field = design
            .lookup("mem0[block]:S_AXI[port]:GPIO_DATA[register]:Channel_1_GPIO_DATA[bitfield]")
            .unwrap();
        match design.get(field).unwrap().data() {
            EntityData::BitField(f) => assert_eq!((f.lsb, f.msb), (0, 7)),
            other => panic!("expected bit field, got {}", other.kind()),
        }
    }

    #[test]
    fn bare_registers_take_the_defaults() {
        let design = design();
        let scratch = design
            .lookup("mem0[block]:S_AXI[port]:GPIO_SCRATCH[register]")
            .unwrap();
        match design.get(scratch).unwrap().data() {
            EntityData::Register(r) => {
                assert_eq!(r.offset, 8);
                assert_eq!(r.width, 32);
                assert!(!r.enabled);
                assert_eq!(r.access, "read-write");
                assert_eq!(r.description, "");
            }
            other => panic!("expected register, got {}", other.kind()),
        }
    }

    #[test]
    fn missing_system_info_is_rejected() {
        let err = Hwh::default()
            .read(b"<EDKSYSTEM><MODULES/></EDKSYSTEM>")
            .unwrap_err();
        assert!(matches!(
            err,
            InterchangeError::Missing { kind: "element", ref name } if name == "SYSTEMINFO"
        ));
    }

    #[test]
    fn processing_system_clocks() {
        let design = design();
        let ps = design.processing_systems(design.root());
        assert_eq!(ps.len(), 1);
        let ps = ps[0];
        assert_eq!(design.get(ps).unwrap().type_name(), "core-zynq_arm");
        assert_eq!(design.clock_divisor(ps, 0, 0).unwrap(), 5);
        assert_eq!(design.clock_divisor(ps, 0, 1).unwrap(), 2);
        assert!(design.clock_enabled(ps, 0).unwrap());
        assert!(!design.clock_enabled(ps, 1).unwrap());
        assert_eq!(design.clock_source(ps, 0).unwrap(), "IO PLL");
        assert!(design.clock_divisor(ps, 3, 0).is_err());

        let irqs = design.irq_signals(ps).unwrap();
        assert_eq!(irqs.len(), 1);
        assert_eq!(irqs[0].0, "IRQ_F2P");

        let gpio = design.gpio_port(ps).unwrap().unwrap();
        assert_eq!(design.reference(gpio).unwrap(), "top:ps7[block]:GPIO_0[port]");
        let tri_o = design.child(gpio, "TRI_O", GenericType::Signal).unwrap();
        assert_eq!(design.get(tri_o).unwrap().data().as_signal().unwrap().width, 64);
    }

    #[test]
    fn hierarchy_follows_full_names() {
        let design = design();
        let mem0 = design.lookup("mem0[block]").unwrap();
        assert_eq!(design.hierarchy("periph").unwrap().core("mem0"), Some(mem0));

        let nested = Hwh::default()
            .read(NESTED_HIERARCHY_HWH.as_bytes())
            .unwrap();
        let leaf = nested.lookup("leaf[block]").unwrap();
        assert_eq!(nested.hierarchy("a/b/c").unwrap().core("leaf"), Some(leaf));
        assert!(nested.hierarchy("a/b").unwrap().core("sibling").is_some());
        assert!(nested.hierarchy_root(nested.root()).unwrap().core("top_core").is_some());
    }

    #[test]
    fn parameters_keep_their_values() {
        let design = design();
        let mem0 = design.lookup("mem0[block]").unwrap();
        assert_eq!(design.parameter_value(mem0, "C_GPIO_WIDTH"), Some("8"));
        let port = design.lookup("dma0[block]:M_AXI[port]").unwrap();
        assert_eq!(design.parameter_value(port, "PROTOCOL"), Some("AXI4LITE"));
        assert!(design.child(port, "ADDR_WIDTH", GenericType::Parameter).is_some());
    }

    #[test]
    fn two_outputs_on_one_wire_fail() {
        let err = Hwh::default()
            .read(OPPOSED_DRIVERS_HWH.as_bytes())
            .unwrap_err();
        assert!(matches!(
            err,
            InterchangeError::Metadata(MetadataError::WrongPolarity { .. })
        ));
    }

    #[test]
    fn refresh_can_be_deferred() {
        let options = HwhOptions {
            refresh: false,
            ..HwhOptions::default()
        };
        let host = DesignHost::from_hwh_str_with(DMA_GPIO_HWH, options).unwrap();
        let design = host.design();
        assert_eq!(design.busses(design.root()).count(), 0);
    }

    #[rstest]
    #[case(r#"<MODULE INSTANCE="c" VLNV="xilinx.com:ip:axi_gpio:2.0"/>"#, "core-ip")]
    #[case(
        r#"<MODULE INSTANCE="c" IS_PL="FALSE" MODTYPE="processing_system7" VLNV="xilinx.com:ip:processing_system7:5.5"/>"#,
        "core-zynq_arm"
    )]
    #[case(
        r#"<MODULE INSTANCE="c" IS_PL="FALSE" MODTYPE="zynq_ultra_ps_e" VLNV="xilinx.com:ip:zynq_ultra_ps_e:3.4"/>"#,
        "core-zynq_aarch64"
    )]
    #[case(r#"<MODULE INSTANCE="c" BDTYPE="BLOCK_CONTAINER" BD="region"/>"#, "module")]
    fn modules_are_classified(#[case] module: &str, #[case] type_name: &str) {
        let xml = format!(
            r#"<EDKSYSTEM><SYSTEMINFO NAME="top"/><MODULES>{module}</MODULES></EDKSYSTEM>"#
        );
        let host = DesignHost::from_hwh_str(&xml).unwrap();
        let c = host.design().lookup("c[block]").unwrap();
        assert_eq!(host.design().get(c).unwrap().type_name(), type_name);
    }

    #[test]
    fn hwh_is_read_only() {
        let design = design();
        assert!(matches!(
            Hwh::default().write(&design),
            Err(InterchangeError::Unsupported(_))
        ));
        assert!(Hwh::default().validate(b"<html/>").is_err());
        assert!(Hwh::default().validate(DMA_GPIO_HWH.as_bytes()).is_ok());
    }
}
