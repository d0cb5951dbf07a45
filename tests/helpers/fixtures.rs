//! Hardware handoff fixtures shared by the integration tests.

/// A DMA engine driving an AXI GPIO through one AXI4-Lite link, a Zynq
/// processing system, a clock pin and an LED interface on the boundary.
pub const DMA_GPIO_HWH: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<EDKSYSTEM EDWVERSION="1.2" TIMESTAMP="Mon Oct  3 10:12:45 2022" VIVADOVERSION="2022.1">
  <SYSTEMINFO ARCH="zynq" BOARD="www.digilentinc.com:pynq-z1:part0:1.0" DEVICE="7z020" NAME="top" PACKAGE="clg400" SPEEDGRADE="-1"/>
  <EXTERNALPORTS>
    <PORT CLKFREQUENCY="100000000" DIR="I" NAME="sys_clk" SIGIS="clk" SIGNAME="External_Ports_sys_clk">
      <CONNECTIONS>
        <CONNECTION INSTANCE="dma0" PORT="m_axi_aclk"/>
        <CONNECTION INSTANCE="mem0" PORT="s_axi_aclk"/>
      </CONNECTIONS>
    </PORT>
    <PORT DIR="O" LEFT="7" NAME="leds" RIGHT="0" SIGIS="undef" SIGNAME="mem0_gpio_io_o">
      <CONNECTIONS>
        <CONNECTION INSTANCE="mem0" PORT="gpio_io_o"/>
      </CONNECTIONS>
    </PORT>
  </EXTERNALPORTS>
  <EXTERNALINTERFACES>
    <BUSINTERFACE BUSNAME="mem0_GPIO" NAME="leds_gpio" TYPE="INITIATOR" VLNV="xilinx.com:interface:gpio:1.0">
      <PORTMAPS>
        <PORTMAP LOGICAL="TRI_O" PHYSICAL="leds"/>
      </PORTMAPS>
    </BUSINTERFACE>
  </EXTERNALINTERFACES>
  <MODULES>
    <MODULE COREREVISION="25" FULLNAME="/dma0" HWVERSION="7.1" INSTANCE="dma0" IPTYPE="PERIPHERAL" IS_ENABLE="1" MODCLASS="PERIPHERAL" MODTYPE="axi_dma" VLNV="xilinx.com:ip:axi_dma:7.1">
      <DOCUMENTS/>
      <PARAMETERS>
        <PARAMETER NAME="C_M_AXI_ADDR_WIDTH" VALUE="32"/>
        <PARAMETER NAME="C_FAMILY" VALUE="zynq"/>
      </PARAMETERS>
      <MEMORYMAP>
        <MEMRANGE ADDRESSBLOCK="Reg" BASENAME="C_BASEADDR" BASEVALUE="0x40000000" HIGHNAME="C_HIGHADDR" HIGHVALUE="0x4000FFFF" INSTANCE="mem0" IS_DATA="TRUE" IS_INSTRUCTION="TRUE" MASTERBUSINTERFACE="M_AXI" MEMTYPE="REGISTER" SLAVEBUSINTERFACE="S_AXI"/>
      </MEMORYMAP>
      <PORTS>
        <PORT CLKFREQUENCY="100000000" DIR="I" NAME="m_axi_aclk" SIGIS="clk" SIGNAME="External_Ports_sys_clk">
          <CONNECTIONS>
            <CONNECTION INSTANCE="External_Ports" PORT="sys_clk"/>
          </CONNECTIONS>
        </PORT>
        <PORT DIR="O" LEFT="31" NAME="m_axi_awaddr" RIGHT="0" SIGIS="undef" SIGNAME="dma0_m_axi_awaddr">
          <CONNECTIONS>
            <CONNECTION INSTANCE="mem0" PORT="s_axi_awaddr"/>
          </CONNECTIONS>
        </PORT>
        <PORT DIR="O" NAME="m_axi_awvalid" SIGIS="undef" SIGNAME="dma0_m_axi_awvalid">
          <CONNECTIONS>
            <CONNECTION INSTANCE="mem0" PORT="s_axi_awvalid"/>
          </CONNECTIONS>
        </PORT>
        <PORT DIR="I" NAME="m_axi_awready" SIGIS="undef" SIGNAME="mem0_s_axi_awready">
          <CONNECTIONS>
            <CONNECTION INSTANCE="mem0" PORT="s_axi_awready"/>
          </CONNECTIONS>
        </PORT>
        <PORT DIR="O" NAME="introut" SIGIS="INTERRUPT" SENSITIVITY="LEVEL_HIGH"/>
      </PORTS>
      <BUSINTERFACES>
        <BUSINTERFACE BUSNAME="dma0_M_AXI" DATAWIDTH="32" NAME="M_AXI" TYPE="MASTER" VLNV="xilinx.com:interface:aximm:1.0">
          <PARAMETER NAME="PROTOCOL" VALUE="AXI4LITE"/>
          <PARAMETER NAME="ADDR_WIDTH" VALUE="32"/>
          <PORTMAPS>
            <PORTMAP LEFT="31" LOGICAL="AWADDR" PHYSICAL="m_axi_awaddr" RIGHT="0"/>
            <PORTMAP LOGICAL="AWVALID" PHYSICAL="m_axi_awvalid"/>
            <PORTMAP LOGICAL="AWREADY" PHYSICAL="m_axi_awready"/>
          </PORTMAPS>
        </BUSINTERFACE>
      </BUSINTERFACES>
    </MODULE>
    <MODULE COREREVISION="27" FULLNAME="/periph/mem0" HWVERSION="2.0" INSTANCE="mem0" IPTYPE="PERIPHERAL" IS_ENABLE="1" MODCLASS="PERIPHERAL" MODTYPE="axi_gpio" VLNV="xilinx.com:ip:axi_gpio:2.0">
      <DOCUMENTS/>
      <ADDRESSBLOCKS>
        <ADDRESSBLOCK ACCESS="read-write" INTERFACE="S_AXI" NAME="Reg" RANGE="65536" USAGE="register">
          <REGISTERS>
            <REGISTER NAME="GPIO_DATA">
              <PROPERTY NAME="DESCRIPTION" VALUE="Channel 1 AXI GPIO Data Register."/>
              <PROPERTY NAME="ADDRESS_OFFSET" VALUE="0x0"/>
              <PROPERTY NAME="SIZE" VALUE="32"/>
              <PROPERTY NAME="ACCESS" VALUE="read-write"/>
              <PROPERTY NAME="IS_ENABLED" VALUE="true"/>
              <PROPERTY NAME="RESET_VALUE" VALUE="0x0"/>
              <FIELDS>
                <FIELD NAME="Channel_1_GPIO_DATA">
                  <PROPERTY NAME="DESCRIPTION" VALUE="AXI GPIO Data Register."/>
                  <PROPERTY NAME="ADDRESS_OFFSET" VALUE="0x0"/>
                  <PROPERTY NAME="ACCESS" VALUE="read-write"/>
                  <PROPERTY NAME="BIT_OFFSET" VALUE="0"/>
                  <PROPERTY NAME="BIT_WIDTH" VALUE="8"/>
                </FIELD>
              </FIELDS>
            </REGISTER>
            <REGISTER NAME="GPIO_TRI">
              <PROPERTY NAME="DESCRIPTION" VALUE="Channel 1 AXI GPIO 3-state Control Register."/>
              <PROPERTY NAME="ADDRESS_OFFSET" VALUE="0x4"/>
              <PROPERTY NAME="SIZE" VALUE="32"/>
              <PROPERTY NAME="ACCESS" VALUE="read-write"/>
              <PROPERTY NAME="IS_ENABLED" VALUE="false"/>
            </REGISTER>
            <REGISTER NAME="GPIO_SCRATCH">
              <PROPERTY NAME="ADDRESS_OFFSET" VALUE="0x8"/>
            </REGISTER>
          </REGISTERS>
        </ADDRESSBLOCK>
      </ADDRESSBLOCKS>
      <PARAMETERS>
        <PARAMETER NAME="C_GPIO_WIDTH" VALUE="8"/>
        <PARAMETER NAME="C_BASEADDR" VALUE="0x40000000"/>
        <PARAMETER NAME="C_HIGHADDR" VALUE="0x4000FFFF"/>
      </PARAMETERS>
      <PORTS>
        <PORT CLKFREQUENCY="100000000" DIR="I" NAME="s_axi_aclk" SIGIS="clk" SIGNAME="External_Ports_sys_clk">
          <CONNECTIONS>
            <CONNECTION INSTANCE="External_Ports" PORT="sys_clk"/>
          </CONNECTIONS>
        </PORT>
        <PORT DIR="I" LEFT="31" NAME="s_axi_awaddr" RIGHT="0" SIGIS="undef" SIGNAME="dma0_m_axi_awaddr">
          <CONNECTIONS>
            <CONNECTION INSTANCE="dma0" PORT="m_axi_awaddr"/>
          </CONNECTIONS>
        </PORT>
        <PORT DIR="I" NAME="s_axi_awvalid" SIGIS="undef" SIGNAME="dma0_m_axi_awvalid">
          <CONNECTIONS>
            <CONNECTION INSTANCE="dma0" PORT="m_axi_awvalid"/>
          </CONNECTIONS>
        </PORT>
        <PORT DIR="O" NAME="s_axi_awready" SIGIS="undef" SIGNAME="mem0_s_axi_awready">
          <CONNECTIONS>
            <CONNECTION INSTANCE="dma0" PORT="m_axi_awready"/>
          </CONNECTIONS>
        </PORT>
        <PORT DIR="O" LEFT="7" NAME="gpio_io_o" RIGHT="0" SIGIS="undef" SIGNAME="mem0_gpio_io_o">
          <CONNECTIONS>
            <CONNECTION INSTANCE="External_Ports" PORT="leds"/>
          </CONNECTIONS>
        </PORT>
      </PORTS>
      <BUSINTERFACES>
        <BUSINTERFACE BUSNAME="dma0_M_AXI" DATAWIDTH="32" NAME="S_AXI" TYPE="SLAVE" VLNV="xilinx.com:interface:aximm:1.0">
          <PARAMETER NAME="PROTOCOL" VALUE="AXI4LITE"/>
          <PORTMAPS>
            <PORTMAP LEFT="31" LOGICAL="AWADDR" PHYSICAL="s_axi_awaddr" RIGHT="0"/>
            <PORTMAP LOGICAL="AWVALID" PHYSICAL="s_axi_awvalid"/>
            <PORTMAP LOGICAL="AWREADY" PHYSICAL="s_axi_awready"/>
          </PORTMAPS>
        </BUSINTERFACE>
        <BUSINTERFACE BUSNAME="mem0_GPIO" NAME="GPIO" TYPE="INITIATOR" VLNV="xilinx.com:interface:gpio:1.0">
          <PORTMAPS>
            <PORTMAP LEFT="7" LOGICAL="TRI_O" PHYSICAL="gpio_io_o" RIGHT="0"/>
          </PORTMAPS>
        </BUSINTERFACE>
      </BUSINTERFACES>
    </MODULE>
    <MODULE COREREVISION="6" FULLNAME="/ps7" HWVERSION="5.5" INSTANCE="ps7" IPTYPE="PERIPHERAL" IS_ENABLE="1" IS_PL="FALSE" MODCLASS="PROCESSOR" MODTYPE="processing_system7" VLNV="xilinx.com:ip:processing_system7:5.5">
      <PARAMETERS>
        <PARAMETER NAME="PCW_FCLK0_PERIPHERAL_DIVISOR0" VALUE="5"/>
        <PARAMETER NAME="PCW_FCLK0_PERIPHERAL_DIVISOR1" VALUE="2"/>
        <PARAMETER NAME="PCW_FPGA_FCLK0_ENABLE" VALUE="1"/>
        <PARAMETER NAME="PCW_FPGA_FCLK1_ENABLE" VALUE="0"/>
        <PARAMETER NAME="PCW_FCLK0_PERIPHERAL_CLKSRC" VALUE="IO PLL"/>
      </PARAMETERS>
      <PORTS>
        <PORT DIR="O" NAME="FCLK_CLK0" SIGIS="clk"/>
        <PORT DIR="I" LEFT="0" NAME="IRQ_F2P" RIGHT="0" SIGIS="INTERRUPT" SENSITIVITY="LEVEL_HIGH"/>
        <PORT DIR="O" LEFT="63" NAME="GPIO_O" RIGHT="0" SIGIS="undef"/>
      </PORTS>
      <BUSINTERFACES>
        <BUSINTERFACE BUSNAME="ps7_GPIO_0" NAME="GPIO_0" TYPE="INITIATOR" VLNV="xilinx.com:interface:gpio:1.0">
          <PORTMAPS>
            <PORTMAP LEFT="63" LOGICAL="TRI_O" PHYSICAL="GPIO_O" RIGHT="0"/>
          </PORTMAPS>
        </BUSINTERFACE>
      </BUSINTERFACES>
    </MODULE>
  </MODULES>
</EDKSYSTEM>
"#;

/// Cores nested three hierarchy levels deep, plus one at the top.
pub const NESTED_HIERARCHY_HWH: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<EDKSYSTEM>
  <SYSTEMINFO NAME="nest"/>
  <MODULES>
    <MODULE FULLNAME="/a/b/c/leaf" INSTANCE="leaf" VLNV="xilinx.com:ip:axi_gpio:2.0"/>
    <MODULE FULLNAME="/a/b/sibling" INSTANCE="sibling" VLNV="xilinx.com:ip:axi_gpio:2.0"/>
    <MODULE FULLNAME="/top_core" INSTANCE="top_core" VLNV="xilinx.com:ip:axi_gpio:2.0"/>
  </MODULES>
</EDKSYSTEM>
"#;

/// Two cores whose only wire connects two outputs.
pub const OPPOSED_DRIVERS_HWH: &str = r#"<EDKSYSTEM>
  <SYSTEMINFO NAME="bad"/>
  <MODULES>
    <MODULE INSTANCE="a" VLNV="x:ip:a:1.0">
      <PORTS><PORT DIR="O" NAME="q"><CONNECTIONS><CONNECTION INSTANCE="b" PORT="q"/></CONNECTIONS></PORT></PORTS>
    </MODULE>
    <MODULE INSTANCE="b" VLNV="x:ip:b:1.0">
      <PORTS><PORT DIR="O" NAME="q"/></PORTS>
    </MODULE>
  </MODULES>
</EDKSYSTEM>
"#;
