// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Module reset lines of the RZ/G3S.
//!
//! Every line has a monitor register [`RST_MON`] bytes above its control
//! register.

use cpg::descriptor::{ResetDesc, ResetId};

pub const GIC600_GICRESET_N: ResetId = ResetId(0);
pub const GIC600_DBG_GICRESET_N: ResetId = ResetId(1);
pub const IA55_RESETN: ResetId = ResetId(2);
pub const DMAC_ARESETN: ResetId = ResetId(3);
pub const DMAC_RST_ASYNC: ResetId = ResetId(4);
pub const OSTM0_PRESETZ: ResetId = ResetId(5);
pub const OSTM1_PRESETZ: ResetId = ResetId(6);
pub const OSTM2_PRESETZ: ResetId = ResetId(7);
pub const OSTM3_PRESETZ: ResetId = ResetId(8);
pub const OSTM4_PRESETZ: ResetId = ResetId(9);
pub const OSTM5_PRESETZ: ResetId = ResetId(10);
pub const OSTM6_PRESETZ: ResetId = ResetId(11);
pub const OSTM7_PRESETZ: ResetId = ResetId(12);
pub const MTU_X_PRESET_MTU3: ResetId = ResetId(13);
pub const POE3_RST_M_REG: ResetId = ResetId(14);
pub const GPT_RST_C: ResetId = ResetId(15);
pub const POEG_A_RST: ResetId = ResetId(16);
pub const POEG_B_RST: ResetId = ResetId(17);
pub const POEG_C_RST: ResetId = ResetId(18);
pub const POEG_D_RST: ResetId = ResetId(19);
pub const WDT0_PRESETN: ResetId = ResetId(20);
pub const SPI_HRESETN: ResetId = ResetId(21);
pub const SPI_ARESETN: ResetId = ResetId(22);
pub const SDHI0_IXRST: ResetId = ResetId(23);
pub const SDHI1_IXRST: ResetId = ResetId(24);
pub const SDHI2_IXRST: ResetId = ResetId(25);
pub const SSI0_RST_M2_REG: ResetId = ResetId(26);
pub const SSI1_RST_M2_REG: ResetId = ResetId(27);
pub const SSI2_RST_M2_REG: ResetId = ResetId(28);
pub const SSI3_RST_M2_REG: ResetId = ResetId(29);
pub const SRC_RST: ResetId = ResetId(30);
pub const USB_U2H0_HRESETN: ResetId = ResetId(31);
pub const USB_U2H1_HRESETN: ResetId = ResetId(32);
pub const USB_U2P_EXL_SYSRST: ResetId = ResetId(33);
pub const USB_PRESETN: ResetId = ResetId(34);
pub const ETH0_RST_HW_N: ResetId = ResetId(35);
pub const ETH1_RST_HW_N: ResetId = ResetId(36);
pub const I2C0_MRST: ResetId = ResetId(37);
pub const I2C1_MRST: ResetId = ResetId(38);
pub const I2C2_MRST: ResetId = ResetId(39);
pub const I2C3_MRST: ResetId = ResetId(40);
pub const SCIF0_RST_SYSTEM_N: ResetId = ResetId(41);
pub const SCIF1_RST_SYSTEM_N: ResetId = ResetId(42);
pub const SCIF2_RST_SYSTEM_N: ResetId = ResetId(43);
pub const SCIF3_RST_SYSTEM_N: ResetId = ResetId(44);
pub const SCIF4_RST_SYSTEM_N: ResetId = ResetId(45);
pub const SCIF5_RST_SYSTEM_N: ResetId = ResetId(46);
pub const SCI0_RST: ResetId = ResetId(47);
pub const SCI1_RST: ResetId = ResetId(48);
pub const RSPI0_RST: ResetId = ResetId(49);
pub const RSPI1_RST: ResetId = ResetId(50);
pub const RSPI2_RST: ResetId = ResetId(51);
pub const RSPI3_RST: ResetId = ResetId(52);
pub const RSPI4_RST: ResetId = ResetId(53);
pub const CANFD_RSTP_N: ResetId = ResetId(54);
pub const CANFD_RSTC_N: ResetId = ResetId(55);
pub const GPIO_RSTN: ResetId = ResetId(56);
pub const GPIO_PORT_RESETN: ResetId = ResetId(57);
pub const GPIO_SPARE_RESETN: ResetId = ResetId(58);
pub const ADC_PRESETN: ResetId = ResetId(59);
pub const ADC_ADRST_N: ResetId = ResetId(60);
pub const TSU_PRESETN: ResetId = ResetId(61);
pub const PCI_ARESETN: ResetId = ResetId(62);
pub const PCI_RST_B: ResetId = ResetId(63);
pub const PCI_RST_GP_B: ResetId = ResetId(64);
pub const PCI_RST_PS_B: ResetId = ResetId(65);
pub const PCI_RST_RSM_B: ResetId = ResetId(66);
pub const PCI_RST_CFG_B: ResetId = ResetId(67);
pub const PCI_RST_LOAD_B: ResetId = ResetId(68);
pub const SPDIF_RST: ResetId = ResetId(69);
pub const I3C_TRESETN: ResetId = ResetId(70);
pub const I3C_PRESETN: ResetId = ResetId(71);
pub const VBAT_BRESETN: ResetId = ResetId(72);

/// Reset monitor registers sit at this distance from their control register.
pub const RST_MON: usize = 0x180;

const fn line(id: ResetId, offset: usize, bit: u8) -> ResetDesc {
    ResetDesc::new(id, offset, bit, Some(offset + RST_MON))
}

pub const RESETS: &[ResetDesc] = &[
    line(GIC600_GICRESET_N, 0x814, 0),
    line(GIC600_DBG_GICRESET_N, 0x814, 1),
    line(IA55_RESETN, 0x818, 0),
    line(DMAC_ARESETN, 0x82c, 0),
    line(DMAC_RST_ASYNC, 0x82c, 1),
    line(OSTM0_PRESETZ, 0x834, 0),
    line(OSTM1_PRESETZ, 0x834, 1),
    line(OSTM2_PRESETZ, 0x834, 2),
    line(OSTM3_PRESETZ, 0x834, 3),
    line(OSTM4_PRESETZ, 0x834, 4),
    line(OSTM5_PRESETZ, 0x834, 5),
    line(OSTM6_PRESETZ, 0x834, 6),
    line(OSTM7_PRESETZ, 0x834, 7),
    line(MTU_X_PRESET_MTU3, 0x838, 0),
    line(POE3_RST_M_REG, 0x83c, 0),
    line(GPT_RST_C, 0x840, 0),
    line(POEG_A_RST, 0x844, 0),
    line(POEG_B_RST, 0x844, 1),
    line(POEG_C_RST, 0x844, 2),
    line(POEG_D_RST, 0x844, 3),
    line(WDT0_PRESETN, 0x848, 0),
    line(SPI_HRESETN, 0x850, 0),
    line(SPI_ARESETN, 0x850, 1),
    line(SDHI0_IXRST, 0x854, 0),
    line(SDHI1_IXRST, 0x854, 1),
    line(SDHI2_IXRST, 0x854, 2),
    line(SSI0_RST_M2_REG, 0x870, 0),
    line(SSI1_RST_M2_REG, 0x870, 1),
    line(SSI2_RST_M2_REG, 0x870, 2),
    line(SSI3_RST_M2_REG, 0x870, 3),
    line(SRC_RST, 0x874, 0),
    line(USB_U2H0_HRESETN, 0x878, 0),
    line(USB_U2H1_HRESETN, 0x878, 1),
    line(USB_U2P_EXL_SYSRST, 0x878, 2),
    line(USB_PRESETN, 0x878, 3),
    line(ETH0_RST_HW_N, 0x87c, 0),
    line(ETH1_RST_HW_N, 0x87c, 1),
    line(I2C0_MRST, 0x880, 0),
    line(I2C1_MRST, 0x880, 1),
    line(I2C2_MRST, 0x880, 2),
    line(I2C3_MRST, 0x880, 3),
    line(SCIF0_RST_SYSTEM_N, 0x884, 0),
    line(SCIF1_RST_SYSTEM_N, 0x884, 1),
    line(SCIF2_RST_SYSTEM_N, 0x884, 2),
    line(SCIF3_RST_SYSTEM_N, 0x884, 3),
    line(SCIF4_RST_SYSTEM_N, 0x884, 4),
    line(SCIF5_RST_SYSTEM_N, 0x884, 5),
    line(SCI0_RST, 0x888, 0),
    line(SCI1_RST, 0x888, 1),
    line(RSPI0_RST, 0x890, 0),
    line(RSPI1_RST, 0x890, 1),
    line(RSPI2_RST, 0x890, 2),
    line(RSPI3_RST, 0x890, 3),
    line(RSPI4_RST, 0x890, 4),
    line(CANFD_RSTP_N, 0x894, 0),
    line(CANFD_RSTC_N, 0x894, 1),
    line(GPIO_RSTN, 0x898, 0),
    line(GPIO_PORT_RESETN, 0x898, 1),
    line(GPIO_SPARE_RESETN, 0x898, 2),
    line(ADC_PRESETN, 0x8a8, 0),
    line(ADC_ADRST_N, 0x8a8, 1),
    line(TSU_PRESETN, 0x8ac, 0),
    line(PCI_ARESETN, 0x908, 0),
    line(PCI_RST_B, 0x908, 1),
    line(PCI_RST_GP_B, 0x908, 2),
    line(PCI_RST_PS_B, 0x908, 3),
    line(PCI_RST_RSM_B, 0x908, 4),
    line(PCI_RST_CFG_B, 0x908, 5),
    line(PCI_RST_LOAD_B, 0x908, 6),
    line(SPDIF_RST, 0x90c, 0),
    line(I3C_TRESETN, 0x910, 0),
    line(I3C_PRESETN, 0x910, 1),
    line(VBAT_BRESETN, 0x914, 0),
];
