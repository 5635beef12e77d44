// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock tree of the RZ/G3S.
//!
//! Everything is derived from the 24 MHz EXTAL oscillator. PLL2, PLL3, PLL4
//! and PLL6 run at rates fixed by the boot firmware and are described as
//! fixed factors; PLL1 (the CPU PLL) is read back from its configuration
//! register.
//!
//! Core clocks use identifiers below [`MOD_BASE`], module clocks start at
//! it.

use cpg::descriptor::{
    ClockDesc, ClockId, Confirm, DivEntry, DividerDesc, GateBit, ModuleGate, Mstop, MuxDesc,
    Notifier, RegField,
};

use crate::pll::{sam_pll_rate, PLL1_CLK1};

// Core clocks handed out to drivers
pub const I: ClockId = ClockId(0);
pub const S0: ClockId = ClockId(1);
pub const SPI0: ClockId = ClockId(2);
pub const SPI1: ClockId = ClockId(3);
pub const SD0: ClockId = ClockId(4);
pub const SD1: ClockId = ClockId(5);
pub const SD2: ClockId = ClockId(6);
pub const M0: ClockId = ClockId(7);
pub const HP: ClockId = ClockId(8);
pub const TSU: ClockId = ClockId(9);
pub const ZT: ClockId = ClockId(10);
pub const P0: ClockId = ClockId(11);
pub const P1: ClockId = ClockId(12);
pub const P2: ClockId = ClockId(13);
pub const P3: ClockId = ClockId(14);
pub const P4: ClockId = ClockId(15);
pub const P5: ClockId = ClockId(16);
pub const OSCCLK: ClockId = ClockId(17);
pub const OSCCLK2: ClockId = ClockId(18);
pub const CANFD: ClockId = ClockId(19);

// Internal core clocks
pub const EXTAL: ClockId = ClockId(20);
pub const OSC_DIV1000: ClockId = ClockId(21);
pub const PLL1: ClockId = ClockId(22);
pub const PLL2: ClockId = ClockId(23);
pub const PLL2_DIV2: ClockId = ClockId(24);
pub const PLL2_DIV2_8: ClockId = ClockId(25);
pub const PLL2_DIV6: ClockId = ClockId(26);
pub const PLL3: ClockId = ClockId(27);
pub const PLL3_DIV2: ClockId = ClockId(28);
pub const PLL3_DIV2_2: ClockId = ClockId(29);
pub const PLL3_DIV2_4: ClockId = ClockId(30);
pub const PLL3_DIV2_8: ClockId = ClockId(31);
pub const PLL3_DIV6: ClockId = ClockId(32);
pub const PLL4: ClockId = ClockId(33);
pub const PLL6: ClockId = ClockId(34);
pub const PLL6_DIV2: ClockId = ClockId(35);
pub const SEL_SDHI0: ClockId = ClockId(36);
pub const SEL_SDHI1: ClockId = ClockId(37);
pub const SEL_SDHI2: ClockId = ClockId(38);
pub const SEL_SPI: ClockId = ClockId(39);
pub const SEL_PLL4: ClockId = ClockId(40);
pub const P1_DIV2: ClockId = ClockId(41);
pub const P3_DIV2: ClockId = ClockId(42);
pub const P4_DIV2: ClockId = ClockId(43);
pub const SD0_DIV4: ClockId = ClockId(44);
pub const SD1_DIV4: ClockId = ClockId(45);
pub const SD2_DIV4: ClockId = ClockId(46);

/// First module clock identifier.
pub const MOD_BASE: u32 = 0x100;

const fn module_id(n: u32) -> ClockId {
    ClockId(MOD_BASE + n)
}

pub const GIC600_GICCLK: ClockId = module_id(0);
pub const IA55_PCLK: ClockId = module_id(1);
pub const IA55_CLK: ClockId = module_id(2);
pub const DMAC_ACLK: ClockId = module_id(3);
pub const DMAC_PCLK: ClockId = module_id(4);
pub const OSTM0_PCLK: ClockId = module_id(5);
pub const OSTM1_PCLK: ClockId = module_id(6);
pub const OSTM2_PCLK: ClockId = module_id(7);
pub const OSTM3_PCLK: ClockId = module_id(8);
pub const OSTM4_PCLK: ClockId = module_id(9);
pub const OSTM5_PCLK: ClockId = module_id(10);
pub const OSTM6_PCLK: ClockId = module_id(11);
pub const OSTM7_PCLK: ClockId = module_id(12);
pub const MTU_X_MCK_MTU3: ClockId = module_id(13);
pub const POE3_CLKM_POE: ClockId = module_id(14);
pub const GPT_PCLK: ClockId = module_id(15);
pub const POEG_A_CLKP: ClockId = module_id(16);
pub const POEG_B_CLKP: ClockId = module_id(17);
pub const POEG_C_CLKP: ClockId = module_id(18);
pub const POEG_D_CLKP: ClockId = module_id(19);
pub const WDT0_PCLK: ClockId = module_id(20);
pub const WDT0_CLK: ClockId = module_id(21);
pub const SPI_HCLK: ClockId = module_id(22);
pub const SPI_ACLK: ClockId = module_id(23);
pub const SPI_CLK: ClockId = module_id(24);
pub const SPI_CLKX2: ClockId = module_id(25);
pub const SDHI0_IMCLK: ClockId = module_id(26);
pub const SDHI0_IMCLK2: ClockId = module_id(27);
pub const SDHI0_CLK_HS: ClockId = module_id(28);
pub const SDHI0_ACLK: ClockId = module_id(29);
pub const SDHI1_IMCLK: ClockId = module_id(30);
pub const SDHI1_IMCLK2: ClockId = module_id(31);
pub const SDHI1_CLK_HS: ClockId = module_id(32);
pub const SDHI1_ACLK: ClockId = module_id(33);
pub const SDHI2_IMCLK: ClockId = module_id(34);
pub const SDHI2_IMCLK2: ClockId = module_id(35);
pub const SDHI2_CLK_HS: ClockId = module_id(36);
pub const SDHI2_ACLK: ClockId = module_id(37);
pub const SSI0_PCLK2: ClockId = module_id(38);
pub const SSI0_PCLK_SFR: ClockId = module_id(39);
pub const SSI1_PCLK2: ClockId = module_id(40);
pub const SSI1_PCLK_SFR: ClockId = module_id(41);
pub const SSI2_PCLK2: ClockId = module_id(42);
pub const SSI2_PCLK_SFR: ClockId = module_id(43);
pub const SSI3_PCLK2: ClockId = module_id(44);
pub const SSI3_PCLK_SFR: ClockId = module_id(45);
pub const SRC_CLKP: ClockId = module_id(46);
pub const USB_U2H0_HCLK: ClockId = module_id(47);
pub const USB_U2H1_HCLK: ClockId = module_id(48);
pub const USB_U2P_EXR_CPUCLK: ClockId = module_id(49);
pub const USB_PCLK: ClockId = module_id(50);
pub const ETH0_CLK_AXI: ClockId = module_id(51);
pub const ETH0_CLK_CHI: ClockId = module_id(52);
pub const ETH0_REFCLK: ClockId = module_id(53);
pub const ETH1_CLK_AXI: ClockId = module_id(54);
pub const ETH1_CLK_CHI: ClockId = module_id(55);
pub const ETH1_REFCLK: ClockId = module_id(56);
pub const I2C0_PCLK: ClockId = module_id(57);
pub const I2C1_PCLK: ClockId = module_id(58);
pub const I2C2_PCLK: ClockId = module_id(59);
pub const I2C3_PCLK: ClockId = module_id(60);
pub const SCIF0_CLK_PCK: ClockId = module_id(61);
pub const SCIF1_CLK_PCK: ClockId = module_id(62);
pub const SCIF2_CLK_PCK: ClockId = module_id(63);
pub const SCIF3_CLK_PCK: ClockId = module_id(64);
pub const SCIF4_CLK_PCK: ClockId = module_id(65);
pub const SCIF5_CLK_PCK: ClockId = module_id(66);
pub const SCI0_CLKP: ClockId = module_id(67);
pub const SCI1_CLKP: ClockId = module_id(68);
pub const RSPI0_CLKB: ClockId = module_id(69);
pub const RSPI1_CLKB: ClockId = module_id(70);
pub const RSPI2_CLKB: ClockId = module_id(71);
pub const RSPI3_CLKB: ClockId = module_id(72);
pub const RSPI4_CLKB: ClockId = module_id(73);
pub const CANFD_PCLK: ClockId = module_id(74);
pub const CANFD_CLK_RAM: ClockId = module_id(75);
pub const GPIO_HCLK: ClockId = module_id(76);
pub const ADC_ADCLK: ClockId = module_id(77);
pub const ADC_PCLK: ClockId = module_id(78);
pub const TSU_PCLK: ClockId = module_id(79);
pub const PCI_ACLK: ClockId = module_id(80);
pub const PCI_CLKL1PM: ClockId = module_id(81);
pub const SPDIF_PCLK: ClockId = module_id(82);
pub const I3C_TCLK: ClockId = module_id(83);
pub const I3C_PCLK: ClockId = module_id(84);
pub const VBAT_BCLK: ClockId = module_id(85);

// Divider and selector control registers
const PL1_DDIV: usize = 0x200;
const PL2_DDIV: usize = 0x204;
const PL3_DDIV: usize = 0x208;
const SDHI_DDIV: usize = 0x218;
const SPI_DDIV: usize = 0x220;
const PLL_DSEL: usize = 0x240;
const SDHI_DSEL: usize = 0x244;
const SPI_SSEL: usize = 0x404;

// Busy flags of the dividers and selectors above
const CLKDIVSTATUS: usize = 0x280;
const CLKSELSTATUS: usize = 0x284;

/// Clock monitor registers sit at this distance from their enable register.
const CLK_MON: usize = 0x180;

// Module stop registers
const MCPU1_MSTOP: usize = 0xb64;
const MCPU2_MSTOP: usize = 0xb68;
const PERI_COM_MSTOP: usize = 0xb6c;
const PERI_CPU_MSTOP: usize = 0xb70;
const REG0_MSTOP: usize = 0xb7c;
const REG1_MSTOP: usize = 0xb80;
const MCPU3_MSTOP: usize = 0xb90;

/// SD dividers must not pass 800 MHz straight through.
const SD_INVALID_RATE: u64 = 800_000_000;
const SD_MAX_RATE: u64 = 500_000_000;
/// The SPI divider must not pass 400 MHz straight through.
const SPI_INVALID_RATE: u64 = 400_000_000;
const SPI_MAX_RATE: u64 = 200_000_000;

const DTABLE_1_2: [DivEntry; 3] = [DivEntry::new(0, 1), DivEntry::new(1, 2), DivEntry::END];

const DTABLE_1_8: [DivEntry; 5] = [
    DivEntry::new(0, 1),
    DivEntry::new(1, 2),
    DivEntry::new(2, 4),
    DivEntry::new(3, 8),
    DivEntry::END,
];

const DTABLE_1_32: [DivEntry; 6] = [
    DivEntry::new(0, 1),
    DivEntry::new(1, 2),
    DivEntry::new(2, 4),
    DivEntry::new(3, 8),
    DivEntry::new(4, 32),
    DivEntry::END,
];

const SEL_SDHI: [ClockId; 3] = [PLL2_DIV2, PLL6, PLL2_DIV6];
const SEL_SPI_OCTA: [ClockId; 3] = [PLL3_DIV2_2, PLL3_DIV6, PLL6_DIV2];
const SEL_PLL4_PARENTS: [ClockId; 2] = [OSC_DIV1000, PLL4];

/// Selector value 1 of the SDHI muxes is reserved.
const MTABLE_SD: [u32; 3] = [0, 2, 3];

const fn busy(status: usize, bit: u8) -> Option<Confirm> {
    Some(Confirm::Busy(RegField::new(status, bit, 1)))
}

const fn divider(
    name: &'static str,
    id: ClockId,
    parent: ClockId,
    field: RegField,
    status_bit: u8,
    table: &'static [DivEntry],
) -> ClockDesc {
    ClockDesc::divider(
        name,
        id,
        DividerDesc {
            parent,
            field,
            confirm: busy(CLKDIVSTATUS, status_bit),
            table,
            bounds: None,
            limit: None,
            rate_parent: false,
            default: None,
            notifier: None,
        },
    )
}

/// A divider that may not run at divisor 1 from `invalid_rate` and is
/// capped at `max_rate`. Rate requests may switch its source selector.
const fn limited_divider(
    name: &'static str,
    id: ClockId,
    parent: ClockId,
    field: RegField,
    status_bit: u8,
    table: &'static [DivEntry],
    invalid_rate: u64,
    max_rate: u64,
) -> ClockDesc {
    ClockDesc::divider(
        name,
        id,
        DividerDesc {
            parent,
            field,
            confirm: busy(CLKDIVSTATUS, status_bit),
            table,
            bounds: None,
            limit: Some(max_rate),
            rate_parent: true,
            default: None,
            notifier: Some(Notifier::ForbiddenParentRate {
                rate: invalid_rate,
                safe_code: 1,
            }),
        },
    )
}

const fn sd_mux(name: &'static str, id: ClockId, shift: u8, status_bit: u8) -> ClockDesc {
    ClockDesc::mux(
        name,
        id,
        MuxDesc {
            parents: &SEL_SDHI,
            field: RegField::new(SDHI_DSEL, shift, 2),
            confirm: busy(CLKSELSTATUS, status_bit),
            table: Some(&MTABLE_SD),
            default: None,
            notifier: None,
        },
    )
}

const fn mstop(offset: usize, mask: u16) -> Option<Mstop> {
    Some(Mstop { offset, mask })
}

const fn gate(parent: ClockId, offset: usize, bit: u8, mstop: Option<Mstop>) -> ModuleGate {
    ModuleGate {
        parent,
        on: GateBit { offset, bit },
        mon: Some(offset + CLK_MON),
        mstop,
    }
}

const fn module(
    name: &'static str,
    id: ClockId,
    parent: ClockId,
    offset: usize,
    bit: u8,
    mstop: Option<Mstop>,
) -> ClockDesc {
    ClockDesc::gate(name, id, gate(parent, offset, bit, mstop))
}

const fn coupled(
    name: &'static str,
    id: ClockId,
    parent: ClockId,
    offset: usize,
    bit: u8,
    mstop: Option<Mstop>,
) -> ClockDesc {
    ClockDesc::coupled(name, id, gate(parent, offset, bit, mstop))
}

pub const CLOCKS: &[ClockDesc] = &[
    // External input
    ClockDesc::input("extal", EXTAL, 24_000_000),
    // Internal core clocks
    ClockDesc::fixed(".osc_div1000", OSC_DIV1000, EXTAL, 1, 1000),
    ClockDesc::pll(".pll1", PLL1, EXTAL, PLL1_CLK1, sam_pll_rate),
    ClockDesc::fixed(".pll2", PLL2, EXTAL, 200, 3),
    ClockDesc::fixed(".pll3", PLL3, EXTAL, 200, 3),
    ClockDesc::fixed(".pll4", PLL4, EXTAL, 100, 3),
    ClockDesc::fixed(".pll6", PLL6, EXTAL, 125, 6),
    ClockDesc::fixed(".pll2_div2", PLL2_DIV2, PLL2, 1, 2),
    ClockDesc::fixed(".pll2_div2_8", PLL2_DIV2_8, PLL2_DIV2, 1, 8),
    ClockDesc::fixed(".pll2_div6", PLL2_DIV6, PLL2, 1, 6),
    ClockDesc::fixed(".pll3_div2", PLL3_DIV2, PLL3, 1, 2),
    ClockDesc::fixed(".pll3_div2_2", PLL3_DIV2_2, PLL3_DIV2, 1, 2),
    ClockDesc::fixed(".pll3_div2_4", PLL3_DIV2_4, PLL3_DIV2, 1, 4),
    ClockDesc::fixed(".pll3_div2_8", PLL3_DIV2_8, PLL3_DIV2, 1, 8),
    ClockDesc::fixed(".pll3_div6", PLL3_DIV6, PLL3, 1, 6),
    ClockDesc::fixed(".pll6_div2", PLL6_DIV2, PLL6, 1, 2),
    ClockDesc::mux(
        ".sel_spi",
        SEL_SPI,
        MuxDesc {
            parents: &SEL_SPI_OCTA,
            field: RegField::new(SPI_SSEL, 0, 2),
            confirm: None,
            table: None,
            default: None,
            notifier: None,
        },
    ),
    sd_mux(".sel_sd0", SEL_SDHI0, 0, 16),
    sd_mux(".sel_sd1", SEL_SDHI1, 4, 17),
    sd_mux(".sel_sd2", SEL_SDHI2, 8, 18),
    // Consumers of S0 must be stopped while it switches source.
    ClockDesc::mux(
        ".sel_pll4",
        SEL_PLL4,
        MuxDesc {
            parents: &SEL_PLL4_PARENTS,
            field: RegField::new(PLL_DSEL, 6, 1),
            confirm: busy(CLKSELSTATUS, 6),
            table: None,
            default: None,
            notifier: Some(Notifier::Quiesce { safe_parent: None }),
        },
    ),
    // Core outputs
    divider("I", I, PLL1, RegField::new(PL1_DDIV, 0, 2), 0, &DTABLE_1_8),
    divider("P0", P0, PLL2_DIV2_8, RegField::new(PL2_DDIV, 4, 3), 5, &DTABLE_1_32),
    limited_divider(
        "SD0",
        SD0,
        SEL_SDHI0,
        RegField::new(SDHI_DDIV, 0, 1),
        24,
        &DTABLE_1_2,
        SD_INVALID_RATE,
        SD_MAX_RATE,
    ),
    limited_divider(
        "SD1",
        SD1,
        SEL_SDHI1,
        RegField::new(SDHI_DDIV, 4, 1),
        25,
        &DTABLE_1_2,
        SD_INVALID_RATE,
        SD_MAX_RATE,
    ),
    limited_divider(
        "SD2",
        SD2,
        SEL_SDHI2,
        RegField::new(SDHI_DDIV, 8, 1),
        26,
        &DTABLE_1_2,
        SD_INVALID_RATE,
        SD_MAX_RATE,
    ),
    limited_divider(
        "SPI0",
        SPI0,
        SEL_SPI,
        RegField::new(SPI_DDIV, 0, 3),
        29,
        &DTABLE_1_32,
        SPI_INVALID_RATE,
        SPI_MAX_RATE,
    ),
    ClockDesc::fixed("SPI1", SPI1, SPI0, 1, 2),
    ClockDesc::fixed(".sd0_div4", SD0_DIV4, SD0, 1, 4),
    ClockDesc::fixed(".sd1_div4", SD1_DIV4, SD1, 1, 4),
    ClockDesc::fixed(".sd2_div4", SD2_DIV4, SD2, 1, 4),
    ClockDesc::fixed("M0", M0, PLL3_DIV2_4, 1, 1),
    ClockDesc::fixed("TSU", TSU, PLL2_DIV2, 1, 8),
    divider("P1", P1, PLL3_DIV2_4, RegField::new(PL3_DDIV, 0, 3), 8, &DTABLE_1_32),
    ClockDesc::fixed("P1_DIV2", P1_DIV2, P1, 1, 2),
    divider("P2", P2, PLL3_DIV2_8, RegField::new(PL3_DDIV, 4, 3), 9, &DTABLE_1_32),
    divider("P3", P3, PLL3_DIV2_4, RegField::new(PL3_DDIV, 8, 3), 10, &DTABLE_1_32),
    ClockDesc::fixed("P3_DIV2", P3_DIV2, P3, 1, 2),
    ClockDesc::fixed("P4", P4, PLL2_DIV2, 1, 5),
    ClockDesc::fixed("P4_DIV2", P4_DIV2, P4, 1, 2),
    ClockDesc::fixed("CANFD", CANFD, P4_DIV2, 1, 1),
    ClockDesc::fixed("P5", P5, PLL2_DIV2, 1, 4),
    ClockDesc::fixed("ZT", ZT, PLL3_DIV2_8, 1, 1),
    ClockDesc::fixed("S0", S0, SEL_PLL4, 1, 2),
    ClockDesc::fixed("OSC", OSCCLK, EXTAL, 1, 1),
    ClockDesc::fixed("OSC2", OSCCLK2, EXTAL, 1, 3),
    ClockDesc::fixed("HP", HP, PLL6, 1, 2),
    // Module clocks
    module("gic_gicclk", GIC600_GICCLK, P1, 0x514, 0, None),
    module("ia55_pclk", IA55_PCLK, P2, 0x518, 0, None),
    module("ia55_clk", IA55_CLK, P1, 0x518, 1, mstop(PERI_CPU_MSTOP, 1 << 13)),
    module("dmac_aclk", DMAC_ACLK, P3, 0x52c, 0, mstop(REG1_MSTOP, 0b1100)),
    module("dmac_pclk", DMAC_PCLK, P3_DIV2, 0x52c, 1, None),
    module("ostm0_pclk", OSTM0_PCLK, P0, 0x534, 0, mstop(REG0_MSTOP, 1 << 4)),
    module("ostm1_pclk", OSTM1_PCLK, P0, 0x534, 1, mstop(REG0_MSTOP, 1 << 5)),
    module("ostm2_pclk", OSTM2_PCLK, P0, 0x534, 2, mstop(REG0_MSTOP, 1 << 6)),
    module("ostm3_pclk", OSTM3_PCLK, P0, 0x534, 3, mstop(REG0_MSTOP, 1 << 7)),
    module("ostm4_pclk", OSTM4_PCLK, P0, 0x534, 4, mstop(REG0_MSTOP, 1 << 8)),
    module("ostm5_pclk", OSTM5_PCLK, P0, 0x534, 5, mstop(REG0_MSTOP, 1 << 9)),
    module("ostm6_pclk", OSTM6_PCLK, P0, 0x534, 6, mstop(REG0_MSTOP, 1 << 10)),
    module("ostm7_pclk", OSTM7_PCLK, P0, 0x534, 7, mstop(REG0_MSTOP, 1 << 11)),
    module("mtu_x_mck", MTU_X_MCK_MTU3, P0, 0x538, 0, mstop(MCPU1_MSTOP, 1 << 2)),
    module("poe3_clkm_poe", POE3_CLKM_POE, P0, 0x53c, 0, mstop(MCPU1_MSTOP, 1 << 9)),
    module("gpt_pclk", GPT_PCLK, P0, 0x540, 0, mstop(MCPU3_MSTOP, 1 << 5)),
    module("poeg_a_clkp", POEG_A_CLKP, P0, 0x544, 0, None),
    module("poeg_b_clkp", POEG_B_CLKP, P0, 0x544, 1, None),
    module("poeg_c_clkp", POEG_C_CLKP, P0, 0x544, 2, None),
    module("poeg_d_clkp", POEG_D_CLKP, P0, 0x544, 3, None),
    module("wdt0_pclk", WDT0_PCLK, P0, 0x548, 0, None),
    module("wdt0_clk", WDT0_CLK, OSCCLK, 0x548, 1, mstop(REG0_MSTOP, 1 << 0)),
    module("spi_hclk", SPI_HCLK, P3, 0x550, 0, None),
    module("spi_aclk", SPI_ACLK, P3, 0x550, 1, None),
    module("spi_clk", SPI_CLK, SPI1, 0x550, 2, mstop(MCPU1_MSTOP, 1 << 1)),
    module("spi_clkx2", SPI_CLKX2, SPI0, 0x550, 3, None),
    module("sdhi0_imclk", SDHI0_IMCLK, SD0_DIV4, 0x554, 0, mstop(PERI_COM_MSTOP, 1 << 0)),
    module("sdhi0_imclk2", SDHI0_IMCLK2, SD0_DIV4, 0x554, 1, None),
    module("sdhi0_clk_hs", SDHI0_CLK_HS, SD0, 0x554, 2, None),
    module("sdhi0_aclk", SDHI0_ACLK, P1, 0x554, 3, None),
    module("sdhi1_imclk", SDHI1_IMCLK, SD1_DIV4, 0x554, 4, mstop(PERI_COM_MSTOP, 1 << 1)),
    module("sdhi1_imclk2", SDHI1_IMCLK2, SD1_DIV4, 0x554, 5, None),
    module("sdhi1_clk_hs", SDHI1_CLK_HS, SD1, 0x554, 6, None),
    module("sdhi1_aclk", SDHI1_ACLK, P1, 0x554, 7, None),
    module("sdhi2_imclk", SDHI2_IMCLK, SD2_DIV4, 0x554, 8, mstop(PERI_COM_MSTOP, 1 << 11)),
    module("sdhi2_imclk2", SDHI2_IMCLK2, SD2_DIV4, 0x554, 9, None),
    module("sdhi2_clk_hs", SDHI2_CLK_HS, SD2, 0x554, 10, None),
    module("sdhi2_aclk", SDHI2_ACLK, P1, 0x554, 11, None),
    module("ssi0_pclk", SSI0_PCLK2, P0, 0x570, 0, mstop(MCPU1_MSTOP, 1 << 10)),
    module("ssi0_sfr", SSI0_PCLK_SFR, P0, 0x570, 1, None),
    module("ssi1_pclk", SSI1_PCLK2, P0, 0x570, 2, mstop(MCPU1_MSTOP, 1 << 11)),
    module("ssi1_sfr", SSI1_PCLK_SFR, P0, 0x570, 3, None),
    module("ssi2_pclk", SSI2_PCLK2, P0, 0x570, 4, mstop(MCPU1_MSTOP, 1 << 12)),
    module("ssi2_sfr", SSI2_PCLK_SFR, P0, 0x570, 5, None),
    module("ssi3_pclk", SSI3_PCLK2, P0, 0x570, 6, mstop(MCPU1_MSTOP, 1 << 13)),
    module("ssi3_sfr", SSI3_PCLK_SFR, P0, 0x570, 7, None),
    module("src_clkp", SRC_CLKP, P0, 0x574, 0, mstop(MCPU1_MSTOP, 1 << 3)),
    module("usb_u2h0_hclk", USB_U2H0_HCLK, P1, 0x578, 0, None),
    module("usb_u2h1_hclk", USB_U2H1_HCLK, P1, 0x578, 1, None),
    module("usb_u2p_exr_cpuclk", USB_U2P_EXR_CPUCLK, P1, 0x578, 2, None),
    module("usb_pclk", USB_PCLK, P1, 0x578, 3, mstop(PERI_COM_MSTOP, 0xf0)),
    coupled("eth0_axi", ETH0_CLK_AXI, M0, 0x57c, 0, mstop(PERI_COM_MSTOP, 1 << 2)),
    coupled("eth0_chi", ETH0_CLK_CHI, ZT, 0x57c, 0, None),
    module("eth0_refclk", ETH0_REFCLK, HP, 0x57c, 8, None),
    coupled("eth1_axi", ETH1_CLK_AXI, M0, 0x57c, 1, mstop(PERI_COM_MSTOP, 1 << 3)),
    coupled("eth1_chi", ETH1_CLK_CHI, ZT, 0x57c, 1, None),
    module("eth1_refclk", ETH1_REFCLK, HP, 0x57c, 9, None),
    module("i2c0_pclk", I2C0_PCLK, P0, 0x580, 0, mstop(MCPU2_MSTOP, 1 << 10)),
    module("i2c1_pclk", I2C1_PCLK, P0, 0x580, 1, mstop(MCPU2_MSTOP, 1 << 11)),
    module("i2c2_pclk", I2C2_PCLK, P0, 0x580, 2, mstop(MCPU2_MSTOP, 1 << 12)),
    module("i2c3_pclk", I2C3_PCLK, P0, 0x580, 3, mstop(MCPU2_MSTOP, 1 << 13)),
    module("scif0_clk_pck", SCIF0_CLK_PCK, P0, 0x584, 0, mstop(MCPU2_MSTOP, 1 << 1)),
    module("scif1_clk_pck", SCIF1_CLK_PCK, P0, 0x584, 1, mstop(MCPU2_MSTOP, 1 << 2)),
    module("scif2_clk_pck", SCIF2_CLK_PCK, P0, 0x584, 2, mstop(MCPU2_MSTOP, 1 << 3)),
    module("scif3_clk_pck", SCIF3_CLK_PCK, P0, 0x584, 3, mstop(MCPU2_MSTOP, 1 << 4)),
    module("scif4_clk_pck", SCIF4_CLK_PCK, P0, 0x584, 4, mstop(MCPU2_MSTOP, 1 << 5)),
    module("scif5_clk_pck", SCIF5_CLK_PCK, P0, 0x584, 5, mstop(MCPU3_MSTOP, 1 << 4)),
    module("sci0_clk_pck", SCI0_CLKP, P0, 0x588, 0, mstop(MCPU2_MSTOP, 1 << 7)),
    module("sci1_clk_pck", SCI1_CLKP, P0, 0x588, 1, mstop(MCPU2_MSTOP, 1 << 8)),
    module("rspi0_clkb", RSPI0_CLKB, P0, 0x590, 0, mstop(MCPU1_MSTOP, 1 << 14)),
    module("rspi1_clkb", RSPI1_CLKB, P0, 0x590, 1, mstop(MCPU1_MSTOP, 1 << 15)),
    module("rspi2_clkb", RSPI2_CLKB, P0, 0x590, 2, mstop(MCPU2_MSTOP, 1 << 0)),
    module("rspi3_clkb", RSPI3_CLKB, P0, 0x590, 3, mstop(MCPU3_MSTOP, 1 << 2)),
    module("rspi4_clkb", RSPI4_CLKB, P0, 0x590, 4, mstop(MCPU3_MSTOP, 1 << 3)),
    module("canfd_pclk", CANFD_PCLK, P4_DIV2, 0x594, 0, mstop(MCPU2_MSTOP, 1 << 9)),
    module("canfd_clk_ram", CANFD_CLK_RAM, P4, 0x594, 1, None),
    module("gpio_hclk", GPIO_HCLK, OSCCLK, 0x598, 0, None),
    module("adc_adclk", ADC_ADCLK, TSU, 0x5a8, 0, mstop(MCPU2_MSTOP, 1 << 14)),
    module("adc_pclk", ADC_PCLK, TSU, 0x5a8, 1, None),
    module("tsu_pclk", TSU_PCLK, TSU, 0x5ac, 0, mstop(MCPU2_MSTOP, 1 << 15)),
    module("pci_aclk", PCI_ACLK, M0, 0x608, 0, None),
    module("pci_clk1pm", PCI_CLKL1PM, ZT, 0x608, 1, None),
    module("spdif_pclk", SPDIF_PCLK, P0, 0x60c, 0, mstop(MCPU3_MSTOP, 1 << 6)),
    module("i3c_tclk", I3C_TCLK, P5, 0x610, 1, mstop(MCPU3_MSTOP, 1 << 10)),
    module("i3c_pclk", I3C_PCLK, TSU, 0x610, 0, None),
    module("vbat_bclk", VBAT_BCLK, OSCCLK, 0x614, 0, mstop(MCPU3_MSTOP, 1 << 8)),
];

/// Module clocks the platform cannot run without.
pub const CRITICAL: &[ClockId] = &[
    GIC600_GICCLK,
    IA55_PCLK,
    IA55_CLK,
    DMAC_ACLK,
    VBAT_BCLK,
];
