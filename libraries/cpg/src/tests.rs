// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

use crate::cpg::Cpg;
use crate::descriptor::{
    ClockDesc, ClockId, Confirm, CpgInfo, DivEntry, DividerDesc, GateBit, ModuleGate, Mstop,
    MuxDesc, Notifier, RateBounds, RegField, ResetDesc, ResetId,
};
use crate::error_codes::{ErrorCode, InitError, TopologyError};
use crate::registers::{masked_word, RegisterSpace, Registers};
use crate::topology::Graph;
use embedded_hal::delay::DelayNs;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::vec::Vec;

const REGION_SIZE: usize = 0x1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Event {
    Write(usize, u32),
    Delay(u32),
}

/// An in-memory CPG register file.
///
/// Writes follow the write-enable layout. Monitor registers mirror the low
/// half of a control register (inverted for reset monitors) and status
/// registers read 0 unless a bit is stuck.
struct FakeCpg {
    words: RefCell<Vec<u32>>,
    /// (monitor, source, inverted)
    mirrors: Vec<(usize, usize, bool)>,
    stuck_high: RefCell<HashMap<usize, u32>>,
    stuck_low: RefCell<HashMap<usize, u32>>,
    log: Rc<RefCell<Vec<Event>>>,
}

impl FakeCpg {
    fn new() -> Self {
        let mut words = vec![0; REGION_SIZE / 4];
        // PLL multiplier
        words[0x000 / 4] = 100;
        // Every module is stopped out of reset.
        words[0xB60 / 4] = 0x0003;
        words[0xB64 / 4] = 0x0001;

        Self {
            words: RefCell::new(words),
            mirrors: vec![
                (0x680, 0x500, false),
                (0x684, 0x504, false),
                (0x204, 0x104, false),
                (0x980, 0x800, true),
            ],
            stuck_high: RefCell::new(HashMap::new()),
            stuck_low: RefCell::new(HashMap::new()),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn delay(&self) -> FakeDelay {
        FakeDelay {
            log: self.log.clone(),
        }
    }

    fn poke(&self, offset: usize, value: u32) {
        self.words.borrow_mut()[offset / 4] = value;
    }

    fn stick_high(&self, offset: usize, mask: u32) {
        self.stuck_high.borrow_mut().insert(offset, mask);
    }

    fn stick_low(&self, offset: usize, mask: u32) {
        self.stuck_low.borrow_mut().insert(offset, mask);
    }

    fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    fn writes(&self) -> Vec<(usize, u32)> {
        self.log
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Write(offset, value) => Some((*offset, *value)),
                Event::Delay(_) => None,
            })
            .collect()
    }

    fn waited_ns(&self) -> u64 {
        self.log
            .borrow()
            .iter()
            .map(|event| match event {
                Event::Delay(ns) => *ns as u64,
                Event::Write(..) => 0,
            })
            .sum()
    }

    fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }
}

impl RegisterSpace for FakeCpg {
    fn size(&self) -> usize {
        REGION_SIZE
    }

    fn read32(&self, offset: usize) -> u32 {
        let words = self.words.borrow();
        let mut value = match self.mirrors.iter().find(|(mon, _, _)| *mon == offset) {
            Some(&(_, source, inverted)) => {
                let low = words[source / 4] & 0xffff;
                if inverted {
                    !low & 0xffff
                } else {
                    low
                }
            }
            None => words[offset / 4],
        };
        value |= self.stuck_high.borrow().get(&offset).copied().unwrap_or(0);
        value &= !self.stuck_low.borrow().get(&offset).copied().unwrap_or(0);
        value
    }

    fn write32(&self, offset: usize, value: u32) {
        self.log.borrow_mut().push(Event::Write(offset, value));
        let mask = value >> 16;
        let word = &mut self.words.borrow_mut()[offset / 4];
        *word = (*word & !mask) | (value & mask);
    }
}

struct FakeDelay {
    log: Rc<RefCell<Vec<Event>>>,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(Event::Delay(ns));
    }
}

const EXTAL: ClockId = ClockId(0);
const PLL: ClockId = ClockId(1);
const PLL2: ClockId = ClockId(2);
const PLL2_DIV2: ClockId = ClockId(3);
const PLL2_DIV3: ClockId = ClockId(4);
const PLL2_DIV4: ClockId = ClockId(5);
const SEL_SD: ClockId = ClockId(6);
const SD_DIV: ClockId = ClockId(7);
const SD_CLK: ClockId = ClockId(8);
const SD_ACLK: ClockId = ClockId(9);
const P_DIV: ClockId = ClockId(10);
const Q_DIV: ClockId = ClockId(11);
const Q_CLK: ClockId = ClockId(12);
const SEL_P: ClockId = ClockId(13);
const PARK_DIV: ClockId = ClockId(14);
const PARK_CLK: ClockId = ClockId(15);
const ETH_TX: ClockId = ClockId(16);
const ETH_RX: ClockId = ClockId(17);
const BUS: ClockId = ClockId(18);

const RST_MON: ResetId = ResetId(0);
const RST_PLAIN: ResetId = ResetId(1);

fn pll_mult(parent: u64, conf: u32) -> u64 {
    parent * (conf & 0xff) as u64
}

static DTABLE_1_2: [DivEntry; 3] = [DivEntry::new(0, 1), DivEntry::new(1, 2), DivEntry::END];

static DTABLE_1_8: [DivEntry; 5] = [
    DivEntry::new(0, 1),
    DivEntry::new(1, 2),
    DivEntry::new(2, 4),
    DivEntry::new(3, 8),
    DivEntry::END,
];

const fn gate(
    parent: ClockId,
    offset: usize,
    bit: u8,
    mon: Option<usize>,
    mstop: Option<Mstop>,
) -> ModuleGate {
    ModuleGate {
        parent,
        on: GateBit { offset, bit },
        mon,
        mstop,
    }
}

const fn div_1_8(parent: ClockId, field: RegField, notifier: Option<Notifier>) -> DividerDesc {
    DividerDesc {
        parent,
        field,
        confirm: None,
        table: &DTABLE_1_8,
        bounds: None,
        limit: None,
        rate_parent: false,
        default: None,
        notifier,
    }
}

static CLOCKS: [ClockDesc; 19] = [
    ClockDesc::input("extal", EXTAL, 24_000_000),
    ClockDesc::pll("pll", PLL, EXTAL, 0x000, pll_mult),
    ClockDesc::fixed("pll2", PLL2, EXTAL, 200, 3),
    ClockDesc::fixed("pll2_div2", PLL2_DIV2, PLL2, 1, 2),
    ClockDesc::fixed("pll2_div3", PLL2_DIV3, PLL2, 1, 3),
    ClockDesc::fixed("pll2_div4", PLL2_DIV4, PLL2, 1, 4),
    ClockDesc::mux(
        "sel_sd",
        SEL_SD,
        MuxDesc {
            parents: &[PLL2_DIV2, PLL2_DIV3, PLL2_DIV4],
            field: RegField::new(0x100, 0, 2),
            confirm: Some(Confirm::Busy(RegField::new(0x200, 0, 1))),
            table: Some(&[0, 2, 3]),
            default: None,
            notifier: None,
        },
    ),
    ClockDesc::divider(
        "sd_div",
        SD_DIV,
        DividerDesc {
            parent: SEL_SD,
            field: RegField::new(0x100, 4, 1),
            confirm: Some(Confirm::Busy(RegField::new(0x200, 1, 1))),
            table: &DTABLE_1_2,
            bounds: Some(RateBounds {
                min: 500_000_000,
                max: 800_000_000,
            }),
            limit: None,
            rate_parent: false,
            default: Some(1),
            notifier: Some(Notifier::ForbiddenParentRate {
                rate: 800_000_000,
                safe_code: 1,
            }),
        },
    ),
    ClockDesc::gate(
        "sd_clk",
        SD_CLK,
        gate(
            SD_DIV,
            0x500,
            0,
            Some(0x680),
            Some(Mstop {
                offset: 0xB60,
                mask: 0x0003,
            }),
        ),
    ),
    ClockDesc::gate(
        "sd_aclk",
        SD_ACLK,
        gate(
            PLL2_DIV4,
            0x500,
            1,
            Some(0x680),
            Some(Mstop {
                offset: 0xB60,
                mask: 0x0001,
            }),
        ),
    ),
    ClockDesc::divider(
        "p_div",
        P_DIV,
        DividerDesc {
            confirm: Some(Confirm::Mirror(RegField::new(0x204, 0, 2))),
            ..div_1_8(PLL2_DIV2, RegField::new(0x104, 0, 2), None)
        },
    ),
    ClockDesc::divider(
        "q_div",
        Q_DIV,
        DividerDesc {
            confirm: Some(Confirm::Busy(RegField::new(0x200, 2, 1))),
            ..div_1_8(
                PLL2_DIV4,
                RegField::new(0x104, 4, 2),
                Some(Notifier::Quiesce { safe_parent: None }),
            )
        },
    ),
    ClockDesc::gate("q_clk", Q_CLK, gate(Q_DIV, 0x500, 2, Some(0x680), None)),
    ClockDesc::mux(
        "sel_p",
        SEL_P,
        MuxDesc {
            parents: &[PLL2_DIV4, EXTAL],
            field: RegField::new(0x108, 0, 1),
            confirm: None,
            table: None,
            default: None,
            notifier: None,
        },
    ),
    ClockDesc::divider(
        "park_div",
        PARK_DIV,
        div_1_8(
            SEL_P,
            RegField::new(0x108, 4, 2),
            Some(Notifier::Quiesce {
                safe_parent: Some(1),
            }),
        ),
    ),
    ClockDesc::gate(
        "park_clk",
        PARK_CLK,
        gate(PARK_DIV, 0x500, 3, Some(0x680), None),
    ),
    ClockDesc::coupled(
        "eth_tx",
        ETH_TX,
        gate(
            PLL2_DIV4,
            0x504,
            0,
            Some(0x684),
            Some(Mstop {
                offset: 0xB64,
                mask: 0x0001,
            }),
        ),
    ),
    ClockDesc::coupled(
        "eth_rx",
        ETH_RX,
        gate(
            PLL2_DIV4,
            0x504,
            0,
            Some(0x684),
            Some(Mstop {
                offset: 0xB64,
                mask: 0x0001,
            }),
        ),
    ),
    ClockDesc::gate("bus", BUS, gate(PLL2_DIV4, 0x504, 1, None, None)),
];

static RESETS: [ResetDesc; 2] = [
    ResetDesc::new(RST_MON, 0x800, 0, Some(0x980)),
    ResetDesc::new(RST_PLAIN, 0x800, 1, None),
];

static TEST_INFO: CpgInfo = CpgInfo {
    clocks: &CLOCKS,
    resets: &RESETS,
    critical: &[BUS],
};

/// A provider with its bring-up writes already cleared from the log.
fn setup() -> Cpg<FakeCpg, FakeDelay> {
    let regs = FakeCpg::new();
    let delay = regs.delay();
    let cpg = Cpg::new(&TEST_INFO, regs, delay).unwrap();
    cpg.registers().clear_log();
    cpg
}

/// Tests of the start-up sequence and teardown
mod lifecycle {
    use super::*;

    #[test]
    fn test_init_programs_defaults_and_critical() {
        let regs = FakeCpg::new();
        let delay = regs.delay();
        let cpg = Cpg::new(&TEST_INFO, regs, delay).unwrap();

        assert_eq!(
            cpg.registers().writes(),
            vec![(0x100, 0x0010_0010), (0x504, 0x0002_0002)]
        );
        assert_eq!(cpg.get_rate(SD_DIV), Ok(400_000_000));
        assert_eq!(cpg.enable_count(BUS), Ok(1));
        assert_eq!(cpg.enable_count(PLL2_DIV4), Ok(1));
        assert_eq!(cpg.enable_count(EXTAL), Ok(1));
        assert_eq!(cpg.is_enabled(BUS), Ok(true));
    }

    #[test]
    fn test_init_keeps_hardware_selection() {
        let regs = FakeCpg::new();
        // sel_sd on its third input (raw value 3)
        regs.poke(0x100, 0x3);
        regs.poke(0x108, 0x1);
        let delay = regs.delay();
        let cpg = Cpg::new(&TEST_INFO, regs, delay).unwrap();

        assert_eq!(cpg.parent(SEL_SD), Ok(Some(PLL2_DIV4)));
        assert_eq!(cpg.parent(SEL_P), Ok(Some(EXTAL)));
        assert_eq!(cpg.get_rate(PARK_DIV), Ok(24_000_000));
    }

    #[test]
    fn test_init_rejects_bad_table() {
        static CLOCKS: [ClockDesc; 2] = [
            ClockDesc::fixed("child", ClockId(1), ClockId(0), 1, 2),
            ClockDesc::input("extal", ClockId(0), 24_000_000),
        ];
        static INFO: CpgInfo = CpgInfo {
            clocks: &CLOCKS,
            resets: &[],
            critical: &[],
        };

        let regs = FakeCpg::new();
        let delay = regs.delay();
        let result = Cpg::new(&INFO, regs, delay);
        assert!(matches!(
            result,
            Err(InitError::Topology(TopologyError::ForwardParent { .. }))
        ));
    }

    #[test]
    fn test_shutdown_leaves_critical_chain() {
        let cpg = setup();
        cpg.enable(SD_CLK).unwrap();
        cpg.enable(Q_CLK).unwrap();
        cpg.enable(Q_CLK).unwrap();
        cpg.enable(ETH_TX).unwrap();
        cpg.enable(PARK_CLK).unwrap();

        cpg.shutdown();

        for id in [SD_CLK, SD_DIV, SEL_SD, PLL2_DIV2, Q_CLK, Q_DIV, ETH_TX, PARK_CLK, SEL_P] {
            assert_eq!(cpg.enable_count(id), Ok(0));
        }
        assert_eq!(cpg.enable_count(BUS), Ok(1));
        assert_eq!(cpg.enable_count(PLL2_DIV4), Ok(1));
        assert_eq!(cpg.enable_count(PLL2), Ok(1));
        assert_eq!(cpg.enable_count(EXTAL), Ok(1));

        let regs = cpg.registers();
        assert_eq!(regs.read32(0x500) & 0xffff, 0);
        assert_eq!(regs.read32(0x504) & 0xffff, 0x0002);
        assert_eq!(regs.read32(0xB60) & 0xffff, 0x0003);
        assert_eq!(regs.read32(0xB64) & 0xffff, 0x0001);
    }
}

/// Tests of enable/disable and module gating
mod gating {
    use super::*;

    #[test]
    fn test_enable_then_disable_restores_state() {
        let cpg = setup();

        cpg.enable(SD_CLK).unwrap();
        cpg.enable(SD_CLK).unwrap();
        assert_eq!(cpg.enable_count(SD_CLK), Ok(2));
        assert_eq!(cpg.enable_count(SD_DIV), Ok(1));
        assert_eq!(cpg.enable_count(PLL2), Ok(2));
        assert_eq!(cpg.is_enabled(SD_CLK), Ok(true));

        cpg.disable(SD_CLK).unwrap();
        assert_eq!(cpg.is_enabled(SD_CLK), Ok(true));
        cpg.disable(SD_CLK).unwrap();

        assert_eq!(cpg.is_enabled(SD_CLK), Ok(false));
        for id in [SD_CLK, SD_DIV, SEL_SD, PLL2_DIV2] {
            assert_eq!(cpg.enable_count(id), Ok(0));
        }
        // Still held by the critical bus clock.
        assert_eq!(cpg.enable_count(PLL2), Ok(1));
    }

    #[test]
    fn test_enable_writes_gate_before_mstop() {
        let cpg = setup();

        cpg.enable(SD_CLK).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![(0x500, 0x0001_0001), (0xB60, 0x0003_0000)]
        );

        cpg.registers().clear_log();
        cpg.disable(SD_CLK).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![(0xB60, 0x0003_0003), (0x500, 0x0001_0000)]
        );
    }

    #[test]
    fn test_enable_monitor_timeout() {
        let cpg = setup();
        cpg.registers().stick_low(0x680, 0x1);

        assert_eq!(cpg.enable(SD_CLK), Err(ErrorCode::HardwareTimeout));

        // Only the gate write was attempted, and the parents are released.
        assert_eq!(cpg.registers().writes(), vec![(0x500, 0x0001_0001)]);
        assert!(cpg.registers().waited_ns() >= 10_000);
        for id in [SD_CLK, SD_DIV, SEL_SD, PLL2_DIV2] {
            assert_eq!(cpg.enable_count(id), Ok(0));
        }
        assert_eq!(cpg.enable_count(PLL2), Ok(1));
    }

    #[test]
    fn test_disable_without_enable() {
        let cpg = setup();

        assert_eq!(cpg.disable(SD_CLK), Err(ErrorCode::NotEnabled));
        assert_eq!(cpg.disable(PLL2_DIV2), Err(ErrorCode::NotEnabled));
        assert!(cpg.registers().writes().is_empty());
    }

    #[test]
    fn test_disable_only_drops_consumer_references() {
        let cpg = setup();

        // The bus clock runs from pll2_div4 but nobody enabled it directly.
        assert_eq!(cpg.disable(PLL2_DIV4), Err(ErrorCode::NotEnabled));
        assert_eq!(cpg.enable_count(PLL2_DIV4), Ok(1));
        assert_eq!(cpg.is_enabled(PLL2_DIV4), Ok(true));
        assert_eq!(cpg.is_enabled(BUS), Ok(true));

        cpg.enable(SD_CLK).unwrap();
        assert_eq!(cpg.disable(SD_DIV), Err(ErrorCode::NotEnabled));
        assert_eq!(cpg.enable_count(SD_DIV), Ok(1));
        assert_eq!(cpg.is_enabled(SD_CLK), Ok(true));

        cpg.enable(PLL2_DIV4).unwrap();
        cpg.disable(PLL2_DIV4).unwrap();
        assert_eq!(cpg.disable(PLL2_DIV4), Err(ErrorCode::NotEnabled));
        assert_eq!(cpg.enable_count(PLL2_DIV4), Ok(1));
    }

    #[test]
    fn test_critical_clock_never_stops() {
        let cpg = setup();

        assert_eq!(cpg.disable(BUS), Err(ErrorCode::ProtectedClock));
        assert!(cpg.registers().writes().is_empty());

        cpg.enable(BUS).unwrap();
        cpg.disable(BUS).unwrap();
        assert_eq!(cpg.disable(BUS), Err(ErrorCode::ProtectedClock));
        assert_eq!(cpg.disable(BUS), Err(ErrorCode::ProtectedClock));

        cpg.shutdown();
        assert_eq!(cpg.enable_count(BUS), Ok(1));
        assert_eq!(cpg.is_enabled(BUS), Ok(true));
        assert!(cpg.registers().writes().is_empty());
    }

    #[test]
    fn test_mstop_bits_are_reference_counted() {
        let cpg = setup();

        cpg.enable(SD_CLK).unwrap();
        cpg.registers().clear_log();

        // Bit 0 of the MSTOP register is already released.
        cpg.enable(SD_ACLK).unwrap();
        assert_eq!(cpg.registers().writes(), vec![(0x500, 0x0002_0002)]);

        cpg.registers().clear_log();
        cpg.disable(SD_CLK).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![(0xB60, 0x0002_0002), (0x500, 0x0001_0000)]
        );

        cpg.registers().clear_log();
        cpg.disable(SD_ACLK).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![(0xB60, 0x0001_0001), (0x500, 0x0002_0000)]
        );
        assert_eq!(cpg.registers().read32(0xB60) & 0xffff, 0x0003);
    }

    #[test]
    fn test_coupled_gates_share_bit() {
        let cpg = setup();

        cpg.enable(ETH_TX).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![(0x504, 0x0001_0001), (0xB64, 0x0001_0000)]
        );

        cpg.registers().clear_log();
        cpg.enable(ETH_RX).unwrap();
        assert!(cpg.registers().writes().is_empty());

        cpg.disable(ETH_TX).unwrap();
        assert!(cpg.registers().writes().is_empty());
        assert_eq!(cpg.is_enabled(ETH_RX), Ok(true));
        assert_eq!(cpg.is_enabled(ETH_TX), Ok(true));

        cpg.disable(ETH_RX).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![(0xB64, 0x0001_0001), (0x504, 0x0001_0000)]
        );
        assert_eq!(cpg.is_enabled(ETH_RX), Ok(false));
    }

    #[test]
    fn test_unknown_clock() {
        let cpg = setup();

        assert_eq!(cpg.enable(ClockId(99)), Err(ErrorCode::InvalidClock));
        assert_eq!(cpg.get_rate(ClockId(99)), Err(ErrorCode::InvalidClock));
    }
}

/// Tests of rate queries and rate selection
mod rates {
    use super::*;

    #[test]
    fn test_fixed_factor_rate() {
        let cpg = setup();

        assert_eq!(cpg.get_rate(PLL2), Ok(1_600_000_000));
        assert_eq!(cpg.get_rate(PLL2_DIV2), Ok(800_000_000));
        assert_eq!(cpg.get_rate(PLL2_DIV3), Ok(533_333_333));
        assert_eq!(cpg.get_rate(SD_ACLK), Ok(400_000_000));
    }

    #[test]
    fn test_pll_rate_follows_configuration() {
        let cpg = setup();

        assert_eq!(cpg.get_rate(PLL), Ok(2_400_000_000));
        cpg.registers().poke(0x000, 50);
        assert_eq!(cpg.get_rate(PLL), Ok(1_200_000_000));
    }

    #[test]
    fn test_divider_picks_closest_rate_below() {
        let cpg = setup();

        assert_eq!(cpg.set_rate(P_DIV, 150_000_000), Ok(100_000_000));
        assert_eq!(cpg.registers().read32(0x104) & 0x3, 0x3);

        assert_eq!(cpg.set_rate(P_DIV, 450_000_000), Ok(400_000_000));
        assert_eq!(cpg.set_rate(P_DIV, 1_000_000_000), Ok(800_000_000));
    }

    #[test]
    fn test_divider_rate_too_low() {
        let cpg = setup();

        assert_eq!(
            cpg.set_rate(P_DIV, 50_000_000),
            Err(ErrorCode::RateOutOfRange)
        );
        assert!(cpg.registers().writes().is_empty());
    }

    #[test]
    fn test_divider_parent_outside_bounds() {
        let cpg = setup();

        cpg.set_mux(SEL_SD, 2).unwrap();
        assert_eq!(cpg.get_rate(SEL_SD), Ok(400_000_000));

        cpg.registers().clear_log();
        assert_eq!(
            cpg.set_rate(SD_DIV, 200_000_000),
            Err(ErrorCode::RateOutOfRange)
        );
        assert!(cpg.registers().writes().is_empty());

        cpg.set_mux(SEL_SD, 1).unwrap();
        assert_eq!(cpg.set_rate(SD_DIV, 600_000_000), Ok(533_333_333));
    }

    #[test]
    fn test_mux_set_rate() {
        let cpg = setup();

        assert_eq!(cpg.set_rate(SEL_SD, 600_000_000), Ok(533_333_333));
        assert_eq!(cpg.parent(SEL_SD), Ok(Some(PLL2_DIV3)));
        assert_eq!(
            cpg.set_rate(SEL_SD, 100_000_000),
            Err(ErrorCode::RateOutOfRange)
        );
    }

    #[test]
    fn test_set_rate_propagates_to_parent() {
        let cpg = setup();

        assert_eq!(cpg.set_rate(Q_CLK, 200_000_000), Ok(200_000_000));
        assert_eq!(cpg.get_rate(Q_DIV), Ok(200_000_000));

        assert_eq!(cpg.set_rate(PLL2, 1_600_000_000), Ok(1_600_000_000));
        assert_eq!(
            cpg.set_rate(PLL2, 1_000_000_000),
            Err(ErrorCode::RateOutOfRange)
        );
        assert_eq!(cpg.set_rate(EXTAL, 25_000_000), Ok(24_000_000));
        assert_eq!(
            cpg.set_rate(EXTAL, 23_000_000),
            Err(ErrorCode::RateOutOfRange)
        );
    }

    #[test]
    fn test_fixed_rates_satisfy_requests_above_them() {
        let cpg = setup();

        // 1.6 GHz / 3 is not a whole number of Hz.
        let rate = cpg.get_rate(PLL2_DIV3).unwrap();
        assert_eq!(cpg.set_rate(PLL2_DIV3, rate), Ok(533_333_333));
        assert_eq!(cpg.set_rate(SD_ACLK, 450_000_000), Ok(400_000_000));
        assert_eq!(cpg.set_rate(PLL, u64::MAX), Ok(2_400_000_000));
        assert_eq!(
            cpg.set_rate(PLL, 2_399_999_999),
            Err(ErrorCode::RateOutOfRange)
        );
        assert_eq!(
            cpg.set_rate(SD_ACLK, 399_999_999),
            Err(ErrorCode::RateOutOfRange)
        );
        assert!(cpg.registers().writes().is_empty());
    }

    #[test]
    fn test_divider_may_switch_its_source() {
        static CLOCKS: [ClockDesc; 5] = [
            ClockDesc::input("extal", ClockId(0), 24_000_000),
            ClockDesc::fixed("fast", ClockId(1), ClockId(0), 100, 3),
            ClockDesc::fixed("slow", ClockId(2), ClockId(0), 125, 6),
            ClockDesc::mux(
                "sel",
                ClockId(3),
                MuxDesc {
                    parents: &[ClockId(1), ClockId(2)],
                    field: RegField::new(0x100, 0, 1),
                    confirm: None,
                    table: None,
                    default: None,
                    notifier: None,
                },
            ),
            ClockDesc::divider(
                "div",
                ClockId(4),
                DividerDesc {
                    limit: Some(500_000_000),
                    rate_parent: true,
                    ..div_1_8(
                        ClockId(3),
                        RegField::new(0x100, 4, 2),
                        Some(Notifier::ForbiddenParentRate {
                            rate: 800_000_000,
                            safe_code: 1,
                        }),
                    )
                },
            ),
        ];
        static INFO: CpgInfo = CpgInfo {
            clocks: &CLOCKS,
            resets: &[],
            critical: &[],
        };

        let regs = FakeCpg::new();
        let delay = regs.delay();
        let cpg = Cpg::new(&INFO, regs, delay).unwrap();
        assert_eq!(cpg.get_rate(ClockId(4)), Ok(800_000_000));

        // 500 MHz is only reachable from the slow input.
        assert_eq!(cpg.set_rate(ClockId(4), 1_000_000_000), Ok(500_000_000));
        assert_eq!(cpg.parent(ClockId(3)), Ok(Some(ClockId(2))));
        assert_eq!(cpg.registers().writes(), vec![(0x100, 0x0001_0001)]);

        // Back on the fast input the divider leaves 1 before the switch.
        cpg.registers().clear_log();
        assert_eq!(cpg.set_rate(ClockId(4), 400_000_000), Ok(400_000_000));
        assert_eq!(
            cpg.registers().writes(),
            vec![(0x100, 0x0030_0010), (0x100, 0x0001_0000)]
        );

        assert_eq!(cpg.set_rate(ClockId(4), 300_000_000), Ok(250_000_000));
        assert_eq!(cpg.parent(ClockId(3)), Ok(Some(ClockId(2))));

        // Ties keep the current selection.
        cpg.registers().clear_log();
        assert_eq!(cpg.set_rate(ClockId(4), 250_000_000), Ok(250_000_000));
        assert!(cpg.registers().writes().is_empty());

        assert_eq!(
            cpg.set_rate(ClockId(4), 50_000_000),
            Err(ErrorCode::RateOutOfRange)
        );
    }
}

/// Tests of the divider and mux change sequence
mod reconfiguration {
    use super::*;

    #[test]
    fn test_quiesce_wraps_divider_write() {
        let cpg = setup();
        cpg.enable(Q_CLK).unwrap();
        cpg.registers().clear_log();

        cpg.set_divisor(Q_DIV, 2).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![
                (0x500, 0x0004_0000),
                (0x104, 0x0030_0020),
                (0x500, 0x0004_0004),
            ]
        );
        assert_eq!(cpg.get_rate(Q_CLK), Ok(100_000_000));
        assert_eq!(cpg.is_enabled(Q_CLK), Ok(true));
    }

    #[test]
    fn test_quiesce_skips_stopped_consumers() {
        let cpg = setup();

        cpg.set_divisor(Q_DIV, 1).unwrap();
        assert_eq!(cpg.registers().writes(), vec![(0x104, 0x0030_0010)]);
    }

    #[test]
    fn test_post_change_runs_after_timeout() {
        let cpg = setup();
        cpg.enable(Q_CLK).unwrap();
        cpg.registers().clear_log();
        cpg.registers().stick_high(0x200, 0x4);

        assert_eq!(cpg.set_divisor(Q_DIV, 3), Err(ErrorCode::HardwareTimeout));
        assert_eq!(
            cpg.registers().writes(),
            vec![
                (0x500, 0x0004_0000),
                (0x104, 0x0030_0030),
                (0x500, 0x0004_0004),
            ]
        );
        assert!(cpg.registers().waited_ns() >= 200_000);

        // The attempted divisor is kept.
        assert_eq!(cpg.get_rate(Q_DIV), Ok(50_000_000));
        assert_eq!(cpg.is_enabled(Q_CLK), Ok(true));
    }

    #[test]
    fn test_quiesce_parks_parent_mux() {
        let cpg = setup();
        cpg.enable(PARK_CLK).unwrap();
        let extal = cpg.enable_count(EXTAL).unwrap();
        cpg.registers().clear_log();

        cpg.set_divisor(PARK_DIV, 1).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![
                (0x500, 0x0008_0000),
                (0x108, 0x0001_0001),
                (0x108, 0x0030_0010),
                (0x108, 0x0001_0000),
                (0x500, 0x0008_0008),
            ]
        );
        assert_eq!(cpg.parent(SEL_P), Ok(Some(PLL2_DIV4)));
        assert_eq!(cpg.get_rate(PARK_DIV), Ok(200_000_000));
        assert_eq!(cpg.enable_count(EXTAL), Ok(extal));
    }

    #[test]
    fn test_quiesce_gates_coupled_bit_once() {
        static CLOCKS: [ClockDesc; 5] = [
            ClockDesc::input("extal", ClockId(0), 24_000_000),
            ClockDesc::fixed("half", ClockId(1), ClockId(0), 1, 2),
            ClockDesc::mux(
                "sel",
                ClockId(2),
                MuxDesc {
                    parents: &[ClockId(0), ClockId(1)],
                    field: RegField::new(0x108, 0, 1),
                    confirm: None,
                    table: None,
                    default: None,
                    notifier: Some(Notifier::Quiesce { safe_parent: None }),
                },
            ),
            ClockDesc::coupled("tx", ClockId(3), gate(ClockId(2), 0x504, 0, Some(0x684), None)),
            ClockDesc::coupled("rx", ClockId(4), gate(ClockId(2), 0x504, 0, Some(0x684), None)),
        ];
        static INFO: CpgInfo = CpgInfo {
            clocks: &CLOCKS,
            resets: &[],
            critical: &[],
        };

        let regs = FakeCpg::new();
        let delay = regs.delay();
        let cpg = Cpg::new(&INFO, regs, delay).unwrap();

        // Only the second half runs; the shared bit still has to go down.
        cpg.enable(ClockId(4)).unwrap();
        cpg.registers().clear_log();
        cpg.set_mux(ClockId(2), 1).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![
                (0x504, 0x0001_0000),
                (0x108, 0x0001_0001),
                (0x504, 0x0001_0001),
            ]
        );
        assert_eq!(cpg.is_enabled(ClockId(3)), Ok(true));
        assert_eq!(cpg.get_rate(ClockId(4)), Ok(12_000_000));
    }

    #[test]
    fn test_mirror_confirmation() {
        let cpg = setup();

        cpg.set_divisor(P_DIV, 2).unwrap();
        assert_eq!(cpg.get_rate(P_DIV), Ok(200_000_000));

        cpg.registers().stick_low(0x204, 0x1);
        assert_eq!(cpg.set_divisor(P_DIV, 1), Err(ErrorCode::HardwareTimeout));
        assert_eq!(cpg.get_rate(P_DIV), Ok(400_000_000));
    }

    #[test]
    fn test_forbidden_parent_rate() {
        let cpg = setup();

        // Divisor 1 is refused while the mux provides 800 MHz.
        assert_eq!(cpg.set_divisor(SD_DIV, 0), Err(ErrorCode::RateOutOfRange));
        assert_eq!(cpg.set_rate(SD_DIV, 800_000_000), Ok(400_000_000));

        cpg.set_mux(SEL_SD, 1).unwrap();
        cpg.set_divisor(SD_DIV, 0).unwrap();
        assert_eq!(cpg.get_rate(SD_DIV), Ok(533_333_333));

        // Going back to 800 MHz moves the divider off 1 first.
        cpg.registers().clear_log();
        cpg.set_mux(SEL_SD, 0).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![(0x100, 0x0010_0010), (0x100, 0x0003_0000)]
        );
        assert_eq!(cpg.get_rate(SD_DIV), Ok(400_000_000));
    }

    #[test]
    fn test_mux_uses_value_table() {
        let cpg = setup();

        cpg.set_mux(SEL_SD, 1).unwrap();
        cpg.set_mux(SEL_SD, 2).unwrap();
        assert_eq!(
            cpg.registers().writes(),
            vec![(0x100, 0x0003_0002), (0x100, 0x0003_0003)]
        );
        assert_eq!(cpg.registers().read32(0x100) & 0xffff, 0x0013);
    }

    #[test]
    fn test_reparent_moves_reference() {
        let cpg = setup();
        let extal = cpg.enable_count(EXTAL).unwrap();
        let pll2_div4 = cpg.enable_count(PLL2_DIV4).unwrap();

        cpg.enable(PARK_CLK).unwrap();
        assert_eq!(cpg.enable_count(PLL2_DIV4), Ok(pll2_div4 + 1));

        cpg.set_mux(SEL_P, 1).unwrap();
        assert_eq!(cpg.parent(SEL_P), Ok(Some(EXTAL)));
        assert_eq!(cpg.enable_count(PLL2_DIV4), Ok(pll2_div4));
        assert_eq!(cpg.enable_count(EXTAL), Ok(extal + 1));

        cpg.disable(PARK_CLK).unwrap();
        assert_eq!(cpg.enable_count(EXTAL), Ok(extal));
        assert_eq!(cpg.enable_count(SEL_P), Ok(0));
    }

    #[test]
    fn test_invalid_selection() {
        let cpg = setup();

        assert_eq!(cpg.set_mux(SEL_P, 2), Err(ErrorCode::InvalidSelection));
        assert_eq!(cpg.set_divisor(P_DIV, 7), Err(ErrorCode::InvalidSelection));
        assert_eq!(cpg.set_mux(P_DIV, 0), Err(ErrorCode::NotSupported));
        assert_eq!(cpg.set_divisor(SEL_P, 0), Err(ErrorCode::NotSupported));
        assert!(cpg.registers().writes().is_empty());
    }
}

/// Tests of the reset lines
mod resets {
    use super::*;

    #[test]
    fn test_assert_and_deassert() {
        let cpg = setup();
        assert_eq!(cpg.reset_status(RST_MON), Ok(true));

        cpg.deassert_reset(RST_MON).unwrap();
        assert_eq!(cpg.reset_status(RST_MON), Ok(false));

        cpg.assert_reset(RST_MON).unwrap();
        assert_eq!(cpg.reset_status(RST_MON), Ok(true));

        assert_eq!(
            cpg.registers().writes(),
            vec![(0x800, 0x0001_0001), (0x800, 0x0001_0000)]
        );
    }

    #[test]
    fn test_reset_pulse() {
        let cpg = setup();

        cpg.reset(RST_PLAIN).unwrap();
        assert_eq!(
            cpg.registers().events(),
            vec![
                Event::Write(0x800, 0x0002_0000),
                Event::Delay(35_000),
                Event::Write(0x800, 0x0002_0002),
            ]
        );
        assert_eq!(cpg.reset_status(RST_PLAIN), Ok(false));
    }

    #[test]
    fn test_reset_monitor_timeout() {
        let cpg = setup();
        cpg.deassert_reset(RST_MON).unwrap();
        cpg.registers().stick_low(0x980, 0x1);

        assert_eq!(
            cpg.assert_reset(RST_MON),
            Err(ErrorCode::HardwareTimeout)
        );
        assert!(cpg.registers().waited_ns() >= 100_000);
    }

    #[test]
    fn test_reset_ignores_clock_state() {
        let cpg = setup();

        cpg.deassert_reset(RST_PLAIN).unwrap();
        assert_eq!(cpg.enable_count(SD_CLK), Ok(0));
        assert_eq!(cpg.registers().writes(), vec![(0x800, 0x0002_0002)]);
    }

    #[test]
    fn test_unknown_reset() {
        let cpg = setup();

        assert_eq!(cpg.assert_reset(ResetId(7)), Err(ErrorCode::InvalidReset));
        assert_eq!(cpg.reset_status(ResetId(7)), Err(ErrorCode::InvalidReset));
    }
}

/// Tests of table validation
mod topology {
    use super::*;

    static EXTAL_ONLY: [ClockDesc; 1] = [ClockDesc::input("extal", ClockId(0), 24_000_000)];

    fn resolve(info: &'static CpgInfo) -> Option<TopologyError> {
        Graph::resolve(info, REGION_SIZE).err()
    }

    #[test]
    fn test_resolves_test_table() {
        let graph = Graph::resolve(&TEST_INFO, REGION_SIZE).unwrap();
        assert_eq!(graph.len(), CLOCKS.len());
        assert!(graph.is_critical(18));
        assert_eq!(graph.sibling(16), Some(17));
        assert_eq!(graph.parents(6), &[3, 4, 5]);
        assert_eq!(graph.children(5).collect::<Vec<_>>(), vec![6, 9, 11, 13, 16, 17, 18]);
    }

    #[test]
    fn test_rejects_forward_parent() {
        static CLOCKS: [ClockDesc; 2] = [
            ClockDesc::fixed("child", ClockId(1), ClockId(0), 1, 2),
            ClockDesc::input("extal", ClockId(0), 24_000_000),
        ];
        static INFO: CpgInfo = CpgInfo {
            clocks: &CLOCKS,
            resets: &[],
            critical: &[],
        };

        assert_eq!(
            resolve(&INFO),
            Some(TopologyError::ForwardParent {
                clock: ClockId(1),
                parent: ClockId(0)
            })
        );
    }

    #[test]
    fn test_rejects_unknown_parent() {
        static CLOCKS: [ClockDesc; 1] = [ClockDesc::fixed("orphan", ClockId(1), ClockId(9), 1, 2)];
        static INFO: CpgInfo = CpgInfo {
            clocks: &CLOCKS,
            resets: &[],
            critical: &[],
        };

        assert_eq!(
            resolve(&INFO),
            Some(TopologyError::UnknownParent {
                clock: ClockId(1),
                parent: ClockId(9)
            })
        );
    }

    #[test]
    fn test_rejects_duplicate_and_zero_factor() {
        static DUPLICATE: [ClockDesc; 2] = [
            ClockDesc::input("a", ClockId(0), 1),
            ClockDesc::input("b", ClockId(0), 2),
        ];
        static DUPLICATE_INFO: CpgInfo = CpgInfo {
            clocks: &DUPLICATE,
            resets: &[],
            critical: &[],
        };
        static ZERO: [ClockDesc; 2] = [
            ClockDesc::input("extal", ClockId(0), 24_000_000),
            ClockDesc::fixed("bad", ClockId(1), ClockId(0), 1, 0),
        ];
        static ZERO_INFO: CpgInfo = CpgInfo {
            clocks: &ZERO,
            resets: &[],
            critical: &[],
        };

        assert_eq!(
            resolve(&DUPLICATE_INFO),
            Some(TopologyError::DuplicateClock(ClockId(0)))
        );
        assert_eq!(
            resolve(&ZERO_INFO),
            Some(TopologyError::ZeroFactor(ClockId(1)))
        );
    }

    #[test]
    fn test_rejects_bad_divider_tables() {
        static UNTERMINATED: [DivEntry; 2] = [DivEntry::new(0, 1), DivEntry::new(1, 2)];
        static REPEATED: [DivEntry; 3] = [DivEntry::new(0, 1), DivEntry::new(0, 2), DivEntry::END];
        static CLOCKS_A: [ClockDesc; 2] = [
            ClockDesc::input("extal", ClockId(0), 24_000_000),
            ClockDesc::divider(
                "div",
                ClockId(1),
                DividerDesc {
                    table: &UNTERMINATED,
                    ..div_1_8(ClockId(0), RegField::new(0x100, 0, 2), None)
                },
            ),
        ];
        static CLOCKS_B: [ClockDesc; 2] = [
            ClockDesc::input("extal", ClockId(0), 24_000_000),
            ClockDesc::divider(
                "div",
                ClockId(1),
                DividerDesc {
                    table: &REPEATED,
                    ..div_1_8(ClockId(0), RegField::new(0x100, 0, 2), None)
                },
            ),
        ];
        static INFO_A: CpgInfo = CpgInfo {
            clocks: &CLOCKS_A,
            resets: &[],
            critical: &[],
        };
        static INFO_B: CpgInfo = CpgInfo {
            clocks: &CLOCKS_B,
            resets: &[],
            critical: &[],
        };

        assert_eq!(
            resolve(&INFO_A),
            Some(TopologyError::UnterminatedTable(ClockId(1)))
        );
        assert_eq!(
            resolve(&INFO_B),
            Some(TopologyError::DuplicateCode {
                clock: ClockId(1),
                code: 0
            })
        );
    }

    #[test]
    fn test_rejects_fields_outside_region() {
        static CLOCKS: [ClockDesc; 2] = [
            ClockDesc::input("extal", ClockId(0), 24_000_000),
            ClockDesc::divider(
                "div",
                ClockId(1),
                div_1_8(ClockId(0), RegField::new(0x2000, 0, 2), None),
            ),
        ];
        static INFO: CpgInfo = CpgInfo {
            clocks: &CLOCKS,
            resets: &[],
            critical: &[],
        };

        assert_eq!(
            resolve(&INFO),
            Some(TopologyError::BadField {
                clock: ClockId(1),
                offset: 0x2000
            })
        );
    }

    #[test]
    fn test_status_fields_may_use_upper_half() {
        static CLOCKS: [ClockDesc; 3] = [
            ClockDesc::input("extal", ClockId(0), 24_000_000),
            ClockDesc::divider(
                "status_high",
                ClockId(1),
                DividerDesc {
                    confirm: Some(Confirm::Busy(RegField::new(0x280, 24, 1))),
                    ..div_1_8(ClockId(0), RegField::new(0x218, 0, 2), None)
                },
            ),
            ClockDesc::divider(
                "control_high",
                ClockId(2),
                div_1_8(ClockId(0), RegField::new(0x218, 16, 2), None),
            ),
        ];
        static INFO: CpgInfo = CpgInfo {
            clocks: &CLOCKS,
            resets: &[],
            critical: &[],
        };

        assert_eq!(
            resolve(&INFO),
            Some(TopologyError::BadField {
                clock: ClockId(2),
                offset: 0x218
            })
        );
    }

    #[test]
    fn test_rejects_lonely_coupled_gate() {
        static CLOCKS: [ClockDesc; 2] = [
            ClockDesc::input("extal", ClockId(0), 24_000_000),
            ClockDesc::coupled("half", ClockId(1), gate(ClockId(0), 0x500, 0, None, None)),
        ];
        static INFO: CpgInfo = CpgInfo {
            clocks: &CLOCKS,
            resets: &[],
            critical: &[],
        };

        assert_eq!(resolve(&INFO), Some(TopologyError::BadCoupling(ClockId(1))));
    }

    #[test]
    fn test_rejects_critical_non_gate() {
        static INFO: CpgInfo = CpgInfo {
            clocks: &EXTAL_ONLY,
            resets: &[],
            critical: &[ClockId(0)],
        };

        assert_eq!(resolve(&INFO), Some(TopologyError::BadCritical(ClockId(0))));
    }

    #[test]
    fn test_rejects_duplicate_reset() {
        static RESETS: [ResetDesc; 2] = [
            ResetDesc::new(ResetId(0), 0x800, 0, None),
            ResetDesc::new(ResetId(0), 0x800, 1, None),
        ];
        static INFO: CpgInfo = CpgInfo {
            clocks: &EXTAL_ONLY,
            resets: &RESETS,
            critical: &[],
        };

        assert_eq!(resolve(&INFO), Some(TopologyError::DuplicateReset(ResetId(0))));
    }
}

/// Tests of callers on several threads sharing one provider
mod concurrency {
    use super::*;
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::thread;

    const ROUNDS: u32 = 200;

    /// Status reads for which a q_div update stays busy.
    const BUSY_READS: u32 = 2;

    /// A register file that can be shared between threads.
    ///
    /// A write to the divider word at 0x104 raises the q_div busy flag for
    /// the next [`BUSY_READS`] status reads. A write arriving while the flag
    /// is still up belongs to a sequence that did not wait for the update.
    struct SharedCpg {
        words: Vec<AtomicU32>,
        busy_reads: AtomicU32,
        overlapped: AtomicBool,
        writes: Mutex<Vec<(usize, u32)>>,
    }

    impl SharedCpg {
        fn new() -> Self {
            let words: Vec<AtomicU32> = (0..REGION_SIZE / 4).map(|_| AtomicU32::new(0)).collect();
            words[0x000 / 4].store(100, Ordering::SeqCst);
            words[0xB60 / 4].store(0x0003, Ordering::SeqCst);
            words[0xB64 / 4].store(0x0001, Ordering::SeqCst);
            Self {
                words,
                busy_reads: AtomicU32::new(0),
                overlapped: AtomicBool::new(false),
                writes: Mutex::new(Vec::new()),
            }
        }

        fn word(&self, offset: usize) -> u32 {
            self.words[offset / 4].load(Ordering::SeqCst)
        }

        fn writes_to(&self, offset: usize) -> usize {
            self.writes
                .lock()
                .unwrap()
                .iter()
                .filter(|(to, _)| *to == offset)
                .count()
        }
    }

    impl RegisterSpace for SharedCpg {
        fn size(&self) -> usize {
            REGION_SIZE
        }

        fn read32(&self, offset: usize) -> u32 {
            match offset {
                0x680 | 0x684 => self.word(offset - 0x180) & 0xffff,
                0x200 => {
                    let busy = self
                        .busy_reads
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                        .is_ok();
                    if busy {
                        0x4
                    } else {
                        0
                    }
                }
                _ => self.word(offset),
            }
        }

        fn write32(&self, offset: usize, value: u32) {
            if self.busy_reads.load(Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            if offset == 0x104 {
                self.busy_reads.store(BUSY_READS, Ordering::SeqCst);
            }
            self.writes.lock().unwrap().push((offset, value));
            let mask = value >> 16;
            let _ = self.words[offset / 4].fetch_update(Ordering::SeqCst, Ordering::SeqCst, |word| {
                Some((word & !mask) | (value & mask))
            });
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn test_concurrent_callers_are_serialized() {
        let cpg = Cpg::new(&TEST_INFO, SharedCpg::new(), NoDelay).unwrap();

        thread::scope(|s| {
            // sd_clk and sd_aclk share MSTOP bit 0.
            s.spawn(|| {
                for _ in 0..ROUNDS {
                    cpg.enable(SD_CLK).unwrap();
                    cpg.enable(SD_ACLK).unwrap();
                    cpg.disable(SD_CLK).unwrap();
                    cpg.disable(SD_ACLK).unwrap();
                }
            });
            s.spawn(|| {
                for _ in 0..ROUNDS {
                    cpg.enable(SD_ACLK).unwrap();
                    cpg.disable(SD_ACLK).unwrap();
                }
            });
            // eth_tx and eth_rx share an enable bit.
            for half in [ETH_TX, ETH_RX] {
                let cpg = &cpg;
                s.spawn(move || {
                    for _ in 0..ROUNDS {
                        cpg.enable(half).unwrap();
                        cpg.disable(half).unwrap();
                    }
                });
            }
            s.spawn(|| {
                for round in 0..ROUNDS {
                    cpg.enable(Q_CLK).unwrap();
                    cpg.set_divisor(Q_DIV, round % 4).unwrap();
                    cpg.disable(Q_CLK).unwrap();
                }
            });
        });

        let regs = cpg.registers();
        assert!(!regs.overlapped.load(Ordering::SeqCst));

        for id in [SD_CLK, SD_ACLK, SD_DIV, ETH_TX, ETH_RX, Q_CLK, Q_DIV] {
            assert_eq!(cpg.enable_count(id), Ok(0));
        }
        assert_eq!(cpg.enable_count(BUS), Ok(1));
        assert_eq!(cpg.enable_count(PLL2_DIV4), Ok(1));

        assert_eq!(regs.word(0x500) & 0xffff, 0);
        assert_eq!(regs.word(0x504) & 0xffff, 0x0002);
        assert_eq!(regs.word(0xB60) & 0xffff, 0x0003);
        assert_eq!(regs.word(0xB64) & 0xffff, 0x0001);

        // Every round but the first changed the divisor once.
        assert_eq!(regs.writes_to(0x104), (ROUNDS - 1) as usize);
        assert_eq!(cpg.get_rate(Q_DIV), Ok(50_000_000));
    }
}

/// Tests of the register access layer
mod registers {
    use super::*;

    #[test]
    fn test_masked_word() {
        assert_eq!(masked_word(0x0003, 0x0002), 0x0003_0002);
        // Value bits outside the mask are dropped.
        assert_eq!(masked_word(0x0001, 0x0003), 0x0001_0001);
    }

    #[test]
    fn test_poll_until_reads_once_more_after_deadline() {
        let regs = Registers::new(FakeCpg::new(), 1, false);
        let mut delay = regs.space().delay();
        regs.space().stick_high(0x200, 0x1);

        assert_eq!(
            regs.poll_until(&mut delay, 0x200, 0x1, 0, 5),
            Err(ErrorCode::HardwareTimeout)
        );
        assert_eq!(regs.space().waited_ns(), 5_000);
        assert_eq!(regs.poll_until(&mut delay, 0x200, 0x1, 0x1, 5), Ok(0x1));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_offset_panics() {
        let regs = Registers::new(FakeCpg::new(), 1, false);
        regs.read(REGION_SIZE);
    }

    #[test]
    #[should_panic]
    fn test_misaligned_offset_panics() {
        let regs = Registers::new(FakeCpg::new(), 1, false);
        regs.write_masked(0x102, 0x1, 0x1);
    }
}
