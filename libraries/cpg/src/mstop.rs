// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Module gate coordinator.
//!
//! Two kinds of hardware bits are shared between logically independent
//! clocks and need their own reference counts, separate from the per-node
//! enable counts:
//!
//! - Module-stop (MSTOP) bits. Each bit of an MSTOP register stops the bus
//!   interface of a group of modules in one power domain. A bit is released
//!   (cleared) when the first clock mapped to it starts, and set again only
//!   once every clock mapped to it has stopped. Several clocks may name the
//!   same bit.
//! - The enable bit of a coupled gate pair. The bit is set when either half
//!   is enabled and cleared only when both halves are disabled.

use alloc::collections::BTreeMap;

use crate::descriptor::{ClockKind, ModuleGate, Mstop};
use crate::registers::{RegisterSpace, Registers};
use crate::topology::Graph;

pub struct GateCoordinator {
    /// Users of every bit of every MSTOP register.
    stop: BTreeMap<usize, [u32; 16]>,
    /// Enabled halves of every coupled enable bit.
    coupled: BTreeMap<(usize, u8), u32>,
}

impl GateCoordinator {
    pub fn new(graph: &Graph) -> GateCoordinator {
        let mut stop = BTreeMap::new();
        let mut coupled = BTreeMap::new();
        for desc in graph.info().clocks {
            if let Some(gate) = desc.module_gate() {
                if let Some(mstop) = gate.mstop {
                    stop.entry(mstop.offset).or_insert([0; 16]);
                }
                if let ClockKind::CoupledGate(_) = desc.kind {
                    coupled.entry((gate.on.offset, gate.on.bit)).or_insert(0);
                }
            }
        }
        GateCoordinator { stop, coupled }
    }

    /// Account for `gate` being turned on. Returns whether its enable bit
    /// has to be written.
    pub fn claim_gate(&mut self, gate: &ModuleGate, coupled: bool) -> bool {
        if !coupled {
            return true;
        }
        match self.coupled.get_mut(&(gate.on.offset, gate.on.bit)) {
            Some(users) => {
                *users += 1;
                *users == 1
            }
            None => true,
        }
    }

    /// Account for `gate` being turned off. Returns whether its enable bit
    /// has to be cleared.
    pub fn release_gate(&mut self, gate: &ModuleGate, coupled: bool) -> bool {
        if !coupled {
            return true;
        }
        match self.coupled.get_mut(&(gate.on.offset, gate.on.bit)) {
            Some(users) => {
                *users = users.saturating_sub(1);
                *users == 0
            }
            None => true,
        }
    }

    /// Release the stop bits of `mstop` that had no users so far.
    pub fn start<R: RegisterSpace>(&mut self, regs: &Registers<R>, mstop: &Mstop) {
        let counts = self.stop.entry(mstop.offset).or_insert([0; 16]);
        let mut released = 0u16;
        for bit in 0..16 {
            if mstop.mask & (1 << bit) != 0 {
                if counts[bit] == 0 {
                    released |= 1 << bit;
                }
                counts[bit] += 1;
            }
        }
        if released != 0 {
            log::debug!("cpg: mstop {:#05x} release {:#06x}", mstop.offset, released);
            regs.write_masked(mstop.offset, released, 0);
        }
    }

    /// Set the stop bits of `mstop` whose last user went away.
    pub fn stop<R: RegisterSpace>(&mut self, regs: &Registers<R>, mstop: &Mstop) {
        let counts = self.stop.entry(mstop.offset).or_insert([0; 16]);
        let mut stopped = 0u16;
        for bit in 0..16 {
            if mstop.mask & (1 << bit) != 0 && counts[bit] > 0 {
                counts[bit] -= 1;
                if counts[bit] == 0 {
                    stopped |= 1 << bit;
                }
            }
        }
        if stopped != 0 {
            log::debug!("cpg: mstop {:#05x} stop {:#06x}", mstop.offset, stopped);
            regs.write_masked(mstop.offset, stopped, stopped);
        }
    }
}
