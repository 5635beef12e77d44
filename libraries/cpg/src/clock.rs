// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock node state machine.
//!
//! Every node carries an enable reference count and, for dividers and
//! muxes, the selected code or position. A node is physically running
//! exactly while its count is non-zero, and a running node holds one
//! reference on its active parent.
//!
//! The references consumers took are counted apart from the total, so a
//! consumer can only give back what it asked for and never the reference a
//! running child or the critical clock list holds.
//!
//! Divider and mux changes go through the same sequence: pre-change
//! notifier, masked write, confirmation poll, post-change notifier. The
//! post-change step runs even when the confirmation times out, so gates
//! that were turned off for the change are always turned back on.

use alloc::vec;
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::config::Config;
use crate::descriptor::{div_entries, ClockKind, Confirm, DividerDesc, GateBit, Notifier};
use crate::error_codes::ErrorCode;
use crate::mstop::GateCoordinator;
use crate::registers::{RegisterSpace, Registers};
use crate::topology::Graph;

/// Mutable runtime state of a provider.
pub struct State<D> {
    /// Enable reference count of every node
    pub counts: Vec<u32>,
    /// The part of `counts` taken through [`Transaction::enable`]
    pub consumers: Vec<u32>,
    /// Divider code or mux position of every node, 0 for other kinds
    pub selection: Vec<u32>,
    pub gates: GateCoordinator,
    pub delay: D,
}

impl<D> State<D> {
    /// Start with every node disabled and the selections the hardware
    /// currently holds.
    pub fn new<R: RegisterSpace>(graph: &Graph, regs: &Registers<R>, delay: D) -> State<D> {
        let selection = (0..graph.len())
            .map(|index| read_selection(graph, regs, index))
            .collect();
        State {
            counts: vec![0; graph.len()],
            consumers: vec![0; graph.len()],
            selection,
            gates: GateCoordinator::new(graph),
            delay,
        }
    }
}

fn read_selection<R: RegisterSpace>(graph: &Graph, regs: &Registers<R>, index: usize) -> u32 {
    let desc = graph.desc(index);
    match &desc.kind {
        ClockKind::Divider(divider) => divider.field.extract(regs.read(divider.field.offset)),
        ClockKind::Mux(mux) => {
            let raw = mux.field.extract(regs.read(mux.field.offset));
            let position = match mux.table {
                Some(table) => table.iter().position(|&code| code == raw),
                None => Some(raw as usize).filter(|&p| p < mux.parents.len()),
            };
            position.map_or_else(
                || {
                    log::warn!("cpg: {}: reserved selector {:#x}", desc.name, raw);
                    0
                },
                |position| position as u32,
            )
        }
        _ => 0,
    }
}

/// Undo information collected by the pre-change notifier.
#[derive(Default)]
struct Quiesced {
    /// Gate bits turned off for the change, with their monitor registers
    gated: Vec<(GateBit, Option<usize>)>,
    /// Mux parked on its safe input, and the position to return it to
    parked: Option<(usize, u32)>,
}

/// One sequence of register accesses, run with the provider lock held.
pub struct Transaction<'a, R: RegisterSpace, D: DelayNs> {
    pub graph: &'a Graph,
    pub regs: &'a Registers<R>,
    pub config: &'a Config,
    pub state: &'a mut State<D>,
}

impl<R: RegisterSpace, D: DelayNs> Transaction<'_, R, D> {
    fn name(&self, index: usize) -> &'static str {
        self.graph.desc(index).name
    }

    /// The parent currently feeding `index`.
    pub fn active_parent(&self, index: usize) -> Option<usize> {
        self.graph.active_parent(index, self.state.selection[index])
    }

    pub fn rate(&self, index: usize) -> u64 {
        let regs = self.regs;
        self.graph
            .rate_of(index, &self.state.selection, &|offset: usize| regs.read(offset))
    }

    fn parent_rate(&self, index: usize) -> u64 {
        self.active_parent(index)
            .map_or(0, |parent| self.rate(parent))
    }

    pub fn enable_count(&self, index: usize) -> u32 {
        self.state.counts[index]
    }

    /// Take a consumer reference on `index`.
    pub fn enable(&mut self, index: usize) -> Result<(), ErrorCode> {
        self.acquire(index)?;
        self.state.consumers[index] += 1;
        Ok(())
    }

    /// Give back a consumer reference on `index`.
    pub fn disable(&mut self, index: usize) -> Result<(), ErrorCode> {
        if self.state.consumers[index] == 0 {
            if self.graph.is_critical(index) {
                log::warn!("cpg: {}: refusing to stop critical clock", self.name(index));
                return Err(ErrorCode::ProtectedClock);
            }
            log::warn!("cpg: {}: disable without enable", self.name(index));
            return Err(ErrorCode::NotEnabled);
        }
        self.state.consumers[index] -= 1;
        self.release(index);
        Ok(())
    }

    /// Take one reference on `index`. A stopped node starts its parent
    /// chain first.
    fn acquire(&mut self, index: usize) -> Result<(), ErrorCode> {
        let count = self.state.counts[index];
        if count == 0 {
            let parent = self.active_parent(index);
            if let Some(parent) = parent {
                self.acquire(parent)?;
            }
            if let Err(err) = self.gate_on(index) {
                if let Some(parent) = parent {
                    self.release(parent);
                }
                log::warn!("cpg: {}: enable failed: {}", self.name(index), err);
                return Err(err);
            }
            log::debug!("cpg: {}: on", self.name(index));
        }
        self.state.counts[index] = count + 1;
        Ok(())
    }

    /// Drop one reference on `index`, stopping it and then its parent chain
    /// once unused.
    fn release(&mut self, index: usize) {
        let count = self.state.counts[index].saturating_sub(1);
        self.state.counts[index] = count;
        if count == 0 {
            self.gate_off(index);
            log::debug!("cpg: {}: off", self.name(index));
            if let Some(parent) = self.active_parent(index) {
                self.release(parent);
            }
        }
    }

    fn gate_on(&mut self, index: usize) -> Result<(), ErrorCode> {
        let (gate, coupled) = match &self.graph.desc(index).kind {
            ClockKind::Gate(gate) => (gate, false),
            ClockKind::CoupledGate(gate) => (gate, true),
            _ => return Ok(()),
        };
        if self.state.gates.claim_gate(gate, coupled) {
            if let Err(err) = self.set_gate_bit(&gate.on, gate.mon) {
                self.state.gates.release_gate(gate, coupled);
                return Err(err);
            }
        }
        // The module bus is only released once its clock runs.
        if let Some(mstop) = &gate.mstop {
            self.state.gates.start(self.regs, mstop);
        }
        Ok(())
    }

    fn gate_off(&mut self, index: usize) {
        let (gate, coupled) = match &self.graph.desc(index).kind {
            ClockKind::Gate(gate) => (gate, false),
            ClockKind::CoupledGate(gate) => (gate, true),
            _ => return,
        };
        if let Some(mstop) = &gate.mstop {
            self.state.gates.stop(self.regs, mstop);
        }
        if self.state.gates.release_gate(gate, coupled) {
            self.regs.write_masked(gate.on.offset, 1 << gate.on.bit, 0);
        }
    }

    fn set_gate_bit(&mut self, on: &GateBit, mon: Option<usize>) -> Result<(), ErrorCode> {
        let bit = 1u16 << on.bit;
        self.regs.write_masked(on.offset, bit, bit);
        match mon {
            Some(mon) => self
                .regs
                .poll_until(
                    &mut self.state.delay,
                    mon,
                    bit as u32,
                    bit as u32,
                    self.config.clk_mon_timeout_us,
                )
                .map(|_| ()),
            None => Ok(()),
        }
    }

    /// Hardware view of whether `index` is running. Gates are read back
    /// from their monitor (or enable) register.
    pub fn is_enabled(&self, index: usize) -> bool {
        match self.graph.desc(index).module_gate() {
            Some(gate) => {
                let offset = gate.mon.unwrap_or(gate.on.offset);
                self.regs.read(offset) & (1 << gate.on.bit) != 0
            }
            None => self.state.counts[index] > 0,
        }
    }

    fn confirm(&mut self, confirm: Option<Confirm>, code: u32) -> Result<(), ErrorCode> {
        let (field, expected) = match confirm {
            None => return Ok(()),
            Some(Confirm::Busy(field)) => (field, 0),
            Some(Confirm::Mirror(field)) => (field, field.expect(code)),
        };
        self.regs
            .poll_until(
                &mut self.state.delay,
                field.offset,
                field.read_mask(),
                expected,
                self.config.clk_update_timeout_us,
            )
            .map(|_| ())
    }

    pub fn set_divisor(&mut self, index: usize, code: u32) -> Result<(), ErrorCode> {
        let ClockKind::Divider(divider) = &self.graph.desc(index).kind else {
            return Err(ErrorCode::NotSupported);
        };
        let Some(entry) = div_entries(divider.table).find(|entry| entry.code == code) else {
            return Err(ErrorCode::InvalidSelection);
        };
        if let Some(Notifier::ForbiddenParentRate { rate, .. }) = divider.notifier {
            if entry.div == 1 && self.parent_rate(index) == rate {
                log::warn!("cpg: {}: divisor 1 not allowed at {} Hz", self.name(index), rate);
                return Err(ErrorCode::RateOutOfRange);
            }
        }
        if self.state.selection[index] == code {
            return Ok(());
        }
        self.reconfigure(index, divider.notifier, |txn| txn.write_divider(index, code))
    }

    pub fn set_mux(&mut self, index: usize, position: u32) -> Result<(), ErrorCode> {
        let ClockKind::Mux(mux) = &self.graph.desc(index).kind else {
            return Err(ErrorCode::NotSupported);
        };
        let Some(&parent) = self.graph.parents(index).get(position as usize) else {
            return Err(ErrorCode::InvalidSelection);
        };
        if self.state.selection[index] == position {
            return Ok(());
        }
        self.protect_children(index, parent)?;
        self.reconfigure(index, mux.notifier, |txn| txn.reparent(index, position))
    }

    fn reconfigure(
        &mut self,
        index: usize,
        notifier: Option<Notifier>,
        change: impl FnOnce(&mut Self) -> Result<(), ErrorCode>,
    ) -> Result<(), ErrorCode> {
        let mut saved = Quiesced::default();
        let result = self
            .pre_change(index, notifier, &mut saved)
            .and_then(|()| change(self));
        let restored = self.post_change(saved);
        result.and(restored)
    }

    fn pre_change(
        &mut self,
        index: usize,
        notifier: Option<Notifier>,
        saved: &mut Quiesced,
    ) -> Result<(), ErrorCode> {
        let Some(Notifier::Quiesce { safe_parent }) = notifier else {
            return Ok(());
        };

        saved.gated = self.running_gates_below(index);
        for (bit, _) in &saved.gated {
            self.regs.write_masked(bit.offset, 1 << bit.bit, 0);
        }

        if let Some(safe) = safe_parent {
            if let Some(mux) = self.active_parent(index) {
                let previous = self.state.selection[mux];
                if previous != safe as u32 {
                    saved.parked = Some((mux, previous));
                    self.reparent(mux, safe as u32)?;
                }
            }
        }
        Ok(())
    }

    fn post_change(&mut self, saved: Quiesced) -> Result<(), ErrorCode> {
        let mut result = Ok(());
        if let Some((mux, position)) = saved.parked {
            result = self.reparent(mux, position);
        }
        for (bit, mon) in saved.gated {
            let restored = self.set_gate_bit(&bit, mon);
            result = result.and(restored);
        }
        result
    }

    /// Enable bits of running gates fed through `index`.
    fn running_gates_below(&self, index: usize) -> Vec<(GateBit, Option<usize>)> {
        let mut below = vec![false; self.graph.len()];
        below[index] = true;
        let mut gated: Vec<(GateBit, Option<usize>)> = Vec::new();

        for node in index + 1..self.graph.len() {
            below[node] = self.active_parent(node).is_some_and(|parent| below[parent]);
            if !below[node] {
                continue;
            }
            if let Some(gate) = self.graph.desc(node).module_gate() {
                // A coupled bit also runs for the other half.
                let running = self.state.counts[node] > 0
                    || self
                        .graph
                        .sibling(node)
                        .is_some_and(|other| self.state.counts[other] > 0);
                if running && !gated.iter().any(|(bit, _)| *bit == gate.on) {
                    gated.push((gate.on, gate.mon));
                }
            }
        }
        gated
    }

    fn write_divider(&mut self, index: usize, code: u32) -> Result<(), ErrorCode> {
        let ClockKind::Divider(divider) = &self.graph.desc(index).kind else {
            return Err(ErrorCode::NotSupported);
        };
        let field = divider.field;
        self.regs
            .write_masked(field.offset, field.mask(), field.place(code));
        self.state.selection[index] = code;
        log::debug!("cpg: {}: code {:#x}", self.name(index), code);
        self.confirm(divider.confirm, code)
    }

    /// Switch `index` to the candidate at `position`, moving the reference
    /// a running mux holds from the old input to the new one.
    fn reparent(&mut self, index: usize, position: u32) -> Result<(), ErrorCode> {
        let ClockKind::Mux(mux) = &self.graph.desc(index).kind else {
            return Err(ErrorCode::NotSupported);
        };
        let Some(&new) = self.graph.parents(index).get(position as usize) else {
            return Err(ErrorCode::InvalidSelection);
        };
        let old = self.active_parent(index);
        let running = self.state.counts[index] > 0;

        if running {
            self.acquire(new)?;
        }

        let raw = mux.table.map_or(position, |table| table[position as usize]);
        self.regs
            .write_masked(mux.field.offset, mux.field.mask(), mux.field.place(raw));
        self.state.selection[index] = position;
        log::debug!("cpg: {}: parent {}", self.name(index), self.name(new));
        let confirmed = self.confirm(mux.confirm, raw);

        if running {
            if let Some(old) = old {
                self.release(old);
            }
        }
        confirmed
    }

    /// Move dividers below the mux `index` off divisor 1 when `new_parent`
    /// runs at a rate they must not pass through unchanged.
    fn protect_children(&mut self, index: usize, new_parent: usize) -> Result<(), ErrorCode> {
        let graph = self.graph;
        let new_rate = self.rate(new_parent);
        for child in graph.children(index) {
            let ClockKind::Divider(divider) = &graph.desc(child).kind else {
                continue;
            };
            let Some(Notifier::ForbiddenParentRate { rate, safe_code }) = divider.notifier else {
                continue;
            };
            let code = self.state.selection[child];
            let unity = div_entries(divider.table).any(|entry| entry.code == code && entry.div == 1);
            if unity && new_rate == rate {
                log::debug!("cpg: {}: leaving divisor 1 before {} Hz", graph.desc(child).name, rate);
                self.write_divider(child, safe_code)?;
            }
        }
        Ok(())
    }

    /// Program the closest achievable rate not above `hz`.
    pub fn set_rate(&mut self, index: usize, hz: u64) -> Result<u64, ErrorCode> {
        let graph = self.graph;
        let rate = match &graph.desc(index).kind {
            ClockKind::Input { .. } | ClockKind::Pll(_) => self.rate(index),
            ClockKind::FixedFactor { mul, div, .. } => {
                let parent = self.active_parent(index).ok_or(ErrorCode::NotSupported)?;
                self.set_rate(parent, parent_request(hz, *mul, *div))?;
                self.rate(index)
            }
            ClockKind::Gate(_) | ClockKind::CoupledGate(_) => {
                let parent = self.active_parent(index).ok_or(ErrorCode::NotSupported)?;
                self.set_rate(parent, hz)?;
                self.rate(index)
            }
            ClockKind::Mux(_) => {
                let current = self.state.selection[index];
                let candidates = graph
                    .parents(index)
                    .iter()
                    .enumerate()
                    .map(|(position, &parent)| (position as u32, self.rate(parent)));
                let (position, _) =
                    closest_below(candidates, hz, current).ok_or(ErrorCode::RateOutOfRange)?;
                self.set_mux(index, position)?;
                self.rate(index)
            }
            ClockKind::Divider(divider) => {
                let hz = divider.limit.map_or(hz, |limit| hz.min(limit));
                let Some((input, code)) = self.best_divisor(index, divider, hz) else {
                    log::warn!("cpg: {}: no divisor reaches {} Hz", self.name(index), hz);
                    return Err(ErrorCode::RateOutOfRange);
                };
                // Switching the input first lets the mux move the divider off
                // a forbidden unity setting before the new rate arrives.
                if let Some((mux, position)) = input {
                    self.set_mux(mux, position)?;
                }
                self.set_divisor(index, code)?;
                self.rate(index)
            }
        };
        if rate > hz {
            log::warn!("cpg: {}: runs at {} Hz, above {} Hz", self.name(index), rate, hz);
            return Err(ErrorCode::RateOutOfRange);
        }
        Ok(rate)
    }

    /// The divider code giving the highest rate not above `hz`, together
    /// with the input its parent mux has to switch to when the divider may
    /// reselect it.
    fn best_divisor(
        &self,
        index: usize,
        divider: &DividerDesc,
        hz: u64,
    ) -> Option<(Option<(usize, u32)>, u32)> {
        let parent = self.active_parent(index)?;
        let mux = match self.graph.desc(parent).kind {
            ClockKind::Mux(_) if divider.rate_parent => Some(parent),
            _ => None,
        };
        let inputs: Vec<(Option<u32>, u64)> = match mux {
            Some(mux) => self
                .graph
                .parents(mux)
                .iter()
                .enumerate()
                .map(|(position, &input)| (Some(position as u32), self.rate(input)))
                .collect(),
            None => vec![(None, self.rate(parent))],
        };
        let current = (
            mux.map(|mux| self.state.selection[mux]),
            self.state.selection[index],
        );

        let candidates = inputs
            .into_iter()
            .filter(|&(_, parent_rate)| {
                divider
                    .bounds
                    .map_or(true, |bounds| bounds.contains(parent_rate))
            })
            .flat_map(|(position, parent_rate)| {
                let forbidden = matches!(
                    divider.notifier,
                    Some(Notifier::ForbiddenParentRate { rate, .. }) if rate == parent_rate
                );
                div_entries(divider.table)
                    .filter(move |entry| !(forbidden && entry.div == 1))
                    .map(move |entry| ((position, entry.code), parent_rate / entry.div as u64))
            });
        let ((position, code), _) = closest_below(candidates, hz, current)?;
        Some((mux.zip(position), code))
    }

    /// Apply the start-up selections the table asks for.
    pub fn apply_defaults(&mut self) -> Result<(), ErrorCode> {
        let graph = self.graph;
        for index in 0..graph.len() {
            match &graph.desc(index).kind {
                ClockKind::Divider(divider) => {
                    if let Some(code) = divider.default {
                        if self.state.selection[index] != code {
                            self.write_divider(index, code)?;
                        }
                    }
                }
                ClockKind::Mux(mux) => {
                    if let Some(position) = mux.default {
                        if self.state.selection[index] != position as u32 {
                            self.reparent(index, position as u32)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn enable_critical(&mut self) -> Result<(), ErrorCode> {
        let graph = self.graph;
        for id in graph.info().critical {
            if let Some(index) = graph.index_of(*id) {
                self.acquire(index)?;
            }
        }
        Ok(())
    }

    /// Drop every consumer reference held on non-critical nodes, children
    /// first.
    pub fn shutdown(&mut self) {
        let graph = self.graph;
        for index in (0..graph.len()).rev() {
            if graph.is_critical(index) {
                continue;
            }
            while self.state.consumers[index] > 0 {
                self.state.consumers[index] -= 1;
                self.release(index);
            }
        }
    }
}

/// The highest parent rate that a `mul / div` factor turns into at most
/// `hz`.
fn parent_request(hz: u64, mul: u32, div: u32) -> u64 {
    let highest = (u128::from(hz) + 1) * u128::from(div) - 1;
    u64::try_from(highest / u128::from(mul)).unwrap_or(u64::MAX)
}

/// The highest `(selection, rate)` pair not above `hz`, keeping `current`
/// on ties.
fn closest_below<S: Copy + PartialEq>(
    candidates: impl Iterator<Item = (S, u64)>,
    hz: u64,
    current: S,
) -> Option<(S, u64)> {
    let mut best: Option<(S, u64)> = None;
    for (selection, rate) in candidates {
        if rate > hz {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, best_rate)) => {
                rate > best_rate || (rate == best_rate && selection == current)
            }
        };
        if better {
            best = Some((selection, rate));
        }
    }
    best
}
